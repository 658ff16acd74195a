//! Chat sessions
//!
//! A [`ChatSession`] is the ephemeral message log for one agent. Only the new
//! message is sent on each turn; the log lives in memory and is dropped with
//! the session.

use crate::api::{agents, chat, AgentDetail, ChatReply, ScrapeRequest};
use crate::error::{Error, Result};
use crate::gateway::RequestGateway;
use crate::notifier::{Notice, Notifier};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Assistant message appended when a turn fails
pub const ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// Message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the chat log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub source_url: Option<String>,
    pub chunks_used: Option<u32>,
    pub sent_at: DateTime<Utc>,
}

impl Message {
    fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            source_url: None,
            chunks_used: None,
            sent_at: Utc::now(),
        }
    }

    fn assistant(reply: ChatReply) -> Self {
        Self {
            role: Role::Assistant,
            content: reply.message,
            source_url: reply.source_url,
            chunks_used: reply.chunks_used,
            sent_at: Utc::now(),
        }
    }

    fn error_reply() -> Self {
        Self {
            role: Role::Assistant,
            content: ERROR_REPLY.to_string(),
            source_url: None,
            chunks_used: None,
            sent_at: Utc::now(),
        }
    }
}

/// Result of [`ChatSession::send`]
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Blank input, or a turn already in progress
    Ignored,
    /// The agent answered
    Replied(Message),
    /// The turn failed; a synthetic error reply was appended
    Failed(String),
}

#[derive(Default)]
struct ChatState {
    agent: Option<AgentDetail>,
    messages: Vec<Message>,
    loading: bool,
    scraping: bool,
}

fn loading_flag(state: &mut ChatState) -> &mut bool {
    &mut state.loading
}

fn scraping_flag(state: &mut ChatState) -> &mut bool {
    &mut state.scraping
}

/// Resets a busy flag when the operation ends
struct BusyGuard<'a> {
    state: &'a Mutex<ChatState>,
    flag: fn(&mut ChatState) -> &mut bool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *(self.flag)(&mut *state) = false;
    }
}

/// Message log and turn handling for one agent
#[derive(Clone)]
pub struct ChatSession {
    agent_id: String,
    gateway: RequestGateway,
    notifier: Arc<dyn Notifier>,
    state: Arc<Mutex<ChatState>>,
}

impl ChatSession {
    pub fn new(
        agent_id: impl Into<String>,
        gateway: RequestGateway,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            gateway,
            notifier,
            state: Arc::new(Mutex::new(ChatState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim a busy flag; `None` if it is already set
    fn try_begin(&self, flag: fn(&mut ChatState) -> &mut bool) -> Option<BusyGuard<'_>> {
        let mut state = self.lock();
        let busy = flag(&mut *state);
        if *busy {
            return None;
        }
        *busy = true;
        Some(BusyGuard {
            state: &self.state,
            flag,
        })
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Load the agent this session talks to
    pub async fn open(&self) -> Result<AgentDetail> {
        match self.gateway.send::<AgentDetail>(agents::get(&self.agent_id)).await {
            Ok(detail) => {
                if detail.needs_source() {
                    tracing::info!("Agent {} has no knowledge sources yet", self.agent_id);
                }
                self.lock().agent = Some(detail.clone());
                Ok(detail)
            }
            Err(e) => {
                tracing::warn!("Failed to load agent {}: {}", self.agent_id, e);
                self.notifier.notify(Notice::error("Failed to load agent"));
                Err(e.into())
            }
        }
    }

    /// Agent details from the last successful [`open`](Self::open)
    pub fn agent(&self) -> Option<AgentDetail> {
        self.lock().agent.clone()
    }

    /// The agent has no knowledge sources to answer from
    pub fn needs_source(&self) -> bool {
        self.lock()
            .agent
            .as_ref()
            .map_or(false, AgentDetail::needs_source)
    }

    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    /// Send one user message and append the agent's answer
    ///
    /// The user message stays in the log whatever happens to the request.
    pub async fn send(&self, content: &str) -> SendOutcome {
        let content = content.trim();
        if content.is_empty() {
            return SendOutcome::Ignored;
        }
        let Some(_busy) = self.try_begin(loading_flag) else {
            tracing::debug!("Chat turn already in progress, ignoring input");
            return SendOutcome::Ignored;
        };

        self.lock().messages.push(Message::user(content));

        match self
            .gateway
            .send::<ChatReply>(chat::process(&self.agent_id, content))
            .await
        {
            Ok(reply) => {
                let message = Message::assistant(reply);
                self.lock().messages.push(message.clone());
                SendOutcome::Replied(message)
            }
            Err(e) => {
                tracing::warn!("Chat turn for agent {} failed: {}", self.agent_id, e);
                self.lock().messages.push(Message::error_reply());
                self.notifier.notify(Notice::error("Failed to get response"));
                SendOutcome::Failed(e.message().to_string())
            }
        }
    }

    /// Scrape `url` into the agent's knowledge base, then reload the agent
    pub async fn add_source(&self, url: &str) -> Result<()> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::Validation("URL is required".to_string()));
        }
        let Some(_busy) = self.try_begin(scraping_flag) else {
            return Err(Error::InFlight(format!("scrape:{}", self.agent_id)));
        };

        let request = agents::scrape(&ScrapeRequest::single_page(self.agent_id.as_str(), url))?;
        if let Err(e) = self.gateway.send_value(request).await {
            tracing::warn!("Scrape of {} failed: {}", url, e);
            self.notifier.notify(Notice::error("Failed to scrape website"));
            return Err(e.into());
        }

        self.notifier
            .notify(Notice::success("Website scraped successfully!"));
        // Refresh failures are already notified by open()
        let _ = self.open().await;
        Ok(())
    }
}
