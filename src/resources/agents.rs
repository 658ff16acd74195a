//! Agents collection

use super::{ResourceController, ResourceKind};
use crate::api::{agents, Agent, AgentDetail, AgentPatch, AgentStatus, ScrapeRequest};
use crate::error::{Error, Result};
use crate::gateway::ApiRequest;
use crate::notifier::Notice;
use serde_json::Value;

/// Which agents the list shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AgentFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl AgentFilter {
    pub fn status(self) -> Option<AgentStatus> {
        match self {
            AgentFilter::All => None,
            AgentFilter::Active => Some(AgentStatus::Active),
            AgentFilter::Inactive => Some(AgentStatus::Inactive),
        }
    }
}

/// Mutations on agents
#[derive(Debug, Clone, PartialEq)]
pub enum AgentAction {
    Create { name: String, role: String },
    Update { id: String, patch: AgentPatch },
    SetStatus { id: String, status: AgentStatus },
    Delete { id: String },
    /// Add a knowledge source
    Scrape(ScrapeRequest),
    /// Re-scrape the primary source
    Refresh { id: String },
}

/// Agents resource kind
pub struct Agents;

pub type AgentController = ResourceController<Agents>;

impl ResourceKind for Agents {
    type Item = Agent;
    type Filter = AgentFilter;
    type Action = AgentAction;

    const LIST_FIELD: &'static str = "agents";
    const LOAD_FAILED: &'static str = "Failed to fetch agents";

    fn list_request(filter: &AgentFilter) -> ApiRequest {
        agents::list(filter.status())
    }

    fn action_request(action: &AgentAction) -> Result<ApiRequest> {
        match action {
            AgentAction::Create { name, role } => {
                let (name, role) = (name.trim(), role.trim());
                if name.is_empty() || role.is_empty() {
                    return Err(Error::Validation(
                        "Please fill in all required fields".to_string(),
                    ));
                }
                Ok(agents::create(name, role))
            }
            AgentAction::Update { id, patch } => {
                if patch.is_empty() {
                    return Err(Error::Validation("Nothing to update".to_string()));
                }
                agents::update(id, patch)
            }
            AgentAction::SetStatus { id, status } => Ok(agents::set_status(id, *status)),
            AgentAction::Delete { id } => Ok(agents::delete(id)),
            AgentAction::Scrape(request) => {
                if request.url.trim().is_empty() {
                    return Err(Error::Validation("URL is required".to_string()));
                }
                agents::scrape(request)
            }
            AgentAction::Refresh { id } => Ok(agents::refresh(id)),
        }
    }

    fn action_key(action: &AgentAction) -> String {
        match action {
            AgentAction::Create { .. } => "agent:create".to_string(),
            AgentAction::Update { id, .. } => format!("agent:update:{}", id),
            AgentAction::SetStatus { id, .. } => format!("agent:status:{}", id),
            AgentAction::Delete { id } => format!("agent:delete:{}", id),
            AgentAction::Scrape(request) => format!("agent:scrape:{}", request.agent_id),
            AgentAction::Refresh { id } => format!("agent:refresh:{}", id),
        }
    }

    fn success_notice(action: &AgentAction, response: &Value) -> Notice {
        match action {
            AgentAction::Create { .. } => Notice::success("Agent created successfully!"),
            AgentAction::Update { .. } => Notice::success("Agent updated successfully!"),
            AgentAction::SetStatus { status, .. } => match status {
                AgentStatus::Active => Notice::success("Agent activated"),
                AgentStatus::Inactive => Notice::success("Agent deactivated"),
            },
            AgentAction::Delete { .. } => Notice::success("Agent deleted successfully"),
            AgentAction::Scrape(_) => Notice::success("Website scraped successfully!"),
            AgentAction::Refresh { .. } => Notice::success(
                response
                    .get("message")
                    .and_then(Value::as_str)
                    .filter(|m| !m.is_empty())
                    .unwrap_or("Knowledge refreshed"),
            ),
        }
    }

    fn failure_notice(action: &AgentAction, error: &Error) -> Notice {
        let message = match action {
            AgentAction::Create { .. } => "Failed to create agent",
            AgentAction::Update { .. } => "Failed to update agent",
            AgentAction::SetStatus { .. } => "Failed to update status",
            AgentAction::Delete { .. } => "Failed to delete agent",
            AgentAction::Scrape(_) => "Failed to scrape website",
            AgentAction::Refresh { .. } => "Failed to refresh agent",
        };
        match error {
            Error::Validation(reason) => Notice::error(reason.clone()),
            _ => Notice::error(message),
        }
    }
}

impl ResourceController<Agents> {
    /// Fetch one agent with its knowledge sources
    pub async fn get(&self, agent_id: &str) -> Result<AgentDetail> {
        Ok(self.gateway().send(agents::get(agent_id)).await?)
    }

    /// Flip an agent between active and inactive
    pub async fn toggle_status(&self, agent: &Agent) -> Result<Value> {
        self.mutate(AgentAction::SetStatus {
            id: agent.id.clone(),
            status: agent.status.toggled(),
        })
        .await
    }
}
