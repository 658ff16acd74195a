//! Client assembly
//!
//! [`ClientBuilder`] wires the collaborators together from a
//! [`ClientConfig`]: transport, credential store, session store and
//! notifier. Everything hangs off the resulting [`Client`].

use crate::chat::ChatSession;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::gateway::{HttpTransport, RequestGateway, Transport};
use crate::guard::RouteGuard;
use crate::notifier::{Notifier, TracingNotifier};
use crate::resources::{AgentController, LoadOrdering, ReminderController};
use crate::session::SessionStore;
use crate::storage::{CredentialStore, FileCredentialStore};
use std::sync::Arc;

/// Entry point holding the wired collaborators
#[derive(Clone)]
pub struct Client {
    config: ClientConfig,
    session: SessionStore,
    notifier: Arc<dyn Notifier>,
    ordering: LoadOrdering,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn gateway(&self) -> RequestGateway {
        self.session.gateway()
    }

    pub fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::clone(&self.notifier)
    }

    /// A fresh guard following this client's session
    pub fn guard(&self) -> RouteGuard {
        RouteGuard::new(self.session.subscribe())
    }

    pub fn agents(&self) -> AgentController {
        AgentController::with_ordering(self.gateway(), self.notifier(), self.ordering)
    }

    pub fn reminders(&self) -> ReminderController {
        ReminderController::with_ordering(self.gateway(), self.notifier(), self.ordering)
    }

    /// Start a chat with one agent
    pub fn chat(&self, agent_id: impl Into<String>) -> ChatSession {
        ChatSession::new(agent_id, self.gateway(), self.notifier())
    }
}

/// Builder for [`Client`]
pub struct ClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    credentials: Option<Arc<dyn CredentialStore>>,
    notifier: Option<Arc<dyn Notifier>>,
    ordering: LoadOrdering,
}

impl ClientBuilder {
    /// Create a new builder with default config
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            transport: None,
            credentials: None,
            notifier: None,
            ordering: LoadOrdering::default(),
        }
    }

    /// Set the configuration
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the API base URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.api.base_url = base_url.into();
        self
    }

    /// Use `transport` instead of the HTTP transport
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use `credentials` instead of the file store from the configuration
    pub fn credential_store(mut self, credentials: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Where notices go; logs them by default
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// How resource controllers reconcile overlapping loads
    pub fn load_ordering(mut self, ordering: LoadOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<Client> {
        self.config.validate()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&self.config.api)?),
        };
        let credentials = match self.credentials {
            Some(credentials) => credentials,
            None => Arc::new(FileCredentialStore::new(
                self.config.storage.credential_path.clone(),
            )),
        };
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(TracingNotifier));

        tracing::debug!("Client configured for {}", self.config.api.base_url);

        Ok(Client {
            session: SessionStore::new(transport, credentials, Arc::clone(&notifier)),
            config: self.config,
            notifier,
            ordering: self.ordering,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::ScriptedTransport;
    use crate::guard::{GuardDecision, Route};
    use crate::notifier;
    use crate::session::SessionStatus;
    use crate::storage::MemoryCredentialStore;
    use reqwest::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_build_and_bootstrap() {
        let transport = ScriptedTransport::new();
        transport.respond(
            Method::GET,
            "/auth/me",
            200,
            json!({"user": {"user_id": "u1", "email": "a@a.com", "full_name": "Ada"}}),
        );
        transport.respond(Method::GET, "/agents/list", 200, json!({"agents": []}));

        let (notifier, _notices) = notifier::channel();
        let client = Client::builder()
            .transport(transport.clone())
            .credential_store(Arc::new(MemoryCredentialStore::with_token("tok")))
            .notifier(notifier)
            .build()
            .unwrap();

        let mut guard = client.guard();
        assert_eq!(guard.current(&Route::Agents), GuardDecision::Loading);

        assert_eq!(client.session().bootstrap().await, SessionStatus::Authenticated);
        assert_eq!(guard.settle(&Route::Agents).await, GuardDecision::Render);

        client.agents().reload().await.unwrap();
        assert_eq!(transport.calls()[1].credential.as_deref(), Some("tok"));
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let result = Client::builder().base_url("ftp://nope").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_controllers_share_ordering() {
        let client = Client::builder()
            .transport(ScriptedTransport::new())
            .credential_store(Arc::new(MemoryCredentialStore::new()))
            .load_ordering(LoadOrdering::LastCompletion)
            .build()
            .unwrap();

        assert_eq!(client.agents().ordering(), LoadOrdering::LastCompletion);
        assert_eq!(client.reminders().ordering(), LoadOrdering::LastCompletion);
        assert_eq!(client.chat("a1").agent_id(), "a1");
    }
}
