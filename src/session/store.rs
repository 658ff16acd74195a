//! Session store
//!
//! Owns the [`Session`] and drives its lifecycle. The current session is
//! published through a `watch` channel so the request gateway and route
//! guards always read the latest credential and status.

use super::model::{Session, SessionStatus, User};
use crate::api::{auth, AuthResponse, IdentityResponse, MessageResponse};
use crate::error::{Error, Result};
use crate::gateway::{RequestGateway, Transport};
use crate::notifier::{Notice, Notifier};
use crate::storage::CredentialStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Minimum password length accepted by the reset flow
pub const MIN_PASSWORD_LEN: usize = 6;

struct Inner {
    state: watch::Sender<Session>,
    credentials: Arc<dyn CredentialStore>,
    gateway: RequestGateway,
    notifier: Arc<dyn Notifier>,
    /// Bumped on every local sign-out; identity checks started under an
    /// older value must not publish
    epoch: AtomicU64,
}

/// Session store
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    /// Create a store in the `Unknown` state
    ///
    /// The store builds the request gateway itself so the gateway is wired
    /// to this session's credential.
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (state, receiver) = watch::channel(Session::unknown());
        let gateway = RequestGateway::new(transport, receiver);
        Self {
            inner: Arc::new(Inner {
                state,
                credentials,
                gateway,
                notifier,
                epoch: AtomicU64::new(0),
            }),
        }
    }

    /// Gateway that carries this session's credential
    pub fn gateway(&self) -> RequestGateway {
        self.inner.gateway.clone()
    }

    /// Observe session changes
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    /// Snapshot of the current session
    pub fn session(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.state.borrow().status()
    }

    pub fn user(&self) -> Option<User> {
        self.inner.state.borrow().user().cloned()
    }

    fn publish(&self, session: Session) {
        let status = session.status();
        let previous = self.inner.state.send_replace(session);
        if previous.status() != status {
            tracing::debug!("Session status {} -> {}", previous.status(), status);
        }
    }

    fn epoch(&self) -> u64 {
        self.inner.epoch.load(Ordering::SeqCst)
    }

    /// Drop the persisted credential and go anonymous
    fn clear_local(&self) {
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = self.inner.credentials.clear() {
            tracing::warn!("Failed to clear stored credential: {}", e);
        }
        self.publish(Session::anonymous());
    }

    /// Resolve the initial session from the persisted credential
    ///
    /// Always settles on `Authenticated` or `Anonymous`. Any failure of the
    /// identity check discards the stored credential.
    pub async fn bootstrap(&self) -> SessionStatus {
        let epoch = self.epoch();
        let token = match self.inner.credentials.get() {
            Ok(Some(token)) => token,
            Ok(None) => {
                self.publish(Session::anonymous());
                return SessionStatus::Anonymous;
            }
            Err(e) => {
                tracing::warn!("Failed to read stored credential: {}", e);
                self.clear_local();
                return SessionStatus::Anonymous;
            }
        };

        match self.identify(token, epoch).await {
            Ok(user) => {
                tracing::info!("Session restored for {}", user.email);
                SessionStatus::Authenticated
            }
            Err(_) if self.epoch() != epoch => self.status(),
            Err(e) => {
                tracing::info!("Stored credential rejected: {}", e);
                self.clear_local();
                SessionStatus::Anonymous
            }
        }
    }

    /// Verify `token` against the identity-check endpoint
    ///
    /// Publishes nothing further if the session was cleared since `epoch`.
    async fn identify(&self, token: String, epoch: u64) -> Result<User> {
        self.publish(Session::authenticating(token.clone()));

        let response = self.inner.gateway.send::<IdentityResponse>(auth::me()).await;
        if self.epoch() != epoch {
            return Err(signed_out());
        }
        let user = response?
            .user
            .ok_or_else(|| Error::Session("Identity check returned no user".to_string()))?;

        self.publish(Session::authenticated(token, user.clone()));
        Ok(user)
    }

    /// Persist the credential from a login/signup response and load the profile
    ///
    /// On any failure the session is rolled back to anonymous with nothing
    /// persisted. A sign-out since `epoch` wins over the response.
    async fn establish(&self, response: AuthResponse, epoch: u64) -> Result<User> {
        if self.epoch() != epoch {
            return Err(signed_out());
        }
        let token = match response.token.filter(|t| !t.is_empty()) {
            Some(token) => token,
            None => {
                self.clear_local();
                return Err(Error::Session(
                    "Authentication response did not include a token".to_string(),
                ));
            }
        };

        if let Err(e) = self.inner.credentials.set(&token) {
            self.clear_local();
            return Err(e);
        }

        match self.identify(token, epoch).await {
            Ok(user) => Ok(user),
            Err(e) if self.epoch() != epoch => Err(e),
            Err(e) => {
                tracing::warn!("Identity check after sign-in failed: {}", e);
                self.clear_local();
                Err(e)
            }
        }
    }

    /// Sign in with email and password
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let email = required(email, "Email is required")?;
        let password = required(password, "Password is required")?;

        let epoch = self.epoch();
        let response: AuthResponse = self
            .inner
            .gateway
            .send(auth::login(email, password))
            .await?;
        let user = self.establish(response, epoch).await?;

        tracing::info!("Logged in as {}", user.email);
        Ok(user)
    }

    /// Create an account and sign in
    pub async fn signup(&self, email: &str, password: &str, full_name: &str) -> Result<User> {
        let email = required(email, "Email is required")?;
        let password = required(password, "Password is required")?;
        let full_name = required(full_name, "Full name is required")?;

        let epoch = self.epoch();
        let response: AuthResponse = self
            .inner
            .gateway
            .send(auth::signup(email, password, full_name))
            .await?;
        let user = self.establish(response, epoch).await?;

        tracing::info!("Signed up as {}", user.email);
        Ok(user)
    }

    /// Sign out
    ///
    /// Remote invalidation is best effort; the local session is cleared
    /// whatever the outcome.
    pub async fn logout(&self) {
        if let Err(e) = self.inner.gateway.send_value(auth::logout()).await {
            tracing::warn!("Remote logout failed, clearing local session anyway: {}", e);
        }
        self.clear_local();
        self.inner.notifier.notify(Notice::success("Logged out"));
        tracing::info!("Logged out");
    }

    /// Delete the account
    ///
    /// On failure the session is left untouched and the error is returned.
    pub async fn delete_account(&self) -> Result<()> {
        if let Err(e) = self.inner.gateway.send_value(auth::delete_account()).await {
            self.inner.notifier.notify(Notice::error(e.message()));
            return Err(e.into());
        }
        self.clear_local();
        self.inner.notifier.notify(Notice::success("Account deleted"));
        tracing::info!("Account deleted");
        Ok(())
    }

    /// Ask the service to mail a password reset link
    pub async fn forgot_password(&self, email: &str) -> Result<String> {
        let email = required(email, "Email is required")?;
        let response: MessageResponse = self
            .inner
            .gateway
            .send(auth::forgot_password(email))
            .await?;
        Ok(response
            .message
            .unwrap_or_else(|| "If your email exists, a reset link was sent.".to_string()))
    }

    /// Set a new password using a reset token
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<String> {
        let token = required(token, "Missing token")?;
        let new_password = new_password.trim();
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let response: MessageResponse = self
            .inner
            .gateway
            .send(auth::reset_password(token, new_password))
            .await?;
        Ok(response
            .message
            .unwrap_or_else(|| "Password reset successfully. Please login.".to_string()))
    }
}

fn signed_out() -> Error {
    Error::Session("Signed out before sign-in completed".to_string())
}

fn required<'a>(value: &'a str, message: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(message.to_string()));
    }
    Ok(trimmed)
}
