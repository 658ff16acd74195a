//! Session state

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the client stands with respect to authentication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Process just started; the stored credential has not been checked
    Unknown,
    /// A credential is being verified
    Authenticating,
    /// Identity confirmed
    Authenticated,
    /// No usable credential
    Anonymous,
}

impl SessionStatus {
    /// Authenticated or anonymous; nothing is pending
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Authenticated | SessionStatus::Anonymous)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Unknown => "unknown",
            SessionStatus::Authenticating => "authenticating",
            SessionStatus::Authenticated => "authenticated",
            SessionStatus::Anonymous => "anonymous",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile of the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "user_id", alias = "id")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
}

impl User {
    pub fn new(id: impl Into<String>, email: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            full_name: full_name.into(),
        }
    }

    /// Name to greet the user with
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() {
            &self.email
        } else {
            &self.full_name
        }
    }
}

/// Client-held proof of identity plus cached profile and status
///
/// The constructors are the only way to build a session, and each one
/// upholds the invariants: a user is present only when authenticated, and a
/// token is present only while authenticating or authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    user: Option<User>,
    status: SessionStatus,
}

impl Session {
    pub fn unknown() -> Self {
        Self {
            token: None,
            user: None,
            status: SessionStatus::Unknown,
        }
    }

    pub fn authenticating(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            user: None,
            status: SessionStatus::Authenticating,
        }
    }

    pub fn authenticated(token: impl Into<String>, user: User) -> Self {
        Self {
            token: Some(token.into()),
            user: Some(user),
            status: SessionStatus::Authenticated,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            token: None,
            user: None,
            status: SessionStatus::Anonymous,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::unknown()
    }
}
