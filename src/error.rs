//! agentwatch error types

use crate::gateway::ApiError;
use thiserror::Error;

/// agentwatch error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Session error
    #[error("Session error: {0}")]
    Session(String),

    /// Input rejected before any request was issued
    #[error("Validation error: {0}")]
    Validation(String),

    /// The same action is already being submitted
    #[error("Action already in flight: {0}")]
    InFlight(String),

    /// Normalized resource API failure
    #[error(transparent)]
    Api(#[from] ApiError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            Error::Api(e) => e.message().to_string(),
            Error::Validation(msg) | Error::Session(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    /// Returns the API error if this failure came from the resource API
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type alias for agentwatch operations
pub type Result<T> = std::result::Result<T, Error>;
