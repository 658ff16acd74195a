//! agentwatch configuration management

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the API base URL
pub const API_BASE_URL_ENV: &str = "AGENTWATCH_API_BASE_URL";

/// Default API root when nothing else is configured
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api";

/// Main agentwatch configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Resource API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Credential storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

impl ClientConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ClientConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_base_url_override(std::env::var(API_BASE_URL_ENV).ok())
    }

    /// Replace the base URL when an override is present and non-empty
    pub fn with_base_url_override(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.api.base_url = url.trim().to_string();
        }
        self
    }

    /// Check the configuration for values the client cannot work with
    pub fn validate(&self) -> Result<()> {
        let base = self.api.base_url.trim();
        if base.is_empty() {
            return Err(Error::Config("api.base_url must not be empty".to_string()));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(Error::Config(format!(
                "api.base_url must be an http(s) URL, got {}",
                base
            )));
        }
        if self.api.request_timeout_secs == 0 {
            return Err(Error::Config(
                "api.request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resource API configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API root, e.g. `http://127.0.0.1:8000/api`
    pub base_url: String,

    /// Transport-level timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            // Chat and scrape calls are slow on the service side
            request_timeout_secs: 180,
        }
    }
}

/// Credential storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// File holding the persisted credential
    pub credential_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let base = dirs_next::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("agentwatch");

        Self {
            credential_path: base.join("credentials.json"),
        }
    }
}
