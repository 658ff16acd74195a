//! Persisted credential storage
//!
//! The client persists exactly one opaque credential under a single
//! well-known key. Its absence means the session starts anonymous.
//! Storage is a pluggable capability so the session store can be
//! exercised against an in-memory backend in tests.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Key the credential is stored under
pub const CREDENTIAL_KEY: &str = "auth_token";

/// Get/set/clear capability for the persisted credential
pub trait CredentialStore: Send + Sync {
    /// Read the stored credential, if any
    fn get(&self) -> Result<Option<String>>;

    /// Replace the stored credential
    fn set(&self, token: &str) -> Result<()>;

    /// Remove the stored credential
    fn clear(&self) -> Result<()>;
}

/// In-memory credential store
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a credential
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>> {
        self.token
            .lock()
            .map_err(|_| Error::Storage("credential lock poisoned".to_string()))
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Result<Option<String>> {
        Ok(self.lock()?.clone())
    }

    fn set(&self, token: &str) -> Result<()> {
        *self.lock()? = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.lock()? = None;
        Ok(())
    }
}

/// Credential store backed by a small JSON key/value file
///
/// Other keys found in the file are preserved on write. A file that does
/// not parse is replaced by `set` and removed by `clear`.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                Error::Storage(format!(
                    "Corrupt credential file {}: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Result<Option<String>> {
        Ok(self
            .read_entries()?
            .remove(CREDENTIAL_KEY)
            .filter(|t| !t.is_empty()))
    }

    fn set(&self, token: &str) -> Result<()> {
        let mut entries = match self.read_entries() {
            Err(Error::Storage(msg)) => {
                tracing::warn!("{}; overwriting", msg);
                BTreeMap::new()
            }
            other => other?,
        };
        entries.insert(CREDENTIAL_KEY.to_string(), token.to_string());
        self.write_entries(&entries)
    }

    fn clear(&self) -> Result<()> {
        match self.read_entries() {
            Ok(mut entries) => {
                if entries.remove(CREDENTIAL_KEY).is_some() {
                    self.write_entries(&entries)?;
                }
                Ok(())
            }
            Err(Error::Storage(msg)) => {
                tracing::warn!("{}; removing it", msg);
                std::fs::remove_file(&self.path)?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.get().unwrap(), None);

        store.set("tok-1").unwrap();
        assert_eq!(store.get().unwrap().as_deref(), Some("tok-1"));

        store.clear().unwrap();
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested/credentials.json"));
        assert_eq!(store.get().unwrap(), None);
        store.clear().unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn test_file_store_set_get_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/credentials.json");
        let store = FileCredentialStore::new(&path);

        store.set("tok-abc").unwrap();
        assert!(path.exists());

        // A fresh handle sees the persisted value
        let reopened = FileCredentialStore::new(&path);
        assert_eq!(reopened.get().unwrap().as_deref(), Some("tok-abc"));

        reopened.clear().unwrap();
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_file_store_preserves_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, r#"{"theme": "dark", "auth_token": "old"}"#).unwrap();

        let store = FileCredentialStore::new(&path);
        store.set("new").unwrap();
        store.clear().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let entries: BTreeMap<String, String> = serde_json::from_str(&content).unwrap();
        assert_eq!(entries.get("theme").map(String::as_str), Some("dark"));
        assert!(!entries.contains_key(CREDENTIAL_KEY));
    }

    #[test]
    fn test_file_store_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileCredentialStore::new(&path);
        assert!(matches!(store.get(), Err(Error::Storage(_))));

        store.clear().unwrap();
        assert!(!path.exists());
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_file_store_set_replaces_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "{\"auth_token\": ").unwrap();

        let store = FileCredentialStore::new(&path);
        store.set("tok-new").unwrap();
        assert_eq!(store.get().unwrap().as_deref(), Some("tok-new"));
    }
}
