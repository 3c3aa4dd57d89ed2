//! Credential storage
//!
//! The credential store keeps the session token on the device. It is a
//! plain name → value contract so the request link and the session layer
//! can share one store without knowing its backend.
//!
//! # Example
//!
//! ```rust
//! use storage::{CredentialStore, MemoryCredentialStore, ACCESS_TOKEN_KEY};
//!
//! # async fn example() -> Result<(), storage::CredentialError> {
//! let store = MemoryCredentialStore::new();
//! store.store(ACCESS_TOKEN_KEY, "token").await?;
//! assert_eq!(store.read(ACCESS_TOKEN_KEY).await?.as_deref(), Some("token"));
//! store.delete(ACCESS_TOKEN_KEY).await?;
//! assert!(store.read(ACCESS_TOKEN_KEY).await?.is_none());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::kv::{KvError, KvStore};

/// Name under which the session token is stored
pub const ACCESS_TOKEN_KEY: &str = "access_token";

const CREDENTIAL_SCOPE: &str = "credential";

/// Credential store error types
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Backing key-value store failed
    #[error("Credential storage error: {0}")]
    Storage(#[from] KvError),

    /// Credential name was empty
    #[error("Invalid credential name: {0}")]
    InvalidName(String),
}

/// Result type for credential operations
pub type Result<T> = std::result::Result<T, CredentialError>;

/// Storage backend for named credentials
///
/// Reading a name that was never stored (or was deleted) yields `Ok(None)`.
/// Deleting a missing name is not an error.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Store a credential, replacing any previous value
    async fn store(&self, name: &str, value: &str) -> Result<()>;

    /// Read a credential
    async fn read(&self, name: &str) -> Result<Option<String>>;

    /// Delete a credential
    async fn delete(&self, name: &str) -> Result<()>;

    /// Name of the backend (for logging)
    fn backend_name(&self) -> &'static str;
}

fn check_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(CredentialError::InvalidName("name cannot be empty".to_string()));
    }
    Ok(())
}

/// Durable credential store on top of the sled key-value store
///
/// Every write is flushed before returning so a token written at login
/// survives an immediate process exit.
#[derive(Clone)]
pub struct KvCredentialStore {
    kv: KvStore,
}

impl KvCredentialStore {
    /// Create a credential store backed by `kv`
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    fn scoped(name: &str) -> String {
        format!("{}:{}", CREDENTIAL_SCOPE, name)
    }
}

#[async_trait]
impl CredentialStore for KvCredentialStore {
    async fn store(&self, name: &str, value: &str) -> Result<()> {
        check_name(name)?;
        self.kv.set(&Self::scoped(name), &value)?;
        self.kv.flush_async().await?;
        tracing::debug!(name, "credential stored");
        Ok(())
    }

    async fn read(&self, name: &str) -> Result<Option<String>> {
        check_name(name)?;
        Ok(self.kv.get(&Self::scoped(name))?)
    }

    async fn delete(&self, name: &str) -> Result<()> {
        check_name(name)?;
        if self.kv.remove(&Self::scoped(name))? {
            self.kv.flush_async().await?;
            tracing::debug!(name, "credential deleted");
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sled"
    }
}

/// Process-local credential store, used by tests and previews
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `value` under `name`
    pub fn with_credential(name: &str, value: &str) -> Self {
        let mut values = HashMap::new();
        values.insert(name.to_string(), value.to_string());
        Self { values: RwLock::new(values) }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn store(&self, name: &str, value: &str) -> Result<()> {
        check_name(name)?;
        self.values
            .write()
            .await
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn read(&self, name: &str) -> Result<Option<String>> {
        check_name(name)?;
        Ok(self.values.read().await.get(name).cloned())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        check_name(name)?;
        self.values.write().await.remove(name);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::KvConfig;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryCredentialStore::new();
        assert!(store.read(ACCESS_TOKEN_KEY).await.unwrap().is_none());

        store.store(ACCESS_TOKEN_KEY, "abc").await.unwrap();
        assert_eq!(store.read(ACCESS_TOKEN_KEY).await.unwrap().as_deref(), Some("abc"));

        store.store(ACCESS_TOKEN_KEY, "def").await.unwrap();
        assert_eq!(store.read(ACCESS_TOKEN_KEY).await.unwrap().as_deref(), Some("def"));

        store.delete(ACCESS_TOKEN_KEY).await.unwrap();
        assert!(store.read(ACCESS_TOKEN_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let store = KvCredentialStore::new(KvStore::in_memory().unwrap());
        store.delete(ACCESS_TOKEN_KEY).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let store = MemoryCredentialStore::new();
        assert!(matches!(
            store.store("", "value").await,
            Err(CredentialError::InvalidName(_))
        ));
    }

    #[tokio::test]
    async fn test_kv_store_is_scoped() {
        let kv = KvStore::in_memory().unwrap();
        let store = KvCredentialStore::new(kv.clone());

        store.store(ACCESS_TOKEN_KEY, "secret").await.unwrap();

        let raw: Option<String> = kv.get(ACCESS_TOKEN_KEY).unwrap();
        assert!(raw.is_none());
        let scoped: Option<String> = kv.get("credential:access_token").unwrap();
        assert_eq!(scoped.as_deref(), Some("secret"));
    }

    #[tokio::test]
    async fn test_token_survives_restart() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("credentials.db").to_string_lossy().to_string();

        {
            let store = KvCredentialStore::new(KvStore::new(KvConfig::new(&path).flush_every_ms(None)).unwrap());
            store.store(ACCESS_TOKEN_KEY, "persisted").await.unwrap();
        }

        let store = KvCredentialStore::new(KvStore::new(KvConfig::new(&path).flush_every_ms(None)).unwrap());
        assert_eq!(
            store.read(ACCESS_TOKEN_KEY).await.unwrap().as_deref(),
            Some("persisted")
        );
        assert_eq!(store.backend_name(), "sled");
    }
}
