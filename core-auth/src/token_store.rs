//! Credential cache
//!
//! Persists the OAuth credential between runs through the [`SecureStore`]
//! bridge. The credential is serialized to JSON under a single key; on
//! desktop the store is one file (`token.json` by default).
//!
//! ## Security Features
//!
//! - Tokens are never logged or exposed in error messages
//! - Corrupted entries are erased and reported as absent

use crate::error::{AuthError, Result};
use crate::types::CredentialSet;
use bridge_traits::storage::SecureStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Key the credential is stored under.
pub const CREDENTIAL_KEY: &str = "youtube_upload";

/// Serializable form of a [`CredentialSet`].
#[derive(Debug, Serialize, Deserialize)]
struct StoredCredentials {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    /// Unix seconds
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    scopes: Vec<String>,
}

impl From<&CredentialSet> for StoredCredentials {
    fn from(credentials: &CredentialSet) -> Self {
        Self {
            access_token: credentials.access_token.clone(),
            refresh_token: credentials.refresh_token.clone(),
            expires_at: credentials.expires_at.map(|at| at.timestamp()),
            scopes: credentials.scopes.clone(),
        }
    }
}

impl StoredCredentials {
    fn into_credentials(self) -> Option<CredentialSet> {
        let expires_at = match self.expires_at {
            Some(secs) => Some(DateTime::<Utc>::from_timestamp(secs, 0)?),
            None => None,
        };
        Some(CredentialSet {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            scopes: self.scopes,
        })
    }
}

/// Persistent store for the upload credential.
#[derive(Clone)]
pub struct CredentialCache {
    secure_store: Arc<dyn SecureStore>,
    key: String,
    location: String,
}

impl CredentialCache {
    /// `location` is shown to the operator when the cache must be deleted.
    pub fn new(secure_store: Arc<dyn SecureStore>, location: impl Into<String>) -> Self {
        debug!("Initializing CredentialCache");
        Self {
            secure_store,
            key: CREDENTIAL_KEY.to_string(),
            location: location.into(),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Store the credential, overwriting any previous one.
    pub async fn store(&self, credentials: &CredentialSet) -> Result<()> {
        let stored = StoredCredentials::from(credentials);
        let json = serde_json::to_vec(&stored).map_err(|e| {
            AuthError::Other(format!("Failed to serialize credentials: {}", e))
        })?;

        self.secure_store.set_secret(&self.key, &json).await.map_err(|e| {
            warn!(location = %self.location, error = %e, "Failed to write credential cache");
            e
        })?;

        info!(
            location = %self.location,
            has_refresh_token = stored.refresh_token.is_some(),
            "Credentials stored"
        );
        Ok(())
    }

    /// Load the cached credential.
    ///
    /// Returns:
    /// - `Ok(Some(credentials))` if a readable credential exists
    /// - `Ok(None)` if nothing is cached or the entry was corrupted (it is erased)
    /// - `Err` if the secure store itself failed
    pub async fn load(&self) -> Result<Option<CredentialSet>> {
        let Some(data) = self.secure_store.get_secret(&self.key).await? else {
            debug!(location = %self.location, "No cached credentials");
            return Ok(None);
        };

        let decoded = serde_json::from_slice::<StoredCredentials>(&data)
            .ok()
            .and_then(StoredCredentials::into_credentials);

        match decoded {
            Some(credentials) => {
                debug!(
                    location = %self.location,
                    has_refresh_token = credentials.refresh_token.is_some(),
                    "Loaded cached credentials"
                );
                Ok(Some(credentials))
            }
            None => {
                warn!(
                    location = %self.location,
                    "Cached credentials are corrupted, discarding them"
                );
                if let Err(e) = self.secure_store.delete_secret(&self.key).await {
                    warn!(error = %e, "Failed to delete corrupted credentials");
                }
                Ok(None)
            }
        }
    }

    /// Erase the cached credential. Succeeds when nothing is cached.
    pub async fn clear(&self) -> Result<()> {
        self.secure_store.delete_secret(&self.key).await?;
        info!(location = %self.location, "Credentials deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        storage: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait::async_trait]
    impl SecureStore for MemoryStore {
        async fn set_secret(&self, key: &str, value: &[u8]) -> BridgeResult<()> {
            self.storage.lock().await.insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn get_secret(&self, key: &str) -> BridgeResult<Option<Vec<u8>>> {
            Ok(self.storage.lock().await.get(key).cloned())
        }

        async fn delete_secret(&self, key: &str) -> BridgeResult<()> {
            self.storage.lock().await.remove(key);
            Ok(())
        }
    }

    fn credentials() -> CredentialSet {
        CredentialSet {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: Some(Utc.with_ymd_and_hms(2024, 3, 10, 13, 0, 0).unwrap()),
            scopes: vec!["scope".to_string()],
        }
    }

    #[tokio::test]
    async fn test_store_and_load() {
        let cache = CredentialCache::new(Arc::new(MemoryStore::default()), "token.json");

        assert!(cache.load().await.unwrap().is_none());
        cache.store(&credentials()).await.unwrap();
        assert_eq!(cache.load().await.unwrap(), Some(credentials()));

        cache.clear().await.unwrap();
        assert!(cache.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupted_entry_is_discarded() {
        let store = Arc::new(MemoryStore::default());
        store.set_secret(CREDENTIAL_KEY, b"{not json").await.unwrap();

        let cache = CredentialCache::new(store.clone(), "token.json");

        assert!(cache.load().await.unwrap().is_none());
        assert!(store.get_secret(CREDENTIAL_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_overwrites() {
        let cache = CredentialCache::new(Arc::new(MemoryStore::default()), "token.json");
        cache.store(&credentials()).await.unwrap();

        let mut newer = credentials();
        newer.access_token = "newer".to_string();
        newer.expires_at = None;
        cache.store(&newer).await.unwrap();

        assert_eq!(cache.load().await.unwrap(), Some(newer));
    }
}
