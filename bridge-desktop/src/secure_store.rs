//! Credential Storage backed by a local JSON file
//!
//! The file holds one JSON object mapping each key to its base64-encoded
//! value. It is rewritten wholesale on every change and, on Unix, restricted
//! to the owner (`0600`).

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bridge_traits::{
    error::{BridgeError, Result},
    storage::SecureStore,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error};

/// File-backed secure storage implementation
pub struct FileSecureStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSecureStore {
    /// Create a store persisting to `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<BTreeMap<String, String>> {
        match fs::read(&self.path).await {
            Ok(data) if data.is_empty() => Ok(BTreeMap::new()),
            Ok(data) => serde_json::from_slice(&data).map_err(|e| {
                error!(path = ?self.path, error = %e, "Credential file is not valid JSON");
                BridgeError::OperationFailed(format!(
                    "Failed to parse {}: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(BridgeError::Io(e)),
        }
    }

    async fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let data = serde_json::to_vec_pretty(entries).map_err(|e| {
            BridgeError::OperationFailed(format!("Failed to serialize secrets: {}", e))
        })?;
        fs::write(&self.path, data).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600)).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl SecureStore for FileSecureStore {
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await.unwrap_or_default();
        entries.insert(key.to_string(), STANDARD.encode(value));
        self.save(&entries).await?;

        debug!(key = key, "Stored secret in credential file");
        Ok(())
    }

    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let _guard = self.lock.lock().await;
        let entries = self.load().await?;

        match entries.get(key) {
            Some(encoded) => {
                let decoded = STANDARD.decode(encoded).map_err(|e| {
                    error!(key = key, error = %e, "Failed to decode secret");
                    BridgeError::OperationFailed(format!("Failed to decode secret: {}", e))
                })?;
                debug!(key = key, "Retrieved secret from credential file");
                Ok(Some(decoded))
            }
            None => Ok(None),
        }
    }

    async fn delete_secret(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await.unwrap_or_default();
        if entries.remove(key).is_some() {
            self.save(&entries).await?;
            debug!(key = key, "Deleted secret from credential file");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_set_get_delete() {
        let dir = tempdir().unwrap();
        let store = FileSecureStore::new(dir.path().join("token.json"));

        assert_eq!(store.get_secret("creds").await.unwrap(), None);

        store.set_secret("creds", b"{\"a\":1}").await.unwrap();
        assert_eq!(
            store.get_secret("creds").await.unwrap(),
            Some(b"{\"a\":1}".to_vec())
        );
        assert!(store.has_secret("creds").await.unwrap());

        store.set_secret("creds", b"second").await.unwrap();
        assert_eq!(
            store.get_secret("creds").await.unwrap(),
            Some(b"second".to_vec())
        );

        store.delete_secret("creds").await.unwrap();
        assert!(!store.has_secret("creds").await.unwrap());
        store.delete_secret("creds").await.unwrap();
    }

    #[tokio::test]
    async fn test_keys_share_one_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token.json");
        let store = FileSecureStore::new(&path);

        store.set_secret("b", b"2").await.unwrap();
        store.set_secret("a", b"1").await.unwrap();
        store.delete_secret("b").await.unwrap();

        let reopened = FileSecureStore::new(&path);
        assert_eq!(reopened.get_secret("a").await.unwrap(), Some(b"1".to_vec()));
        assert_eq!(reopened.get_secret("b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported_and_overwritable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, b"not json").unwrap();
        let store = FileSecureStore::new(&path);

        assert!(store.get_secret("creds").await.is_err());

        store.set_secret("creds", b"fresh").await.unwrap();
        assert_eq!(
            store.get_secret("creds").await.unwrap(),
            Some(b"fresh".to_vec())
        );
    }
}
