//! Storage and File System Abstractions
//!
//! Provides host-agnostic traits for file I/O and secure credential storage.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// File metadata information
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub size: u64,
    pub is_directory: bool,
}

/// File system access trait
///
/// Abstracts the file operations the scheduler needs: scanning the video
/// folder, reading and rewriting the metadata store, and reading a video in
/// fixed-size pieces during a chunked upload.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileSystemAccess;
///
/// async fn first_chunk(fs: &dyn FileSystemAccess, path: &Path) -> Result<Bytes> {
///     fs.read_range(path, 0, 8 * 1024 * 1024).await
/// }
/// ```
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Check if a file or directory exists
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Get metadata for a file or directory
    async fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    /// Create a directory and all parent directories if they don't exist
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Read entire file contents into memory
    async fn read_file(&self, path: &Path) -> Result<Bytes>;

    /// Write data to a file, creating it if it doesn't exist and truncating it otherwise
    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()>;

    /// List all entries in a directory (not recursive)
    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Read at most `len` bytes starting at `offset`.
    ///
    /// Returns fewer bytes only when the end of the file is reached.
    async fn read_range(&self, path: &Path, offset: u64, len: u64) -> Result<Bytes>;

    /// Size of a regular file in bytes
    async fn file_size(&self, path: &Path) -> Result<u64> {
        Ok(self.metadata(path).await?.size)
    }
}

/// Secure credential storage trait
///
/// # Security Requirements
///
/// Implementations MUST:
/// - Overwrite the previous value on `set_secret`
/// - Never log or expose stored values
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SecureStore;
///
/// async fn store_token(store: &dyn SecureStore, token: &str) -> Result<()> {
///     store.set_secret("youtube_credentials", token.as_bytes()).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SecureStore: Send + Sync {
    /// Store a secret value, replacing any previous value for `key`
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Retrieve a secret value
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Delete a secret. Deleting a missing key is not an error.
    async fn delete_secret(&self, key: &str) -> Result<()>;

    /// Check if a secret exists without retrieving it
    async fn has_secret(&self, key: &str) -> Result<bool> {
        Ok(self.get_secret(key).await?.is_some())
    }
}
