//! # Scheduler Configuration Module
//!
//! Provides configuration management for the video scheduler.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `SchedulerConfig` value holding every path and upload setting the core
//! needs. Nothing reads global state: the value is built once at startup and
//! passed into each component. `build()` enforces fail-fast validation.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::SchedulerConfig;
//!
//! let config = SchedulerConfig::builder()
//!     .video_folder("/srv/videos")
//!     .metadata_file("/srv/videos/video_metadata.csv")
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! Invalid combinations are rejected with [`Error::Config`] and an actionable
//! message:
//!
//! ```ignore
//! let err = SchedulerConfig::builder()
//!     .chunk_size(1000)
//!     .build()
//!     .unwrap_err();
//! // "Chunk size must be a positive multiple of 262144 bytes"
//! ```

use crate::error::{Error, Result};
use chrono::NaiveTime;
use std::path::PathBuf;
use std::time::Duration;

/// Resumable upload chunks must be a multiple of this many bytes (except the last).
pub const CHUNK_GRANULARITY: u64 = 256 * 1024;

pub const DEFAULT_VIDEO_FOLDER: &str = "videos";
pub const DEFAULT_METADATA_FILE: &str = "video_metadata.csv";
pub const DEFAULT_CLIENT_SECRETS_FILE: &str = "client_secret.json";
pub const DEFAULT_CREDENTIAL_CACHE_FILE: &str = "token.json";
pub const YOUTUBE_UPLOAD_SCOPE: &str = "https://www.googleapis.com/auth/youtube.upload";
pub const DEFAULT_UPLOAD_BASE_URL: &str = "https://www.googleapis.com/upload/youtube/v3";
pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "flv"];

/// Settings for the upload pass and for the remote video resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSettings {
    /// YouTube category id (`22` = People & Blogs)
    pub category_id: String,

    /// `snippet.defaultLanguage`
    pub default_language: String,

    /// `status.privacyStatus`. Scheduled publishing requires `private`.
    pub privacy_status: String,

    /// `status.selfDeclaredMadeForKids`
    pub made_for_kids: bool,

    /// Maximum retries per record, shared across session start and all chunks
    pub max_retries: u32,

    /// HTTP statuses treated as transient
    pub retriable_statuses: Vec<u16>,

    /// Bytes per resumable chunk
    pub chunk_size: u64,

    /// Base URL of the upload endpoint (`.../upload/youtube/v3`)
    pub upload_base_url: String,

    /// Per-request transport timeout
    pub request_timeout: Duration,

    /// TCP/TLS connect timeout
    pub connect_timeout: Duration,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            category_id: "22".to_string(),
            default_language: "en-US".to_string(),
            privacy_status: "private".to_string(),
            made_for_kids: false,
            max_retries: 5,
            retriable_statuses: vec![500, 502, 503, 504],
            chunk_size: 32 * CHUNK_GRANULARITY,
            upload_base_url: DEFAULT_UPLOAD_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(600),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl UploadSettings {
    pub fn is_retriable(&self, status: u16) -> bool {
        self.retriable_statuses.contains(&status)
    }
}

/// Scheduler configuration.
///
/// Use [`SchedulerConfigBuilder`] to construct instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Folder scanned for video files (not recursive)
    pub video_folder: PathBuf,

    /// CSV metadata store
    pub metadata_file: PathBuf,

    /// Google OAuth client secrets (`installed` or `web` JSON)
    pub client_secrets_file: PathBuf,

    /// Credential cache written through the secure store
    pub credential_cache_file: PathBuf,

    /// OAuth scopes requested during interactive authorization
    pub scopes: Vec<String>,

    /// Lower-case extensions (without dot) recognised as videos
    pub video_extensions: Vec<String>,

    /// Earliest auto-assigned upload time (inclusive)
    pub publish_window_start: NaiveTime,

    /// Latest auto-assigned upload time (inclusive)
    pub publish_window_end: NaiveTime,

    pub upload: UploadSettings,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            video_folder: PathBuf::from(DEFAULT_VIDEO_FOLDER),
            metadata_file: PathBuf::from(DEFAULT_METADATA_FILE),
            client_secrets_file: PathBuf::from(DEFAULT_CLIENT_SECRETS_FILE),
            credential_cache_file: PathBuf::from(DEFAULT_CREDENTIAL_CACHE_FILE),
            scopes: vec![YOUTUBE_UPLOAD_SCOPE.to_string()],
            video_extensions: DEFAULT_VIDEO_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            publish_window_start: NaiveTime::from_hms_opt(16, 30, 0).unwrap_or(NaiveTime::MIN),
            publish_window_end: NaiveTime::from_hms_opt(18, 30, 0).unwrap_or(NaiveTime::MIN),
            upload: UploadSettings::default(),
        }
    }
}

impl SchedulerConfig {
    /// Creates a new builder pre-populated with the defaults.
    pub fn builder() -> SchedulerConfigBuilder {
        SchedulerConfigBuilder::default()
    }

    /// Whether `extension` (with or without a leading dot, any case) is a video extension.
    pub fn is_video_extension(&self, extension: &str) -> bool {
        let ext = extension.trim_start_matches('.');
        self.video_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.video_folder.as_os_str().is_empty() {
            return Err(Error::Config("Video folder cannot be empty".to_string()));
        }

        if self.metadata_file.as_os_str().is_empty() {
            return Err(Error::Config("Metadata file cannot be empty".to_string()));
        }

        if self.video_extensions.is_empty() {
            return Err(Error::Config(
                "At least one video extension is required".to_string(),
            ));
        }

        if self.scopes.is_empty() {
            return Err(Error::Config(
                "At least one OAuth scope is required".to_string(),
            ));
        }

        if self.publish_window_start > self.publish_window_end {
            return Err(Error::Config(format!(
                "Publish window start {} is after end {}",
                self.publish_window_start.format("%H:%M"),
                self.publish_window_end.format("%H:%M")
            )));
        }

        let upload = &self.upload;

        if upload.chunk_size == 0 || upload.chunk_size % CHUNK_GRANULARITY != 0 {
            return Err(Error::Config(format!(
                "Chunk size must be a positive multiple of {} bytes, got {}",
                CHUNK_GRANULARITY, upload.chunk_size
            )));
        }

        if upload.retriable_statuses.iter().any(|s| !(100..600).contains(s)) {
            return Err(Error::Config(
                "Retriable statuses must be valid HTTP status codes".to_string(),
            ));
        }

        if upload.max_retries > 16 {
            return Err(Error::Config(
                "Max retries exceeds maximum of 16".to_string(),
            ));
        }

        if !upload.upload_base_url.starts_with("http://")
            && !upload.upload_base_url.starts_with("https://")
        {
            return Err(Error::Config(format!(
                "Upload base URL must be http(s): {}",
                upload.upload_base_url
            )));
        }

        if upload.privacy_status != "private" {
            tracing::warn!(
                privacy_status = %upload.privacy_status,
                "Scheduled publishing only takes effect for private videos"
            );
        }

        Ok(())
    }
}

/// Builder for [`SchedulerConfig`].
#[derive(Debug, Default)]
pub struct SchedulerConfigBuilder {
    config: SchedulerConfig,
}

impl SchedulerConfigBuilder {
    pub fn video_folder(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.video_folder = path.into();
        self
    }

    pub fn metadata_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.metadata_file = path.into();
        self
    }

    pub fn client_secrets_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.client_secrets_file = path.into();
        self
    }

    pub fn credential_cache_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.credential_cache_file = path.into();
        self
    }

    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the recognised extensions. Leading dots are stripped and
    /// values are lower-cased.
    pub fn video_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.video_extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    pub fn publish_window(mut self, start: NaiveTime, end: NaiveTime) -> Self {
        self.config.publish_window_start = start;
        self.config.publish_window_end = end;
        self
    }

    pub fn category_id(mut self, category_id: impl Into<String>) -> Self {
        self.config.upload.category_id = category_id.into();
        self
    }

    pub fn default_language(mut self, language: impl Into<String>) -> Self {
        self.config.upload.default_language = language.into();
        self
    }

    pub fn privacy_status(mut self, status: impl Into<String>) -> Self {
        self.config.upload.privacy_status = status.into();
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.upload.max_retries = retries;
        self
    }

    pub fn retriable_statuses(mut self, statuses: impl Into<Vec<u16>>) -> Self {
        self.config.upload.retriable_statuses = statuses.into();
        self
    }

    pub fn chunk_size(mut self, bytes: u64) -> Self {
        self.config.upload.chunk_size = bytes;
        self
    }

    pub fn upload_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.upload.upload_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.upload.request_timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.upload.connect_timeout = timeout;
        self
    }

    /// Builds and validates the final `SchedulerConfig`.
    pub fn build(self) -> Result<SchedulerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
