//! # YouTube Provider
//!
//! Uploads videos through the YouTube Data API v3.
//!
//! ## Overview
//!
//! This module provides:
//! - The `videos.insert` request body and its `part` list
//! - A resumable upload connector that sends one chunk per call
//! - Error types that keep the HTTP status so callers can decide on retries

pub mod connector;
pub mod error;
pub mod types;

pub use connector::{ChunkOutcome, UploadSession, YouTubeConnector, UPLOAD_API_BASE};
pub use error::{Result, YouTubeError};
pub use types::{RecordingDetails, UploadedVideo, VideoInsert, VideoSnippet, VideoStatus};
