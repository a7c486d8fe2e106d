//! YouTube resumable upload connector
//!
//! Speaks the resumable upload protocol of the YouTube Data API v3:
//!
//! 1. `POST {base}/videos?uploadType=resumable&part=...` with the video
//!    resource as JSON opens a session; the session URI comes back in the
//!    `Location` header.
//! 2. Each `PUT {session}` carries one chunk and a `Content-Range` header.
//!    `308 Resume Incomplete` acknowledges the bytes received so far through
//!    its `Range` header; `200`/`201` ends the upload with the video resource.
//!
//! The connector performs exactly one round-trip per call. Retrying is the
//! caller's decision.

use bridge_traits::error::BridgeError;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, YouTubeError};
use crate::types::{ApiErrorResponse, UploadedVideo, VideoInsert};

/// YouTube upload API base URL
pub const UPLOAD_API_BASE: &str = "https://www.googleapis.com/upload/youtube/v3";

/// Status the server uses to acknowledge a partial upload
const RESUME_INCOMPLETE: u16 = 308;

/// Longest error body echoed into error messages
const MAX_ERROR_BODY: usize = 512;

/// An open resumable upload session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    /// Session URI from the `Location` header
    pub uri: String,
    /// Size of the whole file in bytes
    pub total_bytes: u64,
}

/// Result of sending one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// The server holds bytes `[0, next_offset)`; continue from `next_offset`
    Incomplete { next_offset: u64 },
    /// The upload finished and the video was created
    Complete(UploadedVideo),
}

/// YouTube upload connector
///
/// # Example
///
/// ```ignore
/// use provider_youtube::YouTubeConnector;
///
/// let connector = YouTubeConnector::new(http_client);
/// let session = connector.start_session(&token, &insert, size, "video/mp4").await?;
/// let outcome = connector.upload_chunk(&token, &session, 0, first_chunk).await?;
/// ```
pub struct YouTubeConnector {
    /// HTTP client for API requests
    http_client: Arc<dyn HttpClient>,

    /// Base URL of the upload API, without trailing slash
    base_url: String,

    /// Per-request timeout
    request_timeout: Option<Duration>,
}

impl YouTubeConnector {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self::with_base_url(http_client, UPLOAD_API_BASE)
    }

    pub fn with_base_url(http_client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout: None,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Open a resumable upload session for `content_length` bytes.
    #[instrument(skip(self, access_token, video), fields(parts = %video.parts()))]
    pub async fn start_session(
        &self,
        access_token: &str,
        video: &VideoInsert,
        content_length: u64,
        content_type: &str,
    ) -> Result<UploadSession> {
        let url = format!(
            "{}/videos?uploadType=resumable&part={}",
            self.base_url,
            video.parts()
        );

        let request = self
            .prepare(HttpRequest::new(HttpMethod::Post, url))
            .bearer_token(access_token)
            .header("X-Upload-Content-Length", content_length.to_string())
            .header("X-Upload-Content-Type", content_type)
            .json(video)?;

        let response = self.send(request).await?;
        if !response.is_success() {
            return Err(api_error(&response));
        }

        let uri = response
            .header("Location")
            .filter(|location| !location.is_empty())
            .ok_or_else(|| {
                YouTubeError::ProtocolError("session response has no Location header".to_string())
            })?
            .to_string();

        info!(bytes = content_length, "Opened resumable upload session");
        Ok(UploadSession {
            uri,
            total_bytes: content_length,
        })
    }

    /// Send `chunk` starting at byte `offset` of the file.
    #[instrument(skip(self, access_token, session, chunk), fields(len = chunk.len()))]
    pub async fn upload_chunk(
        &self,
        access_token: &str,
        session: &UploadSession,
        offset: u64,
        chunk: Bytes,
    ) -> Result<ChunkOutcome> {
        let content_range = content_range(offset, chunk.len() as u64, session.total_bytes);

        let request = self
            .prepare(HttpRequest::new(HttpMethod::Put, session.uri.clone()))
            .bearer_token(access_token)
            .header("Content-Range", content_range)
            .body(chunk);

        let response = self.send(request).await?;

        match response.status {
            RESUME_INCOMPLETE => {
                let next_offset = acknowledged_bytes(response.header("Range"))?;
                debug!(next_offset, total = session.total_bytes, "Chunk acknowledged");
                Ok(ChunkOutcome::Incomplete { next_offset })
            }
            200 | 201 => {
                let video: UploadedVideo = response.json().map_err(|e| {
                    YouTubeError::ParseError(format!("Failed to parse uploaded video: {}", e))
                })?;
                info!(video_id = %video.id, "Upload complete");
                Ok(ChunkOutcome::Complete(video))
            }
            _ => Err(api_error(&response)),
        }
    }

    fn prepare(&self, request: HttpRequest) -> HttpRequest {
        match self.request_timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.http_client.execute(request).await.map_err(|e| match e {
            BridgeError::Network(msg) => YouTubeError::NetworkError(msg),
            BridgeError::Timeout(msg) => YouTubeError::NetworkError(format!("timed out: {}", msg)),
            other => YouTubeError::BridgeError(other),
        })
    }
}

/// `Content-Range` value for `len` bytes at `offset` of a `total`-byte file.
fn content_range(offset: u64, len: u64, total: u64) -> String {
    if len == 0 {
        format!("bytes */{}", total)
    } else {
        format!("bytes {}-{}/{}", offset, offset + len - 1, total)
    }
}

/// Offset to continue from, given the `Range` header of a 308 answer.
///
/// `bytes=0-n` means bytes up to and including `n` were stored. No header
/// means nothing was stored yet.
fn acknowledged_bytes(range: Option<&str>) -> Result<u64> {
    let Some(range) = range else {
        return Ok(0);
    };

    let last = range
        .trim()
        .strip_prefix("bytes=")
        .and_then(|spec| spec.split_once('-'))
        .and_then(|(_, end)| end.trim().parse::<u64>().ok())
        .ok_or_else(|| {
            YouTubeError::ProtocolError(format!("unexpected Range header '{}'", range))
        })?;

    Ok(last + 1)
}

fn api_error(response: &HttpResponse) -> YouTubeError {
    let message = match response.json::<ApiErrorResponse>() {
        Ok(envelope) if !envelope.error.message.is_empty() => {
            let reasons: Vec<&str> = envelope
                .error
                .errors
                .iter()
                .map(|detail| detail.reason.as_str())
                .filter(|reason| !reason.is_empty())
                .collect();
            if reasons.is_empty() {
                envelope.error.message
            } else {
                format!("{} ({})", envelope.error.message, reasons.join(", "))
            }
        }
        _ => {
            let mut text = String::from_utf8_lossy(&response.body).into_owned();
            if text.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !text.is_char_boundary(cut) {
                    cut -= 1;
                }
                text.truncate(cut);
            }
            text
        }
    };

    warn!(status = response.status, error = %message, "YouTube API request failed");
    YouTubeError::ApiError {
        status_code: response.status,
        message,
    }
}
