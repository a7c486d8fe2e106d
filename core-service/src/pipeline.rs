//! Upload Pipeline
//!
//! Uploads one record at a time through the resumable protocol. Record-level
//! problems (missing file, bad publish time, API errors) end up as a
//! [`RecordOutcome::Failed`]; only credential errors escape as `Err`, since
//! no later record could succeed without a token either.
//!
//! Transient statuses are retried with exponential backoff. The retry budget
//! is per record and shared by the session start and every chunk.

use bridge_traits::storage::FileSystemAccess;
use bridge_traits::time::Clock;
use core_auth::{AccessTokenProvider, AuthError};
use core_library::dates::format_canonical;
use core_library::VideoRecord;
use core_runtime::UploadSettings;
use provider_youtube::{
    ChunkOutcome, RecordingDetails, UploadSession, VideoInsert, VideoSnippet, VideoStatus,
    YouTubeConnector, YouTubeError,
};
use rand::Rng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::publish_time::resolve_publish_at;

/// Terminal result for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Uploaded { video_id: String },
    Failed { reason: String },
}

impl RecordOutcome {
    fn failed(reason: impl Into<String>) -> Self {
        RecordOutcome::Failed {
            reason: reason.into(),
        }
    }
}

/// Delay before retry number `retry` (1-based): `2^retry` seconds plus `jitter`.
pub fn backoff_delay(retry: u32, jitter: f64) -> Duration {
    Duration::from_secs_f64(2f64.powi(retry as i32) + jitter.clamp(0.0, 1.0))
}

/// MIME type sent as `X-Upload-Content-Type`.
pub fn content_type_for(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        Some("mkv") => "video/x-matroska",
        Some("flv") => "video/x-flv",
        _ => "application/octet-stream",
    }
}

pub struct UploadPipeline {
    fs: Arc<dyn FileSystemAccess>,
    connector: YouTubeConnector,
    tokens: Arc<dyn AccessTokenProvider>,
    settings: UploadSettings,
    video_folder: PathBuf,
    clock: Arc<dyn Clock>,
}

impl UploadPipeline {
    pub fn new(
        fs: Arc<dyn FileSystemAccess>,
        connector: YouTubeConnector,
        tokens: Arc<dyn AccessTokenProvider>,
        settings: UploadSettings,
        video_folder: impl Into<PathBuf>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            fs,
            connector,
            tokens,
            settings,
            video_folder: video_folder.into(),
            clock,
        }
    }

    /// Build the `videos.insert` body for `record`.
    pub fn video_resource(&self, record: &VideoRecord, publish_at: String) -> VideoInsert {
        let recording_details = match record.parsed_date() {
            Some(date) => Some(RecordingDetails::on(&format_canonical(date))),
            None => {
                warn!(
                    file = %record.file_name,
                    date = %record.upload_date,
                    "Upload date is not valid, omitting recording date"
                );
                None
            }
        };

        VideoInsert {
            snippet: VideoSnippet {
                title: record.title.clone(),
                description: record.description.clone(),
                tags: record.tag_list(),
                category_id: self.settings.category_id.clone(),
                default_language: self.settings.default_language.clone(),
            },
            status: VideoStatus {
                privacy_status: self.settings.privacy_status.clone(),
                publish_at,
                self_declared_made_for_kids: self.settings.made_for_kids,
            },
            recording_details,
        }
    }

    /// Upload the file behind `record`.
    ///
    /// # Errors
    ///
    /// Only credential failures are returned as `Err`; they end the run.
    #[instrument(skip(self, record), fields(file = %record.file_name))]
    pub async fn process(&self, record: &VideoRecord) -> Result<RecordOutcome, AuthError> {
        let path = self.video_folder.join(&record.file_name);

        match self.fs.exists(&path).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(path = ?path, "Video file not found, skipping");
                return Ok(RecordOutcome::failed(format!(
                    "file not found: {}",
                    path.display()
                )));
            }
            Err(e) => {
                warn!(path = ?path, error = %e, "Could not check video file, skipping");
                return Ok(RecordOutcome::failed(e.to_string()));
            }
        }

        let publish_at = match resolve_publish_at(
            &record.upload_date,
            &record.upload_time,
            self.clock.local_offset(),
        ) {
            Ok(publish_at) => publish_at,
            Err(e) => {
                warn!(error = %e, "Could not resolve publish time, skipping");
                return Ok(RecordOutcome::failed(e.to_string()));
            }
        };

        let total_bytes = match self.fs.file_size(&path).await {
            Ok(size) => size,
            Err(e) => {
                warn!(error = %e, "Could not read video file size, skipping");
                return Ok(RecordOutcome::failed(e.to_string()));
            }
        };

        let video = self.video_resource(record, publish_at);
        info!(
            title = %record.title,
            publish_at = %video.status.publish_at,
            bytes = total_bytes,
            "Uploading video"
        );

        let mut retries = 0;
        let session = loop {
            let token = self.tokens.access_token().await?;
            match self
                .connector
                .start_session(
                    &token,
                    &video,
                    total_bytes,
                    content_type_for(&record.file_name),
                )
                .await
            {
                Ok(session) => break session,
                Err(e) => {
                    if !self.back_off(&e, &mut retries).await {
                        return Ok(RecordOutcome::failed(e.to_string()));
                    }
                }
            }
        };

        self.transfer(&path, &session, &mut retries).await
    }

    async fn transfer(
        &self,
        path: &Path,
        session: &UploadSession,
        retries: &mut u32,
    ) -> Result<RecordOutcome, AuthError> {
        let total = session.total_bytes;
        let mut offset = 0u64;

        loop {
            let len = self.settings.chunk_size.min(total.saturating_sub(offset));
            let chunk = match self.fs.read_range(path, offset, len).await {
                Ok(chunk) => chunk,
                Err(e) => {
                    error!(offset, error = %e, "Could not read chunk from video file");
                    return Ok(RecordOutcome::failed(e.to_string()));
                }
            };

            let token = self.tokens.access_token().await?;
            match self
                .connector
                .upload_chunk(&token, session, offset, chunk)
                .await
            {
                Ok(ChunkOutcome::Complete(video)) => {
                    if video.id.trim().is_empty() {
                        error!("Upload finished without a video id");
                        return Ok(RecordOutcome::failed("upload response had no video id"));
                    }
                    info!(video_id = %video.id, "Video uploaded");
                    return Ok(RecordOutcome::Uploaded { video_id: video.id });
                }
                Ok(ChunkOutcome::Incomplete { next_offset }) => {
                    if next_offset > total {
                        error!(next_offset, total, "Server acknowledged more bytes than sent");
                        return Ok(RecordOutcome::failed(format!(
                            "server acknowledged {} of {} bytes",
                            next_offset, total
                        )));
                    }
                    if next_offset <= offset {
                        if *retries >= self.settings.max_retries {
                            error!(offset, "Upload made no progress, giving up");
                            return Ok(RecordOutcome::failed(format!(
                                "upload stalled at byte {} of {}",
                                offset, total
                            )));
                        }
                        *retries += 1;
                        self.sleep_before_retry(*retries, "no progress").await;
                    }
                    offset = next_offset;
                    info!(
                        sent = offset,
                        total,
                        percent = percent(offset, total),
                        "Upload progress"
                    );
                }
                Err(e) => {
                    if !self.back_off(&e, retries).await {
                        return Ok(RecordOutcome::failed(e.to_string()));
                    }
                }
            }
        }
    }

    /// Sleep before retrying `error` if it is transient and budget remains.
    ///
    /// Returns `false` when the caller must give up on the record.
    async fn back_off(&self, error: &YouTubeError, retries: &mut u32) -> bool {
        let retriable = error
            .status_code()
            .is_some_and(|status| self.settings.is_retriable(status));
        if !retriable {
            error!(error = %error, "Upload failed");
            return false;
        }
        if *retries >= self.settings.max_retries {
            error!(
                retries = *retries,
                error = %error,
                "No more retries, giving up on this video"
            );
            return false;
        }

        *retries += 1;
        self.sleep_before_retry(*retries, &error.to_string()).await;
        true
    }

    async fn sleep_before_retry(&self, retry: u32, reason: &str) {
        let jitter: f64 = rand::thread_rng().gen();
        let delay = backoff_delay(retry, jitter);
        warn!(
            retry,
            max_retries = self.settings.max_retries,
            delay_secs = delay.as_secs_f64(),
            reason,
            "Retrying upload"
        );
        tokio::time::sleep(delay).await;
    }
}

fn percent(done: u64, total: u64) -> u64 {
    if total == 0 {
        100
    } else {
        done.saturating_mul(100) / total
    }
}
