//! YouTube Data API types
//!
//! Request and response bodies for `videos.insert`.

use serde::{Deserialize, Serialize};

/// Body of a `videos.insert` request.
///
/// See: https://developers.google.com/youtube/v3/docs/videos/insert
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInsert {
    pub snippet: VideoSnippet,
    pub status: VideoStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_details: Option<RecordingDetails>,
}

impl VideoInsert {
    /// Value of the `part` query parameter matching the populated sections.
    pub fn parts(&self) -> String {
        let mut parts = vec!["snippet", "status"];
        if self.recording_details.is_some() {
            parts.push("recordingDetails");
        }
        parts.join(",")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category_id: String,
    pub default_language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatus {
    pub privacy_status: String,
    /// RFC 3339 UTC instant, e.g. `2024-03-10T22:00:00Z`
    pub publish_at: String,
    pub self_declared_made_for_kids: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingDetails {
    pub recording_date: String,
}

impl RecordingDetails {
    /// Recording date at midnight UTC for a `YYYY-MM-DD` date.
    pub fn on(date: &str) -> Self {
        Self {
            recording_date: format!("{}T00:00:00Z", date),
        }
    }
}

/// Video resource returned once the upload completes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedVideo {
    pub id: String,
    #[serde(default)]
    pub snippet: Option<UploadedSnippet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedSnippet {
    #[serde(default)]
    pub title: String,
}

/// Google API error envelope.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
}
