//! Error types for the YouTube provider

use thiserror::Error;

/// YouTube upload errors
#[derive(Error, Debug)]
pub enum YouTubeError {
    /// The API answered with a non-success status
    #[error("YouTube API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// The server broke the resumable upload protocol
    #[error("Resumable upload protocol error: {0}")]
    ProtocolError(String),

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Transport failure before any response was received
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] bridge_traits::error::BridgeError),
}

impl YouTubeError {
    /// HTTP status of an API error, if the server answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            YouTubeError::ApiError { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

/// Result type for YouTube operations
pub type Result<T> = std::result::Result<T, YouTubeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = YouTubeError::ApiError {
            status_code: 503,
            message: "Backend Error".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "YouTube API error (status 503): Backend Error"
        );
        assert_eq!(error.status_code(), Some(503));
    }

    #[test]
    fn test_network_error_has_no_status() {
        let error = YouTubeError::NetworkError("connection reset".to_string());
        assert_eq!(error.status_code(), None);
    }
}
