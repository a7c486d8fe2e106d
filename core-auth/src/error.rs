use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("OAuth state mismatch (expected {expected}, got {actual})")]
    StateMismatch { expected: String, actual: String },

    #[error("Invalid authorization code: {0}")]
    InvalidAuthCode(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Client secrets file {path} is unusable: {reason}")]
    ClientSecrets { path: String, reason: String },

    /// Refresh failed; the cached credential cannot be used again.
    #[error(
        "Stored credentials could not be refreshed ({reason}). \
         Delete {cache_location} and run again to re-authorize."
    )]
    Invalid {
        cache_location: String,
        reason: String,
    },

    #[error("Operation timed out: {operation}")]
    OperationTimeout { operation: String },

    #[error("Credential storage error: {0}")]
    Storage(#[from] BridgeError),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_tells_operator_what_to_delete() {
        let error = AuthError::Invalid {
            cache_location: "token.json".to_string(),
            reason: "invalid_grant".to_string(),
        };

        let message = error.to_string();
        assert!(message.contains("Delete token.json"));
        assert!(message.contains("invalid_grant"));
    }
}
