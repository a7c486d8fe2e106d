//! Google OAuth client secrets file.
//!
//! The file downloaded from the Google Cloud console wraps the client under
//! an `installed` (desktop app) or `web` key:
//!
//! ```text
//! {"installed": {"client_id": "...", "client_secret": "...",
//!                "auth_uri": "...", "token_uri": "...", "redirect_uris": [...]}}
//! ```

use bridge_traits::storage::FileSystemAccess;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use crate::error::{AuthError, Result};
use crate::oauth::OAuthConfig;

pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// OAuth client registration read from a client secrets file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

#[derive(Deserialize)]
struct SecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ClientSecrets {
    /// Parse a client secrets document. `source` names it in errors.
    pub fn from_json(data: &[u8], source: &str) -> Result<Self> {
        let invalid = |reason: String| AuthError::ClientSecrets {
            path: source.to_string(),
            reason,
        };

        let file: SecretsFile =
            serde_json::from_slice(data).map_err(|e| invalid(format!("invalid JSON: {}", e)))?;

        let secrets = file
            .installed
            .or(file.web)
            .ok_or_else(|| invalid("expected an \"installed\" or \"web\" section".to_string()))?;

        if secrets.client_id.trim().is_empty() {
            return Err(invalid("client_id is empty".to_string()));
        }

        Ok(secrets)
    }

    /// Read and parse the client secrets file at `path`.
    pub async fn load(fs: &dyn FileSystemAccess, path: &Path) -> Result<Self> {
        let source = path.display().to_string();

        if !fs.exists(path).await? {
            return Err(AuthError::ClientSecrets {
                path: source,
                reason: "file not found; download it from the Google Cloud console".to_string(),
            });
        }

        let data = fs.read_file(path).await?;
        let secrets = Self::from_json(&data, &source)?;
        debug!(path = %source, "Loaded client secrets");
        Ok(secrets)
    }

    /// OAuth configuration for this client redirecting to `redirect_uri`.
    pub fn oauth_config(&self, redirect_uri: String, scopes: Vec<String>) -> OAuthConfig {
        OAuthConfig {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone().filter(|s| !s.is_empty()),
            redirect_uri,
            scopes,
            auth_url: self.auth_uri.clone(),
            token_url: self.token_uri.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_installed_section() {
        let json = br#"{"installed":{"client_id":"id.apps.googleusercontent.com","project_id":"p",
            "auth_uri":"https://accounts.google.com/o/oauth2/auth",
            "token_uri":"https://oauth2.googleapis.com/token",
            "client_secret":"shh","redirect_uris":["http://localhost"]}}"#;

        let secrets = ClientSecrets::from_json(json, "client_secret.json").unwrap();

        assert_eq!(secrets.client_id, "id.apps.googleusercontent.com");
        assert_eq!(secrets.client_secret.as_deref(), Some("shh"));
        assert_eq!(secrets.token_uri, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn test_parses_web_section_with_defaults() {
        let json = br#"{"web":{"client_id":"web-id"}}"#;
        let secrets = ClientSecrets::from_json(json, "client_secret.json").unwrap();

        assert_eq!(secrets.client_id, "web-id");
        assert_eq!(secrets.auth_uri, DEFAULT_AUTH_URI);
        assert!(secrets.client_secret.is_none());
    }

    #[test]
    fn test_rejects_unknown_layout() {
        let err = ClientSecrets::from_json(br#"{"other":{}}"#, "cs.json").unwrap_err();
        assert!(matches!(err, AuthError::ClientSecrets { path, .. } if path == "cs.json"));

        assert!(ClientSecrets::from_json(b"not json", "cs.json").is_err());
        assert!(ClientSecrets::from_json(br#"{"installed":{"client_id":" "}}"#, "cs.json").is_err());
    }

    #[test]
    fn test_oauth_config_drops_empty_secret() {
        let secrets = ClientSecrets::from_json(
            br#"{"installed":{"client_id":"id","client_secret":""}}"#,
            "cs.json",
        )
        .unwrap();

        let config = secrets.oauth_config("http://127.0.0.1:1/".to_string(), vec!["s".to_string()]);
        assert_eq!(config.client_id, "id");
        assert!(config.client_secret.is_none());
        assert_eq!(config.token_url, DEFAULT_TOKEN_URI);
        assert_eq!(config.redirect_uri, "http://127.0.0.1:1/");
    }
}
