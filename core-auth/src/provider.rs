//! Identity provider capability.
//!
//! The credential manager only knows how to obtain a credential from scratch
//! and how to refresh one. [`GoogleIdentityProvider`] does both against
//! Google's OAuth endpoints using the installed-application flow.

use async_trait::async_trait;
use bridge_traits::http::HttpClient;
use bridge_traits::storage::FileSystemAccess;
use bridge_traits::time::{Clock, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, instrument};

use crate::error::{AuthError, Result};
use crate::loopback::LoopbackReceiver;
use crate::oauth::OAuthFlowManager;
use crate::secrets::ClientSecrets;
use crate::types::CredentialSet;

/// How long to wait for the operator to finish the consent screen.
pub const DEFAULT_AUTHORIZATION_TIMEOUT: Duration = Duration::from_secs(300);

/// Source of OAuth credentials.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Run the interactive authorization flow.
    async fn authorize(&self) -> Result<CredentialSet>;

    /// Exchange the refresh token of `credentials` for a new access token.
    async fn refresh(&self, credentials: &CredentialSet) -> Result<CredentialSet>;
}

/// Receives the consent URL the operator has to open.
pub type UrlPresenter = Arc<dyn Fn(&str) + Send + Sync>;

/// Google OAuth through a loopback redirect.
///
/// The client secrets file is read on demand, so a run that never needs to
/// authorize or refresh does not require it.
pub struct GoogleIdentityProvider {
    fs: Arc<dyn FileSystemAccess>,
    http_client: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    secrets_path: PathBuf,
    scopes: Vec<String>,
    presenter: UrlPresenter,
    authorization_timeout: Duration,
}

impl GoogleIdentityProvider {
    pub fn new(
        fs: Arc<dyn FileSystemAccess>,
        http_client: Arc<dyn HttpClient>,
        secrets_path: impl Into<PathBuf>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            fs,
            http_client,
            clock: Arc::new(SystemClock),
            secrets_path: secrets_path.into(),
            scopes,
            presenter: Arc::new(|url: &str| {
                println!("Please visit this URL to authorize this application:\n{}", url);
            }),
            authorization_timeout: DEFAULT_AUTHORIZATION_TIMEOUT,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_presenter(mut self, presenter: UrlPresenter) -> Self {
        self.presenter = presenter;
        self
    }

    pub fn with_authorization_timeout(mut self, duration: Duration) -> Self {
        self.authorization_timeout = duration;
        self
    }

    async fn flow(&self, redirect_uri: String) -> Result<OAuthFlowManager> {
        let secrets = ClientSecrets::load(self.fs.as_ref(), &self.secrets_path).await?;
        let config = secrets.oauth_config(redirect_uri, self.scopes.clone());
        Ok(OAuthFlowManager::new(config, self.http_client.clone()).with_clock(self.clock.clone()))
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    #[instrument(skip(self))]
    async fn authorize(&self) -> Result<CredentialSet> {
        let receiver = LoopbackReceiver::bind().await?;
        let flow = self.flow(receiver.redirect_uri()).await?;

        let (auth_url, verifier) = flow.build_auth_url()?;
        info!("Waiting for the operator to authorize access");
        (self.presenter)(&auth_url);

        let callback = timeout(self.authorization_timeout, receiver.wait_for_callback())
            .await
            .map_err(|_| AuthError::OperationTimeout {
                operation: "interactive authorization".to_string(),
            })??;

        flow.exchange_code(&callback.code, &callback.state, &verifier)
            .await
    }

    #[instrument(skip(self, credentials))]
    async fn refresh(&self, credentials: &CredentialSet) -> Result<CredentialSet> {
        let refresh_token = credentials
            .refresh_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AuthError::TokenRefreshFailed("no refresh token".to_string()))?;

        // The redirect URI is not part of a refresh request
        let flow = self.flow(String::new()).await?;
        flow.refresh_access_token(refresh_token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_desktop::TokioFileSystem;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::{HttpMethod, HttpRequest, HttpResponse};
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    const SECRETS: &str = r#"{"installed":{"client_id":"cid","client_secret":"cs",
        "auth_uri":"https://accounts.example.com/auth","token_uri":"https://oauth.example.com/token"}}"#;

    fn token_response(body: &str) -> BridgeResult<HttpResponse> {
        Ok(HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        })
    }

    #[tokio::test]
    async fn test_refresh_without_secrets_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut http = MockHttpClient::new();
        http.expect_execute().never();

        let provider = GoogleIdentityProvider::new(
            Arc::new(TokioFileSystem::new()),
            Arc::new(http),
            dir.path().join("client_secret.json"),
            vec!["scope".to_string()],
        );

        let credentials = CredentialSet {
            access_token: "a".to_string(),
            refresh_token: Some("r".to_string()),
            expires_at: None,
            scopes: vec![],
        };
        let err = provider.refresh(&credentials).await.unwrap_err();
        assert!(matches!(err, AuthError::ClientSecrets { .. }));
    }

    #[tokio::test]
    async fn test_refresh_uses_token_uri_from_secrets() {
        let dir = tempfile::tempdir().unwrap();
        let secrets_path = dir.path().join("client_secret.json");
        tokio::fs::write(&secrets_path, SECRETS).await.unwrap();

        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .withf(|request| {
                request.method == HttpMethod::Post && request.url == "https://oauth.example.com/token"
            })
            .returning(|_| token_response(r#"{"access_token":"fresh","expires_in":3600}"#));

        let provider = GoogleIdentityProvider::new(
            Arc::new(TokioFileSystem::new()),
            Arc::new(http),
            secrets_path,
            vec!["scope".to_string()],
        );

        let credentials = CredentialSet {
            access_token: "stale".to_string(),
            refresh_token: Some("r".to_string()),
            expires_at: None,
            scopes: vec![],
        };
        let refreshed = provider.refresh(&credentials).await.unwrap();

        assert_eq!(refreshed.access_token, "fresh");
        assert_eq!(refreshed.refresh_token.as_deref(), Some("r"));
    }

    #[tokio::test]
    async fn test_authorize_over_loopback() {
        let dir = tempfile::tempdir().unwrap();
        let secrets_path = dir.path().join("client_secret.json");
        tokio::fs::write(&secrets_path, SECRETS).await.unwrap();

        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .withf(|request| {
                let body = String::from_utf8(request.body.clone().unwrap_or_default().to_vec()).unwrap();
                body.contains("code=granted") && body.contains("redirect_uri=http%3A%2F%2F127.0.0.1")
            })
            .returning(|_| {
                token_response(r#"{"access_token":"new","refresh_token":"r","expires_in":3600}"#)
            });

        let presented = Arc::new(Mutex::new(None::<String>));
        let sink = presented.clone();
        let presenter: UrlPresenter = Arc::new(move |url: &str| {
            let url = url::Url::parse(url).unwrap();
            let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
            *sink.lock().unwrap() = Some(url.to_string());

            let redirect = url::Url::parse(&query["redirect_uri"]).unwrap();
            let port = redirect.port().unwrap();
            let state = query["state"].clone();

            // Play the browser following the redirect
            tokio::spawn(async move {
                let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", port)).await.unwrap();
                let request = format!(
                    "GET /?code=granted&state={} HTTP/1.1\r\nHost: localhost\r\n\r\n",
                    state
                );
                stream.write_all(request.as_bytes()).await.unwrap();
                let mut page = String::new();
                stream.read_to_string(&mut page).await.unwrap();
            });
        });

        let provider = GoogleIdentityProvider::new(
            Arc::new(TokioFileSystem::new()),
            Arc::new(http),
            secrets_path,
            vec!["scope".to_string()],
        )
        .with_presenter(presenter);

        let credentials = provider.authorize().await.unwrap();

        assert_eq!(credentials.access_token, "new");
        let url = presented.lock().unwrap().clone().unwrap();
        assert!(url.starts_with("https://accounts.example.com/auth?"));
        assert!(url.contains("client_id=cid"));
    }

    #[tokio::test]
    async fn test_authorize_gives_up_when_nobody_answers() {
        let dir = tempfile::tempdir().unwrap();
        let secrets_path = dir.path().join("client_secret.json");
        tokio::fs::write(&secrets_path, SECRETS).await.unwrap();

        let mut http = MockHttpClient::new();
        http.expect_execute().never();

        let provider = GoogleIdentityProvider::new(
            Arc::new(TokioFileSystem::new()),
            Arc::new(http),
            secrets_path,
            vec!["scope".to_string()],
        )
        .with_presenter(Arc::new(|_: &str| {}))
        .with_authorization_timeout(Duration::from_millis(50));

        let err = provider.authorize().await.unwrap_err();
        assert!(matches!(err, AuthError::OperationTimeout { .. }));
    }
}
