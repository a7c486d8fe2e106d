//! Credential Manager
//!
//! Drives the credential lifecycle for a run:
//!
//! ```text
//! Absent  --authorize ok--> Valid (persisted)
//! Absent  --authorize err-> Absent, error returned
//! Valid   --time passes---> Expired
//! Expired --refresh ok----> Valid (persisted)
//! Expired --refresh err---> Invalid, error returned on every later call
//! ```
//!
//! The cache is consulted once, on the first call. Afterwards the manager
//! works from memory and only writes.

use async_trait::async_trait;
use bridge_traits::time::Clock;
use chrono::Duration;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{AuthError, Result};
use crate::provider::IdentityProvider;
use crate::token_store::CredentialCache;
use crate::types::{CredentialSet, CredentialState, EXPIRY_BUFFER_SECS};

/// Anything that can hand out a currently valid access token.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

#[derive(Default)]
struct Inner {
    loaded: bool,
    current: Option<CredentialSet>,
    invalid_reason: Option<String>,
}

/// Hands out a usable access token, authorizing or refreshing as needed.
pub struct CredentialManager {
    provider: Arc<dyn IdentityProvider>,
    cache: CredentialCache,
    clock: Arc<dyn Clock>,
    expiry_buffer: Duration,
    inner: Mutex<Inner>,
}

impl CredentialManager {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        cache: CredentialCache,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            cache,
            clock,
            expiry_buffer: Duration::seconds(EXPIRY_BUFFER_SECS),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Current lifecycle state. Loads the cache if it was not read yet.
    pub async fn state(&self) -> CredentialState {
        let mut inner = self.inner.lock().await;
        self.load_once(&mut inner).await;
        self.classify(&inner)
    }

    /// Return an access token that is valid now.
    ///
    /// # Errors
    ///
    /// Any error is fatal for the run: authorization failed, the refresh
    /// was rejected (the credential is then `Invalid`), or the credential
    /// could not be persisted.
    #[instrument(skip(self))]
    pub async fn access_token(&self) -> Result<String> {
        let mut inner = self.inner.lock().await;
        self.load_once(&mut inner).await;

        match self.classify(&inner) {
            CredentialState::Valid => {
                debug!("Cached credential is valid");
                inner
                    .current
                    .as_ref()
                    .map(|c| c.access_token.clone())
                    .ok_or_else(|| AuthError::Other("credential vanished".to_string()))
            }
            CredentialState::Invalid => Err(self.invalid_error(&inner)),
            CredentialState::Expired => {
                info!("Access token expired, refreshing");
                let Some(stale) = inner.current.clone() else {
                    return Err(AuthError::Other("credential vanished".to_string()));
                };

                match self.provider.refresh(&stale).await {
                    Ok(fresh) => self.become_valid(&mut inner, fresh).await,
                    Err(e) => {
                        error!(error = %e, "Token refresh failed, credential is now invalid");
                        inner.invalid_reason = Some(e.to_string());
                        Err(self.invalid_error(&inner))
                    }
                }
            }
            CredentialState::Absent => {
                info!("No usable credential cached, starting interactive authorization");
                let fresh = self.provider.authorize().await.map_err(|e| {
                    error!(error = %e, "Interactive authorization failed");
                    e
                })?;
                self.become_valid(&mut inner, fresh).await
            }
        }
    }

    async fn load_once(&self, inner: &mut Inner) {
        if inner.loaded {
            return;
        }
        inner.loaded = true;
        inner.current = match self.cache.load().await {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!(
                    location = %self.cache.location(),
                    error = %e,
                    "Could not read credential cache, treating it as empty"
                );
                None
            }
        };
    }

    fn classify(&self, inner: &Inner) -> CredentialState {
        if inner.invalid_reason.is_some() {
            return CredentialState::Invalid;
        }
        CredentialState::of(inner.current.as_ref(), self.clock.now(), self.expiry_buffer)
    }

    async fn become_valid(&self, inner: &mut Inner, credentials: CredentialSet) -> Result<String> {
        self.cache.store(&credentials).await?;
        let token = credentials.access_token.clone();
        inner.current = Some(credentials);
        info!("Credential is valid");
        Ok(token)
    }

    fn invalid_error(&self, inner: &Inner) -> AuthError {
        AuthError::Invalid {
            cache_location: self.cache.location().to_string(),
            reason: inner
                .invalid_reason
                .clone()
                .unwrap_or_else(|| "refresh failed".to_string()),
        }
    }
}

#[async_trait]
impl AccessTokenProvider for CredentialManager {
    async fn access_token(&self) -> Result<String> {
        CredentialManager::access_token(self).await
    }
}
