use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Seconds before expiry at which a credential is already treated as expired.
pub const EXPIRY_BUFFER_SECS: i64 = 60;

/// OAuth 2.0 credential for the upload API.
///
/// # Security
///
/// Tokens should be stored securely and never logged. The `Debug`
/// implementation redacts them.
///
/// # Examples
///
/// ```
/// use core_auth::CredentialSet;
/// use chrono::{Duration, Utc};
///
/// let now = Utc::now();
/// let credentials = CredentialSet::issued(
///     "ya29.a0...".to_string(),
///     Some("1//0g...".to_string()),
///     Some(3600),
///     vec![],
///     now,
/// );
///
/// assert!(!credentials.is_expired_at(now, Duration::seconds(60)));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSet {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// When the access token expires; `None` means the server gave no expiry
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl CredentialSet {
    /// Build a credential from a token endpoint answer received at `issued_at`.
    pub fn issued(
        access_token: String,
        refresh_token: Option<String>,
        expires_in: Option<i64>,
        scopes: Vec<String>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: expires_in.map(|secs| issued_at + Duration::seconds(secs)),
            scopes,
        }
    }

    /// Whether the access token is expired at `now`, counting `buffer` early.
    ///
    /// A credential without expiry information never expires.
    pub fn is_expired_at(&self, now: DateTime<Utc>, buffer: Duration) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at - buffer,
            None => false,
        }
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|token| !token.is_empty())
    }
}

// Custom Debug implementation to avoid logging tokens
impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Lifecycle state of the cached credential.
///
/// # State Transitions
///
/// ```text
/// Absent  -> Valid                 (interactive authorization)
/// Valid   -> Expired               (time passes)
/// Expired -> Valid | Invalid       (refresh succeeds | fails)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialState {
    /// Nothing usable is cached
    #[default]
    Absent,
    /// Usable as-is
    Valid,
    /// Past expiry, refresh token available
    Expired,
    /// Refresh failed; no further attempts this run
    Invalid,
}

impl CredentialState {
    /// Classify a cached credential at `now`.
    ///
    /// An expired credential that cannot be refreshed is `Absent`: the only
    /// way forward is a fresh authorization.
    pub fn of(credentials: Option<&CredentialSet>, now: DateTime<Utc>, buffer: Duration) -> Self {
        match credentials {
            None => CredentialState::Absent,
            Some(c) if !c.is_expired_at(now, buffer) => CredentialState::Valid,
            Some(c) if c.can_refresh() => CredentialState::Expired,
            Some(_) => CredentialState::Absent,
        }
    }
}

impl fmt::Display for CredentialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialState::Absent => write!(f, "absent"),
            CredentialState::Valid => write!(f, "valid"),
            CredentialState::Expired => write!(f, "expired"),
            CredentialState::Invalid => write!(f, "invalid"),
        }
    }
}
