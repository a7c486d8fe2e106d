//! # Authentication Module
//!
//! OAuth 2.0 credentials for the upload API.
//!
//! ## Overview
//!
//! This module handles the installed-application flow against Google: the
//! interactive loopback authorization, token refresh, and the credential
//! cache that carries tokens from one run to the next.
//!
//! ## Features
//!
//! - OAuth 2.0 authorization code flow with PKCE
//! - Refresh before expiry with a small skew buffer
//! - Credential persistence via the `SecureStore` bridge
//! - A credential state machine that stops retrying once a refresh is rejected

pub mod error;
pub mod loopback;
pub mod manager;
pub mod oauth;
pub mod provider;
pub mod secrets;
pub mod token_store;
pub mod types;

pub use error::{AuthError, Result};
pub use loopback::{AuthCallback, LoopbackReceiver};
pub use manager::{AccessTokenProvider, CredentialManager};
pub use oauth::{OAuthConfig, OAuthFlowManager, PkceVerifier};
pub use provider::{GoogleIdentityProvider, IdentityProvider, UrlPresenter};
pub use secrets::ClientSecrets;
pub use token_store::CredentialCache;
pub use types::{CredentialSet, CredentialState, EXPIRY_BUFFER_SECS};
