//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest` (single attempt, redirects disabled)
//! - `FileSystemAccess` using `tokio::fs`
//! - `SecureStore` backed by one JSON file on disk
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{FileSecureStore, ReqwestHttpClient, TokioFileSystem};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let fs = TokioFileSystem::new();
//!     let store = FileSecureStore::new("token.json");
//!     Ok(())
//! }
//! ```

mod filesystem;
mod http;
mod secure_store;

pub use filesystem::TokioFileSystem;
pub use http::ReqwestHttpClient;
pub use secure_store::FileSecureStore;
