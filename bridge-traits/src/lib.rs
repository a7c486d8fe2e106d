//! # Host Bridge Traits
//!
//! Host abstraction traits that the scheduler core depends on.
//!
//! ## Overview
//!
//! This crate defines the contract between the core crates and the
//! host-specific implementations. Each trait represents a capability that the
//! core requires but that is implemented by an adapter crate
//! (`bridge-desktop`) or by a fake in tests.
//!
//! ## Traits
//!
//! ### Networking & I/O
//! - [`HttpClient`](http::HttpClient) - Single-attempt async HTTP round-trips
//! - [`FileSystemAccess`](storage::FileSystemAccess) - Directory listing, whole-file and ranged reads
//!
//! ### Security
//! - [`SecureStore`](storage::SecureStore) - Credential persistence
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Current instant, local date and local UTC offset
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Adapters
//! should convert host errors into `BridgeError` and keep the context (file
//! path, URL) in the message.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so they can be shared behind an
//! `Arc` across async tasks.

pub mod error;
pub mod http;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use storage::{FileMetadata, FileSystemAccess, SecureStore};
pub use time::{Clock, FixedClock, LogLevel, SystemClock};
