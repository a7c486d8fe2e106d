//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the scheduler core:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that other modules depend on.
//! It establishes the logging conventions and the `SchedulerConfig` value that
//! is built once at startup and passed into every component.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{SchedulerConfig, SchedulerConfigBuilder, UploadSettings};
pub use error::{Error, Result};
