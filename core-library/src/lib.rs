//! # Video Library Module
//!
//! Owns the video schedule: the persisted per-file records, their
//! reconciliation against the video folder, and the checks run before an
//! upload pass.
//!
//! ## Overview
//!
//! This module manages:
//! - Date normalization for user-edited dates
//! - The CSV metadata store behind the [`MetadataStore`] trait
//! - Reconciliation of new files with automatic publish slots
//! - The completeness check that gates uploads

pub mod completeness;
pub mod dates;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod scan;
pub mod store;

pub use completeness::{check_completeness, IncompleteRecord, MissingField};
pub use dates::{normalize_date, DateParseError};
pub use error::{LibraryError, Result};
pub use models::VideoRecord;
pub use reconcile::{reconcile, RandomTimeSlots, Reconciliation, TimeSlotSource};
pub use scan::{scan_video_folder, FolderScan};
pub use store::{CsvMetadataStore, LoadedStore, MetadataStore};
