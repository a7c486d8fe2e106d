//! Completeness check run before any upload.

use std::fmt;
use thiserror::Error;

use crate::models::VideoRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Title,
    Description,
    Tags,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MissingField::Title => "Title",
            MissingField::Description => "Description",
            MissingField::Tags => "Tags",
        };
        f.write_str(name)
    }
}

/// First record whose user-supplied metadata is not filled in.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "Metadata for '{file_name}' (scheduled for {upload_date}) is incomplete at row {row}: missing {}",
    missing_list(.missing)
)]
pub struct IncompleteRecord {
    pub file_name: String,
    pub upload_date: String,
    /// Line in the CSV file, counting the header as line 1
    pub row: usize,
    pub missing: Vec<MissingField>,
}

fn missing_list(missing: &[MissingField]) -> String {
    missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fields of `record` that are empty after trimming.
pub fn missing_fields(record: &VideoRecord) -> Vec<MissingField> {
    let mut missing = Vec::new();
    if record.title.trim().is_empty() {
        missing.push(MissingField::Title);
    }
    if record.description.trim().is_empty() {
        missing.push(MissingField::Description);
    }
    if record.tag_list().is_empty() {
        missing.push(MissingField::Tags);
    }
    missing
}

/// Report the first record, in the given order, with an empty title,
/// description or tag list.
pub fn check_completeness(records: &[VideoRecord]) -> Result<(), IncompleteRecord> {
    for (index, record) in records.iter().enumerate() {
        let missing = missing_fields(record);
        if !missing.is_empty() {
            return Err(IncompleteRecord {
                file_name: record.file_name.clone(),
                upload_date: record.upload_date.clone(),
                row: index + 2,
                missing,
            });
        }
    }
    Ok(())
}
