//! CSV-backed metadata store
//!
//! The store file is a plain CSV the user edits between runs:
//!
//! ```text
//! FileName,UploadDate,UploadTime,Title,Description,Tags,Uploaded
//! clip.mp4,2024-03-10,17:04,clip,Morning run,"running,vlog",No
//! ```
//!
//! Columns are matched by header name. Missing columns and short rows read as
//! empty strings.

use async_trait::async_trait;
use bridge_traits::storage::FileSystemAccess;
use bytes::Bytes;
use csv::StringRecord;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{LibraryError, Result};
use crate::models::{sort_records, VideoRecord};

pub const CSV_HEADERS: [&str; 7] = [
    "FileName",
    "UploadDate",
    "UploadTime",
    "Title",
    "Description",
    "Tags",
    "Uploaded",
];

/// Records read from the store plus whether the backing file existed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedStore {
    pub records: Vec<VideoRecord>,
    pub existed: bool,
    /// Rows skipped while loading (blank or repeated file names)
    pub dropped_rows: usize,
}

impl LoadedStore {
    /// Whether the file on disk no longer matches what was loaded.
    pub fn needs_rewrite(&self) -> bool {
        !self.existed || self.dropped_rows > 0
    }
}

/// Metadata store interface
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Load all records in file order.
    ///
    /// Duplicate file names keep the first row and count as dropped rows. A
    /// missing store yields an empty set with `existed = false`.
    async fn load(&self) -> Result<LoadedStore>;

    /// Rewrite the whole store in store order.
    async fn persist(&self, records: &[VideoRecord]) -> Result<()>;

    /// Location of the store, for diagnostics.
    fn location(&self) -> String;
}

#[derive(Debug, Serialize)]
struct CsvRow {
    #[serde(rename = "FileName")]
    file_name: String,
    #[serde(rename = "UploadDate")]
    upload_date: String,
    #[serde(rename = "UploadTime")]
    upload_time: String,
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "Tags")]
    tags: String,
    #[serde(rename = "Uploaded")]
    uploaded: String,
}

/// Positions of the known columns in the header row.
struct Columns {
    file_name: usize,
    upload_date: Option<usize>,
    upload_time: Option<usize>,
    title: Option<usize>,
    description: Option<usize>,
    tags: Option<usize>,
    uploaded: Option<usize>,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Option<Self> {
        let position = |name: &str| headers.iter().position(|h| h == name);
        Some(Self {
            file_name: position(CSV_HEADERS[0])?,
            upload_date: position(CSV_HEADERS[1]),
            upload_time: position(CSV_HEADERS[2]),
            title: position(CSV_HEADERS[3]),
            description: position(CSV_HEADERS[4]),
            tags: position(CSV_HEADERS[5]),
            uploaded: position(CSV_HEADERS[6]),
        })
    }

    fn record(&self, row: &StringRecord) -> VideoRecord {
        let field = |index: Option<usize>| {
            index
                .and_then(|i| row.get(i))
                .unwrap_or_default()
                .to_string()
        };

        VideoRecord {
            file_name: field(Some(self.file_name)),
            upload_date: field(self.upload_date),
            upload_time: field(self.upload_time),
            title: field(self.title),
            description: field(self.description),
            tags: field(self.tags),
            uploaded: field(self.uploaded).trim().eq_ignore_ascii_case("yes"),
        }
    }
}

impl From<&VideoRecord> for CsvRow {
    fn from(record: &VideoRecord) -> Self {
        Self {
            file_name: record.file_name.clone(),
            upload_date: record.upload_date.clone(),
            upload_time: record.upload_time.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            tags: record.tags.clone(),
            uploaded: if record.uploaded { "Yes" } else { "No" }.to_string(),
        }
    }
}

/// Parse store contents. `source` names the file in error messages.
pub fn parse_records(data: &[u8], source: &str) -> Result<Vec<VideoRecord>> {
    parse_store(data, source).map(|loaded| loaded.records)
}

fn parse_store(data: &[u8], source: &str) -> Result<LoadedStore> {
    let csv_error = |e: csv::Error| LibraryError::Csv {
        path: source.to_string(),
        source: e,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(data);

    let mut loaded = LoadedStore {
        existed: true,
        ..LoadedStore::default()
    };

    let headers = reader.headers().map_err(csv_error)?.clone();
    if headers.is_empty() || (headers.len() == 1 && headers.get(0) == Some("")) {
        return Ok(loaded);
    }
    let columns = Columns::locate(&headers).ok_or_else(|| LibraryError::MissingColumn {
        path: source.to_string(),
        column: CSV_HEADERS[0].to_string(),
    })?;

    let mut seen = HashSet::new();

    for row in reader.records() {
        let record = columns.record(&row.map_err(csv_error)?);

        if record.file_name.trim().is_empty() {
            warn!(source = %source, "Skipping row without a file name");
            loaded.dropped_rows += 1;
            continue;
        }

        if !seen.insert(record.file_name.clone()) {
            warn!(
                source = %source,
                file = %record.file_name,
                "Duplicate file name in metadata store, keeping the first row"
            );
            loaded.dropped_rows += 1;
            continue;
        }

        loaded.records.push(record);
    }

    Ok(loaded)
}

/// Render records as CSV in store order.
pub fn render_records(records: &[VideoRecord], source: &str) -> Result<Vec<u8>> {
    let csv_error = |e: csv::Error| LibraryError::Csv {
        path: source.to_string(),
        source: e,
    };

    let mut sorted = records.to_vec();
    sort_records(&mut sorted);

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADERS).map_err(csv_error)?;
    for record in &sorted {
        writer.serialize(CsvRow::from(record)).map_err(csv_error)?;
    }

    writer.into_inner().map_err(|e| LibraryError::InvalidInput {
        field: "metadata".to_string(),
        message: format!("Failed to flush CSV writer: {}", e),
    })
}

/// Metadata store persisted as a CSV file through [`FileSystemAccess`].
pub struct CsvMetadataStore {
    fs: Arc<dyn FileSystemAccess>,
    path: PathBuf,
}

impl CsvMetadataStore {
    pub fn new(fs: Arc<dyn FileSystemAccess>, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MetadataStore for CsvMetadataStore {
    async fn load(&self) -> Result<LoadedStore> {
        if !self.fs.exists(&self.path).await? {
            debug!(path = ?self.path, "Metadata store does not exist yet");
            return Ok(LoadedStore::default());
        }

        let data = self.fs.read_file(&self.path).await?;
        let loaded = parse_store(&data, &self.location())?;

        debug!(
            path = ?self.path,
            count = loaded.records.len(),
            dropped = loaded.dropped_rows,
            "Loaded metadata store"
        );
        Ok(loaded)
    }

    async fn persist(&self, records: &[VideoRecord]) -> Result<()> {
        let data = render_records(records, &self.location())?;
        self.fs.write_file(&self.path, Bytes::from(data)).await?;

        info!(path = ?self.path, count = records.len(), "Metadata store written");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reads_columns_by_name() {
        let data = b"Uploaded,FileName,Title,UploadDate\n\
                     yes,a.mp4,Alpha,2024-03-10\n\
                     ,b.mp4,Beta,2024-03-11\n";

        let records = parse_records(data, "test.csv").unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].file_name, "a.mp4");
        assert_eq!(records[0].title, "Alpha");
        assert!(records[0].uploaded);
        assert_eq!(records[0].upload_time, "");
        assert_eq!(records[1].description, "");
        assert!(!records[1].uploaded);
    }

    #[test]
    fn test_parse_uploaded_is_case_insensitive() {
        let data = b"FileName,Uploaded\na.mp4,YES\nb.mp4,Yes\nc.mp4,y\nd.mp4,No\n";
        let records = parse_records(data, "test.csv").unwrap();

        let flags: Vec<bool> = records.iter().map(|r| r.uploaded).collect();
        assert_eq!(flags, vec![true, true, false, false]);
    }

    #[test]
    fn test_parse_tolerates_short_rows() {
        let data = b"FileName,UploadDate,UploadTime,Title,Description,Tags,Uploaded\n\
                     a.mp4,2024-03-10\n";
        let records = parse_records(data, "test.csv").unwrap();

        assert_eq!(records[0].upload_date, "2024-03-10");
        assert_eq!(records[0].tags, "");
        assert!(!records[0].uploaded);
    }

    #[test]
    fn test_parse_short_row_after_full_row() {
        let data = b"FileName,UploadDate,UploadTime,Title,Description,Tags,Uploaded\n\
                     a.mp4,2024-03-10,17:00,A,desc,tag,No\n\
                     b.mp4,2024-03-11\n";
        let records = parse_records(data, "test.csv").unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tags, "tag");
        assert_eq!(records[1].file_name, "b.mp4");
        assert_eq!(records[1].upload_date, "2024-03-11");
        assert_eq!(records[1].title, "");
    }

    #[test]
    fn test_parse_keeps_first_duplicate() {
        let data = b"FileName,Title\na.mp4,First\na.mp4,Second\n";
        let records = parse_records(data, "test.csv").unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "First");
    }

    #[test]
    fn test_parse_counts_dropped_rows() {
        let data = b"FileName,Title\na.mp4,First\n,Nameless\na.mp4,Second\nb.mp4,B\n";
        let loaded = parse_store(data, "test.csv").unwrap();

        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.dropped_rows, 2);
        assert!(loaded.needs_rewrite());
    }

    #[test]
    fn test_parse_requires_file_name_column() {
        let err = parse_records(b"Title,Tags\nx,y\n", "test.csv").unwrap_err();
        assert!(matches!(err, LibraryError::MissingColumn { column, .. } if column == "FileName"));
    }

    #[test]
    fn test_parse_empty_file() {
        assert!(parse_records(b"", "test.csv").unwrap().is_empty());
    }

    #[test]
    fn test_render_sorts_and_writes_yes_no() {
        let records = vec![
            VideoRecord {
                file_name: "b.mp4".to_string(),
                upload_date: "2024-03-11".to_string(),
                upload_time: "17:00".to_string(),
                title: "B".to_string(),
                description: "says \"hi\", twice".to_string(),
                tags: "x, y".to_string(),
                uploaded: true,
            },
            VideoRecord {
                file_name: "a.mp4".to_string(),
                upload_date: "2024-03-10".to_string(),
                upload_time: "16:30".to_string(),
                title: "A".to_string(),
                description: "d".to_string(),
                tags: "t".to_string(),
                uploaded: false,
            },
        ];

        let rendered = String::from_utf8(render_records(&records, "test.csv").unwrap()).unwrap();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(
            lines[0],
            "FileName,UploadDate,UploadTime,Title,Description,Tags,Uploaded"
        );
        assert_eq!(lines[1], "a.mp4,2024-03-10,16:30,A,d,t,No");
        assert_eq!(
            lines[2],
            "b.mp4,2024-03-11,17:00,B,\"says \"\"hi\"\", twice\",\"x, y\",Yes"
        );

        let reparsed = parse_records(rendered.as_bytes(), "test.csv").unwrap();
        assert_eq!(reparsed[1], records[0]);
    }
}
