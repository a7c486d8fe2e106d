//! Domain models for the video schedule

use chrono::{NaiveDate, NaiveTime};
use std::cmp::Ordering;
use std::path::Path;

use crate::dates::{format_canonical, parse_canonical, TIME_FORMAT};

/// One row of the metadata store, keyed by `file_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRecord {
    /// File name inside the video folder (unique key)
    pub file_name: String,
    /// Canonical `YYYY-MM-DD`, or the raw stored value when it could not be parsed
    pub upload_date: String,
    /// Local wall-clock `HH:MM`
    pub upload_time: String,
    pub title: String,
    pub description: String,
    /// Comma-joined tag list as typed by the user
    pub tags: String,
    pub uploaded: bool,
}

impl VideoRecord {
    /// Record synthesized for a newly discovered file.
    ///
    /// The title defaults to the file stem; description and tags are left for
    /// the user to fill in.
    pub fn new_scheduled(file_name: impl Into<String>, date: NaiveDate, time: NaiveTime) -> Self {
        let file_name = file_name.into();
        let title = file_stem(&file_name).to_string();

        Self {
            file_name,
            upload_date: format_canonical(date),
            upload_time: time.format(TIME_FORMAT).to_string(),
            title,
            description: String::new(),
            tags: String::new(),
            uploaded: false,
        }
    }

    /// The upload date, if it is stored canonically.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_canonical(&self.upload_date)
    }

    /// The upload time, if it is a valid `HH:MM`.
    pub fn parsed_time(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(self.upload_time.trim(), TIME_FORMAT).ok()
    }

    /// Tags split on commas, trimmed, empties dropped. Order and duplicates are kept.
    pub fn tag_list(&self) -> Vec<String> {
        split_tags(&self.tags)
    }

    /// Whether the record should be uploaded on `today`.
    ///
    /// Records with an unparseable date are never due; the pipeline reports
    /// them separately.
    pub fn is_due(&self, today: NaiveDate) -> bool {
        !self.uploaded && self.parsed_date().is_some_and(|date| date <= today)
    }

    /// Store ordering: by date, unparseable dates last, then by file name.
    pub fn store_order(&self, other: &Self) -> Ordering {
        match (self.parsed_date(), other.parsed_date()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then_with(|| self.file_name.cmp(&other.file_name))
    }
}

/// Split a comma-joined tag string.
pub fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// File name without its final extension.
pub fn file_stem(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(file_name)
}

/// Sort records into store order in place.
pub fn sort_records(records: &mut [VideoRecord]) {
    records.sort_by(VideoRecord::store_order);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(file_name: &str, date: &str) -> VideoRecord {
        VideoRecord {
            file_name: file_name.to_string(),
            upload_date: date.to_string(),
            upload_time: "17:00".to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            tags: "a".to_string(),
            uploaded: false,
        }
    }

    #[test]
    fn test_new_scheduled_defaults() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let time = NaiveTime::from_hms_opt(16, 45, 0).unwrap();
        let record = VideoRecord::new_scheduled("My Trip.final.mp4", date, time);

        assert_eq!(record.upload_date, "2024-03-10");
        assert_eq!(record.upload_time, "16:45");
        assert_eq!(record.title, "My Trip.final");
        assert!(record.description.is_empty());
        assert!(record.tags.is_empty());
        assert!(!record.uploaded);
    }

    #[test]
    fn test_tag_list_trims_and_keeps_order() {
        let mut r = record("a.mp4", "2024-03-10");
        r.tags = " travel, ,vlog,travel ,,".to_string();

        assert_eq!(r.tag_list(), vec!["travel", "vlog", "travel"]);
    }

    #[test]
    fn test_is_due() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();

        assert!(record("a.mp4", "2024-03-09").is_due(today));
        assert!(record("a.mp4", "2024-03-10").is_due(today));
        assert!(!record("a.mp4", "2024-03-11").is_due(today));
        assert!(!record("a.mp4", "someday").is_due(today));

        let mut uploaded = record("a.mp4", "2024-03-01");
        uploaded.uploaded = true;
        assert!(!uploaded.is_due(today));
    }

    #[test]
    fn test_store_order_puts_unparseable_last() {
        let mut records = vec![
            record("z.mp4", "garbage"),
            record("b.mp4", "2024-03-11"),
            record("a.mp4", "2024-03-11"),
            record("c.mp4", "2024-03-10"),
            record("y.mp4", "13/13/13"),
        ];
        sort_records(&mut records);

        let names: Vec<_> = records.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, vec!["c.mp4", "a.mp4", "b.mp4", "y.mp4", "z.mp4"]);
    }
}
