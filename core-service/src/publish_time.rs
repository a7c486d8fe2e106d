//! Publish-time resolution.
//!
//! Records carry a local wall-clock date and time. The API wants an absolute
//! UTC instant, so the pair is pinned to the host's current offset.

use chrono::{FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use core_library::dates::{DATE_FORMAT, TIME_FORMAT};
use thiserror::Error;

/// Format of `status.publishAt`.
pub const PUBLISH_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeResolutionError {
    #[error("invalid upload date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid upload time '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("local time {date} {time} does not map to a single instant")]
    Ambiguous { date: String, time: String },
}

/// Convert a local `date` + `time` at `offset` into an RFC 3339 UTC instant.
pub fn resolve_publish_at(
    date: &str,
    time: &str,
    offset: FixedOffset,
) -> Result<String, TimeResolutionError> {
    let day = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
        .map_err(|_| TimeResolutionError::InvalidDate(date.to_string()))?;
    let clock = NaiveTime::parse_from_str(time.trim(), TIME_FORMAT)
        .map_err(|_| TimeResolutionError::InvalidTime(time.to_string()))?;

    let local = offset
        .from_local_datetime(&day.and_time(clock))
        .single()
        .ok_or_else(|| TimeResolutionError::Ambiguous {
            date: date.to_string(),
            time: time.to_string(),
        })?;

    Ok(local.with_timezone(&Utc).format(PUBLISH_AT_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours_east(hours: i32) -> FixedOffset {
        FixedOffset::east_opt(hours * 3600).unwrap()
    }

    #[test]
    fn test_converts_local_time_to_utc() {
        assert_eq!(
            resolve_publish_at("2024-03-10", "17:00", hours_east(-5)).unwrap(),
            "2024-03-10T22:00:00Z"
        );
    }

    #[test]
    fn test_crosses_day_boundary() {
        assert_eq!(
            resolve_publish_at("2024-03-10", "18:30", hours_east(-8)).unwrap(),
            "2024-03-11T02:30:00Z"
        );
        assert_eq!(
            resolve_publish_at("2024-03-10", "01:15", hours_east(9)).unwrap(),
            "2024-03-09T16:15:00Z"
        );
    }

    #[test]
    fn test_utc_offset_is_identity() {
        assert_eq!(
            resolve_publish_at("2024-12-31", "16:45", hours_east(0)).unwrap(),
            "2024-12-31T16:45:00Z"
        );
    }

    #[test]
    fn test_rejects_bad_date() {
        assert_eq!(
            resolve_publish_at("10/03/24", "17:00", hours_east(0)),
            Err(TimeResolutionError::InvalidDate("10/03/24".to_string()))
        );
        assert!(matches!(
            resolve_publish_at("2024-02-30", "17:00", hours_east(0)),
            Err(TimeResolutionError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_rejects_bad_time() {
        assert_eq!(
            resolve_publish_at("2024-03-10", "5pm", hours_east(0)),
            Err(TimeResolutionError::InvalidTime("5pm".to_string()))
        );
        assert!(matches!(
            resolve_publish_at("2024-03-10", "", hours_east(0)),
            Err(TimeResolutionError::InvalidTime(_))
        ));
    }
}
