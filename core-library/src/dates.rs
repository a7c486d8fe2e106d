//! Date normalization for user-edited schedule dates.
//!
//! Spreadsheet tools rewrite `2024-03-10` into whatever the locale prefers, so
//! stored dates are accepted in a handful of slash-separated layouts and
//! rewritten canonically.

use chrono::{Datelike, NaiveDate};
use thiserror::Error;
use tracing::info;

/// Canonical stored date format
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Stored time format
pub const TIME_FORMAT: &str = "%H:%M";

/// Alternate layouts, tried in order after the canonical one.
///
/// Ambiguous inputs resolve to the first layout that parses, so `03/04/24`
/// is read month-first. Two-digit years map `69..=99` to 19xx and `00..=68`
/// to 20xx.
pub const ALTERNATE_DATE_FORMATS: &[&str] = &[
    "%m/%d/%y",
    "%m/%d/%Y",
    "%d/%m/%y",
    "%d/%m/%Y",
    "%y/%m/%d",
    "%Y/%m/%d",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Could not parse date '{raw}' for '{file_name}'")]
pub struct DateParseError {
    pub raw: String,
    pub file_name: String,
}

/// Parse a stored date, trying the canonical format first and then every
/// alternate layout.
pub fn normalize_date(raw: &str, file_name: &str) -> Result<NaiveDate, DateParseError> {
    let trimmed = raw.trim();

    if let Some(date) = parse_canonical(trimmed) {
        return Ok(date);
    }

    for format in ALTERNATE_DATE_FORMATS {
        if let Some(parsed) = parse_with(trimmed, format) {
            let date = apply_posix_pivot(parsed, format);
            info!(
                file = %file_name,
                raw = %raw,
                canonical = %format_canonical(date),
                "Converted date to canonical format"
            );
            return Ok(date);
        }
    }

    Err(DateParseError {
        raw: raw.to_string(),
        file_name: file_name.to_string(),
    })
}

/// chrono accepts one to four digits for `%Y`; stored years must have four.
fn parse_with(raw: &str, format: &str) -> Option<NaiveDate> {
    let date = NaiveDate::parse_from_str(raw, format).ok()?;
    if format.contains("%Y") && date.year() < 1000 {
        return None;
    }
    Some(date)
}

/// chrono reads a bare `%y` of `69` as 2069; POSIX `strptime` reads it as 1969.
fn apply_posix_pivot(date: NaiveDate, format: &str) -> NaiveDate {
    if format.contains("%y") && date.year() == 2069 {
        date.with_year(1969).unwrap_or(date)
    } else {
        date
    }
}

/// Parse a canonical `YYYY-MM-DD` date.
pub fn parse_canonical(raw: &str) -> Option<NaiveDate> {
    parse_with(raw.trim(), DATE_FORMAT)
}

pub fn format_canonical(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_canonical_is_noop() {
        assert_eq!(normalize_date("2024-03-10", "a.mp4").unwrap(), ymd(2024, 3, 10));
        assert_eq!(format_canonical(ymd(2024, 3, 10)), "2024-03-10");
    }

    #[test]
    fn test_alternate_formats_reach_same_date() {
        let expected = ymd(2024, 3, 25);

        for raw in ["03/25/24", "03/25/2024", "25/03/24", "25/03/2024", "2024/03/25"] {
            assert_eq!(normalize_date(raw, "a.mp4").unwrap(), expected, "input {raw}");
        }
    }

    #[test]
    fn test_two_digit_year_first_layout() {
        // Only `%y/%m/%d` accepts this one.
        assert_eq!(normalize_date("99/12/31", "a.mp4").unwrap(), ymd(1999, 12, 31));
    }

    #[test]
    fn test_short_years_are_not_four_digit_years() {
        assert!(parse_canonical("24-03-10").is_none());
        assert!(normalize_date("24-03-10", "a.mp4").is_err());
        assert_eq!(normalize_date("2024/3/5", "a.mp4").unwrap(), ymd(2024, 3, 5));
    }

    #[test]
    fn test_month_first_wins_when_ambiguous() {
        assert_eq!(normalize_date("03/04/24", "a.mp4").unwrap(), ymd(2024, 3, 4));
    }

    #[test]
    fn test_two_digit_year_pivot() {
        assert_eq!(normalize_date("01/02/69", "a.mp4").unwrap(), ymd(1969, 1, 2));
        assert_eq!(normalize_date("01/02/68", "a.mp4").unwrap(), ymd(2068, 1, 2));
        assert_eq!(normalize_date("01/02/99", "a.mp4").unwrap(), ymd(1999, 1, 2));
        assert_eq!(normalize_date("01/02/00", "a.mp4").unwrap(), ymd(2000, 1, 2));
        // A four-digit 2069 is taken literally.
        assert_eq!(normalize_date("01/02/2069", "a.mp4").unwrap(), ymd(2069, 1, 2));
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        assert_eq!(normalize_date("  2024-03-10 ", "a.mp4").unwrap(), ymd(2024, 3, 10));
        assert_eq!(normalize_date(" 3/10/2024", "a.mp4").unwrap(), ymd(2024, 3, 10));
    }

    #[test]
    fn test_unparseable_reports_raw_and_file() {
        let err = normalize_date("next tuesday", "clip.mov").unwrap_err();

        assert_eq!(
            err,
            DateParseError {
                raw: "next tuesday".to_string(),
                file_name: "clip.mov".to_string(),
            }
        );
        assert!(normalize_date("", "clip.mov").is_err());
        assert!(normalize_date("13/13/2024", "clip.mov").is_err());
    }
}
