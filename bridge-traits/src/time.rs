//! Time Abstractions
//!
//! Provides an injectable time source so "today" and the local UTC offset are
//! deterministic in tests.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Time source trait
///
/// Abstracts system time and the host timezone.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::time::Clock;
///
/// fn log_today(clock: &dyn Clock) {
///     println!("Scheduling relative to {}", clock.today());
/// }
/// ```
pub trait Clock: Send + Sync {
    /// Get current UTC time
    fn now(&self) -> DateTime<Utc>;

    /// The host's current offset from UTC.
    ///
    /// This is the offset in effect *now*, not at any scheduled instant.
    fn local_offset(&self) -> FixedOffset;

    /// The current calendar date in the host timezone
    fn today(&self) -> NaiveDate {
        self.now().with_timezone(&self.local_offset()).date_naive()
    }
}

/// System clock implementation using actual system time
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_offset(&self) -> FixedOffset {
        Local::now().offset().fix()
    }
}

/// Clock frozen at a given instant and offset.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: DateTime<Utc>,
    offset: FixedOffset,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self { now, offset }
    }

    /// Clock at local noon of `date` in `offset`.
    pub fn at_local_noon(date: NaiveDate, offset: FixedOffset) -> Self {
        let local_noon = date.and_time(NaiveTime::MIN) + chrono::Duration::hours(12);
        let utc_noon = local_noon - chrono::Duration::seconds(offset.local_minus_utc() as i64);
        Self {
            now: Utc.from_utc_datetime(&utc_noon),
            offset,
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn local_offset(&self) -> FixedOffset {
        self.offset
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock() {
        let clock = SystemClock;
        let offset = clock.local_offset();

        assert!(clock.now().timestamp() > 0);
        assert!(offset.local_minus_utc().abs() < 24 * 3600);
    }

    #[test]
    fn test_today_uses_local_offset() {
        // 2024-03-11 03:00 UTC is still 2024-03-10 at UTC-5.
        let now = Utc.with_ymd_and_hms(2024, 3, 11, 3, 0, 0).unwrap();
        let minus_five = FixedOffset::west_opt(5 * 3600).unwrap();
        let clock = FixedClock::new(now, minus_five);

        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());

        let utc_clock = FixedClock::new(now, FixedOffset::east_opt(0).unwrap());
        assert_eq!(
            utc_clock.today(),
            NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()
        );
    }

    #[test]
    fn test_at_local_noon() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let plus_nine = FixedOffset::east_opt(9 * 3600).unwrap();
        let clock = FixedClock::at_local_noon(date, plus_nine);

        assert_eq!(clock.today(), date);
        assert_eq!(clock.now(), Utc.with_ymd_and_hms(2024, 3, 10, 3, 0, 0).unwrap());
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!("DEBUG".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert!("loud".parse::<LogLevel>().is_err());
        assert!(LogLevel::Trace < LogLevel::Error);
    }
}
