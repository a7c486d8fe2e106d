//! Reconciliation of the video folder against the metadata store.
//!
//! New files are appended with an automatically assigned publish slot: one
//! file per day, starting today or the day after the latest scheduled date,
//! at a random minute inside the publish window. Stored dates in alternate
//! layouts are rewritten canonically.

use chrono::{NaiveDate, NaiveTime, Timelike};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeSet, HashSet};
use tracing::{info, warn};

use crate::dates::{format_canonical, normalize_date};
use crate::models::{sort_records, VideoRecord};

/// Source of upload times for newly scheduled files.
pub trait TimeSlotSource: Send {
    fn next_slot(&mut self) -> NaiveTime;
}

/// Uniformly random minute in `[start, end]`, both ends inclusive.
pub struct RandomTimeSlots<R = StdRng> {
    start_minute: u32,
    end_minute: u32,
    rng: R,
}

impl RandomTimeSlots {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self::with_rng(start, end, StdRng::from_entropy())
    }
}

impl<R: Rng> RandomTimeSlots<R> {
    pub fn with_rng(start: NaiveTime, end: NaiveTime, rng: R) -> Self {
        let start_minute = minute_of_day(start);
        let end_minute = minute_of_day(end).max(start_minute);
        Self {
            start_minute,
            end_minute,
            rng,
        }
    }
}

impl<R: Rng + Send> TimeSlotSource for RandomTimeSlots<R> {
    fn next_slot(&mut self) -> NaiveTime {
        let minute = self.rng.gen_range(self.start_minute..=self.end_minute);
        NaiveTime::from_hms_opt(minute / 60, minute % 60, 0).unwrap_or(NaiveTime::MIN)
    }
}

fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Result of reconciling a folder listing with stored records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// All records in store order
    pub records: Vec<VideoRecord>,
    /// Number of records synthesized for new files
    pub added: usize,
    /// Number of stored dates rewritten canonically
    pub canonicalized: usize,
}

impl Reconciliation {
    /// Whether reconciliation changed anything that must be written back.
    pub fn changed(&self) -> bool {
        self.added > 0 || self.canonicalized > 0
    }
}

/// Merge `disk_file_names` into `persisted`.
///
/// Stored records are never removed. Files without a record get one with the
/// next free day: `today` when nothing is scheduled yet, otherwise
/// `max(today, latest + 1 day)`. Files are processed in sorted order so the
/// assignment is deterministic.
pub fn reconcile<S>(
    disk_file_names: &[String],
    persisted: Vec<VideoRecord>,
    today: NaiveDate,
    time_source: &mut S,
) -> Reconciliation
where
    S: TimeSlotSource + ?Sized,
{
    let mut records = persisted;
    let mut canonicalized = 0;

    for record in &mut records {
        match normalize_date(&record.upload_date, &record.file_name) {
            Ok(date) => {
                let canonical = format_canonical(date);
                if canonical != record.upload_date {
                    record.upload_date = canonical;
                    canonicalized += 1;
                }
            }
            Err(err) => {
                warn!(
                    file = %err.file_name,
                    raw = %err.raw,
                    "Could not parse upload date, leaving it unchanged"
                );
            }
        }
    }

    let known: HashSet<&str> = records.iter().map(|r| r.file_name.as_str()).collect();
    let new_files: BTreeSet<&String> = disk_file_names
        .iter()
        .filter(|name| !known.contains(name.as_str()))
        .collect();

    let mut frontier = records.iter().filter_map(VideoRecord::parsed_date).max();
    let mut added_records = Vec::with_capacity(new_files.len());

    for file_name in new_files {
        let date = match frontier {
            None => today,
            Some(latest) => latest.succ_opt().map_or(today, |next| today.max(next)),
        };
        frontier = Some(date);

        let time = time_source.next_slot();
        info!(
            file = %file_name,
            date = %format_canonical(date),
            time = %time.format("%H:%M"),
            "Scheduled new video"
        );
        added_records.push(VideoRecord::new_scheduled(file_name.clone(), date, time));
    }

    let added = added_records.len();
    records.extend(added_records);
    sort_records(&mut records);

    Reconciliation {
        records,
        added,
        canonicalized,
    }
}
