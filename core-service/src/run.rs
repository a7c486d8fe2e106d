//! Run orchestration.
//!
//! One run is: scan the folder, reconcile it with the store, persist the
//! reconciled schedule, check completeness, then upload every due record in
//! store order and persist the upload flags once at the end.

use bridge_traits::storage::FileSystemAccess;
use bridge_traits::time::Clock;
use core_library::{
    check_completeness, reconcile, scan_video_folder, IncompleteRecord, MetadataStore,
    TimeSlotSource, VideoRecord,
};
use core_runtime::SchedulerConfig;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::error::{Result, ServiceError};
use crate::pipeline::{RecordOutcome, UploadPipeline};

/// Exit code for a clean run.
pub const EXIT_OK: i32 = 0;
/// Exit code for an aborted run.
pub const EXIT_ABORTED: i32 = 1;
/// Exit code when metadata must be filled in first.
pub const EXIT_INCOMPLETE: i32 = 2;
/// Exit code when at least one record failed or was skipped.
pub const EXIT_FAILURES: i32 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Check and list what would be uploaded, without authenticating
    pub dry_run: bool,
    /// Print the schedule after reconciliation and stop
    pub list: bool,
}

/// Counters for one upload pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub uploaded: usize,
    /// Failed or skipped records
    pub failed: usize,
    pub not_due: usize,
    pub already_uploaded: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The folder holds no video files
    NothingToDo { folder_created: bool },
    /// Schedule after reconciliation
    Listed(Vec<VideoRecord>),
    /// A record is missing user metadata; nothing was uploaded
    Incomplete(IncompleteRecord),
    /// Records that a real run would upload now
    DryRun { due: Vec<VideoRecord> },
    Completed(RunSummary),
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Incomplete(_) => EXIT_INCOMPLETE,
            RunOutcome::Completed(summary) if summary.failed > 0 => EXIT_FAILURES,
            _ => EXIT_OK,
        }
    }
}

/// Drives a single scheduler run.
pub struct Scheduler {
    config: SchedulerConfig,
    fs: Arc<dyn FileSystemAccess>,
    store: Arc<dyn MetadataStore>,
    clock: Arc<dyn Clock>,
    time_slots: Box<dyn TimeSlotSource>,
    pipeline: UploadPipeline,
}

impl Scheduler {
    pub fn new(
        config: SchedulerConfig,
        fs: Arc<dyn FileSystemAccess>,
        store: Arc<dyn MetadataStore>,
        clock: Arc<dyn Clock>,
        time_slots: Box<dyn TimeSlotSource>,
        pipeline: UploadPipeline,
    ) -> Self {
        Self {
            config,
            fs,
            store,
            clock,
            time_slots,
            pipeline,
        }
    }

    /// Execute one run.
    ///
    /// # Errors
    ///
    /// Store and filesystem failures, and any credential failure during the
    /// upload pass. Uploads that finished before a credential failure are
    /// persisted before the error is returned.
    #[instrument(skip(self))]
    pub async fn run(&mut self, options: RunOptions) -> Result<RunOutcome> {
        let scan = scan_video_folder(
            self.fs.as_ref(),
            &self.config.video_folder,
            &self.config.video_extensions,
        )
        .await?;

        if scan.file_names.is_empty() {
            info!(folder = ?self.config.video_folder, "No video files found");
            return Ok(RunOutcome::NothingToDo {
                folder_created: scan.created,
            });
        }

        let loaded = self.store.load().await?;
        let needs_rewrite = loaded.needs_rewrite();
        let dropped_rows = loaded.dropped_rows;
        let today = self.clock.today();
        let reconciliation = reconcile(
            &scan.file_names,
            loaded.records,
            today,
            self.time_slots.as_mut(),
        );

        if reconciliation.changed() || needs_rewrite {
            self.store.persist(&reconciliation.records).await?;
            info!(
                store = %self.store.location(),
                added = reconciliation.added,
                canonicalized = reconciliation.canonicalized,
                dropped = dropped_rows,
                "Metadata store updated"
            );
        }

        let mut records = reconciliation.records;

        if options.list {
            return Ok(RunOutcome::Listed(records));
        }

        if let Err(incomplete) = check_completeness(&records) {
            error!(
                file = %incomplete.file_name,
                row = incomplete.row,
                "{}",
                incomplete
            );
            return Ok(RunOutcome::Incomplete(incomplete));
        }

        if options.dry_run {
            let due = records
                .iter()
                .filter(|record| record.is_due(today))
                .cloned()
                .collect();
            return Ok(RunOutcome::DryRun { due });
        }

        let summary = self.upload_pass(&mut records, today).await?;
        Ok(RunOutcome::Completed(summary))
    }

    async fn upload_pass(
        &self,
        records: &mut [VideoRecord],
        today: chrono::NaiveDate,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let mut changed = false;

        for index in 0..records.len() {
            let record = &records[index];
            if record.uploaded {
                summary.already_uploaded += 1;
                continue;
            }
            if record.parsed_date().is_none() {
                warn!(
                    file = %record.file_name,
                    date = %record.upload_date,
                    "Upload date could not be parsed, skipping"
                );
                summary.failed += 1;
                continue;
            }
            if !record.is_due(today) {
                summary.not_due += 1;
                continue;
            }

            match self.pipeline.process(record).await {
                Ok(RecordOutcome::Uploaded { video_id }) => {
                    info!(file = %record.file_name, video_id = %video_id, "Uploaded");
                    records[index].uploaded = true;
                    changed = true;
                    summary.uploaded += 1;
                }
                Ok(RecordOutcome::Failed { reason }) => {
                    warn!(file = %record.file_name, reason = %reason, "Upload failed");
                    summary.failed += 1;
                }
                Err(auth) => {
                    error!(error = %auth, "Credential failure, aborting run");
                    if changed {
                        if let Err(e) = self.store.persist(records).await {
                            error!(error = %e, "Could not record finished uploads");
                        }
                    }
                    return Err(ServiceError::Auth(auth));
                }
            }
        }

        if changed {
            self.store.persist(records).await?;
        }

        info!(
            uploaded = summary.uploaded,
            failed = summary.failed,
            not_due = summary.not_due,
            already_uploaded = summary.already_uploaded,
            "Success: {}, Fail/Skip: {}",
            summary.uploaded,
            summary.failed
        );
        Ok(summary)
    }
}
