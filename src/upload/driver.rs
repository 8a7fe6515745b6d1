//! Upload driver
//!
//! Sends every pending entry of a session through an [`Uploader`], strictly
//! one at a time and in session order. Each entry moves
//! `pending -> uploading -> completed | error`; a failure is recorded on its
//! entry and the run moves on to the next one.
//!
//! Entries removed while their request is in flight are not brought back:
//! the late result is discarded. There is no timeout at this level, so an
//! uploader that never resolves stalls the rest of the queue.

use super::aggregator::ResultAggregator;
use super::registry::FileId;
use super::session::SessionHandle;
use super::{SessionError, Uploader};
use crate::api::{Category, UploadResponse};
use crate::metrics;
use std::time::Instant;

/// Progress shown while a request is in flight
pub const UPLOADING_PROGRESS: u8 = 50;

/// Counts for one upload run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Entries that were pending when the run started
    pub attempted: usize,
    pub completed: usize,
    pub failed: usize,
    /// Entries removed before or during their upload
    pub discarded: usize,
    /// Results of every completed entry in the session after the run
    pub results: Vec<UploadResponse>,
}

impl RunReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

enum EntryOutcome {
    Completed,
    Failed,
    Discarded,
}

/// Runs uploads for a session against one category endpoint
pub struct UploadDriver<U> {
    uploader: U,
    category: Category,
    aggregator: ResultAggregator,
}

impl<U: Uploader> UploadDriver<U> {
    pub fn new(uploader: U, category: Category) -> Self {
        Self {
            uploader,
            category,
            aggregator: ResultAggregator::default(),
        }
    }

    /// Deliver aggregated results to `aggregator` at the end of each run
    pub fn with_aggregator(mut self, aggregator: ResultAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Upload every entry that is pending right now.
    ///
    /// Fails only when another run already owns the session.
    #[tracing::instrument(
        name = "upload.run",
        skip(self, session),
        fields(category = %self.category, pending = tracing::field::Empty)
    )]
    pub async fn run(&self, session: &SessionHandle) -> Result<RunReport, SessionError> {
        let _guard = session.begin_run().ok_or(SessionError::RunInProgress)?;

        let pending = session.snapshot().pending_ids();
        tracing::Span::current().record("pending", pending.len());

        let mut report = RunReport {
            attempted: pending.len(),
            ..RunReport::default()
        };

        for id in pending {
            match self.upload_entry(session, id).await {
                EntryOutcome::Completed => report.completed += 1,
                EntryOutcome::Failed => report.failed += 1,
                EntryOutcome::Discarded => report.discarded += 1,
            }
        }

        report.results = self.aggregator.on_run_complete(&session.snapshot());

        tracing::info!(
            attempted = report.attempted,
            completed = report.completed,
            failed = report.failed,
            discarded = report.discarded,
            "Upload run finished"
        );

        Ok(report)
    }

    async fn upload_entry(&self, session: &SessionHandle, id: FileId) -> EntryOutcome {
        // Take the payload and publish the in-flight state in one step
        let mut payload = None;
        let selected = session.update_entry(id, |entry| {
            if entry.status().is_pending() {
                payload = Some(entry.payload().clone());
                entry.mark_uploading(UPLOADING_PROGRESS);
            }
        });
        let payload = match (selected, payload) {
            (true, Some(payload)) => payload,
            _ => {
                tracing::debug!(file_id = %id, "Entry no longer pending, skipping");
                return EntryOutcome::Discarded;
            }
        };

        let name = payload.name.clone();
        let bytes = payload.byte_size();
        let start = Instant::now();
        let result = self.uploader.upload(self.category, payload).await;
        let duration = start.elapsed();

        metrics::record_upload_duration(self.category.as_str(), duration.as_secs_f64());

        match result {
            Ok(response) => {
                metrics::record_upload_success(self.category.as_str(), bytes);
                tracing::info!(
                    file = %name,
                    file_id = %id,
                    bytes,
                    duration_ms = duration.as_millis(),
                    "Upload completed"
                );
                if session.update_entry(id, |entry| entry.mark_completed(response)) {
                    EntryOutcome::Completed
                } else {
                    self.discard_stale(id)
                }
            }
            Err(failure) => {
                let message = failure.message();
                metrics::record_upload_failure(self.category.as_str());
                tracing::warn!(
                    file = %name,
                    file_id = %id,
                    error = %message,
                    duration_ms = duration.as_millis(),
                    "Upload failed"
                );
                if session.update_entry(id, |entry| entry.mark_failed(message)) {
                    EntryOutcome::Failed
                } else {
                    self.discard_stale(id)
                }
            }
        }
    }

    fn discard_stale(&self, id: FileId) -> EntryOutcome {
        metrics::record_stale_update();
        tracing::debug!(file_id = %id, "Entry removed during upload, discarding result");
        EntryOutcome::Discarded
    }
}
