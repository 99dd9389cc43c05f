//! Transfer orchestration.
//!
//! [`TransferTask`] drives one collection copy end to end: gather endpoint
//! metadata, size the job, prepare the target, then hand the source stream
//! to the batch writer while a heartbeat covers the quiet stretches. The
//! task owns the phase ordering and turns every exit (success, failure,
//! cancellation) into something reportable.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::Instant;

use crate::adapters::traits::{DocumentReader, TargetCollection};
use crate::core::transfer::heartbeat;
use crate::core::transfer::progress::{ProgressSink, ProgressTracker};
use crate::core::transfer::summary::TransferSummary;
use crate::core::transfer::writer::BatchWriter;
use crate::core::transfer::TransferRequest;
use crate::domain::errors::{FerryError, TransferError};
use crate::domain::stats::{ProgressDelta, TransferStats};
use crate::domain::Result;

/// Phases a transfer task moves through.
///
/// The order is fixed: `Idle` through `Streaming`, then exactly one of the
/// three terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    /// Not started yet.
    Idle,
    /// Gathering endpoint metadata.
    Initializing,
    /// Sizing the source collection.
    Counting,
    /// Preparing the target collection.
    EnsuringTarget,
    /// Documents are flowing.
    Streaming,
    /// Every source document was consumed.
    Completed,
    /// The run ended on an error.
    Failed,
    /// The run was cut short by cancellation.
    Cancelled,
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferState::Idle => "idle",
            TransferState::Initializing => "initializing",
            TransferState::Counting => "counting",
            TransferState::EnsuringTarget => "ensuring-target",
            TransferState::Streaming => "streaming",
            TransferState::Completed => "completed",
            TransferState::Failed => "failed",
            TransferState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Orchestrates one collection transfer.
pub struct TransferTask {
    request: TransferRequest,
    reader: Arc<dyn DocumentReader>,
    target: Arc<dyn TargetCollection>,
    dry_run: bool,
    state: TransferState,
}

impl TransferTask {
    /// Creates a task for `request`, reading from `reader` and writing to
    /// `target`.
    pub fn new(
        request: TransferRequest,
        reader: Arc<dyn DocumentReader>,
        target: Arc<dyn TargetCollection>,
    ) -> Self {
        Self {
            request,
            reader,
            target,
            dry_run: false,
            state: TransferState::Idle,
        }
    }

    /// Skips every store mutation while still exercising the full flow.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Current phase of the task.
    pub fn state(&self) -> TransferState {
        self.state
    }

    /// Runs the transfer to completion.
    ///
    /// `on_progress` receives every user-facing update: phase messages,
    /// per-batch progress with percentage, heartbeat lines, and the final
    /// summary line. Cancellation via `cancel` is not an error: the task
    /// returns an interrupted [`TransferSummary`] carrying partial
    /// statistics.
    ///
    /// # Errors
    ///
    /// Returns [`FerryError::Count`] when the source cannot be sized,
    /// [`FerryError::EnsureTarget`] when the target cannot be prepared,
    /// and [`FerryError::Transfer`] for failures while documents were
    /// flowing. Transfer errors carry the statistics accumulated up to
    /// the failure.
    pub async fn run(
        &mut self,
        on_progress: ProgressSink,
        cancel: watch::Receiver<bool>,
    ) -> Result<TransferSummary> {
        let started = Instant::now();
        let started_at = Utc::now();

        self.set_state(TransferState::Initializing);
        tracing::info!(
            source = %self.request.source,
            target = %self.request.target,
            policy = %self.request.policy,
            dry_run = self.dry_run,
            "starting transfer"
        );

        // Metadata failures are not fatal, they just mark the run.
        let mut metadata_incomplete = false;
        let source_info = match self.reader.info().await {
            Ok(info) => {
                tracing::debug!(endpoint = %info.describe(), "source endpoint");
                Some(info)
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not gather source endpoint metadata");
                metadata_incomplete = true;
                None
            }
        };
        let target_info = match self.target.info().await {
            Ok(info) => {
                tracing::debug!(endpoint = %info.describe(), "target endpoint");
                Some(info)
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not gather target endpoint metadata");
                metadata_incomplete = true;
                None
            }
        };

        if *cancel.borrow() {
            return Ok(self.interrupted_summary(
                TransferStats::new(),
                0,
                started,
                started_at,
                false,
            ));
        }

        self.set_state(TransferState::Counting);
        let total = match self.reader.count_documents().await {
            Ok(total) => total,
            Err(err) => {
                self.set_state(TransferState::Failed);
                return Err(FerryError::Count(err.to_string()));
            }
        };
        tracing::info!(total, "sized source collection");

        if *cancel.borrow() {
            return Ok(self.interrupted_summary(
                TransferStats::new(),
                total,
                started,
                started_at,
                false,
            ));
        }

        self.set_state(TransferState::EnsuringTarget);
        let target_created = if self.dry_run {
            false
        } else {
            match self.target.ensure_exists().await {
                Ok(outcome) => outcome.created,
                Err(err) => {
                    self.set_state(TransferState::Failed);
                    return Err(FerryError::EnsureTarget(err.to_string()));
                }
            }
        };

        self.set_state(TransferState::Streaming);
        if total == 0 {
            on_progress(100, "Nothing to copy: source collection is empty");
            self.set_state(TransferState::Completed);
            let mut summary = TransferSummary::new(TransferStats::new(), 0)
                .with_started_at(started_at)
                .with_duration(started.elapsed());
            summary.target_created = target_created;
            summary.metadata_incomplete = metadata_incomplete;
            summary.dry_run = self.dry_run;
            summary.source = source_info;
            summary.target = target_info;
            summary.log_summary();
            return Ok(summary);
        }

        on_progress(0, &format!("Copying {total} documents"));

        let tracker = Arc::new(ProgressTracker::new(total));
        let beat = heartbeat::spawn(tracker.clone(), on_progress.clone());

        let stream = match self.reader.stream_documents(cancel.clone(), true).await {
            Ok(stream) => stream,
            Err(err) => {
                beat.stop();
                self.set_state(TransferState::Failed);
                return Err(FerryError::Transfer(TransferError::Fatal {
                    message: format!("could not open source stream: {err}"),
                    stats: TransferStats::new(),
                }));
            }
        };

        let mut writer =
            BatchWriter::new(self.target.clone(), self.request.policy).with_dry_run(self.dry_run);

        let sink = on_progress.clone();
        let delta_tracker = tracker.clone();
        let on_delta = move |delta: ProgressDelta| {
            delta_tracker.record(delta.documents);
            sink(delta_tracker.percent(), &delta_tracker.progress_message());
        };

        let result = writer.write_documents(stream, &on_delta, cancel.clone()).await;
        beat.stop();

        match result {
            Ok(stats) => {
                on_progress(100, &stats.summary_message());
                self.set_state(TransferState::Completed);
                let mut summary = TransferSummary::new(stats, total)
                    .with_started_at(started_at)
                    .with_duration(started.elapsed());
                summary.target_created = target_created;
                summary.metadata_incomplete = metadata_incomplete;
                summary.dry_run = self.dry_run;
                summary.source = source_info;
                summary.target = target_info;
                summary.log_summary();
                Ok(summary)
            }
            Err(err) if err.is_cancelled() => {
                let stats = err.stats().clone();
                on_progress(
                    tracker.percent(),
                    &format!(
                        "Copy cancelled: {} of {} documents copied",
                        stats.total_processed, total
                    ),
                );
                let mut summary =
                    self.interrupted_summary(stats, total, started, started_at, target_created);
                summary.metadata_incomplete = metadata_incomplete;
                summary.source = source_info;
                summary.target = target_info;
                Ok(summary)
            }
            Err(err) => {
                let stats = err.stats();
                on_progress(
                    tracker.percent(),
                    &format!(
                        "Copy failed after {} of {} documents: {}",
                        stats.total_processed, total, err
                    ),
                );
                self.set_state(TransferState::Failed);
                Err(FerryError::Transfer(err))
            }
        }
    }

    fn set_state(&mut self, state: TransferState) {
        tracing::debug!(from = %self.state, to = %state, "transfer state change");
        self.state = state;
    }

    fn interrupted_summary(
        &mut self,
        stats: TransferStats,
        total: u64,
        started: Instant,
        started_at: DateTime<Utc>,
        target_created: bool,
    ) -> TransferSummary {
        tracing::info!("transfer cancelled by caller");
        self.set_state(TransferState::Cancelled);
        let mut summary = TransferSummary::new(stats, total)
            .with_started_at(started_at)
            .with_duration(started.elapsed());
        summary.interrupted = true;
        summary.target_created = target_created;
        summary.dry_run = self.dry_run;
        summary.log_summary();
        summary
    }
}
