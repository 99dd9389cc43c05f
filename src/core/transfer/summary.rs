//! Transfer summary generation and reporting
//!
//! This module provides the summary of a finished transfer run: the final
//! statistics, how the run ended, timing, and the endpoints involved.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::adapters::traits::StoreInfo;
use crate::domain::stats::TransferStats;

/// Summary of a transfer run.
#[derive(Debug, Clone)]
pub struct TransferSummary {
    /// Final accounting of processed documents
    pub stats: TransferStats,
    /// Approximate source size the run was started against
    pub source_total: u64,
    /// Whether the target collection had to be created
    pub target_created: bool,
    /// Wall-clock time the run started
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration of the run
    pub duration: Duration,
    /// Whether the run was cut short by cancellation
    pub interrupted: bool,
    /// Whether endpoint metadata could not be fully gathered
    pub metadata_incomplete: bool,
    /// Whether store writes were skipped
    pub dry_run: bool,
    /// Source endpoint identity, when it could be gathered
    pub source: Option<StoreInfo>,
    /// Target endpoint identity, when it could be gathered
    pub target: Option<StoreInfo>,
}

impl TransferSummary {
    /// Creates a summary from final statistics and the sized source total.
    pub fn new(stats: TransferStats, source_total: u64) -> Self {
        Self {
            stats,
            source_total,
            target_created: false,
            started_at: Utc::now(),
            duration: Duration::ZERO,
            interrupted: false,
            metadata_incomplete: false,
            dry_run: false,
            source: None,
            target: None,
        }
    }

    /// Sets the wall-clock start time
    pub fn with_started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self
    }

    /// Sets the run duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// True when the run processed everything it set out to.
    pub fn is_complete(&self) -> bool {
        !self.interrupted
    }

    /// Final user-facing line for this run.
    pub fn message(&self) -> String {
        if self.interrupted {
            format!(
                "Copy cancelled: {} of {} documents copied",
                self.stats.total_processed, self.source_total
            )
        } else {
            self.stats.summary_message()
        }
    }

    /// Logs the summary at info level.
    pub fn log_summary(&self) {
        tracing::info!(
            total_processed = self.stats.total_processed,
            inserted = self.stats.inserted,
            skipped = self.stats.skipped,
            replaced = self.stats.replaced,
            created = self.stats.created,
            flushes = self.stats.flush_count,
            source_total = self.source_total,
            target_created = self.target_created,
            interrupted = self.interrupted,
            dry_run = self.dry_run,
            started_at = %self.started_at.to_rfc3339(),
            duration_secs = self.duration.as_secs_f64(),
            "Transfer finished"
        );
        if self.metadata_incomplete {
            tracing::warn!("Endpoint metadata was incomplete for this run");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::stats::{OutcomeKind, ProgressDelta};

    fn stats_with(total: u64) -> TransferStats {
        let mut stats = TransferStats::new();
        stats.apply(&ProgressDelta::uniform(OutcomeKind::Inserted, total));
        stats
    }

    #[test]
    fn test_complete_summary_message() {
        let summary = TransferSummary::new(stats_with(250), 250);
        assert!(summary.is_complete());
        assert_eq!(summary.message(), "Processed 250 documents (inserted 250)");
    }

    #[test]
    fn test_interrupted_summary_message() {
        let mut summary = TransferSummary::new(stats_with(100), 400);
        summary.interrupted = true;
        assert!(!summary.is_complete());
        assert_eq!(summary.message(), "Copy cancelled: 100 of 400 documents copied");
    }

    #[test]
    fn test_with_duration() {
        let summary =
            TransferSummary::new(TransferStats::new(), 0).with_duration(Duration::from_secs(3));
        assert_eq!(summary.duration, Duration::from_secs(3));
    }

    #[test]
    fn test_with_started_at() {
        let started_at = Utc::now() - chrono::Duration::seconds(5);
        let summary = TransferSummary::new(TransferStats::new(), 0).with_started_at(started_at);
        assert_eq!(summary.started_at, started_at);
        assert!(summary.started_at <= Utc::now());
    }
}
