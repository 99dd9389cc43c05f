//! Transfer statistics.
//!
//! [`TransferStats`] is the single accounting record for a transfer run.
//! It accumulates [`ProgressDelta`] values emitted by the batch writer and
//! renders the human-readable completion summary. Every error that escapes
//! the engine carries a snapshot of these statistics so callers can always
//! report how far the transfer got.

use serde::{Deserialize, Serialize};

/// How a batch of documents landed in the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    /// Inserted as new documents.
    Inserted,
    /// Dropped because a document with the same identifier already existed.
    Skipped,
    /// Replaced an existing document with the same identifier.
    Replaced,
    /// Inserted under a freshly generated identifier.
    Created,
}

/// Incremental progress from one successful write round.
///
/// `documents` is the number of source documents consumed by the round; the
/// remaining fields break that number down by outcome. A delta from an
/// insert round has `documents == inserted`; a skip round splits between
/// `inserted` and `skipped`; an overwrite round splits between `replaced`
/// and `created`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressDelta {
    /// Source documents consumed by this round.
    pub documents: u64,
    /// Documents inserted as new.
    pub inserted: u64,
    /// Documents skipped due to identifier conflicts.
    pub skipped: u64,
    /// Documents that replaced an existing target document.
    pub replaced: u64,
    /// Documents stored under a freshly generated identifier.
    pub created: u64,
}

impl ProgressDelta {
    /// A delta attributing every consumed document to a single outcome.
    pub fn uniform(kind: OutcomeKind, documents: u64) -> Self {
        let mut delta = Self {
            documents,
            ..Self::default()
        };
        match kind {
            OutcomeKind::Inserted => delta.inserted = documents,
            OutcomeKind::Skipped => delta.skipped = documents,
            OutcomeKind::Replaced => delta.replaced = documents,
            OutcomeKind::Created => delta.created = documents,
        }
        delta
    }
}

/// Cumulative statistics for a transfer run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferStats {
    /// Total source documents consumed.
    pub total_processed: u64,
    /// Documents inserted as new.
    pub inserted: u64,
    /// Documents skipped due to identifier conflicts.
    pub skipped: u64,
    /// Documents that replaced an existing target document.
    pub replaced: u64,
    /// Documents stored under a freshly generated identifier.
    pub created: u64,
    /// Write rounds that consumed their entire in-flight slice.
    pub flush_count: u64,
}

impl TransferStats {
    /// Empty statistics for a run that has not processed anything yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one progress delta into the totals.
    pub fn apply(&mut self, delta: &ProgressDelta) {
        self.total_processed += delta.documents;
        self.inserted += delta.inserted;
        self.skipped += delta.skipped;
        self.replaced += delta.replaced;
        self.created += delta.created;
    }

    /// Records a write round that consumed its entire in-flight slice.
    pub fn note_flush(&mut self) {
        self.flush_count += 1;
    }

    /// True when nothing has been processed.
    pub fn is_empty(&self) -> bool {
        self.total_processed == 0
    }

    /// Renders the completion summary, listing only non-zero outcome
    /// categories.
    ///
    /// Examples: `Processed 250 documents (inserted 240, skipped 10)`,
    /// `Processed 0 documents`.
    pub fn summary_message(&self) -> String {
        let mut parts = Vec::new();
        if self.inserted > 0 {
            parts.push(format!("inserted {}", self.inserted));
        }
        if self.skipped > 0 {
            parts.push(format!("skipped {}", self.skipped));
        }
        if self.replaced > 0 {
            parts.push(format!("replaced {}", self.replaced));
        }
        if self.created > 0 {
            parts.push(format!("created {}", self.created));
        }

        let noun = if self.total_processed == 1 {
            "document"
        } else {
            "documents"
        };
        if parts.is_empty() {
            format!("Processed {} {}", self.total_processed, noun)
        } else {
            format!(
                "Processed {} {} ({})",
                self.total_processed,
                noun,
                parts.join(", ")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_accumulates() {
        let mut stats = TransferStats::new();
        stats.apply(&ProgressDelta::uniform(OutcomeKind::Inserted, 100));
        stats.apply(&ProgressDelta {
            documents: 50,
            inserted: 40,
            skipped: 10,
            ..ProgressDelta::default()
        });
        assert_eq!(stats.total_processed, 150);
        assert_eq!(stats.inserted, 140);
        assert_eq!(stats.skipped, 10);
        assert_eq!(stats.replaced, 0);
    }

    #[test]
    fn test_summary_lists_only_nonzero_categories() {
        let mut stats = TransferStats::new();
        stats.apply(&ProgressDelta {
            documents: 250,
            inserted: 240,
            skipped: 10,
            ..ProgressDelta::default()
        });
        assert_eq!(
            stats.summary_message(),
            "Processed 250 documents (inserted 240, skipped 10)"
        );
    }

    #[test]
    fn test_summary_for_empty_run() {
        let stats = TransferStats::new();
        assert_eq!(stats.summary_message(), "Processed 0 documents");
        assert!(stats.is_empty());
    }

    #[test]
    fn test_summary_singular_document() {
        let mut stats = TransferStats::new();
        stats.apply(&ProgressDelta::uniform(OutcomeKind::Created, 1));
        assert_eq!(stats.summary_message(), "Processed 1 document (created 1)");
    }

    #[test]
    fn test_uniform_delta_assigns_single_category() {
        let delta = ProgressDelta::uniform(OutcomeKind::Replaced, 7);
        assert_eq!(delta.documents, 7);
        assert_eq!(delta.replaced, 7);
        assert_eq!(delta.inserted, 0);
    }

    #[test]
    fn test_flush_count_tracks_rounds() {
        let mut stats = TransferStats::new();
        stats.note_flush();
        stats.note_flush();
        assert_eq!(stats.flush_count, 2);
    }
}
