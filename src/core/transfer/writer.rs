//! Adaptive batch writer.
//!
//! The writer pulls documents from a source stream, stages them into an
//! adaptive batch, and lands each batch in the target with retries. Batch
//! size adapts to what the store will take: full unthrottled success grows
//! it gently, a throttled partial write snaps it down to the count the
//! store actually confirmed. Identifier conflicts are resolved by the
//! configured [`ConflictPolicy`]; transport errors retry on a fixed delay.
//! Ten consecutive attempts that land nothing end the transfer.
//!
//! The stream is only pulled while staging the next batch, so a slow
//! target naturally stops the reader from racing ahead.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde_json::Value;
use tokio::sync::watch;

use crate::adapters::traits::{DocumentStream, TargetCollection, WriteOutcome};
use crate::core::transfer::backoff::{
    throttle_delay, MAX_ATTEMPTS_WITHOUT_PROGRESS, NETWORK_RETRY_DELAY,
};
use crate::core::transfer::classify::{classify, ErrorClass};
use crate::core::transfer::policy::ConflictPolicy;
use crate::domain::document::{display_id, DocumentRecord};
use crate::domain::errors::{StoreError, TransferError};
use crate::domain::stats::{OutcomeKind, ProgressDelta, TransferStats};

/// Batch size every transfer starts from.
pub const INITIAL_BATCH_SIZE: usize = 100;

/// Lower bound on the adaptive batch size.
pub const MIN_BATCH_SIZE: usize = 1;

/// Upper bound on the adaptive batch size.
pub const MAX_BATCH_SIZE: usize = 1000;

/// Growth factor applied after a fully successful, unthrottled batch.
pub const BATCH_GROWTH_FACTOR: f64 = 1.1;

/// Callback receiving one [`ProgressDelta`] per consumed slice.
pub type OnDelta = dyn Fn(ProgressDelta) + Send + Sync;

/// A staged document: the prepared body plus the source identifier kept
/// for error reporting.
struct PendingDocument {
    source_id: Option<Value>,
    body: Value,
}

/// Writes a document stream into a target collection in adaptive batches.
pub struct BatchWriter {
    target: Arc<dyn TargetCollection>,
    policy: ConflictPolicy,
    dry_run: bool,
    batch_size: usize,
    pending: VecDeque<PendingDocument>,
    stats: TransferStats,
    attempts_without_progress: u32,
}

impl BatchWriter {
    /// Creates a writer for `target` under the given conflict policy.
    pub fn new(target: Arc<dyn TargetCollection>, policy: ConflictPolicy) -> Self {
        Self {
            target,
            policy,
            dry_run: false,
            batch_size: INITIAL_BATCH_SIZE,
            pending: VecDeque::new(),
            stats: TransferStats::new(),
            attempts_without_progress: 0,
        }
    }

    /// Skips store writes, synthesizing success for every batch.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Current adaptive batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Statistics accumulated so far.
    pub fn stats(&self) -> &TransferStats {
        &self.stats
    }

    /// Drains the stream into the target, returning the final statistics.
    ///
    /// `on_progress` fires once per consumed slice, immediately after the
    /// store confirms it. `cancel` is observed between stream pulls, write
    /// rounds, and retry waits; on cancellation the method returns
    /// [`TransferError::Cancelled`] with the statistics accumulated so
    /// far, and nothing staged but unwritten is submitted.
    pub async fn write_documents(
        &mut self,
        documents: DocumentStream,
        on_progress: &OnDelta,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<TransferStats, TransferError> {
        let mut documents = documents.fuse();
        loop {
            if *cancel.borrow() {
                return Err(self.cancelled());
            }
            // Stage up to one batch; the reader is not pulled again until
            // this batch has been consumed.
            while self.pending.len() < self.batch_size {
                match documents.next().await {
                    Some(Ok(record)) => self.stage(record),
                    Some(Err(err)) => {
                        return Err(TransferError::Fatal {
                            message: format!("source stream failed: {err}"),
                            stats: self.stats.clone(),
                        });
                    }
                    None => break,
                }
                if *cancel.borrow() {
                    return Err(self.cancelled());
                }
            }
            if self.pending.is_empty() {
                break;
            }
            self.flush_round(on_progress, &mut cancel).await?;
        }
        Ok(self.stats.clone())
    }

    fn stage(&mut self, record: DocumentRecord) {
        let source_id = record.id().cloned();
        let body = self.policy.prepare(record.into_body());
        self.pending.push_back(PendingDocument { source_id, body });
    }

    /// Lands one slice of staged documents, retrying until the store takes
    /// it, the conflict policy resolves it, or the attempt budget runs out.
    async fn flush_round(
        &mut self,
        on_progress: &OnDelta,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<(), TransferError> {
        let mut in_flight = self.batch_size.min(self.pending.len());
        let mut throttled = false;

        loop {
            if *cancel.borrow() {
                return Err(self.cancelled());
            }

            let slice: Vec<Value> = self
                .pending
                .iter()
                .take(in_flight)
                .map(|doc| doc.body.clone())
                .collect();

            let err = match self.submit(&slice).await {
                Ok(outcome) => {
                    let delta = self.success_delta(in_flight as u64, &outcome);
                    self.consume(in_flight, delta, on_progress);
                    self.stats.note_flush();
                    self.attempts_without_progress = 0;
                    if !throttled {
                        self.grow_batch_size();
                    }
                    return Ok(());
                }
                Err(err) => err,
            };

            match classify(&err) {
                ErrorClass::Throttle => {
                    throttled = true;
                    let written = (err.applied as usize).min(in_flight);
                    if written > 0 {
                        // The store told us its comfortable size; adopt it.
                        let delta = self.partial_delta(written as u64);
                        self.consume(written, delta, on_progress);
                        self.batch_size = written.clamp(MIN_BATCH_SIZE, MAX_BATCH_SIZE);
                        self.attempts_without_progress = 0;
                        tracing::warn!(
                            applied = written,
                            batch_size = self.batch_size,
                            "throttled mid-batch, adopting confirmed count as batch size"
                        );
                        self.wait(throttle_delay(self.attempts_without_progress), cancel)
                            .await?;
                        return Ok(());
                    }
                    in_flight = (in_flight / 2).max(MIN_BATCH_SIZE);
                    self.bump_attempts(&err)?;
                    tracing::warn!(
                        in_flight,
                        attempts = self.attempts_without_progress,
                        "throttled with no progress, halving in-flight slice"
                    );
                    self.wait(throttle_delay(self.attempts_without_progress), cancel)
                        .await?;
                }
                ErrorClass::Conflict => {
                    return self.resolve_conflict(err, in_flight, on_progress).await;
                }
                ErrorClass::Network => {
                    self.bump_attempts(&err)?;
                    tracing::warn!(
                        attempts = self.attempts_without_progress,
                        error = %err,
                        "transport error, retrying after fixed delay"
                    );
                    self.wait(NETWORK_RETRY_DELAY, cancel).await?;
                }
                ErrorClass::Other => {
                    return Err(TransferError::Fatal {
                        message: err.to_string(),
                        stats: self.stats.clone(),
                    });
                }
            }
        }
    }

    /// Applies the conflict policy to a duplicate-identifier failure.
    async fn resolve_conflict(
        &mut self,
        err: StoreError,
        in_flight: usize,
        on_progress: &OnDelta,
    ) -> Result<(), TransferError> {
        let written = (err.applied as usize).min(in_flight);

        if self.policy.halts_on_conflict() {
            // Ordered write: everything before the duplicate landed and
            // counts; the duplicate itself ends the run.
            let (id, message) = self.conflict_detail(&err);
            if written > 0 {
                let delta = self.partial_delta(written as u64);
                self.consume(written, delta, on_progress);
            }
            tracing::warn!(id = %id, "duplicate id in target, aborting per policy");
            return Err(TransferError::Conflict {
                id,
                message,
                stats: self.stats.clone(),
            });
        }

        if self.policy.uses_upsert() {
            // The store rejected replace-with-upsert as a duplicate, so it
            // lacks atomic upsert. Credit what it confirmed and land the
            // rest as delete-then-insert.
            if written > 0 {
                let delta = self.partial_delta(written as u64);
                self.consume(written, delta, on_progress);
            }
            let rest = in_flight - written;
            if rest > 0 {
                let slice: Vec<Value> = self
                    .pending
                    .iter()
                    .take(rest)
                    .map(|doc| doc.body.clone())
                    .collect();
                tracing::debug!(count = rest, "falling back to delete-then-insert");
                let outcome =
                    self.target
                        .delete_then_insert(&slice)
                        .await
                        .map_err(|fallback_err| TransferError::Fatal {
                            message: format!("overwrite fallback failed: {fallback_err}"),
                            stats: self.stats.clone(),
                        })?;
                let delta = ProgressDelta {
                    documents: rest as u64,
                    inserted: outcome.inserted,
                    replaced: outcome.replaced,
                    created: outcome.created,
                    skipped: 0,
                };
                self.consume(rest, delta, on_progress);
            }
            self.stats.note_flush();
            self.attempts_without_progress = 0;
            return Ok(());
        }

        // Unordered insert: every document was attempted, conflicts are
        // absorbed as skips and the rest landed.
        let landed = written as u64;
        let slice_len = in_flight as u64;
        let mut delta = ProgressDelta {
            documents: slice_len,
            skipped: slice_len - landed,
            ..ProgressDelta::default()
        };
        match self.policy.success_kind() {
            OutcomeKind::Created => delta.created = landed,
            _ => delta.inserted = landed,
        }
        tracing::debug!(
            landed,
            skipped = delta.skipped,
            "duplicates absorbed per policy"
        );
        self.consume(in_flight, delta, on_progress);
        self.stats.note_flush();
        self.attempts_without_progress = 0;
        Ok(())
    }

    /// Submits one slice with the policy's write primitive.
    async fn submit(&self, documents: &[Value]) -> Result<WriteOutcome, StoreError> {
        if self.dry_run {
            return Ok(self.dry_run_outcome(documents.len() as u64));
        }
        if self.policy.uses_upsert() {
            self.target.replace_upsert(documents).await
        } else {
            self.target
                .insert_many(documents, self.policy.ordered_writes())
                .await
        }
    }

    fn dry_run_outcome(&self, count: u64) -> WriteOutcome {
        match self.policy.success_kind() {
            OutcomeKind::Replaced => WriteOutcome {
                replaced: count,
                ..WriteOutcome::default()
            },
            OutcomeKind::Created => WriteOutcome {
                created: count,
                ..WriteOutcome::default()
            },
            _ => WriteOutcome {
                inserted: count,
                ..WriteOutcome::default()
            },
        }
    }

    /// Delta for a fully successful round of `documents` documents.
    fn success_delta(&self, documents: u64, outcome: &WriteOutcome) -> ProgressDelta {
        if self.policy.uses_upsert() {
            ProgressDelta {
                documents,
                inserted: outcome.inserted,
                replaced: outcome.replaced,
                created: outcome.created,
                skipped: 0,
            }
        } else {
            ProgressDelta::uniform(self.policy.success_kind(), documents)
        }
    }

    /// Delta for a store-confirmed partial write of `documents` documents.
    ///
    /// The store does not break a partial count down by outcome, so upsert
    /// partials are attributed to `replaced`.
    fn partial_delta(&self, documents: u64) -> ProgressDelta {
        if self.policy.uses_upsert() {
            ProgressDelta::uniform(OutcomeKind::Replaced, documents)
        } else {
            ProgressDelta::uniform(self.policy.success_kind(), documents)
        }
    }

    /// Drops `count` staged documents, folds the delta into the running
    /// statistics, and reports it.
    fn consume(&mut self, count: usize, delta: ProgressDelta, on_progress: &OnDelta) {
        self.pending.drain(..count);
        self.stats.apply(&delta);
        on_progress(delta);
    }

    fn grow_batch_size(&mut self) {
        let grown = (self.batch_size as f64 * BATCH_GROWTH_FACTOR).round() as usize;
        let next = grown.min(MAX_BATCH_SIZE);
        if next != self.batch_size {
            tracing::debug!(from = self.batch_size, to = next, "growing batch size");
            self.batch_size = next;
        }
    }

    /// Counts one attempt that landed nothing; errors once the budget is
    /// spent.
    fn bump_attempts(&mut self, err: &StoreError) -> Result<(), TransferError> {
        self.attempts_without_progress += 1;
        if self.attempts_without_progress >= MAX_ATTEMPTS_WITHOUT_PROGRESS {
            return Err(TransferError::RetriesExhausted {
                attempts: self.attempts_without_progress,
                message: err.to_string(),
                stats: self.stats.clone(),
            });
        }
        Ok(())
    }

    /// Identifier and message of the first conflicting document, resolved
    /// against the staged batch when the store did not echo the id.
    ///
    /// Must run before the partial write is consumed: failure indexes
    /// refer to the submitted slice, which lines up with `pending` until
    /// then.
    fn conflict_detail(&self, err: &StoreError) -> (String, String) {
        match err.first_failure() {
            Some(failure) => {
                let id = failure.id.clone().unwrap_or_else(|| {
                    self.pending
                        .get(failure.index)
                        .map(|doc| display_id(doc.source_id.as_ref()))
                        .unwrap_or_else(|| "<unknown>".to_string())
                });
                (id, failure.message.clone())
            }
            None => ("<unknown>".to_string(), err.message.clone()),
        }
    }

    fn cancelled(&self) -> TransferError {
        TransferError::Cancelled {
            stats: self.stats.clone(),
        }
    }

    /// Sleeps for `delay` unless cancellation arrives first.
    async fn wait(
        &self,
        delay: Duration,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<(), TransferError> {
        if *cancel.borrow() {
            return Err(self.cancelled());
        }
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = sleep.as_mut() => return Ok(()),
                changed = cancel.changed() => match changed {
                    Ok(()) => {
                        if *cancel.borrow() {
                            return Err(self.cancelled());
                        }
                    }
                    Err(_) => {
                        // Sender gone: nobody can cancel us any more.
                        sleep.as_mut().await;
                        return Ok(());
                    }
                }
            }
        }
    }
}
