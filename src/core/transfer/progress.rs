//! Shared progress state.
//!
//! The tracker is the one piece of transfer state read from two tasks at
//! once: the writer's progress callback advances it, the heartbeat task
//! polls it for idleness. It is lock-free so neither side can stall the
//! other.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

/// Callback receiving user-facing progress: a percentage in `0..=100` and
/// a one-line message.
pub type ProgressSink = Arc<dyn Fn(u8, &str) + Send + Sync>;

/// A sink that swallows progress, for callers that do not want it.
pub fn null_sink() -> ProgressSink {
    Arc::new(|_, _| {})
}

/// Transfer progress shared between the writer and the heartbeat task.
pub struct ProgressTracker {
    total: u64,
    processed: AtomicU64,
    started: Instant,
    /// Milliseconds since `started` at the last forward progress.
    last_progress_ms: AtomicU64,
}

impl ProgressTracker {
    /// Creates a tracker for a job of `total` source documents.
    pub fn new(total: u64) -> Self {
        Self {
            total,
            processed: AtomicU64::new(0),
            started: Instant::now(),
            last_progress_ms: AtomicU64::new(0),
        }
    }

    /// Records `documents` consumed and resets the idle clock.
    pub fn record(&self, documents: u64) {
        self.processed.fetch_add(documents, Ordering::Relaxed);
        self.touch();
    }

    /// Resets the idle clock without advancing the count.
    pub fn touch(&self) {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        self.last_progress_ms.store(elapsed_ms, Ordering::Relaxed);
    }

    /// Documents consumed so far.
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Total source documents the job was sized at.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Completion percentage, clamped to `0..=100`.
    ///
    /// The job size is approximate, so the processed count can overrun it;
    /// the percentage never does.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let processed = self.processed();
        ((processed * 100) / self.total).min(100) as u8
    }

    /// Time since the last forward progress (or since tracker creation).
    pub fn idle_for(&self) -> Duration {
        let now_ms = self.started.elapsed().as_millis() as u64;
        let last_ms = self.last_progress_ms.load(Ordering::Relaxed);
        Duration::from_millis(now_ms.saturating_sub(last_ms))
    }

    /// Estimated time remaining, from the average rate so far.
    ///
    /// `None` until the first documents land, and once the job is done.
    pub fn eta(&self) -> Option<Duration> {
        let processed = self.processed();
        if processed == 0 || processed >= self.total {
            return None;
        }
        let elapsed = self.started.elapsed().as_secs_f64();
        if elapsed <= 0.0 {
            return None;
        }
        let rate = processed as f64 / elapsed;
        let remaining = (self.total - processed) as f64 / rate;
        Some(Duration::from_secs_f64(remaining))
    }

    /// Renders the standard progress line, with an ETA when one is known.
    pub fn progress_message(&self) -> String {
        let mut message = format!(
            "Copied {} of {} documents ({}%)",
            self.processed(),
            self.total,
            self.percent()
        );
        if let Some(eta) = self.eta() {
            message.push_str(&format!(", about {} remaining", format_eta(eta)));
        }
        message
    }
}

fn format_eta(eta: Duration) -> String {
    let secs = eta.as_secs().max(1);
    if secs < 60 {
        format!("{secs}s")
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
