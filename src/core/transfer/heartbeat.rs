//! Long-silence heartbeat.
//!
//! Batch retries can keep the engine silent for seconds at a time (a
//! throttle backoff tops out at 6.5 seconds). The heartbeat task watches
//! the shared [`ProgressTracker`] and emits a "still copying" line once
//! the silence passes a threshold, so interactive callers know the run is
//! alive. Markers grow by one per silent second up to a cap, and the task
//! goes quiet again as soon as real progress resumes.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::core::transfer::progress::{ProgressSink, ProgressTracker};

/// Silence needed before the first heartbeat line.
pub const HEARTBEAT_IDLE_THRESHOLD: Duration = Duration::from_secs(2);

/// Marker growth stops after this many silent seconds.
pub const HEARTBEAT_MAX_MARKERS: u64 = 16;

/// Handle to a running heartbeat task.
///
/// The task is aborted on [`stop`](HeartbeatGuard::stop) and again on drop,
/// so a heartbeat can never outlive its transfer regardless of how the
/// transfer ends.
pub struct HeartbeatGuard {
    handle: JoinHandle<()>,
}

impl HeartbeatGuard {
    /// Stops the heartbeat task.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for HeartbeatGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawns the heartbeat task for a transfer.
pub fn spawn(tracker: Arc<ProgressTracker>, sink: ProgressSink) -> HeartbeatGuard {
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let idle = tracker.idle_for();
            if idle >= HEARTBEAT_IDLE_THRESHOLD {
                let markers = idle.as_secs().min(HEARTBEAT_MAX_MARKERS) as usize;
                let message = format!("Still copying{}", ".".repeat(markers));
                sink(tracker.percent(), &message);
            }
        }
    });
    HeartbeatGuard { handle }
}
