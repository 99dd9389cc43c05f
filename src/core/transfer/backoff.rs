//! Retry pacing.
//!
//! Throttle retries back off exponentially with jitter so concurrent
//! transfers against the same store do not retry in lockstep. Network
//! retries use a fixed delay: the store is not overloaded, the transport
//! hiccupped, and there is nothing to be gained from growing the wait.

use std::time::Duration;

use rand::Rng;

/// First throttle retry delay, before jitter.
pub const THROTTLE_BASE_DELAY_MS: u64 = 1000;

/// Exponential growth factor between throttle retries.
pub const THROTTLE_BACKOFF_MULTIPLIER: f64 = 1.5;

/// Cap on the throttle delay, before jitter.
pub const THROTTLE_MAX_DELAY_MS: u64 = 5000;

/// Jitter ratio applied to the capped delay: the final delay is drawn
/// uniformly from ±30% around it, so the worst case is 6.5 seconds.
pub const THROTTLE_JITTER_RATIO: f64 = 0.3;

/// Fixed wait before retrying after a transport failure.
pub const NETWORK_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Consecutive attempts that move no documents before the writer gives up.
pub const MAX_ATTEMPTS_WITHOUT_PROGRESS: u32 = 10;

/// Computes the jittered backoff delay for a throttle retry.
///
/// `attempt` is the number of consecutive no-progress attempts already
/// made, so a throttle that still moved documents backs off about one
/// second while repeated no-progress rounds grow the wait by 1.5x up to
/// the five-second cap.
pub fn throttle_delay(attempt: u32) -> Duration {
    let exponential =
        THROTTLE_BASE_DELAY_MS as f64 * THROTTLE_BACKOFF_MULTIPLIER.powi(attempt as i32);
    let capped = exponential.min(THROTTLE_MAX_DELAY_MS as f64);
    let factor = rand::thread_rng()
        .gen_range(1.0 - THROTTLE_JITTER_RATIO..=1.0 + THROTTLE_JITTER_RATIO);
    Duration::from_millis((capped * factor).round() as u64)
}
