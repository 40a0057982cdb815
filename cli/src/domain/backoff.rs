//! Poll backoff schedule.
//!
//! The first re-poll waits a fixed [`FIRST_RETRY_DELAY`]. Later attempts use
//! capped exponential growth with equal jitter: the delay is half the capped
//! value plus a random share of the other half.

use std::time::Duration;

use rand::Rng;

/// Delay before the second poll of an operation.
pub const FIRST_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Upper bound of the exponential term, in milliseconds.
pub const MAX_SLEEP_MS: u64 = 5000;

/// Backoff state scoped to a single poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffState {
    attempt: u32,
    polling_interval: Duration,
}

impl BackoffState {
    #[must_use]
    pub fn new(polling_interval: Duration) -> Self {
        Self {
            attempt: 0,
            polling_interval,
        }
    }

    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Returns the delay before the next poll and advances the attempt.
    pub fn next_delay<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Duration {
        let attempt = self.attempt;
        self.attempt = self.attempt.saturating_add(1);
        if attempt == 0 {
            return FIRST_RETRY_DELAY;
        }
        let temp = capped_exponential_ms(self.polling_interval, attempt);
        let half = temp / 2;
        Duration::from_millis(half + rng.random_range(0..=half))
    }
}

/// `min(MAX_SLEEP_MS, base_ms * 2^attempt)` with saturating arithmetic.
#[must_use]
pub fn capped_exponential_ms(polling_interval: Duration, attempt: u32) -> u64 {
    let base_ms = u64::try_from(polling_interval.as_millis()).unwrap_or(u64::MAX);
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    base_ms.saturating_mul(factor).min(MAX_SLEEP_MS)
}
