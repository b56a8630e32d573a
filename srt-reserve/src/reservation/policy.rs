//! Polling policy for the reservation loop.

use std::time::Duration;

use rand::Rng;

use super::state::LoopState;

/// How often to poll, how to retry a refresh, and when to give up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// Stop after this many inspection passes. `None` polls until booked.
    pub max_attempts: Option<u64>,

    /// Stop once this many seconds have passed. `None` polls until booked.
    pub max_duration_secs: Option<u64>,

    /// Shortest pause between passes (milliseconds).
    pub jitter_min_ms: u64,

    /// Longest pause between passes (milliseconds).
    /// The actual pause is drawn uniformly between min and max.
    pub jitter_max_ms: u64,

    /// Attempts to re-submit the search before giving up on a refresh.
    pub resubmit_attempts: u32,

    /// Fixed pause between re-submit attempts (milliseconds).
    pub resubmit_backoff_ms: u64,
}

impl PollPolicy {
    /// Stop after `attempts` inspection passes.
    pub fn with_max_attempts(mut self, attempts: u64) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Stop after `secs` seconds of polling.
    pub fn with_max_duration_secs(mut self, secs: u64) -> Self {
        self.max_duration_secs = Some(secs);
        self
    }

    /// Pause between passes, drawn from `[min_ms, max_ms]`.
    pub fn with_jitter_ms(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.jitter_min_ms = min_ms.min(max_ms);
        self.jitter_max_ms = min_ms.max(max_ms);
        self
    }

    pub fn with_resubmit(mut self, attempts: u32, backoff_ms: u64) -> Self {
        self.resubmit_attempts = attempts;
        self.resubmit_backoff_ms = backoff_ms;
        self
    }

    /// Returns the duration ceiling, if any.
    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration_secs.map(Duration::from_secs)
    }

    /// Returns the pause between re-submit attempts.
    pub fn resubmit_backoff(&self) -> Duration {
        Duration::from_millis(self.resubmit_backoff_ms)
    }

    /// Draw a pause between passes.
    ///
    /// Randomised so the polling does not run on a fixed beat.
    pub fn jitter(&self) -> Duration {
        let ms = rand::thread_rng().gen_range(self.jitter_min_ms..=self.jitter_max_ms);
        Duration::from_millis(ms)
    }

    /// Whether the loop has used up its attempts or time.
    pub fn ceiling_reached(&self, state: &LoopState) -> bool {
        let attempts_spent = self
            .max_attempts
            .is_some_and(|max| state.attempts() >= max);
        let time_spent = self
            .max_duration()
            .is_some_and(|max| state.elapsed() >= max);

        attempts_spent || time_spent
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            max_duration_secs: None,
            jitter_min_ms: 2_000,
            jitter_max_ms: 4_000,
            resubmit_attempts: 3,
            resubmit_backoff_ms: 1_000,
        }
    }
}
