//! Bounded waiting.
//!
//! Every "wait for element/response" point in the crate goes through
//! [`wait_for`], which gives up after a fixed timeout instead of blocking.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};

/// Default time to wait for a condition.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default interval between condition checks.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Timeout and poll interval for a bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl WaitConfig {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

/// Poll `check` until it yields a value or the timeout elapses.
///
/// The check always runs at least once. Returns `Ok(None)` on timeout and
/// stops at the first error.
pub async fn wait_for<T, E, F, Fut>(config: WaitConfig, mut check: F) -> Result<Option<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let deadline = Instant::now() + config.timeout;

    loop {
        if let Some(value) = check().await? {
            return Ok(Some(value));
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }

        sleep(config.poll_interval.min(deadline - now)).await;
    }
}
