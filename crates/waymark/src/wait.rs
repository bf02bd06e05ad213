//! Polling waits for page conditions.
//!
//! Network synchronization goes through aliases; this module covers the
//! other half, where a scenario waits for the DOM to reflect something
//! (a validation alert rendering after a 400, a form clearing after
//! Cancel). Conditions are async and polled at a fixed interval until
//! they hold or the timeout elapses.

use crate::result::{WaymarkError, WaymarkResult};
use std::future::Future;
use std::time::{Duration, Instant};

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: crate::config::DEFAULT_COMMAND_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options bounded by `timeout`
    #[must_use]
    pub fn within(timeout: Duration) -> Self {
        Self::default().with_timeout(timeout.as_millis() as u64)
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Result of a successful wait
#[derive(Debug, Clone)]
pub struct WaitResult {
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of times the condition was checked
    pub attempts: u32,
    /// Description of what was waited for
    pub waited_for: String,
}

/// Poll `condition` until it yields `true`.
///
/// The condition is always checked at least once, even with a zero
/// timeout. Errors raised by the condition abort the wait immediately.
pub async fn poll_until<F, Fut>(
    description: &str,
    options: WaitOptions,
    mut condition: F,
) -> WaymarkResult<WaitResult>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = WaymarkResult<bool>>,
{
    let start = Instant::now();
    let timeout = options.timeout();
    let mut attempts = 0;

    loop {
        attempts += 1;
        if condition().await? {
            return Ok(WaitResult {
                elapsed: start.elapsed(),
                attempts,
                waited_for: description.to_string(),
            });
        }
        if start.elapsed() >= timeout {
            break;
        }
        tokio::time::sleep(options.poll_interval()).await;
    }

    tracing::warn!(
        condition = description,
        timeout_ms = options.timeout_ms,
        attempts,
        "condition never held"
    );
    Err(WaymarkError::ConditionTimeout {
        condition: description.to_string(),
        ms: options.timeout_ms,
    })
}
