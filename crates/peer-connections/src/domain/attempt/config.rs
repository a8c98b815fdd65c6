//! Retry policy configuration.

use std::time::Duration;

/// Delay between a failed connect and the next one.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Fixed-delay, unlimited retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay armed after every failed connect
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Policy with a custom delay
    pub fn fixed(delay: Duration) -> Self {
        Self { delay }
    }

    /// Delay before the next dial. Independent of how many failures came before.
    pub fn delay_after(&self, _consecutive_failures: u32) -> Duration {
        self.delay
    }
}
