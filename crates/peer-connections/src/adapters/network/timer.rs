use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::ports::{RetryTimer, TimerError};

/// Retry timer backed by `tokio::time::sleep`.
///
/// Reports [`TimerError::FiredEarly`] if the runtime wakes it before the
/// deadline, which only happens when the clock itself misbehaves.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioRetryTimer;

impl TokioRetryTimer {
    /// Create a new timer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RetryTimer for TokioRetryTimer {
    async fn wait(&self, delay: Duration) -> Result<(), TimerError> {
        let started = Instant::now();
        tokio::time::sleep(delay).await;

        let elapsed = started.elapsed();
        if elapsed < delay {
            return Err(TimerError::FiredEarly {
                expected: delay,
                elapsed,
            });
        }
        Ok(())
    }
}
