//! Outgoing attempt state machine.

use super::config::RetryPolicy;
use super::types::{AttemptAction, AttemptInfo, AttemptState};
use crate::domain::{AttemptError, AttemptId, ConnectionHandle, OutgoingTarget};

/// Retrying state machine driving one outbound connection.
///
/// The same object is reused for every reconnect toward its target.
#[derive(Debug, Clone)]
pub struct OutgoingAttempt {
    id: AttemptId,
    target: OutgoingTarget,
    policy: RetryPolicy,
    state: AttemptState,
    dial_count: u64,
    consecutive_failures: u32,
    total_failures: u64,
    last_error: Option<String>,
    /// Bumped whenever a timer is armed or cancelled
    timer_generation: u64,
}

impl OutgoingAttempt {
    /// Create an attempt in `Connecting`. Call [`Self::start`] to get the first dial.
    pub fn new(id: AttemptId, target: OutgoingTarget, policy: RetryPolicy) -> Self {
        Self {
            id,
            target,
            policy,
            state: AttemptState::Connecting,
            dial_count: 0,
            consecutive_failures: 0,
            total_failures: 0,
            last_error: None,
            timer_generation: 0,
        }
    }

    /// Initial dial issued at startup.
    pub fn start(&mut self) -> AttemptAction {
        self.state = AttemptState::Connecting;
        self.dial_count += 1;
        AttemptAction::Dial
    }

    /// Connect completed with an error: `Connecting → Failed → WaitingRetry`.
    pub fn on_connect_failed(&mut self, reason: impl Into<String>) -> Result<AttemptAction, AttemptError> {
        self.expect_connecting("connect failed")?;

        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.total_failures += 1;
        self.last_error = Some(reason.into());

        self.timer_generation += 1;
        self.state = AttemptState::WaitingRetry;
        Ok(AttemptAction::ScheduleRetry {
            delay: self.policy.delay_after(self.consecutive_failures),
            generation: self.timer_generation,
        })
    }

    /// Retry timer expired: `WaitingRetry → Connecting`.
    ///
    /// Returns `None` when the expiry belongs to a timer that has since been
    /// cancelled or superseded; such expiries are suppressed.
    pub fn on_retry_elapsed(&mut self, generation: u64) -> Option<AttemptAction> {
        if self.state != AttemptState::WaitingRetry || generation != self.timer_generation {
            return None;
        }
        self.state = AttemptState::Connecting;
        self.dial_count += 1;
        Some(AttemptAction::Dial)
    }

    /// Connect completed without error: `Connecting → Connected`.
    ///
    /// Any pending retry timer is cancelled first.
    pub fn on_connected(&mut self, handle: ConnectionHandle) -> Result<(), AttemptError> {
        self.expect_connecting("connect succeeded")?;
        self.cancel_retry();
        self.consecutive_failures = 0;
        self.state = AttemptState::Connected(handle);
        Ok(())
    }

    /// Registered connection reported disconnection: `Connected → Connecting`.
    ///
    /// Re-dial is immediate; the backoff delay only follows failed connects.
    pub fn on_disconnected(&mut self, handle: ConnectionHandle) -> Result<AttemptAction, AttemptError> {
        match self.state {
            AttemptState::Connected(current) if current == handle => {
                self.state = AttemptState::Connecting;
                self.dial_count += 1;
                Ok(AttemptAction::Dial)
            }
            state => Err(AttemptError::InvalidTransition {
                state,
                event: "disconnected",
            }),
        }
    }

    /// Invalidate any armed timer so that its expiry is ignored.
    ///
    /// Returns true if a timer was pending.
    pub fn cancel_retry(&mut self) -> bool {
        let was_pending = self.state == AttemptState::WaitingRetry;
        self.timer_generation += 1;
        was_pending
    }

    fn expect_connecting(&self, event: &'static str) -> Result<(), AttemptError> {
        if self.state == AttemptState::Connecting {
            Ok(())
        } else {
            Err(AttemptError::InvalidTransition {
                state: self.state,
                event,
            })
        }
    }

    /// Attempt identity
    pub fn id(&self) -> AttemptId {
        self.id
    }

    /// Remote endpoint
    pub fn target(&self) -> &OutgoingTarget {
        &self.target
    }

    /// Current state
    pub fn state(&self) -> AttemptState {
        self.state
    }

    /// True while a connect is in flight
    pub fn is_connecting(&self) -> bool {
        self.state == AttemptState::Connecting
    }

    /// Live connection handle while connected
    pub fn connection(&self) -> Option<ConnectionHandle> {
        match self.state {
            AttemptState::Connected(handle) => Some(handle),
            _ => None,
        }
    }

    /// Generation of the most recently armed (or cancelled) timer
    pub fn timer_generation(&self) -> u64 {
        self.timer_generation
    }

    /// Connects issued so far
    pub fn dial_count(&self) -> u64 {
        self.dial_count
    }

    /// Failures since the last successful connect
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Snapshot for status reporting
    pub fn info(&self) -> AttemptInfo {
        AttemptInfo {
            id: self.id,
            target: self.target.clone(),
            state: self.state,
            dial_count: self.dial_count,
            consecutive_failures: self.consecutive_failures,
            total_failures: self.total_failures,
            last_error: self.last_error.clone(),
        }
    }
}
