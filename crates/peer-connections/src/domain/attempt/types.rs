//! Outgoing attempt types.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::domain::{AttemptId, ConnectionHandle, OutgoingTarget};

/// Current state of an outgoing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "connection", rename_all = "snake_case")]
pub enum AttemptState {
    /// A connect is in flight
    Connecting,
    /// Last connect failed, retry timer armed
    WaitingRetry,
    /// Registered under this handle until it reports disconnection
    Connected(ConnectionHandle),
}

impl fmt::Display for AttemptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::WaitingRetry => write!(f, "waiting to retry"),
            Self::Connected(handle) => write!(f, "connected ({})", handle),
        }
    }
}

/// Side effect the service must perform after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptAction {
    /// Issue a connect toward the target now
    Dial,
    /// Arm the retry timer; its expiry must carry `generation` back
    ScheduleRetry {
        /// How long to wait
        delay: Duration,
        /// Tag identifying this particular timer
        generation: u64,
    },
}

/// Snapshot of an attempt for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptInfo {
    /// Attempt identity
    pub id: AttemptId,
    /// Remote endpoint being dialed
    pub target: OutgoingTarget,
    /// Current state
    pub state: AttemptState,
    /// Connects issued so far
    pub dial_count: u64,
    /// Failures since the last successful connect
    pub consecutive_failures: u32,
    /// Failures over the attempt's lifetime
    pub total_failures: u64,
    /// Reason of the most recent failed connect
    pub last_error: Option<String>,
}
