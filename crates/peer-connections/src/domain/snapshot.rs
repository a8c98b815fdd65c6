//! Point-in-time view of the whole connection layer, for status reporting.

use serde::Serialize;

use super::{AttemptId, AttemptInfo, AttemptState, ConnectionInfo, ListenerInfo, RegistryStats};

/// Listeners, attempts and live connections at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagerSnapshot {
    /// Bound listeners
    pub listeners: Vec<ListenerInfo>,
    /// Outgoing attempts, one per target
    pub attempts: Vec<AttemptInfo>,
    /// Live registry entries, ordered by handle
    pub connections: Vec<ConnectionInfo>,
    /// Registry counters
    pub stats: RegistryStats,
}

impl ManagerSnapshot {
    /// Attempts for which the "exactly one of connecting, waiting to retry,
    /// one live outbound connection" rule does not hold.
    pub fn attempt_invariant_violations(&self) -> Vec<AttemptId> {
        self.attempts
            .iter()
            .filter(|attempt| !self.attempt_is_consistent(attempt))
            .map(|attempt| attempt.id)
            .collect()
    }

    /// True when every attempt satisfies the one-of rule
    pub fn check_attempt_invariant(&self) -> bool {
        self.attempt_invariant_violations().is_empty()
    }

    fn attempt_is_consistent(&self, attempt: &AttemptInfo) -> bool {
        let live: Vec<_> = self
            .connections
            .iter()
            .filter(|c| c.role.attempt() == Some(attempt.id))
            .map(|c| c.handle)
            .collect();

        match attempt.state {
            AttemptState::Connecting | AttemptState::WaitingRetry => live.is_empty(),
            AttemptState::Connected(handle) => live == [handle],
        }
    }

    /// Live inbound connections
    pub fn inbound_count(&self) -> usize {
        self.stats.inbound
    }

    /// Live outbound connections
    pub fn outbound_count(&self) -> usize {
        self.stats.outbound
    }

    /// Attempt by identity
    pub fn attempt(&self, id: AttemptId) -> Option<&AttemptInfo> {
        self.attempts.iter().find(|a| a.id == id)
    }
}
