//! Value Objects for Peer Connections
//!
//! Stable identities handed out by the domain. None of them is ever
//! reused for the lifetime of the process, so a handle captured by a
//! pending callback can never alias a newer entry.

use std::fmt;

use serde::Serialize;

/// Identity of a live registry entry.
///
/// Backed by a monotonically increasing counter; removing one entry
/// never changes the handle of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ConnectionHandle(u64);

impl ConnectionHandle {
    /// Wrap a raw handle value
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw handle value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

/// Identity of a bound listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ListenerId(u32);

impl ListenerId {
    /// Wrap a raw listener index
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw listener index
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Identity of an outgoing attempt (one per configured target).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AttemptId(u32);

impl AttemptId {
    /// Wrap a raw attempt index
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw attempt index
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempt#{}", self.0)
    }
}

/// Which side opened a registered connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "direction", rename_all = "snake_case")]
pub enum ConnectionRole {
    /// Accepted by one of our listeners
    Inbound {
        /// Listener that accepted the socket
        listener: ListenerId,
    },
    /// Dialed by one of our outgoing attempts
    Outbound {
        /// Attempt to re-dial once this connection drops
        attempt: AttemptId,
    },
}

impl ConnectionRole {
    /// True for connections we dialed
    pub fn is_outbound(&self) -> bool {
        matches!(self, Self::Outbound { .. })
    }

    /// Correlated attempt, if outbound
    pub fn attempt(&self) -> Option<AttemptId> {
        match self {
            Self::Outbound { attempt } => Some(*attempt),
            Self::Inbound { .. } => None,
        }
    }
}

/// Unix timestamp in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create a new timestamp
    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Seconds since the Unix epoch
    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Seconds elapsed between `self` and a later timestamp
    pub fn elapsed_until(&self, later: Timestamp) -> u64 {
        later.0.saturating_sub(self.0)
    }
}
