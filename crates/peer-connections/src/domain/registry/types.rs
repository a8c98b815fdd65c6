//! Connection registry types.

use std::net::SocketAddr;

use serde::Serialize;

use crate::domain::{ConnectionHandle, ConnectionRole, Timestamp};

/// Public description of a registered connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionInfo {
    /// Stable identity
    pub handle: ConnectionHandle,
    /// Inbound (with listener) or outbound (with attempt)
    pub role: ConnectionRole,
    /// Remote address, when the socket could report it
    pub peer_addr: Option<SocketAddr>,
    /// Local address, when the socket could report it
    pub local_addr: Option<SocketAddr>,
    /// When the connection was registered
    pub established_at: Timestamp,
}

/// A registry entry: public info plus the resource kept alive with it.
#[derive(Debug)]
pub struct RegisteredConnection<C> {
    /// Public description
    pub info: ConnectionInfo,
    /// Owned resource, released together with the entry
    pub resource: C,
}

/// Registry statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    /// Entries currently live
    pub live: usize,
    /// Live inbound entries
    pub inbound: usize,
    /// Live outbound entries
    pub outbound: usize,
    /// Entries ever registered
    pub total_registered: u64,
    /// Entries ever removed
    pub total_removed: u64,
}
