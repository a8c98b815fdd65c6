//! Listener records.
//!
//! A listener exists only for specs that resolved and bound; a failing spec
//! leaves no record behind. Inbound peer addresses are not checked against
//! any allowed range here. Access control belongs to a separate layer.

use std::net::SocketAddr;

use serde::Serialize;

use super::{ListenSpec, ListenerId};

/// A bound listener, kept for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListenerInfo {
    /// Listener identity
    pub id: ListenerId,
    /// Configured endpoint
    pub spec: ListenSpec,
    /// Address actually bound (resolves port 0)
    pub local_addr: SocketAddr,
    /// Connections accepted so far
    pub accepted: u64,
}

impl ListenerInfo {
    /// Record for a freshly bound listener
    pub fn new(id: ListenerId, spec: ListenSpec, local_addr: SocketAddr) -> Self {
        Self {
            id,
            spec,
            local_addr,
            accepted: 0,
        }
    }

    /// Count one accepted connection
    pub fn record_accept(&mut self) {
        self.accepted = self.accepted.saturating_add(1);
    }
}
