//! Connection registry implementation.

use std::collections::HashMap;
use std::net::SocketAddr;

use super::types::{ConnectionInfo, RegisteredConnection, RegistryStats};
use crate::domain::{AttemptId, ConnectionHandle, ConnectionRole, Timestamp};

/// Live connections keyed by stable handle.
#[derive(Debug)]
pub struct ConnectionRegistry<C> {
    entries: HashMap<ConnectionHandle, RegisteredConnection<C>>,
    next_handle: u64,
    total_removed: u64,
}

impl<C> Default for ConnectionRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> ConnectionRegistry<C> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_handle: 1,
            total_removed: 0,
        }
    }

    /// Register an established connection and return its handle.
    pub fn register(
        &mut self,
        role: ConnectionRole,
        peer_addr: Option<SocketAddr>,
        local_addr: Option<SocketAddr>,
        established_at: Timestamp,
        resource: C,
    ) -> ConnectionHandle {
        let handle = ConnectionHandle::new(self.next_handle);
        self.next_handle += 1;

        let info = ConnectionInfo {
            handle,
            role,
            peer_addr,
            local_addr,
            established_at,
        };
        self.entries.insert(handle, RegisteredConnection { info, resource });
        handle
    }

    /// Remove an entry. Removing an absent handle returns `None`.
    pub fn remove(&mut self, handle: ConnectionHandle) -> Option<RegisteredConnection<C>> {
        let removed = self.entries.remove(&handle);
        if removed.is_some() {
            self.total_removed += 1;
        }
        removed
    }

    /// Get an entry
    pub fn get(&self, handle: ConnectionHandle) -> Option<&RegisteredConnection<C>> {
        self.entries.get(&handle)
    }

    /// Get a mutable entry
    pub fn get_mut(&mut self, handle: ConnectionHandle) -> Option<&mut RegisteredConnection<C>> {
        self.entries.get_mut(&handle)
    }

    /// Check whether a handle is live
    pub fn contains(&self, handle: ConnectionHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Live inbound entries
    pub fn inbound_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| !e.info.role.is_outbound())
            .count()
    }

    /// Live outbound entries
    pub fn outbound_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.info.role.is_outbound())
            .count()
    }

    /// Live entries dialed by `attempt`
    pub fn outbound_for(&self, attempt: AttemptId) -> Vec<ConnectionHandle> {
        let mut handles: Vec<_> = self
            .entries
            .values()
            .filter(|e| e.info.role.attempt() == Some(attempt))
            .map(|e| e.info.handle)
            .collect();
        handles.sort();
        handles
    }

    /// Public info of every live entry, ordered by handle
    pub fn snapshot(&self) -> Vec<ConnectionInfo> {
        let mut infos: Vec<_> = self.entries.values().map(|e| e.info.clone()).collect();
        infos.sort_by_key(|info| info.handle);
        infos
    }

    /// Remove every entry, e.g. on shutdown
    pub fn drain(&mut self) -> Vec<RegisteredConnection<C>> {
        let drained: Vec<_> = self.entries.drain().map(|(_, entry)| entry).collect();
        self.total_removed += drained.len() as u64;
        drained
    }

    /// Get statistics
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            live: self.len(),
            inbound: self.inbound_count(),
            outbound: self.outbound_count(),
            total_registered: self.next_handle - 1,
            total_removed: self.total_removed,
        }
    }
}
