//! # Connection Registry
//!
//! The live set of established peer connections, inbound and outbound
//! together.
//!
//! ## Identity Stability
//!
//! Entries are keyed by [`ConnectionHandle`], a counter that is never
//! reused. Callbacks scheduled for one entry hold only its handle, so
//! removing any other entry cannot invalidate or shift them, and a late
//! removal for an entry that is already gone is a harmless no-op.
//!
//! The registry is generic over the resource it keeps alive for each entry
//! (the connection collaborator and its disconnect subscription in the
//! service), which keeps this module free of I/O.

mod manager;
mod types;

pub use manager::ConnectionRegistry;
pub use types::{ConnectionInfo, RegisteredConnection, RegistryStats};

#[cfg(test)]
mod tests;
