//! # Driving Ports (Inbound API)
//!
//! The API the connection layer exposes to the node.

use async_trait::async_trait;

use crate::domain::{AttemptInfo, ListenSpec, ListenerInfo, ManagerSnapshot, OutgoingTarget};
use crate::service::ConnectionManagerError;

/// Primary API for driving and inspecting the connection layer.
///
/// Every call is forwarded to the single task that owns listener, attempt
/// and registry state, so callers never touch that state directly.
///
/// # Example
///
/// ```rust,ignore
/// use peer_connections::ports::ConnectionManagerApi;
///
/// async fn report<T: ConnectionManagerApi>(api: &T) {
///     let snapshot = api.snapshot().await.unwrap();
///     println!("{} live connections", snapshot.connections.len());
/// }
/// ```
#[async_trait]
pub trait ConnectionManagerApi: Send + Sync {
    /// Resolve, bind and start accepting on every spec.
    ///
    /// Specs that fail to resolve or bind are logged and skipped; the
    /// returned list holds only the listeners that came up.
    async fn start_listening(
        &self,
        specs: Vec<ListenSpec>,
    ) -> Result<Vec<ListenerInfo>, ConnectionManagerError>;

    /// Create one retrying attempt per target and issue the first connects.
    async fn start_outgoing(
        &self,
        targets: Vec<OutgoingTarget>,
    ) -> Result<Vec<AttemptInfo>, ConnectionManagerError>;

    /// Listeners, attempts and live connections at this instant.
    async fn snapshot(&self) -> Result<ManagerSnapshot, ConnectionManagerError>;

    /// Number of live registry entries.
    async fn connection_count(&self) -> Result<usize, ConnectionManagerError>;

    /// Stop the event loop and release every socket and timer.
    async fn shutdown(&self) -> Result<(), ConnectionManagerError>;
}
