//! # Peer Connections
//!
//! Connection establishment and maintenance for a peer-to-peer node:
//! listeners that accept inbound peers, outgoing attempts that dial
//! configured peers and retry them forever, and a registry of every live
//! connection.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture with:
//! - **Domain Layer:** Pure state (endpoints, attempt state machine, registry)
//! - **Ports Layer:** Trait definitions for external dependencies
//! - **Service Layer:** A single tokio task that owns all state and
//!   serializes every accept, connect, timer and disconnect completion
//! - **Adapters Layer:** TCP, tokio timer, system clock, TOML config
//!
//! What travels over an established connection is not this crate's
//! business. Sockets are handed to a [`ports::ConnectionFactory`], and the
//! only thing the manager needs back is a one-shot disconnect notice.
//!
//! ## Example
//!
//! ```rust,no_run
//! use peer_connections::{start, ConnectionManagerConfig, ConnectionPorts};
//! use peer_connections::ports::ConnectionManagerApi;
//!
//! # async fn run() -> Result<(), peer_connections::ConnectionManagerError> {
//! let config = ConnectionManagerConfig {
//!     listen_endpoints: vec!["0.0.0.0:9876".to_string()],
//!     outgoing_peers: vec!["127.0.0.1:6666".to_string()],
//!     ..Default::default()
//! };
//!
//! let started = start(&config, ConnectionPorts::tcp(&config)).await?;
//! let status = started.handle.snapshot().await?;
//! println!("{} live connections", status.connections.len());
//!
//! started.handle.shutdown().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Mock ports (scripted dialer, controllable connections, failing timer)
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// =============================================================================
// RE-EXPORTS
// =============================================================================

// Domain
pub use domain::{
    AttemptError, AttemptId, AttemptInfo, AttemptState, ConnectionHandle, ConnectionInfo,
    ConnectionManagerConfig, ConnectionRegistry, ConnectionRole, Endpoint, EndpointError,
    ListenSpec, ListenerId, ListenerInfo, ManagerSnapshot, OutgoingAttempt, OutgoingTarget,
    RegistryStats, RetryPolicy, Timestamp, DEFAULT_PORT, DEFAULT_RETRY_DELAY,
};

// Port traits
pub use ports::{
    ConfigProvider, ConnectionFactory, ConnectionManagerApi, Dialer, DisconnectNotice,
    DisconnectReason, PeerConnection, RetryTimer, TimeSource, TimerError,
};

// Service
pub use service::{
    start, ConnectionManager, ConnectionManagerError, ConnectionManagerHandle, ConnectionPorts,
    StartedManager,
};

// Adapters
pub use adapters::{
    ConfigError, StaticConfigProvider, SystemTimeSource, TcpConnectionFactory, TcpDialer,
    TokioRetryTimer, TomlConfigProvider,
};
