//! # Network Adapters
//!
//! Production implementations of the driven ports.
//!
//! ## Adapters Provided
//!
//! - `TcpDialer` - outbound connects with an optional timeout
//! - `TcpConnectionFactory` - minimal connection collaborator over `TcpStream`
//! - `TokioRetryTimer` - backoff delay on the tokio clock
//! - `SystemTimeSource` - registry timestamps from the system clock
//! - `StaticConfigProvider` / `TomlConfigProvider` - configuration loading

// Semantic submodules
/// Configuration providers
pub mod config;
/// Connection collaborator
pub mod connection;
/// Outbound connects
pub mod dialer;
/// Time source adapters
pub mod time;
/// Retry timer adapters
pub mod timer;

use std::sync::Arc;

// Re-export public API
pub use config::{ConfigError, StaticConfigProvider, TomlConfigProvider};
pub use connection::{TcpConnectionFactory, TcpPeerConnection};
pub use dialer::TcpDialer;
pub use time::SystemTimeSource;
pub use timer::TokioRetryTimer;

use crate::domain::ConnectionManagerConfig;
use crate::service::ConnectionPorts;

impl ConnectionPorts {
    /// Production ports: real TCP, tokio timers, system clock.
    pub fn tcp(config: &ConnectionManagerConfig) -> Self {
        Self {
            dialer: Arc::new(TcpDialer::new().with_connect_timeout(config.connect_timeout)),
            connections: Arc::new(TcpConnectionFactory::new()),
            retry_timer: Arc::new(TokioRetryTimer::new()),
            time_source: Arc::new(SystemTimeSource::new()),
        }
    }
}
