//! Connection manager configuration.
//!
//! Values arrive already loaded (see `ConfigProvider`); this type only turns
//! them into endpoints and a retry policy.

use std::time::Duration;

use super::attempt::{RetryPolicy, DEFAULT_RETRY_DELAY};
use super::endpoint::{parse_all, ListenSpec, OutgoingTarget, DEFAULT_PORT};
use super::errors::EndpointError;

/// Everything the connection manager needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionManagerConfig {
    /// Listen endpoints, `host:port` or `[ipv6]:port`
    pub listen_endpoints: Vec<String>,
    /// Outbound peers, same format
    pub outgoing_peers: Vec<String>,
    /// Port used when a value carries none
    pub default_port: u16,
    /// Fixed delay between a failed connect and the next one
    pub retry_delay: Duration,
    /// Give up on a single connect after this long (counts as a failure)
    pub connect_timeout: Option<Duration>,
}

impl Default for ConnectionManagerConfig {
    fn default() -> Self {
        Self {
            listen_endpoints: Vec::new(),
            outgoing_peers: Vec::new(),
            default_port: DEFAULT_PORT,
            retry_delay: DEFAULT_RETRY_DELAY,
            connect_timeout: None,
        }
    }
}

impl ConnectionManagerConfig {
    /// Loopback-only config with a short retry delay
    pub fn for_testing() -> Self {
        Self {
            listen_endpoints: vec!["127.0.0.1:0".to_string()],
            outgoing_peers: Vec::new(),
            default_port: DEFAULT_PORT,
            retry_delay: Duration::from_millis(50),
            connect_timeout: Some(Duration::from_secs(2)),
        }
    }

    /// Parsed listen specs plus the values that could not be parsed
    pub fn listen_specs(&self) -> (Vec<ListenSpec>, Vec<EndpointError>) {
        parse_all(self.listen_endpoints.iter().map(String::as_str), self.default_port)
    }

    /// Parsed outbound targets plus the values that could not be parsed
    pub fn outgoing_targets(&self) -> (Vec<OutgoingTarget>, Vec<EndpointError>) {
        parse_all(self.outgoing_peers.iter().map(String::as_str), self.default_port)
    }

    /// Retry policy shared by every outgoing attempt
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(self.retry_delay)
    }
}
