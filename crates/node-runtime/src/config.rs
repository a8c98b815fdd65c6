//! # Node Configuration
//!
//! Connection settings come from an optional TOML file named by
//! `NODE_CONFIG`, then environment variables override individual values:
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `NODE_LISTEN_ENDPOINTS` | comma-separated listen endpoints |
//! | `NODE_OUTGOING_PEERS` | comma-separated outbound peers |
//! | `NODE_RETRY_DELAY_SECS` | backoff after a failed connect |
//! | `NODE_STATUS_INTERVAL_SECS` | how often status is logged (default 30) |

use std::time::Duration;

use peer_connections::{ConfigError, ConfigProvider, ConnectionManagerConfig, TomlConfigProvider};
use thiserror::Error;

/// Default interval between status reports.
pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_secs(30);

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    /// Listen endpoints, outbound peers, retry settings.
    pub connections: ConnectionManagerConfig,
    /// Interval between status reports.
    pub status_interval: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            connections: ConnectionManagerConfig::default(),
            status_interval: DEFAULT_STATUS_INTERVAL,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum NodeConfigError {
    /// Config file could not be loaded.
    #[error(transparent)]
    File(#[from] ConfigError),
    /// An environment variable held an unusable value.
    #[error("environment variable {var}=`{value}` is not a valid number of seconds")]
    InvalidSeconds {
        /// Variable name.
        var: &'static str,
        /// Value found.
        value: String,
    },
}

/// Load configuration through `lookup`, which maps a variable name to its value.
///
/// Taking the lookup as a parameter keeps the process environment out of tests.
pub fn load_config<F>(lookup: F) -> Result<NodeConfig, NodeConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = NodeConfig::default();

    if let Some(path) = lookup("NODE_CONFIG") {
        config.connections = TomlConfigProvider::load(&path)?.connection_config();
    }

    if let Some(list) = lookup("NODE_LISTEN_ENDPOINTS") {
        config.connections.listen_endpoints = split_list(&list);
    }
    if let Some(list) = lookup("NODE_OUTGOING_PEERS") {
        config.connections.outgoing_peers = split_list(&list);
    }
    if let Some(value) = lookup("NODE_RETRY_DELAY_SECS") {
        config.connections.retry_delay = parse_secs("NODE_RETRY_DELAY_SECS", value)?;
    }
    if let Some(value) = lookup("NODE_STATUS_INTERVAL_SECS") {
        config.status_interval = parse_secs("NODE_STATUS_INTERVAL_SECS", value)?;
    }

    Ok(config)
}

/// Load configuration from the process environment.
pub fn load_config_from_env() -> Result<NodeConfig, NodeConfigError> {
    load_config(|var| std::env::var(var).ok())
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

fn parse_secs(var: &'static str, value: String) -> Result<Duration, NodeConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(NodeConfigError::InvalidSeconds { var, value }),
    }
}
