use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::ConnectionManagerConfig;
use crate::ports::ConfigProvider;

// ============================================================================
// StaticConfigProvider - In-code config for tests and embedding
// ============================================================================

/// Static configuration provider.
///
/// Useful for tests and for hosts that already hold their settings. For
/// config files, use `TomlConfigProvider`.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigProvider {
    config: ConnectionManagerConfig,
}

impl StaticConfigProvider {
    /// Create with default config: no listeners, no peers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the listen endpoints.
    #[must_use]
    pub fn with_listen_endpoints<I, S>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.listen_endpoints = endpoints.into_iter().map(Into::into).collect();
        self
    }

    /// Set the outgoing peers.
    #[must_use]
    pub fn with_outgoing_peers<I, S>(mut self, peers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.outgoing_peers = peers.into_iter().map(Into::into).collect();
        self
    }

    /// Set the retry delay.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry_delay = delay;
        self
    }

    /// Replace the whole config.
    #[must_use]
    pub fn with_config(mut self, config: ConnectionManagerConfig) -> Self {
        self.config = config;
        self
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn connection_config(&self) -> ConnectionManagerConfig {
        self.config.clone()
    }
}

// ============================================================================
// TomlConfigProvider - Config file loading
// ============================================================================

/// Configuration file structure.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    listen: ListenSection,
    #[serde(default)]
    outgoing: OutgoingSection,
    #[serde(default)]
    retry: RetrySection,
}

#[derive(Debug, Deserialize, Default)]
struct ListenSection {
    #[serde(default)]
    endpoints: Vec<String>,
    default_port: Option<u16>,
}

#[derive(Debug, Deserialize, Default)]
struct OutgoingSection {
    #[serde(default)]
    peers: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RetrySection {
    delay_secs: Option<u64>,
    connect_timeout_secs: Option<u64>,
}

/// TOML-based configuration provider.
///
/// # Config File Format
///
/// ```toml
/// [listen]
/// endpoints = ["0.0.0.0:9876", "[::1]:9877"]
/// default_port = 9876
///
/// [outgoing]
/// peers = ["127.0.0.1:6666"]
///
/// [retry]
/// delay_secs = 3
/// connect_timeout_secs = 10
/// ```
///
/// Every section is optional; missing values keep their defaults.
#[derive(Debug, Clone)]
pub struct TomlConfigProvider {
    config: ConnectionManagerConfig,
}

impl TomlConfigProvider {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let defaults = ConnectionManagerConfig::default();
        let config = ConnectionManagerConfig {
            listen_endpoints: file.listen.endpoints,
            outgoing_peers: file.outgoing.peers,
            default_port: file.listen.default_port.unwrap_or(defaults.default_port),
            retry_delay: file
                .retry
                .delay_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.retry_delay),
            connect_timeout: file
                .retry
                .connect_timeout_secs
                .map(Duration::from_secs)
                .or(defaults.connect_timeout),
        };

        Ok(Self { config })
    }
}

impl ConfigProvider for TomlConfigProvider {
    fn connection_config(&self) -> ConnectionManagerConfig {
        self.config.clone()
    }
}

/// Errors that can occur during config loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file `{path}`: {error}")]
    Io {
        /// Path of the file that failed to load.
        path: String,
        /// Error message from the I/O operation.
        error: String,
    },
    /// TOML parse error.
    #[error("failed to parse config: {0}")]
    Parse(String),
}
