//! Service-level errors.

use thiserror::Error;

/// Errors surfaced by the connection manager.
///
/// Only [`ConnectionManagerError::TimerSchedulingFailed`] ever ends the
/// event loop. Resolve, bind and connect failures are logged where they
/// happen and absorbed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionManagerError {
    /// Listen spec could not be resolved or bound; the endpoint is skipped
    #[error("failed to resolve or bind `{endpoint}`: {reason}")]
    ResolveOrBindFailed {
        /// Configured endpoint
        endpoint: String,
        /// Resolver or socket error
        reason: String,
    },

    /// Outbound connect completed with an error; the attempt backs off
    #[error("connect to `{target}` failed: {reason}")]
    ConnectFailed {
        /// Remote endpoint
        target: String,
        /// Socket error
        reason: String,
    },

    /// Retry timer broke; the retry loop can no longer be trusted
    #[error("retry timer for `{target}` failed: {reason}")]
    TimerSchedulingFailed {
        /// Remote endpoint of the affected attempt
        target: String,
        /// Timer error
        reason: String,
    },

    /// Event loop is no longer running
    #[error("connection manager is not running")]
    ServiceStopped,
}
