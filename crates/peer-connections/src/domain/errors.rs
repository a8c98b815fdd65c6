//! Domain Errors for Peer Connections
//!
//! Errors raised by the pure domain layer. Service-level failures
//! (bind, connect, timer) live in [`crate::service::ConnectionManagerError`].

use thiserror::Error;

use super::attempt::AttemptState;

/// Errors produced while parsing a `host:port` endpoint string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    /// Nothing left of the host once brackets were stripped
    #[error("endpoint `{input}` has an empty host")]
    EmptyHost {
        /// The raw configuration value
        input: String,
    },
    /// Port was not a number in `0..=65535`
    #[error("endpoint `{input}` has an invalid port `{port}`")]
    InvalidPort {
        /// The raw configuration value
        input: String,
        /// The text found after the last colon
        port: String,
    },
}

/// Errors produced by the outgoing attempt state machine.
///
/// An invalid transition means a completion event arrived that the
/// attempt was not waiting for. The service logs it and drops the event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    /// Event does not apply to the current state
    #[error("cannot apply `{event}` while attempt is {state}")]
    InvalidTransition {
        /// State the attempt was in when the event arrived
        state: AttemptState,
        /// Name of the rejected event
        event: &'static str,
    },
}
