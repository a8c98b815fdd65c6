//! # Ports Layer - Hexagonal Architecture Boundaries
//!
//! - **Driving Ports (Inbound):** the API this crate exposes
//! - **Driven Ports (Outbound):** what it requires from adapters

pub mod inbound;
pub mod outbound;

pub use inbound::ConnectionManagerApi;
pub use outbound::{
    ConfigProvider, ConnectionContext, ConnectionFactory, Dialer, DisconnectNotice,
    DisconnectNotifier, DisconnectReason, PeerConnection, RetryTimer, TimeSource, TimerError,
};
