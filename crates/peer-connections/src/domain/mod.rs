//! Domain Layer - Pure connection-lifecycle state with no I/O
//!
//! This module contains:
//! - Endpoints and their best-effort `host:port` parsing
//! - Listener records
//! - The outgoing attempt state machine (fixed-delay, unlimited retry)
//! - The connection registry keyed by stable handles
//! - Configuration and the status snapshot

pub mod attempt;
pub mod config;
pub mod endpoint;
pub mod errors;
pub mod listener;
pub mod registry;
pub mod snapshot;
pub mod value_objects;

pub use attempt::*;
pub use config::*;
pub use endpoint::*;
pub use errors::*;
pub use listener::*;
pub use registry::*;
pub use snapshot::*;
pub use value_objects::*;
