//! # Connection Manager Service
//!
//! The serialization domain. A single tokio task owns the listeners,
//! outgoing attempts and connection registry; accept loops, dials, retry
//! timers and disconnect watchers run as their own tasks and post their
//! completions back to it over one unbounded queue.
//!
//! Callers talk to it through [`ConnectionManagerHandle`], which implements
//! the [`crate::ports::ConnectionManagerApi`] driving port.

mod core;
mod error;
mod events;
mod handle;
mod lifecycle;
mod listening;
mod outgoing;

pub use self::core::{ConnectionManager, ConnectionPorts};
pub use error::ConnectionManagerError;
pub use handle::{start, ConnectionManagerHandle, StartedManager};

#[cfg(test)]
mod tests;
