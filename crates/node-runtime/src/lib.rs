//! # Node Runtime Library
//!
//! Configuration loading and the runtime loop around the connection
//! manager. The entry point is the `main.rs` binary; this library exists
//! so both can be tested.

#![warn(missing_docs)]

pub mod config;
pub mod runtime;

pub use config::{load_config, load_config_from_env, NodeConfig, NodeConfigError};
pub use runtime::NodeRuntime;
