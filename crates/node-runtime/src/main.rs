//! # Node Runtime
//!
//! Entry point for the peer-to-peer node.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging (`RUST_LOG`, default `info`)
//! 2. Load configuration (file from `NODE_CONFIG`, then env overrides)
//! 3. Bind listeners and start outgoing attempts
//! 4. Report status periodically until Ctrl+C

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use node_runtime::{load_config_from_env, NodeRuntime};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load configuration
    let config = load_config_from_env().context("Failed to load configuration")?;
    info!(
        listen = ?config.connections.listen_endpoints,
        outgoing = ?config.connections.outgoing_peers,
        retry_delay = ?config.connections.retry_delay,
        "configuration loaded"
    );

    let runtime = NodeRuntime::start(config).await?;

    info!("Node is running. Press Ctrl+C to stop.");
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    runtime.run_until(shutdown).await
}
