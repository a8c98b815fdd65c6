//! # Node Runtime
//!
//! Starts the connection manager, logs its status on an interval and
//! shuts it down when asked.

use std::future::Future;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use peer_connections::{
    start, ConnectionManagerApi, ConnectionManagerHandle, ConnectionPorts, ManagerSnapshot,
    StartedManager,
};
use tracing::{debug, info, warn};

use crate::config::NodeConfig;

/// A running node.
#[derive(Debug)]
pub struct NodeRuntime {
    manager: StartedManager,
    status_interval: Duration,
}

impl NodeRuntime {
    /// Bind listeners and start outgoing attempts.
    pub async fn start(config: NodeConfig) -> Result<Self> {
        let ports = ConnectionPorts::tcp(&config.connections);
        let manager = start(&config.connections, ports)
            .await
            .context("Failed to start connection manager")?;

        info!(
            listeners = manager.listeners.len(),
            outgoing = manager.attempts.len(),
            "node started"
        );
        if manager.listeners.is_empty() {
            warn!("no listener is bound; inbound peers cannot connect");
        }

        Ok(Self {
            manager,
            status_interval: config.status_interval,
        })
    }

    /// Handle to the connection manager.
    pub fn handle(&self) -> &ConnectionManagerHandle {
        &self.manager.handle
    }

    /// Log a one-line status and return the snapshot it was built from.
    pub async fn report_status(&self) -> Result<ManagerSnapshot> {
        let snapshot = self
            .manager
            .handle
            .snapshot()
            .await
            .context("Failed to read connection status")?;

        info!(
            listeners = snapshot.listeners.len(),
            inbound = snapshot.inbound_count(),
            outbound = snapshot.outbound_count(),
            attempts = snapshot.attempts.len(),
            "status"
        );
        if let Ok(json) = serde_json::to_string(&snapshot) {
            debug!(status = %json, "status detail");
        }
        Ok(snapshot)
    }

    /// Report status until `shutdown` resolves, then stop the manager.
    ///
    /// Returns an error if the manager stops on its own.
    pub async fn run_until<S>(mut self, shutdown: S) -> Result<()>
    where
        S: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.status_interval);
        // The first tick completes immediately
        ticker.tick().await;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    self.report_status().await?;
                }
                outcome = &mut self.manager.task => {
                    let outcome = outcome.context("Connection manager task panicked")?;
                    outcome.context("Connection manager stopped")?;
                    bail!("Connection manager stopped unexpectedly");
                }
            }
        }

        self.shutdown().await
    }

    /// Stop the manager and wait for its task.
    pub async fn shutdown(self) -> Result<()> {
        info!("Initiating graceful shutdown...");
        self.manager
            .handle
            .shutdown()
            .await
            .context("Failed to stop connection manager")?;
        self.manager
            .task
            .await
            .context("Connection manager task panicked")?
            .context("Connection manager failed")?;
        info!("Shutdown complete");
        Ok(())
    }
}
