//! Cloneable front door to the manager's event loop.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, warn};

use super::core::{ConnectionManager, ConnectionPorts};
use super::error::ConnectionManagerError;
use super::events::ManagerCommand;
use super::listening::bind_listener;
use crate::domain::{
    AttemptInfo, ConnectionManagerConfig, ListenSpec, ListenerInfo, ManagerSnapshot,
    OutgoingTarget,
};
use crate::ports::ConnectionManagerApi;

/// Handle to a running [`ConnectionManager`].
///
/// Dropping every handle stops the manager.
#[derive(Debug, Clone)]
pub struct ConnectionManagerHandle {
    commands: mpsc::UnboundedSender<ManagerCommand>,
}

impl ConnectionManagerHandle {
    pub(crate) fn new(commands: mpsc::UnboundedSender<ManagerCommand>) -> Self {
        Self { commands }
    }

    /// True while the event loop is still accepting commands
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> ManagerCommand,
    ) -> Result<T, ConnectionManagerError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(make(reply))
            .map_err(|_| ConnectionManagerError::ServiceStopped)?;
        response
            .await
            .map_err(|_| ConnectionManagerError::ServiceStopped)
    }
}

#[async_trait]
impl ConnectionManagerApi for ConnectionManagerHandle {
    async fn start_listening(
        &self,
        specs: Vec<ListenSpec>,
    ) -> Result<Vec<ListenerInfo>, ConnectionManagerError> {
        let mut started = Vec::with_capacity(specs.len());
        for spec in specs {
            let (listener, local_addr) = match bind_listener(&spec).await {
                Ok(bound) => bound,
                Err(e) => {
                    error!(endpoint = %spec, error = %e, "listener not started");
                    continue;
                }
            };
            let info = self
                .request(|reply| ManagerCommand::AddListener {
                    spec,
                    listener,
                    local_addr,
                    reply,
                })
                .await?;
            started.push(info);
        }
        Ok(started)
    }

    async fn start_outgoing(
        &self,
        targets: Vec<OutgoingTarget>,
    ) -> Result<Vec<AttemptInfo>, ConnectionManagerError> {
        self.request(|reply| ManagerCommand::AddTargets { targets, reply })
            .await
    }

    async fn snapshot(&self) -> Result<ManagerSnapshot, ConnectionManagerError> {
        self.request(|reply| ManagerCommand::Snapshot { reply }).await
    }

    async fn connection_count(&self) -> Result<usize, ConnectionManagerError> {
        Ok(self.snapshot().await?.connections.len())
    }

    async fn shutdown(&self) -> Result<(), ConnectionManagerError> {
        self.request(|reply| ManagerCommand::Shutdown { reply }).await
    }
}

/// A manager started from configuration.
#[derive(Debug)]
pub struct StartedManager {
    /// Handle for inspection and shutdown
    pub handle: ConnectionManagerHandle,
    /// The event loop; resolves when it stops
    pub task: JoinHandle<Result<(), ConnectionManagerError>>,
    /// Listeners that came up
    pub listeners: Vec<ListenerInfo>,
    /// One attempt per outgoing target
    pub attempts: Vec<AttemptInfo>,
}

/// Spawn a manager, bind every listen endpoint and start every outgoing attempt.
///
/// Configuration values that do not parse are logged and skipped, the same
/// way an endpoint that fails to bind is.
pub async fn start(
    config: &ConnectionManagerConfig,
    ports: ConnectionPorts,
) -> Result<StartedManager, ConnectionManagerError> {
    let (specs, rejected_specs) = config.listen_specs();
    let (targets, rejected_targets) = config.outgoing_targets();
    for rejected in rejected_specs.iter().chain(rejected_targets.iter()) {
        warn!(error = %rejected, "ignoring malformed endpoint");
    }

    let (handle, task) = ConnectionManager::spawn(config, ports);
    let listeners = handle.start_listening(specs).await?;
    let attempts = handle.start_outgoing(targets).await?;

    Ok(StartedManager {
        handle,
        task,
        listeners,
        attempts,
    })
}
