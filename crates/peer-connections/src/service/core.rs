use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::error::ConnectionManagerError;
use super::events::{ManagerCommand, ManagerEvent};
use super::handle::ConnectionManagerHandle;
use crate::domain::{
    ConnectionManagerConfig, ConnectionRegistry, ListenerInfo, ManagerSnapshot, OutgoingAttempt,
    RetryPolicy, Timestamp,
};
use crate::ports::{ConnectionFactory, Dialer, PeerConnection, RetryTimer, TimeSource};

/// The driven ports the manager talks to.
///
/// Shared with the tasks the manager spawns, hence `Arc`.
#[derive(Clone)]
pub struct ConnectionPorts {
    /// Issues outbound connects
    pub dialer: Arc<dyn Dialer>,
    /// Wraps established sockets
    pub connections: Arc<dyn ConnectionFactory>,
    /// Waits out the backoff delay
    pub retry_timer: Arc<dyn RetryTimer>,
    /// Stamps registry entries
    pub time_source: Arc<dyn TimeSource>,
}

/// A bound listener and its accept loop.
pub(crate) struct ListenerSlot {
    pub(crate) info: ListenerInfo,
    pub(crate) accept_task: JoinHandle<()>,
}

/// An outgoing attempt plus whichever of its tasks is in flight.
pub(crate) struct AttemptSlot {
    pub(crate) machine: OutgoingAttempt,
    pub(crate) dial_task: Option<JoinHandle<()>>,
    pub(crate) timer_task: Option<JoinHandle<()>>,
}

/// Resource stored with each registry entry.
pub(crate) struct LiveConnection {
    pub(crate) connection: Box<dyn PeerConnection>,
    pub(crate) subscription: Option<JoinHandle<()>>,
}

/// Connection manager event loop.
///
/// Owns every listener, attempt and registry entry. All completions are
/// posted to one queue and handled one at a time by [`Self::run`], so no
/// state here is ever touched concurrently and none of it is locked.
///
/// # Example
///
/// ```rust,ignore
/// use peer_connections::service::ConnectionManager;
/// use peer_connections::ports::ConnectionManagerApi;
///
/// let (handle, task) = ConnectionManager::spawn(&config, ConnectionPorts::tcp(&config));
/// let listeners = handle.start_listening(specs).await?;
/// handle.shutdown().await?;
/// task.await??;
/// ```
pub struct ConnectionManager {
    pub(crate) ports: ConnectionPorts,
    pub(crate) retry_policy: RetryPolicy,
    pub(crate) listeners: Vec<ListenerSlot>,
    pub(crate) attempts: Vec<AttemptSlot>,
    pub(crate) registry: ConnectionRegistry<LiveConnection>,
    pub(crate) events_tx: mpsc::UnboundedSender<ManagerEvent>,
    events_rx: mpsc::UnboundedReceiver<ManagerEvent>,
    commands_rx: mpsc::UnboundedReceiver<ManagerCommand>,
}

impl ConnectionManager {
    /// Create the manager and a handle to it. Nothing runs until [`Self::run`].
    pub fn new(
        config: &ConnectionManagerConfig,
        ports: ConnectionPorts,
    ) -> (Self, ConnectionManagerHandle) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        let manager = Self {
            ports,
            retry_policy: config.retry_policy(),
            listeners: Vec::new(),
            attempts: Vec::new(),
            registry: ConnectionRegistry::new(),
            events_tx,
            events_rx,
            commands_rx,
        };
        (manager, ConnectionManagerHandle::new(commands_tx))
    }

    /// Create the manager and run it on a new tokio task.
    pub fn spawn(
        config: &ConnectionManagerConfig,
        ports: ConnectionPorts,
    ) -> (
        ConnectionManagerHandle,
        JoinHandle<Result<(), ConnectionManagerError>>,
    ) {
        let (manager, handle) = Self::new(config, ports);
        (handle, tokio::spawn(manager.run()))
    }

    /// Process events and commands until shutdown.
    ///
    /// Returns `Ok` after a shutdown command or once every handle is
    /// dropped, and `Err` when a retry timer fails.
    pub async fn run(mut self) -> Result<(), ConnectionManagerError> {
        let result = loop {
            tokio::select! {
                Some(event) = self.events_rx.recv() => {
                    if let Err(e) = self.handle_event(event) {
                        error!(error = %e, "connection manager stopping on fatal error");
                        break Err(e);
                    }
                }
                command = self.commands_rx.recv() => match command {
                    Some(command) => {
                        if !self.handle_command(command) {
                            return Ok(());
                        }
                    }
                    None => break Ok(()),
                },
            }
        };

        self.shutdown_all();
        result
    }

    fn handle_event(&mut self, event: ManagerEvent) -> Result<(), ConnectionManagerError> {
        match event {
            ManagerEvent::Accepted {
                listener,
                socket,
                peer_addr,
            } => self.on_accepted(listener, socket, peer_addr),
            ManagerEvent::ConnectCompleted { attempt, result } => {
                self.on_connect_completed(attempt, result)
            }
            ManagerEvent::RetryElapsed {
                attempt,
                generation,
                result,
            } => return self.on_retry_elapsed(attempt, generation, result),
            ManagerEvent::Disconnected { handle, reason } => self.on_disconnected(handle, reason),
        }
        Ok(())
    }

    /// Returns false once the loop must stop.
    fn handle_command(&mut self, command: ManagerCommand) -> bool {
        match command {
            ManagerCommand::AddListener {
                spec,
                listener,
                local_addr,
                reply,
            } => {
                let info = self.add_listener(spec, listener, local_addr);
                let _ = reply.send(info);
            }
            ManagerCommand::AddTargets { targets, reply } => {
                let infos = self.add_targets(targets);
                let _ = reply.send(infos);
            }
            ManagerCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            ManagerCommand::Shutdown { reply } => {
                self.shutdown_all();
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    pub(crate) fn now(&self) -> Timestamp {
        self.ports.time_source.now()
    }

    pub(crate) fn snapshot(&self) -> ManagerSnapshot {
        ManagerSnapshot {
            listeners: self.listeners.iter().map(|l| l.info.clone()).collect(),
            attempts: self.attempts.iter().map(|a| a.machine.info()).collect(),
            connections: self.registry.snapshot(),
            stats: self.registry.stats(),
        }
    }

    /// Abort every task and close every registered connection.
    pub(crate) fn shutdown_all(&mut self) {
        for slot in self.listeners.drain(..) {
            slot.accept_task.abort();
        }
        for slot in &mut self.attempts {
            if let Some(task) = slot.dial_task.take() {
                task.abort();
            }
            if let Some(task) = slot.timer_task.take() {
                task.abort();
            }
            slot.machine.cancel_retry();
        }

        let closed = self.registry.len();
        for entry in self.registry.drain() {
            let LiveConnection {
                mut connection,
                subscription,
            } = entry.resource;
            if let Some(task) = subscription {
                task.abort();
            }
            connection.close();
        }

        info!(closed, "connection manager shut down");
    }
}
