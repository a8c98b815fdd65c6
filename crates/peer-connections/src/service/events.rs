//! Messages consumed by the manager's event loop.
//!
//! Completions (accept, connect, timer, disconnect) come from tasks the
//! manager spawned itself. Commands come from [`super::ConnectionManagerHandle`].

use std::io;
use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use crate::domain::{
    AttemptId, AttemptInfo, ConnectionHandle, ListenSpec, ListenerId, ListenerInfo,
    ManagerSnapshot, OutgoingTarget,
};
use crate::ports::{DisconnectReason, TimerError};

/// Completion events posted by accept loops, dials, timers and
/// disconnect watchers.
pub(crate) enum ManagerEvent {
    /// A listener accepted a socket
    Accepted {
        listener: ListenerId,
        socket: TcpStream,
        peer_addr: SocketAddr,
    },
    /// An outbound connect finished
    ConnectCompleted {
        attempt: AttemptId,
        result: io::Result<TcpStream>,
    },
    /// A retry timer finished waiting
    RetryElapsed {
        attempt: AttemptId,
        generation: u64,
        result: Result<(), TimerError>,
    },
    /// A registered connection reported that it ended
    Disconnected {
        handle: ConnectionHandle,
        reason: DisconnectReason,
    },
}

/// Requests from handles.
pub(crate) enum ManagerCommand {
    /// Take over an already bound listener and start accepting
    AddListener {
        spec: ListenSpec,
        listener: TcpListener,
        local_addr: SocketAddr,
        reply: oneshot::Sender<ListenerInfo>,
    },
    /// Create one attempt per target and dial each
    AddTargets {
        targets: Vec<OutgoingTarget>,
        reply: oneshot::Sender<Vec<AttemptInfo>>,
    },
    /// Report current state
    Snapshot {
        reply: oneshot::Sender<ManagerSnapshot>,
    },
    /// Release everything and stop the loop
    Shutdown { reply: oneshot::Sender<()> },
}
