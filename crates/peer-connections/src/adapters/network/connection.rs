use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::ports::{
    ConnectionContext, ConnectionFactory, DisconnectNotice, DisconnectNotifier, DisconnectReason,
    PeerConnection,
};

const READ_BUFFER_SIZE: usize = 4096;

/// Wraps sockets in [`TcpPeerConnection`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnectionFactory;

impl TcpConnectionFactory {
    /// Create a new factory.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ConnectionFactory for TcpConnectionFactory {
    fn open(&self, socket: TcpStream, context: &ConnectionContext) -> Box<dyn PeerConnection> {
        Box::new(TcpPeerConnection::spawn(socket, context.clone()))
    }
}

/// Minimal connection collaborator.
///
/// Speaks no protocol: a task reads and discards whatever the peer sends
/// and fires the disconnect notice on EOF or on the first read error.
#[derive(Debug)]
pub struct TcpPeerConnection {
    context: ConnectionContext,
    reader: JoinHandle<()>,
    notice: Option<DisconnectNotice>,
}

impl TcpPeerConnection {
    /// Take ownership of `socket` and start draining it.
    pub fn spawn(socket: TcpStream, context: ConnectionContext) -> Self {
        let (notifier, notice) = DisconnectNotice::channel();
        let reader = tokio::spawn(drain(socket, notifier, context.clone()));
        Self {
            context,
            reader,
            notice: Some(notice),
        }
    }

    /// Context the connection was opened with
    pub fn context(&self) -> &ConnectionContext {
        &self.context
    }
}

async fn drain(mut socket: TcpStream, notifier: DisconnectNotifier, context: ConnectionContext) {
    let mut buf = [0u8; READ_BUFFER_SIZE];
    let reason = loop {
        match socket.read(&mut buf).await {
            Ok(0) => break DisconnectReason::RemoteClosed,
            Ok(n) => trace!(peer = ?context.peer_addr, bytes = n, "discarding inbound bytes"),
            Err(e) => break DisconnectReason::Io(e.to_string()),
        }
    };
    notifier.notify(reason);
}

impl PeerConnection for TcpPeerConnection {
    fn take_disconnect_notice(&mut self) -> Option<DisconnectNotice> {
        self.notice.take()
    }

    fn close(&mut self) {
        self.reader.abort();
    }
}

impl Drop for TcpPeerConnection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
