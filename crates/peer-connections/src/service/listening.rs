//! Inbound path: resolve, bind, accept.

use std::net::SocketAddr;

use tokio::net::{lookup_host, TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::core::{ConnectionManager, ListenerSlot};
use super::error::ConnectionManagerError;
use super::events::ManagerEvent;
use crate::domain::{ConnectionRole, Endpoint, ListenSpec, ListenerId, ListenerInfo};

impl Endpoint {
    /// Resolve through the system resolver, keeping the first address.
    pub async fn resolve(&self) -> Result<SocketAddr, ConnectionManagerError> {
        let failed = |reason: String| ConnectionManagerError::ResolveOrBindFailed {
            endpoint: self.to_string(),
            reason,
        };

        let mut addrs = lookup_host(self.authority())
            .await
            .map_err(|e| failed(e.to_string()))?;
        addrs
            .next()
            .ok_or_else(|| failed("resolver returned no addresses".to_string()))
    }
}

/// Resolve and bind one listen spec, returning the bound address too.
pub(crate) async fn bind_listener(
    spec: &ListenSpec,
) -> Result<(TcpListener, SocketAddr), ConnectionManagerError> {
    let bind_failed = |e: std::io::Error| ConnectionManagerError::ResolveOrBindFailed {
        endpoint: spec.to_string(),
        reason: e.to_string(),
    };

    let addr = spec.resolve().await?;
    let listener = TcpListener::bind(addr).await.map_err(bind_failed)?;
    let local_addr = listener.local_addr().map_err(bind_failed)?;
    Ok((listener, local_addr))
}

/// Accept forever, posting each socket to the manager.
///
/// Accept errors are logged and the loop re-arms at once. The loop only
/// ends when the manager is gone.
async fn accept_loop(
    id: ListenerId,
    listener: TcpListener,
    events: mpsc::UnboundedSender<ManagerEvent>,
) {
    loop {
        match listener.accept().await {
            Ok((socket, peer_addr)) => {
                let event = ManagerEvent::Accepted {
                    listener: id,
                    socket,
                    peer_addr,
                };
                if events.send(event).is_err() {
                    debug!(listener = %id, "manager gone, accept loop exiting");
                    return;
                }
            }
            Err(e) => {
                warn!(listener = %id, error = %e, "accept failed");
            }
        }
    }
}

impl ConnectionManager {
    pub(crate) fn add_listener(
        &mut self,
        spec: ListenSpec,
        listener: TcpListener,
        local_addr: SocketAddr,
    ) -> ListenerInfo {
        let id = ListenerId::new(self.listeners.len() as u32);
        let info = ListenerInfo::new(id, spec, local_addr);

        info!(listener = %id, endpoint = %info.spec, %local_addr, "listening");

        let accept_task = tokio::spawn(accept_loop(id, listener, self.events_tx.clone()));
        self.listeners.push(ListenerSlot {
            info: info.clone(),
            accept_task,
        });
        info
    }

    pub(crate) fn on_accepted(&mut self, listener: ListenerId, socket: TcpStream, peer_addr: SocketAddr) {
        let Some(slot) = self.listeners.get_mut(listener.as_u32() as usize) else {
            debug!(listener = %listener, "accept from unknown listener dropped");
            return;
        };
        slot.info.record_accept();

        let handle = self.register_connection(ConnectionRole::Inbound { listener }, socket, Some(peer_addr));
        info!(listener = %listener, peer = %peer_addr, handle = %handle, "accepted connection");
    }
}
