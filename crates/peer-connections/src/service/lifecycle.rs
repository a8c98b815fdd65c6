//! Registration, disconnect watching and removal.

use std::net::SocketAddr;

use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::core::{ConnectionManager, LiveConnection};
use super::events::ManagerEvent;
use crate::domain::{AttemptAction, ConnectionHandle, ConnectionRole, RegisteredConnection};
use crate::ports::{ConnectionContext, DisconnectNotice, DisconnectReason};

/// Forward a connection's one-shot disconnect notice to the manager.
fn watch_disconnect(
    handle: ConnectionHandle,
    notice: DisconnectNotice,
    events: mpsc::UnboundedSender<ManagerEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let reason = notice.await;
        let _ = events.send(ManagerEvent::Disconnected { handle, reason });
    })
}

impl ConnectionManager {
    /// Hand `socket` to the connection factory and register the result.
    ///
    /// `peer_hint` is used when the socket cannot report its own peer address.
    pub(crate) fn register_connection(
        &mut self,
        role: ConnectionRole,
        socket: TcpStream,
        peer_hint: Option<SocketAddr>,
    ) -> ConnectionHandle {
        let peer_addr = socket.peer_addr().ok().or(peer_hint);
        let local_addr = socket.local_addr().ok();
        let context = ConnectionContext {
            role,
            peer_addr,
            local_addr,
        };

        let mut connection = self.ports.connections.open(socket, &context);
        let notice = connection.take_disconnect_notice();
        let established_at = self.now();

        let handle = self.registry.register(
            role,
            peer_addr,
            local_addr,
            established_at,
            LiveConnection {
                connection,
                subscription: None,
            },
        );

        match notice {
            Some(notice) => {
                let task = watch_disconnect(handle, notice, self.events_tx.clone());
                if let Some(entry) = self.registry.get_mut(handle) {
                    entry.resource.subscription = Some(task);
                }
            }
            None => {
                error!(handle = %handle, "connection offered no disconnect notice; it will never be removed");
            }
        }

        handle
    }

    /// Remove a connection that reported its end; re-dial if it was ours.
    pub(crate) fn on_disconnected(&mut self, handle: ConnectionHandle, reason: DisconnectReason) {
        let Some(entry) = self.registry.remove(handle) else {
            debug!(handle = %handle, "disconnect for unknown handle ignored");
            return;
        };

        let RegisteredConnection { info, resource } = entry;
        let LiveConnection {
            mut connection,
            subscription,
        } = resource;
        if let Some(task) = subscription {
            task.abort();
        }
        connection.close();

        info!(
            handle = %handle,
            peer = ?info.peer_addr,
            reason = %reason,
            remaining = self.registry.len(),
            "connection removed"
        );

        let Some(attempt) = info.role.attempt() else {
            return;
        };
        let Some(slot) = self.attempts.get_mut(attempt.as_u32() as usize) else {
            error!(attempt = %attempt, handle = %handle, "outbound connection for unknown attempt");
            return;
        };

        match slot.machine.on_disconnected(handle) {
            Ok(AttemptAction::Dial) => {
                info!(attempt = %attempt, target = %slot.machine.target(), "reconnecting");
                self.dial(attempt);
            }
            Ok(action) => {
                error!(attempt = %attempt, ?action, "unexpected action after disconnect");
            }
            Err(e) => {
                error!(attempt = %attempt, handle = %handle, error = %e, "disconnect ignored");
            }
        }
    }
}
