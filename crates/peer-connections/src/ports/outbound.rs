//! # Driven Ports (Outbound SPI)
//!
//! These are the interfaces the connection layer **requires** from the host:
//! something to dial with, a connection collaborator to hand sockets to,
//! a retry timer and a clock.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::oneshot;

use crate::domain::{ConnectionManagerConfig, ConnectionRole, OutgoingTarget, Timestamp};

/// Abstract interface for issuing outbound connects.
///
/// The returned future completes once, with the connected socket or the
/// error that ends this particular attempt. There is no cancellation path:
/// implementations must eventually complete on their own.
#[async_trait]
pub trait Dialer: Send + Sync + 'static {
    /// Connect to `target`.
    async fn dial(&self, target: &OutgoingTarget) -> std::io::Result<TcpStream>;
}

/// Abstract retry timer.
///
/// `Err` means the scheduling substrate itself is broken, which is not a
/// network condition. The service treats it as fatal.
#[async_trait]
pub trait RetryTimer: Send + Sync + 'static {
    /// Wait for `delay` to elapse.
    async fn wait(&self, delay: Duration) -> Result<(), TimerError>;
}

/// Errors from the retry timer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    /// Timer completed before its deadline
    #[error("timer fired after {elapsed:?}, before its {expected:?} deadline")]
    FiredEarly {
        /// Requested delay
        expected: Duration,
        /// Time actually elapsed
        elapsed: Duration,
    },
    /// Timer could not be armed or awaited
    #[error("timer substrate failure: {0}")]
    Substrate(String),
}

/// What the collaborator is told about a socket it receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionContext {
    /// Inbound or outbound
    pub role: ConnectionRole,
    /// Remote address, if known
    pub peer_addr: Option<std::net::SocketAddr>,
    /// Local address, if known
    pub local_addr: Option<std::net::SocketAddr>,
}

/// Builds the opaque connection collaborator around an established socket.
pub trait ConnectionFactory: Send + Sync + 'static {
    /// Take ownership of `socket` and return the live connection.
    fn open(&self, socket: TcpStream, context: &ConnectionContext) -> Box<dyn PeerConnection>;
}

/// An established connection owned by the registry.
///
/// Protocol behavior is entirely up to the implementation; the connection
/// layer only needs to learn when it ends.
pub trait PeerConnection: Send + 'static {
    /// Hand out the one-shot disconnect notice.
    ///
    /// Returns `Some` on the first call and `None` afterwards.
    fn take_disconnect_notice(&mut self) -> Option<DisconnectNotice>;

    /// Release the socket. Called when the entry leaves the registry.
    fn close(&mut self);
}

/// Why a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Remote side closed the stream
    RemoteClosed,
    /// Read or write failed
    Io(String),
    /// Closed locally, or the collaborator went away without saying
    Closed,
}

impl std::fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RemoteClosed => write!(f, "remote closed the connection"),
            Self::Io(e) => write!(f, "i/o error: {}", e),
            Self::Closed => write!(f, "connection closed"),
        }
    }
}

/// Sending half of a disconnect notice. Consumed on use, so it fires at most once.
#[derive(Debug)]
pub struct DisconnectNotifier {
    sender: oneshot::Sender<DisconnectReason>,
}

impl DisconnectNotifier {
    /// Fire the notice. Returns false if nobody is listening any more.
    pub fn notify(self, reason: DisconnectReason) -> bool {
        self.sender.send(reason).is_ok()
    }
}

/// Receiving half: a future resolving exactly once.
///
/// A notifier dropped without firing resolves as [`DisconnectReason::Closed`].
#[derive(Debug)]
pub struct DisconnectNotice {
    receiver: oneshot::Receiver<DisconnectReason>,
}

impl DisconnectNotice {
    /// Create a connected notifier/notice pair
    pub fn channel() -> (DisconnectNotifier, DisconnectNotice) {
        let (sender, receiver) = oneshot::channel();
        (DisconnectNotifier { sender }, DisconnectNotice { receiver })
    }
}

impl Future for DisconnectNotice {
    type Output = DisconnectReason;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.unwrap_or(DisconnectReason::Closed))
    }
}

/// Abstract interface for wall-clock time.
///
/// Enables deterministic tests by injecting controllable time sources.
pub trait TimeSource: Send + Sync + 'static {
    /// Get the current timestamp.
    fn now(&self) -> Timestamp;
}

/// Abstract interface for configuration loading.
pub trait ConfigProvider: Send + Sync {
    /// Listen endpoints, outbound peers and retry settings.
    fn connection_config(&self) -> ConnectionManagerConfig;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test-only TimeSource returning a fixed timestamp for deterministic assertions.
    struct FixedTimeSource(u64);

    impl TimeSource for FixedTimeSource {
        fn now(&self) -> Timestamp {
            Timestamp::new(self.0)
        }
    }

    #[test]
    fn test_fixed_time_source_returns_configured_value() {
        let source = FixedTimeSource(1000);
        assert_eq!(source.now().as_secs(), 1000);
    }

    #[tokio::test]
    async fn test_notice_resolves_with_reason() {
        let (notifier, notice) = DisconnectNotice::channel();
        assert!(notifier.notify(DisconnectReason::RemoteClosed));
        assert_eq!(notice.await, DisconnectReason::RemoteClosed);
    }

    #[tokio::test]
    async fn test_dropped_notifier_resolves_closed() {
        let (notifier, notice) = DisconnectNotice::channel();
        drop(notifier);
        assert_eq!(notice.await, DisconnectReason::Closed);
    }

    #[test]
    fn test_notify_without_listener() {
        let (notifier, notice) = DisconnectNotice::channel();
        drop(notice);
        assert!(!notifier.notify(DisconnectReason::Closed));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            DisconnectReason::Io("reset".into()).to_string(),
            "i/o error: reset"
        );
        assert_eq!(
            TimerError::Substrate("clock gone".into()).to_string(),
            "timer substrate failure: clock gone"
        );
    }
}
