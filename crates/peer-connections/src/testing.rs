//! Centralized Testing Utilities
//!
//! Mock ports used by the crate's own tests and by downstream crates.
//! Available with the `test-utils` feature flag.
//!
//! - [`ScriptedDialer`] records every dial and either refuses or connects
//!   to a fixed loopback address
//! - [`MockConnectionFactory`] hands out connections whose disconnect the
//!   test fires by hand
//! - [`FailingRetryTimer`] simulates a broken scheduling substrate

use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::adapters::TokioRetryTimer;
use crate::domain::{OutgoingTarget, Timestamp};
use crate::ports::{
    ConnectionContext, ConnectionFactory, Dialer, DisconnectNotice, DisconnectNotifier,
    DisconnectReason, PeerConnection, RetryTimer, TimeSource, TimerError,
};
use crate::service::ConnectionPorts;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A time source that returns a fixed timestamp.
///
/// # Example
///
/// ```rust,ignore
/// use peer_connections::testing::FixedTimeSource;
/// use peer_connections::ports::TimeSource;
///
/// let time = FixedTimeSource::new(12345);
/// assert_eq!(time.now().as_secs(), 12345);
/// ```
#[derive(Debug, Clone)]
pub struct FixedTimeSource {
    timestamp: u64,
}

impl FixedTimeSource {
    /// Create a new fixed time source with the given timestamp (in seconds).
    pub fn new(timestamp: u64) -> Self {
        Self { timestamp }
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.timestamp)
    }
}

// =============================================================================
// Dialer
// =============================================================================

/// Outcome of one scripted dial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialOutcome {
    /// Complete with `ConnectionRefused`
    Refuse,
    /// Connect to this address instead of the target
    ConnectTo(SocketAddr),
}

/// One recorded dial.
#[derive(Debug, Clone)]
pub struct DialRecord {
    /// Target the manager asked for
    pub target: OutgoingTarget,
    /// When the dial was issued, on the tokio clock
    pub at: Instant,
}

/// Dialer driven by a script.
///
/// Queued outcomes are consumed in order; once the queue is empty every
/// dial gets the fallback outcome.
#[derive(Debug)]
pub struct ScriptedDialer {
    script: Mutex<VecDeque<DialOutcome>>,
    fallback: DialOutcome,
    dials: Mutex<Vec<DialRecord>>,
    dialed: Notify,
}

impl ScriptedDialer {
    /// Every dial is refused.
    pub fn always_refuse() -> Self {
        Self::with_fallback(DialOutcome::Refuse)
    }

    /// Every dial connects to `addr`.
    pub fn always_connect_to(addr: SocketAddr) -> Self {
        Self::with_fallback(DialOutcome::ConnectTo(addr))
    }

    fn with_fallback(fallback: DialOutcome) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            dials: Mutex::new(Vec::new()),
            dialed: Notify::new(),
        }
    }

    /// Queue outcomes for the next dials.
    pub fn then(self, outcomes: impl IntoIterator<Item = DialOutcome>) -> Self {
        lock(&self.script).extend(outcomes);
        self
    }

    /// Dials issued so far
    pub fn dial_count(&self) -> usize {
        lock(&self.dials).len()
    }

    /// Every dial issued so far, in order
    pub fn dials(&self) -> Vec<DialRecord> {
        lock(&self.dials).clone()
    }

    /// Resolve once at least `count` dials were issued.
    pub async fn wait_for_dials(&self, count: usize) {
        loop {
            let notified = self.dialed.notified();
            if self.dial_count() >= count {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl Dialer for ScriptedDialer {
    async fn dial(&self, target: &OutgoingTarget) -> io::Result<TcpStream> {
        let outcome = lock(&self.script).pop_front().unwrap_or(self.fallback);
        lock(&self.dials).push(DialRecord {
            target: target.clone(),
            at: Instant::now(),
        });
        self.dialed.notify_waiters();

        match outcome {
            DialOutcome::Refuse => Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("scripted refusal for {}", target),
            )),
            DialOutcome::ConnectTo(addr) => TcpStream::connect(addr).await,
        }
    }
}

// =============================================================================
// Connections
// =============================================================================

/// Test-side view of a connection handed out by [`MockConnectionFactory`].
#[derive(Debug)]
struct MockProbe {
    context: ConnectionContext,
    notifier: Option<DisconnectNotifier>,
    closed: Arc<AtomicBool>,
}

/// Connection whose disconnect is fired by the test.
#[derive(Debug)]
pub struct MockConnection {
    _socket: TcpStream,
    notice: Option<DisconnectNotice>,
    closed: Arc<AtomicBool>,
}

impl PeerConnection for MockConnection {
    fn take_disconnect_notice(&mut self) -> Option<DisconnectNotice> {
        self.notice.take()
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Factory recording every connection it opens, in order.
#[derive(Debug, Default)]
pub struct MockConnectionFactory {
    probes: Mutex<Vec<MockProbe>>,
    opened: Notify,
}

impl MockConnectionFactory {
    /// Create an empty factory
    pub fn new() -> Self {
        Self::default()
    }

    /// Connections opened so far
    pub fn opened(&self) -> usize {
        lock(&self.probes).len()
    }

    /// Context of the `index`-th connection
    pub fn context(&self, index: usize) -> Option<ConnectionContext> {
        lock(&self.probes).get(index).map(|p| p.context.clone())
    }

    /// Fire the disconnect notice of the `index`-th connection.
    ///
    /// Returns false if it was already fired or does not exist.
    pub fn disconnect(&self, index: usize, reason: DisconnectReason) -> bool {
        let notifier = lock(&self.probes)
            .get_mut(index)
            .and_then(|p| p.notifier.take());
        notifier.is_some_and(|n| n.notify(reason))
    }

    /// True once the manager released the `index`-th connection
    pub fn is_closed(&self, index: usize) -> bool {
        lock(&self.probes)
            .get(index)
            .is_some_and(|p| p.closed.load(Ordering::SeqCst))
    }

    /// Resolve once at least `count` connections were opened.
    pub async fn wait_for_opened(&self, count: usize) {
        loop {
            let notified = self.opened.notified();
            if self.opened() >= count {
                return;
            }
            notified.await;
        }
    }
}

impl ConnectionFactory for MockConnectionFactory {
    fn open(&self, socket: TcpStream, context: &ConnectionContext) -> Box<dyn PeerConnection> {
        let (notifier, notice) = DisconnectNotice::channel();
        let closed = Arc::new(AtomicBool::new(false));

        lock(&self.probes).push(MockProbe {
            context: context.clone(),
            notifier: Some(notifier),
            closed: Arc::clone(&closed),
        });
        self.opened.notify_waiters();

        Box::new(MockConnection {
            _socket: socket,
            notice: Some(notice),
            closed,
        })
    }
}

// =============================================================================
// Timer
// =============================================================================

/// Retry timer that waits out the delay and then reports a substrate failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingRetryTimer;

#[async_trait]
impl RetryTimer for FailingRetryTimer {
    async fn wait(&self, delay: Duration) -> Result<(), TimerError> {
        tokio::time::sleep(delay).await;
        Err(TimerError::Substrate("simulated timer failure".to_string()))
    }
}

/// Ports with the given dialer and connection factory, a real tokio
/// retry timer and a fixed clock.
pub fn mock_ports(dialer: Arc<ScriptedDialer>, connections: Arc<MockConnectionFactory>) -> ConnectionPorts {
    ConnectionPorts {
        dialer,
        connections,
        retry_timer: Arc::new(TokioRetryTimer::new()),
        time_source: Arc::new(FixedTimeSource::new(1_000)),
    }
}
