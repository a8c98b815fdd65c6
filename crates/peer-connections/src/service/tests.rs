//! Tests for ConnectionManager
//!
//! Mock dialer and connections, real tokio timer. Retry timing runs on
//! tokio's paused clock.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use super::*;
use crate::domain::{
    AttemptState, ConnectionHandle, ConnectionManagerConfig, ConnectionRole, Endpoint,
    ManagerSnapshot,
};
use crate::ports::{ConnectionManagerApi, DisconnectReason};
use crate::testing::{mock_ports, DialOutcome, FailingRetryTimer, MockConnectionFactory, ScriptedDialer};

const WAIT: Duration = Duration::from_secs(5);

fn config_with_retry(retry_delay: Duration) -> ConnectionManagerConfig {
    ConnectionManagerConfig {
        retry_delay,
        ..Default::default()
    }
}

fn target() -> Endpoint {
    Endpoint::new("127.0.0.1", 6666)
}

fn loopback_spec() -> Endpoint {
    Endpoint::new("127.0.0.1", 0)
}

/// Loopback listener that accepts forever and keeps every socket open.
async fn peer_listener() -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let task = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    (addr, task)
}

async fn wait_for_snapshot<F>(handle: &ConnectionManagerHandle, mut done: F) -> ManagerSnapshot
where
    F: FnMut(&ManagerSnapshot) -> bool,
{
    timeout(WAIT, async {
        loop {
            let snapshot = handle.snapshot().await.unwrap();
            if done(&snapshot) {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time")
}

fn index_of(factory: &MockConnectionFactory, role: ConnectionRole) -> usize {
    (0..factory.opened())
        .find(|i| factory.context(*i).map(|c| c.role) == Some(role))
        .expect("no connection with that role")
}

// =============================================================================
// TEST GROUP 1: Backoff on failed connects
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_failing_target_retries_at_fixed_interval() {
    let dialer = Arc::new(ScriptedDialer::always_refuse());
    let factory = Arc::new(MockConnectionFactory::new());
    let config = ConnectionManagerConfig::default();
    let (handle, task) = ConnectionManager::spawn(&config, mock_ports(dialer.clone(), factory));

    handle.start_outgoing(vec![target()]).await.unwrap();

    // Initial dial plus five retries
    dialer.wait_for_dials(6).await;
    let dials = dialer.dials();
    for pair in dials.windows(2) {
        let gap = pair[1].at - pair[0].at;
        assert!(gap >= Duration::from_secs(3), "retry after only {:?}", gap);
        assert!(gap < Duration::from_millis(3_100), "backoff grew to {:?}", gap);
    }
    assert!(dials.iter().all(|d| d.target == target()));

    let snapshot = handle.snapshot().await.unwrap();
    let attempt = &snapshot.attempts[0];
    assert!(attempt.dial_count >= 6);
    assert!(attempt.consecutive_failures >= 5);
    assert!(attempt.last_error.as_deref().unwrap().contains("scripted refusal"));
    assert!(snapshot.connections.is_empty());

    handle.shutdown().await.unwrap();
    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_attempt_invariant_holds_while_retrying() {
    let dialer = Arc::new(ScriptedDialer::always_refuse());
    let factory = Arc::new(MockConnectionFactory::new());
    let config = ConnectionManagerConfig::default();
    let (handle, task) = ConnectionManager::spawn(&config, mock_ports(dialer.clone(), factory));

    let targets = vec![target(), Endpoint::new("127.0.0.1", 6667)];
    let infos = handle.start_outgoing(targets).await.unwrap();
    assert_eq!(infos.len(), 2);
    assert!(infos.iter().all(|i| i.state == AttemptState::Connecting));

    for _ in 0..20 {
        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.check_attempt_invariant());
        tokio::time::sleep(Duration::from_millis(700)).await;
    }

    handle.shutdown().await.unwrap();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_connect_after_failures_resets_counter() {
    let (peer_addr, _peer) = peer_listener().await;
    let dialer = Arc::new(
        ScriptedDialer::always_connect_to(peer_addr)
            .then([DialOutcome::Refuse, DialOutcome::Refuse]),
    );
    let factory = Arc::new(MockConnectionFactory::new());
    let config = config_with_retry(Duration::from_millis(20));
    let (handle, task) = ConnectionManager::spawn(&config, mock_ports(dialer.clone(), factory));

    handle.start_outgoing(vec![target()]).await.unwrap();

    let snapshot = wait_for_snapshot(&handle, |s| s.connections.len() == 1).await;
    let attempt = &snapshot.attempts[0];
    assert_eq!(attempt.dial_count, 3);
    assert_eq!(attempt.consecutive_failures, 0);
    assert_eq!(attempt.total_failures, 2);
    assert!(matches!(attempt.state, AttemptState::Connected(_)));
    assert!(snapshot.check_attempt_invariant());

    handle.shutdown().await.unwrap();
    task.await.unwrap().unwrap();
}

// =============================================================================
// TEST GROUP 2: Outbound connections
// =============================================================================

#[tokio::test]
async fn test_outbound_disconnect_redials_without_delay() {
    let (peer_addr, _peer) = peer_listener().await;
    let dialer = Arc::new(ScriptedDialer::always_connect_to(peer_addr));
    let factory = Arc::new(MockConnectionFactory::new());
    // Long enough that the test would time out if the backoff applied
    let config = config_with_retry(Duration::from_secs(60));
    let (handle, task) = ConnectionManager::spawn(&config, mock_ports(dialer.clone(), factory.clone()));

    handle.start_outgoing(vec![target()]).await.unwrap();
    let first = wait_for_snapshot(&handle, |s| s.connections.len() == 1).await;
    let first_handle = first.connections[0].handle;
    assert_eq!(
        first.attempts[0].state,
        AttemptState::Connected(first_handle)
    );

    assert!(factory.disconnect(0, DisconnectReason::RemoteClosed));

    let second = wait_for_snapshot(&handle, |s| {
        s.connections.len() == 1 && s.connections[0].handle != first_handle
    })
    .await;
    assert_eq!(dialer.dial_count(), 2);
    assert!(factory.is_closed(0));
    assert!(!factory.is_closed(1));
    assert_eq!(
        second.attempts[0].state,
        AttemptState::Connected(second.connections[0].handle)
    );
    assert_eq!(second.stats.total_removed, 1);

    handle.shutdown().await.unwrap();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_outbound_connection_context() {
    let (peer_addr, _peer) = peer_listener().await;
    let dialer = Arc::new(ScriptedDialer::always_connect_to(peer_addr));
    let factory = Arc::new(MockConnectionFactory::new());
    let config = ConnectionManagerConfig::default();
    let (handle, task) = ConnectionManager::spawn(&config, mock_ports(dialer, factory.clone()));

    let infos = handle.start_outgoing(vec![target()]).await.unwrap();
    timeout(WAIT, factory.wait_for_opened(1)).await.unwrap();

    let context = factory.context(0).unwrap();
    assert_eq!(context.role, ConnectionRole::Outbound { attempt: infos[0].id });
    assert_eq!(context.peer_addr, Some(peer_addr));
    assert!(context.local_addr.is_some());

    handle.shutdown().await.unwrap();
    task.await.unwrap().unwrap();
}

// =============================================================================
// TEST GROUP 3: Inbound connections
// =============================================================================

#[tokio::test]
async fn test_inbound_accept_and_disconnect() {
    let dialer = Arc::new(ScriptedDialer::always_refuse());
    let factory = Arc::new(MockConnectionFactory::new());
    let config = ConnectionManagerConfig::default();
    let (handle, task) = ConnectionManager::spawn(&config, mock_ports(dialer.clone(), factory.clone()));

    let listeners = handle.start_listening(vec![loopback_spec()]).await.unwrap();
    assert_eq!(listeners.len(), 1);
    assert_ne!(listeners[0].local_addr.port(), 0);

    let _client = TcpStream::connect(listeners[0].local_addr).await.unwrap();
    let snapshot = wait_for_snapshot(&handle, |s| s.connections.len() == 1).await;
    assert_eq!(snapshot.listeners[0].accepted, 1);
    assert_eq!(
        snapshot.connections[0].role,
        ConnectionRole::Inbound { listener: listeners[0].id }
    );

    assert!(factory.disconnect(0, DisconnectReason::RemoteClosed));
    wait_for_snapshot(&handle, |s| s.connections.is_empty()).await;

    assert!(factory.is_closed(0));
    assert_eq!(dialer.dial_count(), 0);
    assert_eq!(handle.connection_count().await.unwrap(), 0);

    handle.shutdown().await.unwrap();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_concurrent_disconnects_leave_others_untouched() {
    let (peer_addr, _peer) = peer_listener().await;
    let dialer = Arc::new(ScriptedDialer::always_connect_to(peer_addr));
    let factory = Arc::new(MockConnectionFactory::new());
    let config = config_with_retry(Duration::from_secs(60));
    let (handle, task) = ConnectionManager::spawn(&config, mock_ports(dialer.clone(), factory.clone()));

    let listeners = handle.start_listening(vec![loopback_spec()]).await.unwrap();
    let listener = listeners[0].id;
    let _a = TcpStream::connect(listeners[0].local_addr).await.unwrap();
    let _b = TcpStream::connect(listeners[0].local_addr).await.unwrap();
    let attempts = handle.start_outgoing(vec![target()]).await.unwrap();
    let attempt = attempts[0].id;

    let before = wait_for_snapshot(&handle, |s| s.connections.len() == 3).await;
    let inbound: Vec<usize> = (0..3)
        .filter(|i| factory.context(*i).unwrap().role == ConnectionRole::Inbound { listener })
        .collect();
    assert_eq!(inbound.len(), 2);
    let outbound = index_of(&factory, ConnectionRole::Outbound { attempt });

    // Handles follow registration order, which is the factory's open order
    let handle_of = |index: usize| ConnectionHandle::new(index as u64 + 1);
    let survivor = before
        .connections
        .iter()
        .find(|c| c.handle == handle_of(inbound[1]))
        .cloned()
        .unwrap();

    // Fire both before the manager gets to run
    assert!(factory.disconnect(inbound[0], DisconnectReason::RemoteClosed));
    assert!(factory.disconnect(outbound, DisconnectReason::Io("reset".into())));

    let after = wait_for_snapshot(&handle, |s| {
        s.stats.total_removed == 2 && s.connections.len() == 2
    })
    .await;

    assert!(after.connections.contains(&survivor));
    assert!(after.connections.iter().all(|c| c.handle != handle_of(inbound[0])));
    assert!(after.connections.iter().all(|c| c.handle != handle_of(outbound)));
    assert!(!factory.is_closed(inbound[1]));
    assert!(factory.is_closed(inbound[0]));
    assert!(factory.is_closed(outbound));

    // The outbound one was replaced by a fresh dial
    assert_eq!(dialer.dial_count(), 2);
    assert!(after.check_attempt_invariant());

    handle.shutdown().await.unwrap();
    task.await.unwrap().unwrap();
}

// =============================================================================
// TEST GROUP 4: Failure and shutdown
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_timer_failure_stops_manager() {
    let dialer = Arc::new(ScriptedDialer::always_refuse());
    let factory = Arc::new(MockConnectionFactory::new());
    let mut ports = mock_ports(dialer, factory);
    ports.retry_timer = Arc::new(FailingRetryTimer);
    let config = ConnectionManagerConfig::default();
    let (handle, task) = ConnectionManager::spawn(&config, ports);

    handle.start_outgoing(vec![target()]).await.unwrap();

    let result = task.await.unwrap();
    match result {
        Err(ConnectionManagerError::TimerSchedulingFailed { target, reason }) => {
            assert_eq!(target, "127.0.0.1:6666");
            assert!(reason.contains("simulated timer failure"));
        }
        other => panic!("expected timer failure, got {:?}", other),
    }

    assert_eq!(
        handle.snapshot().await,
        Err(ConnectionManagerError::ServiceStopped)
    );
    assert!(!handle.is_running());
}

#[tokio::test]
async fn test_shutdown_closes_connections() {
    let dialer = Arc::new(ScriptedDialer::always_refuse());
    let factory = Arc::new(MockConnectionFactory::new());
    let config = ConnectionManagerConfig::default();
    let (handle, task) = ConnectionManager::spawn(&config, mock_ports(dialer, factory.clone()));

    let listeners = handle.start_listening(vec![loopback_spec()]).await.unwrap();
    let _client = TcpStream::connect(listeners[0].local_addr).await.unwrap();
    wait_for_snapshot(&handle, |s| s.connections.len() == 1).await;

    handle.shutdown().await.unwrap();
    task.await.unwrap().unwrap();

    assert!(factory.is_closed(0));
    assert_eq!(
        handle.connection_count().await,
        Err(ConnectionManagerError::ServiceStopped)
    );
    assert_eq!(
        handle.shutdown().await,
        Err(ConnectionManagerError::ServiceStopped)
    );
}

#[tokio::test]
async fn test_dropping_every_handle_stops_manager() {
    let dialer = Arc::new(ScriptedDialer::always_refuse());
    let factory = Arc::new(MockConnectionFactory::new());
    let config = ConnectionManagerConfig::default();
    let (handle, task) = ConnectionManager::spawn(&config, mock_ports(dialer, factory));

    let clone = handle.clone();
    drop(handle);
    assert!(clone.is_running());
    drop(clone);

    timeout(WAIT, task).await.unwrap().unwrap().unwrap();
}

#[tokio::test]
async fn test_start_skips_malformed_endpoints() {
    let dialer = Arc::new(ScriptedDialer::always_refuse());
    let factory = Arc::new(MockConnectionFactory::new());
    let config = ConnectionManagerConfig {
        listen_endpoints: vec!["127.0.0.1:0".into(), "127.0.0.1:notaport".into()],
        outgoing_peers: vec!["127.0.0.1:6666".into(), "[]:1".into()],
        retry_delay: Duration::from_secs(60),
        ..Default::default()
    };

    let started = start(&config, mock_ports(dialer.clone(), factory)).await.unwrap();
    assert_eq!(started.listeners.len(), 1);
    assert_eq!(started.attempts.len(), 1);
    assert_eq!(started.attempts[0].target, target());

    timeout(WAIT, dialer.wait_for_dials(1)).await.unwrap();

    started.handle.shutdown().await.unwrap();
    started.task.await.unwrap().unwrap();
}
