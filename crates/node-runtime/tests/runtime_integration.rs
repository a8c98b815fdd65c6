//! # Node Runtime Integration Tests
//!
//! Configuration loading from file and environment, and a full
//! start / report / shutdown cycle on loopback.

use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

use node_runtime::{load_config, NodeConfig, NodeConfigError, NodeRuntime};
use peer_connections::ConnectionManagerApi;
use tokio::net::TcpStream;

fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |var: &str| map.get(var).cloned()
}

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_no_sources_gives_defaults() {
    let config = load_config(env(&[])).unwrap();
    assert_eq!(config, NodeConfig::default());
    assert_eq!(config.status_interval, Duration::from_secs(30));
}

#[test]
fn test_file_then_env_overrides() {
    let file = write_config(
        r#"
        [listen]
        endpoints = ["0.0.0.0:9876"]

        [outgoing]
        peers = ["10.0.0.1:6666"]

        [retry]
        delay_secs = 3
        "#,
    );
    let path = file.path().to_str().unwrap();

    let config = load_config(env(&[
        ("NODE_CONFIG", path),
        ("NODE_OUTGOING_PEERS", "127.0.0.1:6666, [::1]:7000"),
        ("NODE_RETRY_DELAY_SECS", "5"),
        ("NODE_STATUS_INTERVAL_SECS", "10"),
    ]))
    .unwrap();

    // Untouched by env
    assert_eq!(config.connections.listen_endpoints, vec!["0.0.0.0:9876"]);
    assert_eq!(
        config.connections.outgoing_peers,
        vec!["127.0.0.1:6666", "[::1]:7000"]
    );
    assert_eq!(config.connections.retry_delay, Duration::from_secs(5));
    assert_eq!(config.status_interval, Duration::from_secs(10));
}

#[test]
fn test_missing_config_file_is_an_error() {
    let result = load_config(env(&[("NODE_CONFIG", "/nonexistent/node.toml")]));
    assert!(matches!(result, Err(NodeConfigError::File(_))));
}

#[test]
fn test_bad_interval_is_an_error() {
    let result = load_config(env(&[("NODE_STATUS_INTERVAL_SECS", "often")]));
    match result {
        Err(NodeConfigError::InvalidSeconds { var, value }) => {
            assert_eq!(var, "NODE_STATUS_INTERVAL_SECS");
            assert_eq!(value, "often");
        }
        other => panic!("expected InvalidSeconds, got {:?}", other),
    }
}

#[tokio::test]
async fn test_runtime_start_report_shutdown() {
    let mut config = load_config(env(&[
        ("NODE_LISTEN_ENDPOINTS", "127.0.0.1:0"),
        ("NODE_STATUS_INTERVAL_SECS", "1"),
    ]))
    .unwrap();
    config.connections.connect_timeout = Some(Duration::from_secs(1));

    let runtime = NodeRuntime::start(config).await.unwrap();
    let status = runtime.report_status().await.unwrap();
    assert_eq!(status.listeners.len(), 1);
    assert!(status.connections.is_empty());

    let _client = TcpStream::connect(status.listeners[0].local_addr)
        .await
        .unwrap();
    let handle = runtime.handle().clone();
    tokio::time::timeout(Duration::from_secs(5), async {
        while handle.connection_count().await.unwrap() != 1 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    runtime
        .run_until(tokio::time::sleep(Duration::from_millis(50)))
        .await
        .unwrap();
    assert!(!handle.is_running());
}
