use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::domain::OutgoingTarget;
use crate::ports::Dialer;

/// Dials with `TcpStream::connect`, resolving the host on every attempt.
///
/// With a connect timeout set, a connect that takes longer completes with
/// `io::ErrorKind::TimedOut` and goes down the normal backoff path.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpDialer {
    connect_timeout: Option<Duration>,
}

impl TcpDialer {
    /// Dialer without a timeout: connects run until the OS gives up.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound every connect by `timeout`.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

#[async_trait]
impl Dialer for TcpDialer {
    async fn dial(&self, target: &OutgoingTarget) -> io::Result<TcpStream> {
        let connect = TcpStream::connect(target.authority());
        match self.connect_timeout {
            None => connect.await,
            Some(limit) => tokio::time::timeout(limit, connect).await.map_err(|_| {
                io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connect to {} timed out after {:?}", target, limit),
                )
            })?,
        }
    }
}
