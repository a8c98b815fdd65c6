//! # Endpoints
//!
//! Host + port pairs used both for listen specs and outbound targets.
//!
//! Parsing is deliberately best-effort: the last colon separates host from
//! port unless the value is a bracketed IPv6 literal without a port, and
//! brackets are stripped from the host. Whatever comes out is handed to the
//! system resolver unchanged.

use std::fmt;

use serde::Serialize;

use super::errors::EndpointError;

/// Port applied when a configured value carries none.
pub const DEFAULT_PORT: u16 = 9876;

/// A host + numeric port. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Endpoint {
    host: String,
    port: u16,
}

/// Endpoint a listener binds to.
pub type ListenSpec = Endpoint;

/// Endpoint an outgoing attempt dials.
pub type OutgoingTarget = Endpoint;

impl Endpoint {
    /// Create an endpoint from an already-split host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse `host:port`, `[ipv6]:port`, `host` or `[ipv6]`.
    ///
    /// `default_port` is used when the value has no port part.
    pub fn parse(input: &str, default_port: u16) -> Result<Self, EndpointError> {
        let input = input.trim();
        let (raw_host, raw_port) = split_host_port(input);

        let host: String = raw_host.chars().filter(|c| *c != '[' && *c != ']').collect();
        if host.is_empty() {
            return Err(EndpointError::EmptyHost {
                input: input.to_string(),
            });
        }

        let port = match raw_port {
            None => default_port,
            Some(p) => p.parse::<u16>().map_err(|_| EndpointError::InvalidPort {
                input: input.to_string(),
                port: p.to_string(),
            })?,
        };

        Ok(Self { host, port })
    }

    /// Host name or IP literal, without brackets
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Numeric port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// `(host, port)` pair accepted by `tokio::net::lookup_host`.
    pub fn authority(&self) -> (&str, u16) {
        (&self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Split at the last colon, keeping bracketed literals without a port whole.
fn split_host_port(input: &str) -> (&str, Option<&str>) {
    let Some(last_colon) = input.rfind(':') else {
        return (input, None);
    };

    if last_colon > 0 && input.contains('[') {
        let closes_before_colon = input
            .rfind(']')
            .is_some_and(|close| close + 1 == last_colon);
        if !closes_before_colon {
            return (input, None);
        }
    }

    (&input[..last_colon], Some(&input[last_colon + 1..]))
}

/// Parse every value, returning the good endpoints and the rejected ones.
///
/// Rejections are not fatal: a bad listen value simply produces no listener.
pub fn parse_all<'a, I>(values: I, default_port: u16) -> (Vec<Endpoint>, Vec<EndpointError>)
where
    I: IntoIterator<Item = &'a str>,
{
    let mut endpoints = Vec::new();
    let mut rejected = Vec::new();
    for value in values {
        match Endpoint::parse(value, default_port) {
            Ok(endpoint) => endpoints.push(endpoint),
            Err(e) => rejected.push(e),
        }
    }
    (endpoints, rejected)
}
