/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! TCP connect and bind helpers.

use fixline_core::error::ConnectionError;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream, lookup_host};
use tracing::debug;

/// Socket options applied to every connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpOptions {
    /// Disable Nagle's algorithm.
    pub nodelay: bool,
    /// Optional bound on the connect attempt.
    pub connect_timeout: Option<Duration>,
}

impl Default for TcpOptions {
    fn default() -> Self {
        Self {
            nodelay: true,
            connect_timeout: None,
        }
    }
}

/// Resolves `host:port` to the first socket address.
///
/// # Errors
/// Returns `ConnectionError::Resolve` if the name cannot be resolved.
pub async fn resolve(host: &str, port: u16) -> Result<SocketAddr, ConnectionError> {
    let resolve_error = |reason: String| ConnectionError::Resolve {
        address: format!("{host}:{port}"),
        reason,
    };
    let mut addresses = lookup_host((host, port))
        .await
        .map_err(|e| resolve_error(e.to_string()))?;
    addresses
        .next()
        .ok_or_else(|| resolve_error("no addresses returned".to_string()))
}

/// Resolves `host`, opens a TCP connection and applies `options`.
///
/// # Errors
/// Returns `ConnectionError::Resolve` if the name cannot be resolved,
/// `ConnectionError::Connect` if the connection is refused or the socket
/// cannot be configured, and `ConnectionError::Timeout` if
/// `connect_timeout` elapses first.
pub async fn connect(host: &str, port: u16, options: TcpOptions) -> Result<TcpStream, ConnectionError> {
    let attempt = async {
        let addr = resolve(host, port).await?;
        TcpStream::connect(addr)
            .await
            .map_err(|e| ConnectionError::Connect {
                address: addr.to_string(),
                reason: e.to_string(),
            })
    };

    let stream = match options.connect_timeout {
        Some(limit) => tokio::time::timeout(limit, attempt).await.map_err(|_| {
            ConnectionError::Timeout {
                address: format!("{host}:{port}"),
                timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            }
        })??,
        None => attempt.await?,
    };

    configure(&stream, options).map_err(|e| ConnectionError::Connect {
        address: format!("{host}:{port}"),
        reason: e.to_string(),
    })?;
    debug!(host, port, nodelay = options.nodelay, "tcp connection established");
    Ok(stream)
}

/// Binds a listener on all interfaces at `port` (0 picks a free port).
///
/// # Errors
/// Returns `ConnectionError::Connect` if the port cannot be bound.
pub async fn bind(port: u16) -> Result<TcpListener, ConnectionError> {
    TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|e| ConnectionError::Connect {
            address: format!("0.0.0.0:{port}"),
            reason: e.to_string(),
        })
}

/// Applies `options` to an accepted or connected stream.
///
/// # Errors
/// Returns the underlying I/O error if a socket option cannot be set.
pub fn configure(stream: &TcpStream, options: TcpOptions) -> std::io::Result<()> {
    stream.set_nodelay(options.nodelay)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_sets_nodelay() {
        let listener = bind(0).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let stream = connect("127.0.0.1", port, TcpOptions::default())
            .await
            .unwrap();
        assert!(stream.nodelay().unwrap());
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = bind(0).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = connect("127.0.0.1", port, TcpOptions::default()).await;
        assert!(matches!(result, Err(ConnectionError::Connect { .. })));
    }

    #[tokio::test]
    async fn test_resolve_localhost() {
        let addr = resolve("127.0.0.1", 9880).await.unwrap();
        assert_eq!(addr.port(), 9880);
    }

    #[tokio::test]
    async fn test_connect_unknown_host_is_resolve_error() {
        let result = connect("no-such-host.invalid", 9880, TcpOptions::default()).await;
        assert!(
            matches!(&result, Err(ConnectionError::Resolve { address, .. }) if address == "no-such-host.invalid:9880"),
            "unexpected result: {result:?}"
        );
    }

    #[tokio::test]
    async fn test_connect_timeout_elapses() {
        let options = TcpOptions {
            connect_timeout: Some(Duration::from_millis(100)),
            ..TcpOptions::default()
        };
        let result = connect("10.255.255.1", 9880, options).await;
        match result {
            Err(ConnectionError::Timeout { timeout_ms, .. }) => assert_eq!(timeout_ms, 100),
            // hosts with no route at all fail before the timer fires
            Err(ConnectionError::Connect { reason, .. }) => {
                assert!(reason.to_lowercase().contains("unreachable"), "{reason}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
