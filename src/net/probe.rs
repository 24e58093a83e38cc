//! TCP connectivity probe.

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time;

/// Checks whether `host:port` accepts connections.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn reachable(&self, host: &str, port: u16, timeout: Duration) -> bool;
}

/// Opens (and immediately drops) a TCP connection.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpProbe;

#[async_trait]
impl ConnectivityProbe for TcpProbe {
    async fn reachable(&self, host: &str, port: u16, timeout: Duration) -> bool {
        match time::timeout(timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                tracing::debug!(host = %host, port, error = %e, "Probe failed: connection error");
                false
            }
            Err(_) => {
                tracing::debug!(host = %host, port, "Probe failed: timeout");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_probe_open_and_closed_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(TcpProbe.reachable("127.0.0.1", port, Duration::from_secs(1)).await);

        drop(listener);
        assert!(!TcpProbe.reachable("127.0.0.1", port, Duration::from_secs(1)).await);
    }
}
