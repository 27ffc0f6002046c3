//! TcpProbeNetwork: the networking collaborator backed by a TCP reachability probe.
//!
//! `initialize` opens a TCP connection to `<address>:<probe_port>` and closes
//! it again once the handshake completes.  A completed handshake counts as
//! one reachable peer.  There is no application protocol on the socket; the
//! DPN link itself is simulated.
//!
//! # Portability note
//!
//! Only `tokio::net::TcpStream` is used, which behaves the same on Windows,
//! Linux, and macOS.

use std::net::{SocketAddr, SocketAddrV4};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use dpn_core::parse_ipv4;
use tokio::net::TcpStream;
use tracing::debug;

use crate::application::connect_session::{DpnNetwork, NetworkError};

/// Settings for [`TcpProbeNetwork`].
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub port: u16,
    pub timeout: Duration,
    /// Scheme shown in the session endpoint, e.g. `tcp`.
    pub scheme: String,
}

#[derive(Debug, Default)]
struct LinkState {
    peers: u32,
    endpoint: Option<String>,
}

/// [`DpnNetwork`] implementation that probes the peer over TCP.
#[derive(Debug)]
pub struct TcpProbeNetwork {
    config: ProbeConfig,
    link: Mutex<LinkState>,
}

impl TcpProbeNetwork {
    pub fn new(config: ProbeConfig) -> Self {
        Self {
            config,
            link: Mutex::new(LinkState::default()),
        }
    }

    fn set_link(&self, state: LinkState) {
        *self.link.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }
}

#[async_trait]
impl DpnNetwork for TcpProbeNetwork {
    async fn initialize(&self, device_id: &str, address: &str) -> Result<(), NetworkError> {
        let ip = parse_ipv4(address).ok_or_else(|| NetworkError::InvalidAddress(address.to_string()))?;
        let target = SocketAddr::V4(SocketAddrV4::new(ip, self.config.port));
        self.set_link(LinkState::default());

        debug!("{device_id}: probing {target}");
        let stream = match tokio::time::timeout(self.config.timeout, TcpStream::connect(target)).await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(NetworkError::Unreachable {
                    address: target.to_string(),
                    source,
                })
            }
            Err(_elapsed) => {
                return Err(NetworkError::Timeout {
                    address: target.to_string(),
                    after: self.config.timeout,
                })
            }
        };
        drop(stream);

        self.set_link(LinkState {
            peers: 1,
            endpoint: Some(format!("{}://{target}", self.config.scheme)),
        });
        debug!("{device_id}: {target} reachable");
        Ok(())
    }

    fn peer_count(&self) -> u32 {
        self.link.lock().unwrap_or_else(|e| e.into_inner()).peers
    }

    fn session_endpoint(&self) -> String {
        self.link
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .endpoint
            .clone()
            .unwrap_or_default()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn network_on(port: u16) -> TcpProbeNetwork {
        TcpProbeNetwork::new(ProbeConfig {
            port,
            timeout: Duration::from_secs(2),
            scheme: "tcp".to_string(),
        })
    }

    #[tokio::test]
    async fn test_initialize_succeeds_against_listening_peer() {
        // Arrange
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accept = tokio::spawn(async move { listener.accept().await.map(|_| ()) });
        let network = network_on(port);

        // Act
        let result = network.initialize("device-abc123def", "127.0.0.1").await;

        // Assert
        assert!(result.is_ok(), "{result:?}");
        assert_eq!(network.peer_count(), 1);
        assert_eq!(network.session_endpoint(), format!("tcp://127.0.0.1:{port}"));
        accept.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_initialize_accepts_leading_zero_octets() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let _accept = tokio::spawn(async move { listener.accept().await.map(|_| ()) });

        let result = network_on(port).initialize("device-x", "127.000.0.01").await;

        assert!(result.is_ok(), "{result:?}");
    }

    #[tokio::test]
    async fn test_initialize_reports_unreachable_peer() {
        // Arrange: grab a free port, then close it again.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let network = network_on(port);

        // Act
        let result = network.initialize("device-x", "127.0.0.1").await;

        // Assert
        assert!(matches!(result, Err(NetworkError::Unreachable { .. })));
        assert_eq!(network.peer_count(), 0);
        assert_eq!(network.session_endpoint(), "");
    }

    #[tokio::test]
    async fn test_initialize_rejects_non_ipv4_address() {
        let result = network_on(1).initialize("device-x", "localhost").await;
        assert!(matches!(result, Err(NetworkError::InvalidAddress(_))));
    }
}
