//! Host capability interface.
//!
//! The pipeline never talks to a proxy API directly. It depends on
//! [`ProxyHost`], which lists backends, pings them and reports player
//! counts. [`StaticHost`] implements it from configuration: backends are
//! pinged with a TCP connect and player counts are pushed in by the embedder.

use crate::config::{parse_host_port, ProxyConfig};
use crate::error::{HostError, PingError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tracing::debug;

/// A backend server registered with the proxy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackendHandle {
    pub name: String,
    pub address: String,
}

/// Current and maximum player counts of the proxy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerCounts {
    pub current: u32,
    pub max: u32,
}

/// What the pipeline needs from the proxy it observes.
#[async_trait]
pub trait ProxyHost: Send + Sync {
    /// Backends in registration order.
    fn list_backends(&self) -> Vec<BackendHandle>;

    /// Measures round-trip latency to a backend. Implementations should
    /// give up after `timeout`.
    async fn ping_backend(
        &self,
        backend: &BackendHandle,
        timeout: Duration,
    ) -> Result<Duration, PingError>;

    fn current_player_counts(&self) -> Result<PlayerCounts, HostError>;

    /// Players currently connected to one backend.
    fn players_on(&self, backend: &BackendHandle) -> u32;
}

/// Config-driven host.
pub struct StaticHost {
    backends: Vec<BackendHandle>,
    max_players: AtomicU32,
    current_players: AtomicU32,
    per_backend: DashMap<String, u32>,
}

impl StaticHost {
    pub fn new(backends: Vec<BackendHandle>, max_players: u32) -> Self {
        Self {
            backends,
            max_players: AtomicU32::new(max_players),
            current_players: AtomicU32::new(0),
            per_backend: DashMap::new(),
        }
    }

    pub fn from_config(proxy: &ProxyConfig) -> Self {
        let backends = proxy
            .backends
            .iter()
            .map(|b| BackendHandle {
                name: b.name.clone(),
                address: b.address.clone(),
            })
            .collect();
        Self::new(backends, proxy.max_players)
    }

    /// Records the number of players on the proxy.
    pub fn set_player_count(&self, current: u32) {
        self.current_players.store(current, Ordering::Relaxed);
    }

    pub fn set_max_players(&self, max: u32) {
        self.max_players.store(max, Ordering::Relaxed);
    }

    /// Records the number of players on one backend.
    pub fn set_players_on(&self, backend: &str, players: u32) {
        self.per_backend.insert(backend.to_string(), players);
    }
}

#[async_trait]
impl ProxyHost for StaticHost {
    fn list_backends(&self) -> Vec<BackendHandle> {
        self.backends.clone()
    }

    async fn ping_backend(
        &self,
        backend: &BackendHandle,
        timeout: Duration,
    ) -> Result<Duration, PingError> {
        let (host, port) = parse_host_port(&backend.address)
            .ok_or_else(|| PingError::InvalidAddress(backend.address.clone()))?;

        let start = Instant::now();
        match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(_stream)) => Ok(start.elapsed()),
            Ok(Err(e)) => {
                debug!("Ping to backend {} failed: {}", backend.name, e);
                Err(PingError::Unreachable(e.to_string()))
            }
            Err(_) => Err(PingError::Timeout(timeout)),
        }
    }

    fn current_player_counts(&self) -> Result<PlayerCounts, HostError> {
        Ok(PlayerCounts {
            current: self.current_players.load(Ordering::Relaxed),
            max: self.max_players.load(Ordering::Relaxed),
        })
    }

    fn players_on(&self, backend: &BackendHandle) -> u32 {
        self.per_backend
            .get(&backend.name)
            .map(|entry| *entry.value())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;

    fn host() -> StaticHost {
        StaticHost::from_config(&ProxyConfig {
            name: "Proxy".into(),
            max_players: 200,
            pid: None,
            backends: vec![
                BackendConfig {
                    name: "lobby".into(),
                    address: "127.0.0.1:1".into(),
                },
                BackendConfig {
                    name: "survival".into(),
                    address: "not-an-address".into(),
                },
            ],
        })
    }

    #[test]
    fn test_static_host_counts() {
        let host = host();
        assert_eq!(host.list_backends().len(), 2);
        assert_eq!(
            host.current_player_counts().unwrap(),
            PlayerCounts { current: 0, max: 200 }
        );

        host.set_player_count(42);
        host.set_players_on("lobby", 30);
        let lobby = &host.list_backends()[0];
        assert_eq!(host.current_player_counts().unwrap().current, 42);
        assert_eq!(host.players_on(lobby), 30);
        assert_eq!(host.players_on(&host.list_backends()[1]), 0);

        host.set_max_players(500);
        assert_eq!(host.current_player_counts().unwrap().max, 500);
    }

    #[tokio::test]
    async fn test_ping_invalid_address() {
        let host = host();
        let backend = host.list_backends()[1].clone();
        let result = host.ping_backend(&backend, Duration::from_millis(100)).await;
        assert_eq!(
            result,
            Err(PingError::InvalidAddress("not-an-address".into()))
        );
    }

    #[tokio::test]
    async fn test_ping_listening_backend() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let host = StaticHost::new(
            vec![BackendHandle {
                name: "local".into(),
                address: addr.to_string(),
            }],
            10,
        );
        let backend = host.list_backends()[0].clone();
        let latency = host.ping_backend(&backend, Duration::from_secs(1)).await;
        assert!(latency.is_ok(), "ping failed: {:?}", latency);
    }
}
