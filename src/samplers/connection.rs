//! Backend latency and connection quality.

use crate::cache::TtlCache;
use crate::error::PingError;
use crate::host::ProxyHost;
use crate::sample::ConnectionQualitySample;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Staleness window of the connection-quality sample.
pub const CONNECTION_CACHE_WINDOW: Duration = Duration::from_secs(10);

/// Per-backend ping timeout.
pub const PING_TIMEOUT: Duration = Duration::from_secs(1);

/// Backends pinged per refresh.
pub const MAX_PINGED_BACKENDS: usize = 3;

pub struct ConnectionQualitySampler {
    host: Arc<dyn ProxyHost>,
    cache: TtlCache<ConnectionQualitySample>,
}

impl ConnectionQualitySampler {
    pub fn new(host: Arc<dyn ProxyHost>) -> Self {
        Self::with_window(host, CONNECTION_CACHE_WINDOW)
    }

    pub fn with_window(host: Arc<dyn ProxyHost>, window: Duration) -> Self {
        Self {
            host,
            cache: TtlCache::new(window),
        }
    }

    pub async fn sample(&self) -> ConnectionQualitySample {
        self.sample_at(Instant::now()).await
    }

    /// Returns the cached sample while fresh, otherwise pings up to
    /// [`MAX_PINGED_BACKENDS`] backends concurrently, each bounded by
    /// [`PING_TIMEOUT`].
    pub async fn sample_at(&self, now: Instant) -> ConnectionQualitySample {
        if let Some(cached) = self.cache.fresh(now) {
            return cached;
        }

        let backends: Vec<_> = self
            .host
            .list_backends()
            .into_iter()
            .take(MAX_PINGED_BACKENDS)
            .collect();

        let pings = backends.iter().map(|backend| async move {
            let outcome = tokio::time::timeout(
                PING_TIMEOUT,
                self.host.ping_backend(backend, PING_TIMEOUT),
            )
            .await
            .unwrap_or(Err(PingError::Timeout(PING_TIMEOUT)));

            if let Err(e) = &outcome {
                debug!("Ping failed for server {}: {}", backend.name, e);
            }
            outcome
        });

        let latencies: Vec<f64> = join_all(pings)
            .await
            .into_iter()
            .filter_map(Result::ok)
            .map(|latency| latency.as_secs_f64() * 1000.0)
            .collect();

        let sample = ConnectionQualitySample::from_pings(&latencies, backends.len());
        self.cache.store(now, sample);
        sample
    }

    /// (hits, misses) of the staleness cache.
    pub fn cache_counters(&self) -> (u64, u64) {
        self.cache.counters()
    }
}
