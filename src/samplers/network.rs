//! Proxy-level player load and backend availability.

use crate::cache::TtlCache;
use crate::host::ProxyHost;
use crate::sample::NetworkSample;
use futures_util::FutureExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Staleness window of the network sample.
pub const NETWORK_CACHE_WINDOW: Duration = Duration::from_secs(5);

/// Upper bound handed to the host for the immediate availability poll.
const AVAILABILITY_PING_TIMEOUT: Duration = Duration::from_secs(1);

pub struct NetworkSampler {
    host: Arc<dyn ProxyHost>,
    cache: TtlCache<NetworkSample>,
}

impl NetworkSampler {
    pub fn new(host: Arc<dyn ProxyHost>) -> Self {
        Self::with_window(host, NETWORK_CACHE_WINDOW)
    }

    pub fn with_window(host: Arc<dyn ProxyHost>, window: Duration) -> Self {
        Self {
            host,
            cache: TtlCache::new(window),
        }
    }

    pub fn sample(&self) -> NetworkSample {
        self.sample_at(Instant::now())
    }

    /// Returns the cached sample while fresh, otherwise queries the host.
    ///
    /// A backend counts as online when it has connected players or when a
    /// single poll of its ping has not already failed. Pings are never
    /// awaited, so a ping still in flight counts as online. Failed host
    /// queries yield the zero sample and are not cached.
    pub fn sample_at(&self, now: Instant) -> NetworkSample {
        if let Some(cached) = self.cache.fresh(now) {
            return cached;
        }

        let counts = match self.host.current_player_counts() {
            Ok(counts) => counts,
            Err(e) => {
                debug!("Error getting network data: {}", e);
                return NetworkSample::default();
            }
        };

        let backends = self.host.list_backends();
        let online = backends
            .iter()
            .filter(|backend| {
                if self.host.players_on(backend) > 0 {
                    return true;
                }
                !matches!(
                    self.host
                        .ping_backend(backend, AVAILABILITY_PING_TIMEOUT)
                        .now_or_never(),
                    Some(Err(_))
                )
            })
            .count();

        let sample = NetworkSample::new(counts.current, counts.max, online, backends.len());
        self.cache.store(now, sample);
        sample
    }

    /// (hits, misses) of the staleness cache.
    pub fn cache_counters(&self) -> (u64, u64) {
        self.cache.counters()
    }
}
