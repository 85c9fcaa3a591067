//! Staleness-window cache for expensive samples.
//!
//! This module provides `TtlCache`, which holds the most recent value of a
//! sampler together with its refresh instant. A value younger than the
//! window is returned as-is; older values force the caller to recompute.
//! Concurrent refreshes are last-writer-wins.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// A cached value with the instant it was computed.
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    refreshed_at: Instant,
    value: T,
}

/// Single-value cache with a fixed staleness window.
#[derive(Debug)]
pub struct TtlCache<T> {
    window: Duration,
    slot: RwLock<Option<CacheEntry<T>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            slot: RwLock::new(None),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns the cached value if `now - refreshed_at < window`.
    pub fn fresh(&self, now: Instant) -> Option<T> {
        let value = self.slot.read().ok().and_then(|guard| {
            guard
                .as_ref()
                .filter(|entry| now.saturating_duration_since(entry.refreshed_at) < self.window)
                .map(|entry| entry.value.clone())
        });

        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        value
    }

    /// Replaces the cached value and its timestamp in one write.
    pub fn store(&self, now: Instant, value: T) {
        if let Ok(mut guard) = self.slot.write() {
            *guard = Some(CacheEntry {
                refreshed_at: now,
                value,
            });
        }
    }

    /// Drops the cached value so the next read recomputes.
    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.slot.write() {
            *guard = None;
        }
    }

    /// Returns (hits, misses) observed by `fresh`.
    pub fn counters(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cache_misses() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(5));
        assert_eq!(cache.fresh(Instant::now()), None);
        assert_eq!(cache.counters(), (0, 1));
    }

    #[test]
    fn test_value_fresh_within_window() {
        let cache = TtlCache::new(Duration::from_secs(5));
        let t0 = Instant::now();
        cache.store(t0, 42u32);

        assert_eq!(cache.fresh(t0), Some(42));
        assert_eq!(cache.fresh(t0 + Duration::from_millis(4999)), Some(42));
        assert_eq!(cache.counters(), (2, 0));
    }

    #[test]
    fn test_value_stale_at_window_boundary() {
        let cache = TtlCache::new(Duration::from_secs(5));
        let t0 = Instant::now();
        cache.store(t0, 1u32);
        assert_eq!(cache.fresh(t0 + Duration::from_secs(5)), None);
    }

    #[test]
    fn test_last_writer_wins() {
        let cache = TtlCache::new(Duration::from_secs(10));
        let t0 = Instant::now();
        cache.store(t0, "first");
        cache.store(t0 + Duration::from_secs(1), "second");
        assert_eq!(cache.fresh(t0 + Duration::from_secs(2)), Some("second"));
    }

    #[test]
    fn test_invalidate() {
        let cache = TtlCache::new(Duration::from_secs(10));
        let t0 = Instant::now();
        cache.store(t0, 7u8);
        cache.invalidate();
        assert_eq!(cache.fresh(t0), None);
    }
}
