//! CPU load from tick-counter deltas.

use crate::sample::normalize_fraction;
use crate::system::{CpuStat, SystemSource};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Computes system CPU load between consecutive calls.
///
/// The previous tick snapshot is shared state; the mutex serializes
/// concurrent callers so each delta is taken against exactly one
/// predecessor.
pub struct CpuSampler {
    source: Arc<dyn SystemSource>,
    previous: Mutex<Option<CpuStat>>,
}

impl CpuSampler {
    /// Creates the sampler and primes it with the current counters so the
    /// first `sample` already measures a real interval.
    pub fn new(source: Arc<dyn SystemSource>) -> Self {
        let initial = source.cpu_times().ok();
        Self {
            source,
            previous: Mutex::new(initial),
        }
    }

    /// CPU load in [0, 1] since the previous call; 0 when unknown.
    pub fn sample(&self) -> f64 {
        let current = match self.source.cpu_times() {
            Ok(stat) => stat,
            Err(e) => {
                debug!("Error getting CPU usage: {}", e);
                return 0.0;
            }
        };

        let mut previous = match self.previous.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let load = previous
            .as_ref()
            .map(|prev| load_between(prev, &current))
            .unwrap_or(0.0);
        *previous = Some(current);

        let normalized = normalize_fraction(load);
        if normalized != load {
            debug!("Invalid CPU usage value: {}, normalized to {}", load, normalized);
        }
        normalized
    }
}

/// Busy fraction between two snapshots. Counter resets yield 0.
pub fn load_between(previous: &CpuStat, current: &CpuStat) -> f64 {
    let delta_total = current.total().saturating_sub(previous.total());
    let delta_idle = current.idle_total().saturating_sub(previous.idle_total());

    if delta_total == 0 {
        return 0.0;
    }
    delta_total.saturating_sub(delta_idle) as f64 / delta_total as f64
}
