//! Runtime heap, thread, class and collector statistics.

use crate::runtime::RuntimeProbe;
use crate::sample::{normalize_percent, JvmSample};
use std::sync::Arc;
use tracing::debug;

pub struct JvmSampler {
    probe: Arc<dyn RuntimeProbe>,
}

impl JvmSampler {
    pub fn new(probe: Arc<dyn RuntimeProbe>) -> Self {
        Self { probe }
    }

    /// Reads every figure independently; a failed read leaves that field at 0.
    pub fn sample(&self) -> JvmSample {
        let heap_utilization_percent = match self.probe.heap() {
            Ok(heap) if heap.max_bytes > 0 => {
                normalize_percent(heap.used_bytes as f64 / heap.max_bytes as f64 * 100.0)
            }
            Ok(_) => 0.0,
            Err(e) => {
                debug!("Heap usage not available: {}", e);
                0.0
            }
        };

        let non_heap_used_mb = self
            .probe
            .non_heap_used_bytes()
            .map(|bytes| bytes as f64 / (1024.0 * 1024.0))
            .unwrap_or_else(|e| {
                debug!("Non-heap usage not available: {}", e);
                0.0
            });

        let thread_count = self.probe.thread_count().unwrap_or_else(|e| {
            debug!("Thread count not available: {}", e);
            0
        });

        let loaded_class_count = self.probe.loaded_class_count().unwrap_or_else(|e| {
            debug!("Class loading info not available: {}", e);
            0
        });

        let total_gc_time_ms = self
            .probe
            .gc_collection_times_ms()
            .map(|times| times.into_iter().filter(|t| *t > 0).map(|t| t as u64).sum())
            .unwrap_or_else(|e| {
                debug!("GC info not available: {}", e);
                0
            });

        JvmSample {
            heap_utilization_percent,
            non_heap_used_mb,
            thread_count,
            loaded_class_count,
            total_gc_time_ms,
        }
    }
}
