//! Physical memory usage.

use crate::sample::MemorySample;
use crate::system::SystemSource;
use std::sync::Arc;
use tracing::debug;

pub struct MemorySampler {
    source: Arc<dyn SystemSource>,
}

impl MemorySampler {
    pub fn new(source: Arc<dyn SystemSource>) -> Self {
        Self { source }
    }

    /// Current memory usage; an unreadable or inconsistent source yields the zero sample.
    pub fn sample(&self) -> MemorySample {
        match self.source.memory() {
            Ok(info) => {
                if info.total_bytes == 0 || info.available_bytes > info.total_bytes {
                    debug!(
                        "Invalid memory values: total={}, available={}",
                        info.total_bytes, info.available_bytes
                    );
                }
                MemorySample::from_totals(info.total_bytes, info.available_bytes)
            }
            Err(e) => {
                debug!("Error getting memory usage: {}", e);
                MemorySample::zeroed()
            }
        }
    }
}
