//! Per-volume disk usage.

use crate::sample::DiskSample;
use crate::system::SystemSource;
use std::sync::Arc;
use tracing::debug;

pub struct DiskSampler {
    source: Arc<dyn SystemSource>,
}

impl DiskSampler {
    pub fn new(source: Arc<dyn SystemSource>) -> Self {
        Self { source }
    }

    /// Usage of every volume with a positive capacity, named by mount point.
    ///
    /// Volumes without capacity are dropped, not reported as zero.
    pub fn sample(&self) -> Vec<DiskSample> {
        match self.source.volumes() {
            Ok(volumes) => volumes
                .into_iter()
                .filter_map(|v| {
                    let sample =
                        DiskSample::from_capacity(&v.mount_point, v.total_bytes, v.available_bytes);
                    if sample.is_none() {
                        debug!(
                            "Skipping volume {}: total={}, free={}",
                            v.mount_point, v.total_bytes, v.available_bytes
                        );
                    }
                    sample
                })
                .collect(),
            Err(e) => {
                debug!("Error getting disk usage: {}", e);
                Vec::new()
            }
        }
    }
}
