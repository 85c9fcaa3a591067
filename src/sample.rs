//! Sample types produced by the samplers.
//!
//! Samples are created fresh on each tick and discarded once they have
//! been logged and evaluated. Constructors normalize raw readings so that
//! percentages are always finite and within [0, 100].

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;

/// Clamps a percentage to [0, 100]; NaN and infinities become 0.
pub fn normalize_percent(value: f64) -> f64 {
    if !value.is_finite() || value < 0.0 {
        return 0.0;
    }
    value.min(100.0)
}

/// Clamps a fraction to [0, 1]; NaN and infinities become 0.
pub fn normalize_fraction(value: f64) -> f64 {
    if !value.is_finite() || value < 0.0 {
        return 0.0;
    }
    value.min(1.0)
}

/// Formats a byte count with a binary unit: `512 B`, `1.50 KB`, `7.00 GB`.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else if bytes < GB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    }
}

/// Point-in-time physical memory state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MemorySample {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
    pub usage_percent: f64,
}

impl MemorySample {
    pub fn zeroed() -> Self {
        Self::default()
    }

    /// Builds a sample from total and available bytes.
    ///
    /// A zero total, or more available than total, yields the all-zero sample.
    pub fn from_totals(total_bytes: u64, available_bytes: u64) -> Self {
        if total_bytes == 0 || available_bytes > total_bytes {
            return Self::zeroed();
        }
        let used_bytes = total_bytes - available_bytes;
        Self {
            total_bytes,
            used_bytes,
            available_bytes,
            usage_percent: normalize_percent(used_bytes as f64 / total_bytes as f64 * 100.0),
        }
    }
}

/// Usage of one mounted volume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskSample {
    pub name: String,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub usage_percent: f64,
}

impl DiskSample {
    /// Builds a sample, or None when the volume has no capacity or reports
    /// more free space than its size.
    pub fn from_capacity(name: impl Into<String>, total_bytes: u64, free_bytes: u64) -> Option<Self> {
        if total_bytes == 0 || free_bytes > total_bytes {
            return None;
        }
        let used_bytes = total_bytes - free_bytes;
        Some(Self {
            name: name.into(),
            total_bytes,
            used_bytes,
            free_bytes,
            usage_percent: normalize_percent(used_bytes as f64 / total_bytes as f64 * 100.0),
        })
    }

    pub fn free_gb(&self) -> f64 {
        self.free_bytes as f64 / (1024.0 * 1024.0 * 1024.0)
    }
}

/// Proxy-level load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NetworkSample {
    pub current_players: u32,
    pub max_players: u32,
    pub utilization_percent: f64,
    pub online_servers: usize,
    pub total_servers: usize,
}

impl NetworkSample {
    pub fn new(
        current_players: u32,
        max_players: u32,
        online_servers: usize,
        total_servers: usize,
    ) -> Self {
        let utilization = if max_players > 0 {
            current_players as f64 / max_players as f64 * 100.0
        } else {
            0.0
        };
        Self {
            current_players,
            max_players,
            utilization_percent: normalize_percent(utilization),
            online_servers,
            total_servers,
        }
    }
}

/// Latency tier derived from the average backend ping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionQuality {
    Excellent,
    Good,
    Fair,
    Poor,
    Unknown,
}

impl ConnectionQuality {
    /// Tier for an average ping in milliseconds; negative means no valid ping.
    pub fn from_average_ping(average_ms: f64) -> Self {
        if !average_ms.is_finite() || average_ms < 0.0 {
            ConnectionQuality::Unknown
        } else if average_ms < 50.0 {
            ConnectionQuality::Excellent
        } else if average_ms < 100.0 {
            ConnectionQuality::Good
        } else if average_ms < 200.0 {
            ConnectionQuality::Fair
        } else {
            ConnectionQuality::Poor
        }
    }
}

impl fmt::Display for ConnectionQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionQuality::Excellent => "Excellent",
            ConnectionQuality::Good => "Good",
            ConnectionQuality::Fair => "Fair",
            ConnectionQuality::Poor => "Poor",
            ConnectionQuality::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Backend latency and reachability.
///
/// Pings are in milliseconds; -1 means unknown. `packet_loss_percent` is -1
/// when no backend was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConnectionQualitySample {
    pub average_ping_ms: f64,
    pub max_ping_ms: f64,
    pub quality: ConnectionQuality,
    pub packet_loss_percent: f64,
}

impl ConnectionQualitySample {
    pub fn unknown() -> Self {
        Self {
            average_ping_ms: -1.0,
            max_ping_ms: -1.0,
            quality: ConnectionQuality::Unknown,
            packet_loss_percent: -1.0,
        }
    }

    /// Aggregates the latencies of successful pings out of `attempted` checks.
    pub fn from_pings(latencies_ms: &[f64], attempted: usize) -> Self {
        let valid: Vec<f64> = latencies_ms
            .iter()
            .copied()
            .filter(|ms| ms.is_finite() && *ms >= 0.0)
            .collect();

        let packet_loss_percent = if attempted > 0 {
            let failed = attempted.saturating_sub(valid.len());
            normalize_percent(failed as f64 / attempted as f64 * 100.0)
        } else {
            -1.0
        };

        if valid.is_empty() {
            return Self {
                packet_loss_percent,
                ..Self::unknown()
            };
        }

        let average = valid.iter().sum::<f64>() / valid.len() as f64;
        let max = valid.iter().copied().fold(0.0_f64, f64::max);

        Self {
            average_ping_ms: average,
            max_ping_ms: max,
            quality: ConnectionQuality::from_average_ping(average),
            packet_loss_percent,
        }
    }
}

/// Runtime health of the observed process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct JvmSample {
    pub heap_utilization_percent: f64,
    pub non_heap_used_mb: f64,
    pub thread_count: u64,
    pub loaded_class_count: u64,
    pub total_gc_time_ms: u64,
}

/// Outcome of one sampler on one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Reading<T> {
    /// The monitor is turned off; the field is omitted from the log line.
    Disabled,
    /// The monitor is on but the host does not allow it; logged as `N/A`.
    Unavailable,
    Sampled(T),
}

impl<T> Reading<T> {
    pub fn sampled(&self) -> Option<&T> {
        match self {
            Reading::Sampled(value) => Some(value),
            _ => None,
        }
    }
}

/// Everything gathered on one tick.
#[derive(Debug, Clone, Serialize)]
pub struct TickSnapshot {
    pub timestamp: DateTime<Local>,
    /// CPU load as a fraction in [0, 1].
    pub cpu: Reading<f64>,
    pub memory: Reading<MemorySample>,
    pub disks: Reading<Vec<DiskSample>>,
    pub network: Reading<NetworkSample>,
    pub jvm: Reading<JvmSample>,
    pub connection: Reading<ConnectionQualitySample>,
}

impl TickSnapshot {
    /// A snapshot with every monitor disabled.
    pub fn empty(timestamp: DateTime<Local>) -> Self {
        Self {
            timestamp,
            cpu: Reading::Disabled,
            memory: Reading::Disabled,
            disks: Reading::Disabled,
            network: Reading::Disabled,
            jvm: Reading::Disabled,
            connection: Reading::Disabled,
        }
    }

    /// CPU usage in percent, 0 when not sampled.
    pub fn cpu_percent(&self) -> f64 {
        self.cpu.sampled().map(|c| c * 100.0).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIB: u64 = 1024 * 1024 * 1024;

    #[test]
    fn test_normalize_percent() {
        assert_eq!(normalize_percent(f64::NAN), 0.0);
        assert_eq!(normalize_percent(f64::INFINITY), 0.0);
        assert_eq!(normalize_percent(f64::NEG_INFINITY), 0.0);
        assert_eq!(normalize_percent(-3.0), 0.0);
        assert_eq!(normalize_percent(150.0), 100.0);
        assert_eq!(normalize_percent(42.5), 42.5);
    }

    #[test]
    fn test_normalize_fraction() {
        assert_eq!(normalize_fraction(f64::NAN), 0.0);
        assert_eq!(normalize_fraction(1.5), 1.0);
        assert_eq!(normalize_fraction(-0.1), 0.0);
        assert_eq!(normalize_fraction(0.25), 0.25);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_bytes(7 * GIB), "7.00 GB");
    }

    #[test]
    fn test_memory_sample_from_totals() {
        let sample = MemorySample::from_totals(8 * GIB, GIB);
        assert_eq!(sample.used_bytes, 7 * GIB);
        assert_eq!(sample.available_bytes, GIB);
        assert!((sample.usage_percent - 87.5).abs() < 1e-9);
    }

    #[test]
    fn test_memory_sample_invalid_inputs_are_zeroed() {
        assert_eq!(MemorySample::from_totals(0, 0), MemorySample::zeroed());
        assert_eq!(MemorySample::from_totals(GIB, 2 * GIB), MemorySample::zeroed());
    }

    #[test]
    fn test_disk_sample_drops_empty_volumes() {
        assert!(DiskSample::from_capacity("/boot", 0, 0).is_none());
        assert!(DiskSample::from_capacity("/weird", 10, 20).is_none());
        let disk = DiskSample::from_capacity("/", 100, 5).unwrap();
        assert_eq!(disk.used_bytes, 95);
        assert!((disk.usage_percent - 95.0).abs() < 1e-9);
    }

    #[test]
    fn test_network_sample_utilization() {
        assert_eq!(NetworkSample::new(10, 0, 1, 2).utilization_percent, 0.0);
        assert!((NetworkSample::new(25, 100, 1, 2).utilization_percent - 25.0).abs() < 1e-9);
        // Overfull proxies stay within bounds
        assert_eq!(NetworkSample::new(150, 100, 1, 2).utilization_percent, 100.0);
    }

    #[test]
    fn test_connection_quality_tiers() {
        assert_eq!(ConnectionQuality::from_average_ping(-1.0), ConnectionQuality::Unknown);
        assert_eq!(ConnectionQuality::from_average_ping(49.9), ConnectionQuality::Excellent);
        assert_eq!(ConnectionQuality::from_average_ping(50.0), ConnectionQuality::Good);
        assert_eq!(ConnectionQuality::from_average_ping(99.9), ConnectionQuality::Good);
        assert_eq!(ConnectionQuality::from_average_ping(150.0), ConnectionQuality::Fair);
        assert_eq!(ConnectionQuality::from_average_ping(200.0), ConnectionQuality::Poor);
    }

    #[test]
    fn test_connection_sample_from_pings() {
        let sample = ConnectionQualitySample::from_pings(&[20.0, 40.0], 3);
        assert!((sample.average_ping_ms - 30.0).abs() < 1e-9);
        assert_eq!(sample.max_ping_ms, 40.0);
        assert_eq!(sample.quality, ConnectionQuality::Excellent);
        assert!((sample.packet_loss_percent - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_connection_sample_without_valid_pings() {
        let sample = ConnectionQualitySample::from_pings(&[], 2);
        assert_eq!(sample.average_ping_ms, -1.0);
        assert_eq!(sample.max_ping_ms, -1.0);
        assert_eq!(sample.quality, ConnectionQuality::Unknown);
        assert_eq!(sample.packet_loss_percent, 100.0);

        let none_attempted = ConnectionQualitySample::from_pings(&[], 0);
        assert_eq!(none_attempted.packet_loss_percent, -1.0);
    }
}
