//! Overall health classification for status reporting.
//!
//! Health is derived from the same thresholds as alerts but ignores the
//! cooldown path entirely. CPU and RAM enter a "Caution" band at 80% of
//! their threshold; any breach is a "Warning"; CPU and RAM breaching
//! together is "Critical".
//!
//! # Usage
//!
//! ```rust
//! use proxy_usage_monitor::config::Thresholds;
//! use proxy_usage_monitor::health::{classify, HealthStatus};
//!
//! let report = classify(&Thresholds::default(), 70.0, 40.0, &[]);
//! assert_eq!(report.overall, HealthStatus::Caution);
//! ```

use crate::config::Thresholds;
use crate::sample::DiskSample;
use serde::Serialize;
use std::fmt;

/// Fraction of a threshold at which a resource enters the caution band.
pub const CAUTION_RATIO: f64 = 0.8;

/// Derived health tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    Healthy,
    Caution,
    Warning,
    Critical,
}

impl HealthStatus {
    pub fn emoji(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "✅",
            HealthStatus::Caution => "⚠️",
            HealthStatus::Warning => "🟠",
            HealthStatus::Critical => "🔴",
        }
    }

    /// Discord embed color.
    pub fn color(&self) -> u32 {
        match self {
            HealthStatus::Healthy => 5763719,
            HealthStatus::Caution => 16776960,
            HealthStatus::Warning => 16753920,
            HealthStatus::Critical => 16711680,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HealthStatus::Healthy => "Healthy",
            HealthStatus::Caution => "Caution",
            HealthStatus::Warning => "Warning",
            HealthStatus::Critical => "Critical",
        };
        f.write_str(name)
    }
}

/// Health of a single resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceHealth {
    /// Resource name, e.g. "cpu", "ram" or "disk:/data".
    pub name: String,
    pub usage_percent: f64,
    pub threshold_percent: f64,
    pub status: HealthStatus,
}

/// Health of every resource plus the overall tier.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub resources: Vec<ResourceHealth>,
    pub overall: HealthStatus,
}

/// Classifies current usage against the thresholds.
pub fn classify(
    thresholds: &Thresholds,
    cpu_percent: f64,
    ram_percent: f64,
    disks: &[DiskSample],
) -> HealthReport {
    let mut resources = vec![
        ResourceHealth {
            name: "cpu".to_string(),
            usage_percent: cpu_percent,
            threshold_percent: thresholds.cpu,
            status: evaluate_status(cpu_percent, thresholds.cpu, true),
        },
        ResourceHealth {
            name: "ram".to_string(),
            usage_percent: ram_percent,
            threshold_percent: thresholds.ram,
            status: evaluate_status(ram_percent, thresholds.ram, true),
        },
    ];

    resources.extend(disks.iter().map(|disk| ResourceHealth {
        name: format!("disk:{}", disk.name),
        usage_percent: disk.usage_percent,
        threshold_percent: thresholds.disk,
        status: evaluate_status(disk.usage_percent, thresholds.disk, false),
    }));

    let cpu_high = resources[0].status == HealthStatus::Warning;
    let ram_high = resources[1].status == HealthStatus::Warning;

    // Worst resource wins; CPU and RAM breaching together escalates to critical.
    let overall = if cpu_high && ram_high {
        HealthStatus::Critical
    } else {
        resources
            .iter()
            .map(|r| status_priority(r.status))
            .max()
            .map(priority_to_status)
            .unwrap_or(HealthStatus::Healthy)
    };

    HealthReport { resources, overall }
}

/// Status of one resource: Warning above the threshold, Caution above
/// 80% of it when `with_caution` is set, otherwise Healthy.
fn evaluate_status(percent: f64, threshold: f64, with_caution: bool) -> HealthStatus {
    if percent > threshold {
        HealthStatus::Warning
    } else if with_caution && percent > threshold * CAUTION_RATIO {
        HealthStatus::Caution
    } else {
        HealthStatus::Healthy
    }
}

/// Returns a numeric priority for status (higher = worse).
fn status_priority(status: HealthStatus) -> u8 {
    match status {
        HealthStatus::Healthy => 0,
        HealthStatus::Caution => 1,
        HealthStatus::Warning => 2,
        HealthStatus::Critical => 3,
    }
}

/// Converts a priority number back to a status.
fn priority_to_status(priority: u8) -> HealthStatus {
    match priority {
        0 => HealthStatus::Healthy,
        1 => HealthStatus::Caution,
        2 => HealthStatus::Warning,
        _ => HealthStatus::Critical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disk(name: &str, used_percent: u64) -> DiskSample {
        DiskSample::from_capacity(name, 100, 100 - used_percent).unwrap()
    }

    #[test]
    fn test_healthy() {
        let report = classify(&Thresholds::default(), 10.0, 20.0, &[disk("/", 50)]);
        assert_eq!(report.overall, HealthStatus::Healthy);
        assert_eq!(report.resources.len(), 3);
    }

    #[test]
    fn test_caution_band() {
        // 80% of the 85% RAM threshold is 68%
        let report = classify(&Thresholds::default(), 10.0, 70.0, &[]);
        assert_eq!(report.overall, HealthStatus::Caution);
    }

    #[test]
    fn test_disk_has_no_caution_band() {
        let report = classify(&Thresholds::default(), 10.0, 10.0, &[disk("/", 85)]);
        assert_eq!(report.overall, HealthStatus::Healthy);
    }

    #[test]
    fn test_single_breach_is_warning() {
        let report = classify(&Thresholds::default(), 10.0, 10.0, &[disk("/", 95)]);
        assert_eq!(report.overall, HealthStatus::Warning);

        let report = classify(&Thresholds::default(), 90.0, 10.0, &[]);
        assert_eq!(report.overall, HealthStatus::Warning);
    }

    #[test]
    fn test_cpu_and_ram_is_critical() {
        let report = classify(&Thresholds::default(), 85.0, 87.5, &[]);
        assert_eq!(report.overall, HealthStatus::Critical);
    }

    #[test]
    fn test_cpu_and_disk_is_only_warning() {
        let report = classify(&Thresholds::default(), 85.0, 10.0, &[disk("/", 95)]);
        assert_eq!(report.overall, HealthStatus::Warning);
    }

    #[test]
    fn test_priority_roundtrip() {
        for status in [
            HealthStatus::Healthy,
            HealthStatus::Caution,
            HealthStatus::Warning,
            HealthStatus::Critical,
        ] {
            assert_eq!(priority_to_status(status_priority(status)), status);
        }
    }

    #[test]
    fn test_colors() {
        assert_eq!(HealthStatus::Healthy.color(), 5763719);
        assert_eq!(HealthStatus::Critical.color(), 16711680);
    }
}
