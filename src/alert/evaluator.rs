//! Threshold evaluation.

use super::{Alert, AlertKind};
use crate::config::Thresholds;
use crate::sample::{format_bytes, normalize_fraction, DiskSample, MemorySample};

/// Values checked against the thresholds on one pass.
///
/// Missing samples are evaluated as zeroed defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluationInput<'a> {
    /// CPU load as a fraction in [0, 1].
    pub cpu_usage: f64,
    pub memory: Option<&'a MemorySample>,
    pub disks: Option<&'a [DiskSample]>,
}

/// Which thresholds a set of samples breaches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Breaches {
    pub cpu: bool,
    pub ram: bool,
    /// Number of volumes above the disk threshold.
    pub disks: usize,
}

impl Breaches {
    /// Two of {CPU, RAM}, or one of them together with any disk.
    pub fn is_critical(&self) -> bool {
        let count = self.cpu as usize + self.ram as usize;
        count >= 2 || (count >= 1 && self.disks > 0)
    }
}

/// Compares samples against configured thresholds.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdEvaluator {
    thresholds: Thresholds,
}

impl ThresholdEvaluator {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn breaches(&self, input: &EvaluationInput<'_>) -> Breaches {
        let cpu_percent = normalize_fraction(input.cpu_usage) * 100.0;
        let ram_percent = input.memory.map(|m| m.usage_percent).unwrap_or(0.0);
        let disks = input
            .disks
            .unwrap_or(&[])
            .iter()
            .filter(|d| d.usage_percent > self.thresholds.disk)
            .count();

        Breaches {
            cpu: cpu_percent > self.thresholds.cpu,
            ram: ram_percent > self.thresholds.ram,
            disks,
        }
    }

    /// Candidate alerts for one pass, before cooldown gating.
    ///
    /// Emits one DiskHigh per breached volume, and SystemCritical alongside
    /// its constituent alerts.
    pub fn evaluate(&self, input: &EvaluationInput<'_>) -> Vec<Alert> {
        let t = &self.thresholds;
        let zero_memory = MemorySample::zeroed();
        let memory = input.memory.unwrap_or(&zero_memory);
        let disks = input.disks.unwrap_or(&[]);
        let cpu_percent = normalize_fraction(input.cpu_usage) * 100.0;
        let breaches = self.breaches(input);

        let mut alerts = Vec::new();

        if breaches.cpu {
            alerts.push(Alert::new(
                AlertKind::CpuHigh,
                format!("CPU usage is {:.2}% (threshold: {:.1}%)", cpu_percent, t.cpu),
            ));
        }

        if breaches.ram {
            alerts.push(Alert::new(
                AlertKind::RamHigh,
                format!(
                    "RAM usage is {:.2}% (threshold: {:.1}%) - {}/{}",
                    memory.usage_percent,
                    t.ram,
                    format_bytes(memory.used_bytes),
                    format_bytes(memory.total_bytes)
                ),
            ));
        }

        for disk in disks.iter().filter(|d| d.usage_percent > t.disk) {
            alerts.push(Alert::new(
                AlertKind::DiskHigh,
                format!(
                    "Disk {} usage is {:.2}% (threshold: {:.1}%) - {}/{}",
                    disk.name,
                    disk.usage_percent,
                    t.disk,
                    format_bytes(disk.used_bytes),
                    format_bytes(disk.total_bytes)
                ),
            ));
        }

        if breaches.is_critical() {
            alerts.push(Alert::new(
                AlertKind::SystemCritical,
                format!(
                    "Multiple system resources are under stress! CPU: {:.2}%, RAM: {:.2}%, Disks with issues: {}",
                    cpu_percent, memory.usage_percent, breaches.disks
                ),
            ));
        }

        alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIB: u64 = 1024 * 1024 * 1024;

    fn evaluator() -> ThresholdEvaluator {
        ThresholdEvaluator::new(Thresholds::default())
    }

    fn kinds(alerts: &[Alert]) -> Vec<AlertKind> {
        alerts.iter().map(|a| a.kind).collect()
    }

    #[test]
    fn test_no_alerts_below_thresholds() {
        let memory = MemorySample::from_totals(8 * GIB, 4 * GIB);
        let input = EvaluationInput {
            cpu_usage: 0.5,
            memory: Some(&memory),
            disks: None,
        };
        assert!(evaluator().evaluate(&input).is_empty());
    }

    #[test]
    fn test_threshold_is_strictly_greater() {
        let input = EvaluationInput {
            cpu_usage: 0.80,
            ..Default::default()
        };
        assert!(evaluator().evaluate(&input).is_empty());
    }

    #[test]
    fn test_single_ram_breach_is_not_critical() {
        let memory = MemorySample::from_totals(8 * GIB, GIB);
        let input = EvaluationInput {
            cpu_usage: 0.1,
            memory: Some(&memory),
            disks: None,
        };
        let alerts = evaluator().evaluate(&input);
        assert_eq!(kinds(&alerts), vec![AlertKind::RamHigh]);
        assert_eq!(
            alerts[0].message,
            "RAM usage is 87.50% (threshold: 85.0%) - 7.00 GB/8.00 GB"
        );
    }

    #[test]
    fn test_disk_alert_per_volume() {
        let disks = vec![
            DiskSample::from_capacity("/", 100 * GIB, 5 * GIB).unwrap(),
            DiskSample::from_capacity("/data", 100 * GIB, 50 * GIB).unwrap(),
            DiskSample::from_capacity("/srv", 100 * GIB, GIB).unwrap(),
        ];
        let input = EvaluationInput {
            cpu_usage: 0.0,
            memory: None,
            disks: Some(&disks),
        };
        let alerts = evaluator().evaluate(&input);
        assert_eq!(kinds(&alerts), vec![AlertKind::DiskHigh, AlertKind::DiskHigh]);
        assert!(alerts[0].message.starts_with("Disk / usage is 95.00% (threshold: 90.0%)"));
    }

    #[test]
    fn test_cpu_and_disk_is_critical() {
        let disks = vec![DiskSample::from_capacity("/", 100, 5).unwrap()];
        let input = EvaluationInput {
            cpu_usage: 0.95,
            memory: None,
            disks: Some(&disks),
        };
        let alerts = evaluator().evaluate(&input);
        assert_eq!(
            kinds(&alerts),
            vec![AlertKind::CpuHigh, AlertKind::DiskHigh, AlertKind::SystemCritical]
        );
        assert_eq!(
            alerts[2].message,
            "Multiple system resources are under stress! CPU: 95.00%, RAM: 0.00%, Disks with issues: 1"
        );
    }

    #[test]
    fn test_disk_alone_is_not_critical() {
        let disks = vec![
            DiskSample::from_capacity("/", 100, 1).unwrap(),
            DiskSample::from_capacity("/data", 100, 1).unwrap(),
        ];
        let breaches = evaluator().breaches(&EvaluationInput {
            cpu_usage: 0.0,
            memory: None,
            disks: Some(&disks),
        });
        assert_eq!(breaches.disks, 2);
        assert!(!breaches.is_critical());
    }

    #[test]
    fn test_invalid_cpu_is_treated_as_zero() {
        let input = EvaluationInput {
            cpu_usage: f64::NAN,
            ..Default::default()
        };
        assert!(evaluator().evaluate(&input).is_empty());
    }
}
