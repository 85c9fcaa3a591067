//! Threshold alerts.
//!
//! Samples flow through the [`ThresholdEvaluator`], which produces
//! candidate alerts, then through the [`CooldownGate`], which suppresses
//! repeats of the same kind, before the [`AlertManager`] hands survivors
//! to the notification dispatcher.
//!
//! Per kind the lifecycle is `Idle -> Fired -> Idle`: an alert fires when
//! its threshold is breached and the cooldown has elapsed, and firing is
//! momentary.

pub mod cooldown;
pub mod evaluator;
pub mod manager;

pub use cooldown::CooldownGate;
pub use evaluator::{Breaches, EvaluationInput, ThresholdEvaluator};
pub use manager::{AlertManager, AlertPass};

use serde::Serialize;
use std::fmt;

/// Category of a threshold breach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AlertKind {
    CpuHigh,
    RamHigh,
    DiskHigh,
    /// Derived: several resources breached at once.
    SystemCritical,
}

impl AlertKind {
    pub const ALL: [AlertKind; 4] = [
        AlertKind::CpuHigh,
        AlertKind::RamHigh,
        AlertKind::DiskHigh,
        AlertKind::SystemCritical,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            AlertKind::CpuHigh => "High CPU Usage",
            AlertKind::RamHigh => "High RAM Usage",
            AlertKind::DiskHigh => "High Disk Usage",
            AlertKind::SystemCritical => "Critical System State",
        }
    }

    /// Stable identifier, e.g. `CPU_HIGH`.
    pub fn code(&self) -> &'static str {
        match self {
            AlertKind::CpuHigh => "CPU_HIGH",
            AlertKind::RamHigh => "RAM_HIGH",
            AlertKind::DiskHigh => "DISK_HIGH",
            AlertKind::SystemCritical => "SYSTEM_CRITICAL",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            AlertKind::CpuHigh => "⚡",
            AlertKind::RamHigh => "🧠",
            AlertKind::DiskHigh => "💾",
            AlertKind::SystemCritical => "🚨",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            AlertKind::SystemCritical => Severity::Critical,
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Severity tier of an alert kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Warning,
    Critical,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Warning => "⚠️ Warning",
            Severity::Critical => "🚨 Critical",
        }
    }

    /// Discord embed color (orange / red).
    pub fn discord_color(&self) -> u32 {
        match self {
            Severity::Warning => 16753920,
            Severity::Critical => 16711680,
        }
    }

    /// Slack attachment color.
    pub fn slack_color(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Critical => "danger",
        }
    }
}

/// An alert ready for dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
    /// Raised by an explicit test request rather than a breach.
    pub test: bool,
}

impl Alert {
    pub fn new(kind: AlertKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            test: false,
        }
    }

    pub fn test(kind: AlertKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            test: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_presentation() {
        assert_eq!(AlertKind::CpuHigh.display_name(), "High CPU Usage");
        assert_eq!(AlertKind::SystemCritical.code(), "SYSTEM_CRITICAL");
        assert_eq!(AlertKind::DiskHigh.emoji(), "💾");
        assert_eq!(AlertKind::RamHigh.severity(), Severity::Warning);
        assert_eq!(AlertKind::SystemCritical.severity(), Severity::Critical);
        assert_eq!(Severity::Warning.discord_color(), 16753920);
        assert_eq!(Severity::Critical.slack_color(), "danger");
    }
}
