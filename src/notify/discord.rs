//! Discord webhook payloads.
//!
//! All three messages are single-embed payloads. Alerts and the test
//! message carry an empty `attachments` array as Discord expects for
//! webhook executions without files.

use crate::alert::Alert;
use crate::health::HealthStatus;
use crate::sample::{DiskSample, MemorySample, NetworkSample};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

const FOOTER: &str = "Proxy Usage Monitor";
const TEST_COLOR: u32 = 3447003;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Inputs of the periodic status report.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub cpu_percent: f64,
    pub memory: MemorySample,
    pub network: NetworkSample,
    pub disks: Vec<DiskSample>,
    pub health: HealthStatus,
}

/// Embed for a threshold alert.
pub fn alert_payload(alert: &Alert, server: &str, now: DateTime<Utc>) -> Value {
    let severity = alert.kind.severity();
    json!({
        "content": null,
        "embeds": [{
            "title": format!("{} {}", alert.kind.emoji(), alert.kind.display_name()),
            "description": alert.message,
            "color": severity.discord_color(),
            "timestamp": now.to_rfc3339_opts(SecondsFormat::Millis, true),
            "fields": [
                { "name": "Alert Type", "value": alert.kind.display_name(), "inline": true },
                { "name": "Severity", "value": severity.label(), "inline": true },
                { "name": "Server", "value": server, "inline": true },
                { "name": "Timestamp", "value": format!("<t:{}:F>", now.timestamp()), "inline": false }
            ],
            "footer": { "text": format!("{} • Automatic Alert", FOOTER) }
        }],
        "attachments": []
    })
}

/// Embed for the periodic status report.
pub fn status_report_payload(report: &StatusReport, now: DateTime<Utc>) -> Value {
    let health = report.health;
    json!({
        "content": null,
        "embeds": [{
            "title": format!("{} System Status Report", health.emoji()),
            "description": "Current server performance metrics and health status",
            "color": health.color(),
            "timestamp": now.to_rfc3339_opts(SecondsFormat::Millis, true),
            "fields": [
                {
                    "name": "🖥️ CPU Usage",
                    "value": format!("{:.2}%", report.cpu_percent),
                    "inline": true
                },
                {
                    "name": "🧠 Memory Usage",
                    "value": format!(
                        "{:.1}% ({:.1} GB / {:.1} GB)",
                        report.memory.usage_percent,
                        report.memory.used_bytes as f64 / GIB,
                        report.memory.total_bytes as f64 / GIB
                    ),
                    "inline": true
                },
                {
                    "name": "👥 Players Online",
                    "value": format!(
                        "{} / {} ({:.1}%)",
                        report.network.current_players,
                        report.network.max_players,
                        report.network.utilization_percent
                    ),
                    "inline": true
                },
                {
                    "name": "💾 Disk Usage",
                    "value": disk_summary(&report.disks),
                    "inline": false
                },
                {
                    "name": "🏥 Overall Health",
                    "value": format!("{} {}", health.emoji(), health),
                    "inline": false
                }
            ],
            "footer": { "text": format!("{} • Status Report", FOOTER) }
        }]
    })
}

/// Embed for an explicit connectivity test.
pub fn test_payload(sender: &str, server: &str, now: DateTime<Utc>) -> Value {
    json!({
        "content": null,
        "embeds": [{
            "title": "🧪 Test Webhook",
            "description": "This is a test message to verify that Discord webhook integration is working correctly.",
            "color": TEST_COLOR,
            "timestamp": now.to_rfc3339_opts(SecondsFormat::Millis, true),
            "fields": [
                { "name": "Initiated by", "value": sender, "inline": true },
                { "name": "Test Status", "value": "✅ Connection Successful", "inline": true },
                { "name": "Server", "value": server, "inline": true },
                {
                    "name": "Note",
                    "value": "If you can see this message, your Discord webhook is configured correctly!",
                    "inline": false
                }
            ],
            "footer": { "text": format!("{} • Test Message", FOOTER) }
        }],
        "attachments": []
    })
}

/// One `**name**: x.x% (y.y GB free)` line per volume.
pub fn disk_summary(disks: &[DiskSample]) -> String {
    if disks.is_empty() {
        return "No disk data available".to_string();
    }
    disks
        .iter()
        .map(|d| format!("**{}**: {:.1}% ({:.1} GB free)", d.name, d.usage_percent, d.free_gb()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertKind;
    use chrono::TimeZone;

    const GIB_U: u64 = 1024 * 1024 * 1024;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_alert_payload() {
        let alert = Alert::new(AlertKind::SystemCritical, "Multiple system resources are under stress!");
        let payload = alert_payload(&alert, "Proxy-EU", now());
        let embed = &payload["embeds"][0];
        assert_eq!(embed["title"], "🚨 Critical System State");
        assert_eq!(embed["color"], 16711680);
        assert_eq!(embed["fields"][1]["value"], "🚨 Critical");
        assert_eq!(embed["fields"][2]["value"], "Proxy-EU");
        assert_eq!(embed["fields"][3]["value"], format!("<t:{}:F>", now().timestamp()));
        assert_eq!(embed["timestamp"], "2024-05-01T12:00:00.000Z");
        assert!(payload["attachments"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_status_report_payload() {
        let report = StatusReport {
            cpu_percent: 12.5,
            memory: MemorySample::from_totals(8 * GIB_U, 4 * GIB_U),
            network: NetworkSample::new(25, 100, 2, 3),
            disks: vec![DiskSample::from_capacity("/", 100 * GIB_U, 40 * GIB_U).unwrap()],
            health: HealthStatus::Healthy,
        };
        let payload = status_report_payload(&report, now());
        let fields = &payload["embeds"][0]["fields"];
        assert_eq!(fields[0]["value"], "12.50%");
        assert_eq!(fields[1]["value"], "50.0% (4.0 GB / 8.0 GB)");
        assert_eq!(fields[2]["value"], "25 / 100 (25.0%)");
        assert_eq!(fields[3]["value"], "**/**: 60.0% (40.0 GB free)");
        assert_eq!(fields[4]["value"], "✅ Healthy");
        assert_eq!(payload["embeds"][0]["color"], 5763719);
    }

    #[test]
    fn test_disk_summary_empty() {
        assert_eq!(disk_summary(&[]), "No disk data available");
    }

    #[test]
    fn test_test_payload() {
        let payload = test_payload("admin", "Proxy", now());
        let embed = &payload["embeds"][0];
        assert_eq!(embed["color"], 3447003);
        assert_eq!(embed["fields"][0]["value"], "admin");
    }
}
