//! Alert file channel.

use crate::alert::Alert;
use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

pub const ALERT_LOG_FILENAME: &str = "alerts.log";

/// `[ts] ALERT - <display name>: <message>`, or `[ts] TEST ALERT: <message>`.
pub fn format_alert_line(alert: &Alert, timestamp: DateTime<Local>, date_format: &str) -> String {
    let ts = timestamp.format(date_format);
    if alert.test {
        format!("[{}] TEST ALERT: {}", ts, alert.message)
    } else {
        format!("[{}] ALERT - {}: {}", ts, alert.kind.display_name(), alert.message)
    }
}

/// Appends one line, creating the file and its directory as needed.
pub fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)
}
