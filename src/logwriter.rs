//! Usage log: one line per tick.
//!
//! Lines are appended to a dated file under `<data_dir>/logs`. After every
//! write the directory is trimmed to the newest `max_files` `.log` files;
//! the alert log is never counted or removed.

use crate::config::Config;
use crate::notify::file::ALERT_LOG_FILENAME;
use crate::sample::{format_bytes, Reading, TickSnapshot};
use chrono::{DateTime, Local, NaiveDate};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// Literal token in the filename pattern replaced by the current date.
pub const DATE_TOKEN: &str = "%date%";

/// Formats the fields of one tick, without the timestamp prefix.
///
/// Disabled monitors are omitted; unavailable ones are written as `N/A`.
pub fn format_usage_fields(snapshot: &TickSnapshot) -> String {
    let mut segments: Vec<String> = Vec::new();

    match &snapshot.cpu {
        Reading::Disabled => {}
        Reading::Unavailable => segments.push("CPU: N/A".to_string()),
        Reading::Sampled(cpu) => segments.push(format!("CPU: {:.2}%", cpu * 100.0)),
    }

    match &snapshot.memory {
        Reading::Disabled => {}
        Reading::Unavailable => segments.push("RAM: N/A".to_string()),
        Reading::Sampled(m) => segments.push(format!(
            "RAM: {}/{} ({:.2}%)",
            format_bytes(m.used_bytes),
            format_bytes(m.total_bytes),
            m.usage_percent
        )),
    }

    match &snapshot.disks {
        Reading::Disabled => {}
        Reading::Unavailable => segments.push("Disk: N/A".to_string()),
        // No volumes means no segment at all
        Reading::Sampled(disks) if disks.is_empty() => {}
        Reading::Sampled(disks) => segments.push(
            disks
                .iter()
                .map(|d| {
                    format!(
                        "Disk({}): {}/{} ({:.2}%)",
                        d.name,
                        format_bytes(d.used_bytes),
                        format_bytes(d.total_bytes),
                        d.usage_percent
                    )
                })
                .collect::<Vec<_>>()
                .join(", "),
        ),
    }

    match &snapshot.network {
        Reading::Disabled => {}
        Reading::Unavailable => segments.push("Network: N/A".to_string()),
        Reading::Sampled(n) => segments.push(format!(
            "Players: {}/{} ({:.1}%), Servers: {}/{}",
            n.current_players, n.max_players, n.utilization_percent, n.online_servers, n.total_servers
        )),
    }

    match &snapshot.jvm {
        Reading::Disabled => {}
        Reading::Unavailable => segments.push("JVM: N/A".to_string()),
        Reading::Sampled(j) => segments.push(format!(
            "JVM: Heap {:.1}%, NonHeap: {:.1} MB, Threads: {}, GC: {}ms, Classes: {}",
            j.heap_utilization_percent,
            j.non_heap_used_mb,
            j.thread_count,
            j.total_gc_time_ms,
            j.loaded_class_count
        )),
    }

    match &snapshot.connection {
        Reading::Disabled => {}
        Reading::Unavailable => segments.push("Connection: N/A".to_string()),
        Reading::Sampled(c) => {
            let mut segment = format!(
                "Connection: Avg Ping {:.1}ms, Max Ping {:.1}ms, Quality: {}",
                c.average_ping_ms, c.max_ping_ms, c.quality
            );
            if c.packet_loss_percent >= 0.0 {
                segment.push_str(&format!(", Loss: {:.2}%", c.packet_loss_percent));
            }
            segments.push(segment);
        }
    }

    segments.join(" | ")
}

/// `[timestamp] <fields>`.
pub fn format_usage_line(snapshot: &TickSnapshot, date_format: &str) -> String {
    format!(
        "[{}] {}",
        snapshot.timestamp.format(date_format),
        format_usage_fields(snapshot)
    )
}

/// Applies the date to a filename pattern.
///
/// `%date%` is replaced by `yyyy-MM-dd`; without the token the date is
/// inserted before the last extension, or appended when there is none.
pub fn resolve_log_filename(pattern: &str, date: NaiveDate) -> String {
    let date = date.format("%Y-%m-%d").to_string();
    if pattern.contains(DATE_TOKEN) {
        return pattern.replace(DATE_TOKEN, &date);
    }
    match pattern.rfind('.') {
        Some(dot) if dot > 0 => format!("{}-{}{}", &pattern[..dot], date, &pattern[dot..]),
        _ => format!("{}-{}", pattern, date),
    }
}

/// Appends usage lines and enforces retention.
#[derive(Debug, Clone)]
pub struct LogWriter {
    logs_dir: PathBuf,
    filename: String,
    max_files: usize,
}

impl LogWriter {
    pub fn new(logs_dir: impl Into<PathBuf>, filename: impl Into<String>, max_files: usize) -> Self {
        Self {
            logs_dir: logs_dir.into(),
            filename: filename.into(),
            max_files,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.logs_dir(), cfg.logging.filename.clone(), cfg.logging.max_files)
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.logs_dir.join(resolve_log_filename(&self.filename, date))
    }

    /// Appends `line` to the file for `now`'s date, then trims old files.
    pub fn append(&self, line: &str, now: DateTime<Local>) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.logs_dir)?;
        let path = self.path_for(now.date_naive());
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{}", line)?;

        if let Err(e) = self.cleanup() {
            warn!("Failed to clean up old log files: {}", e);
        }
        Ok(path)
    }

    /// Deletes all but the newest `max_files` usage logs. Returns how many
    /// were removed. A limit of 0 keeps everything.
    pub fn cleanup(&self) -> io::Result<usize> {
        if self.max_files == 0 || !self.logs_dir.exists() {
            return Ok(0);
        }

        let mut logs: Vec<(PathBuf, SystemTime)> = fs::read_dir(&self.logs_dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                name.ends_with(".log") && name != ALERT_LOG_FILENAME
            })
            .filter_map(|entry| {
                let modified = entry.metadata().and_then(|m| m.modified()).ok()?;
                Some((entry.path(), modified))
            })
            .collect();

        // Newest first
        logs.sort_by(|a, b| b.1.cmp(&a.1));

        let mut removed = 0;
        for (path, _) in logs.into_iter().skip(self.max_files) {
            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!("Deleted old log file: {}", path.display());
                    removed += 1;
                }
                Err(e) => warn!("Failed to delete old log file {}: {}", path.display(), e),
            }
        }
        Ok(removed)
    }
}
