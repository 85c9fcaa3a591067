//! Host metrics read from the /proc filesystem.
//!
//! This module provides the raw readers (aggregate CPU tick counters,
//! memory totals, processor identity) and the [`SystemSource`] trait the
//! samplers consume, so they can run against a fake host in tests.

use crate::collectors::filesystem::{read_filesystem_stats, FilesystemStats};
use std::fs;

/// Memory totals from /proc/meminfo, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryInfo {
    pub total_bytes: u64,
    pub available_bytes: u64,
}

/// Aggregate CPU tick counters from the `cpu` line of /proc/stat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuStat {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuStat {
    /// Calculate total CPU time (all fields).
    pub fn total(&self) -> u64 {
        self.user
            + self.nice
            + self.system
            + self.idle
            + self.iowait
            + self.irq
            + self.softirq
            + self.steal
    }

    /// Calculate non-active time (idle + iowait).
    pub fn idle_total(&self) -> u64 {
        self.idle + self.iowait
    }
}

/// Source of host-level readings.
///
/// Every method may fail; callers degrade failures to zeroed samples.
pub trait SystemSource: Send + Sync {
    /// Aggregate CPU tick counters.
    fn cpu_times(&self) -> Result<CpuStat, String>;

    /// Physical memory totals.
    fn memory(&self) -> Result<MemoryInfo, String>;

    /// Mounted, non-pseudo volumes.
    fn volumes(&self) -> Result<Vec<FilesystemStats>, String>;
}

/// Reads the live host through /proc and statvfs.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcfsSource;

impl SystemSource for ProcfsSource {
    fn cpu_times(&self) -> Result<CpuStat, String> {
        read_cpu_stat()
    }

    fn memory(&self) -> Result<MemoryInfo, String> {
        read_memory_info()
    }

    fn volumes(&self) -> Result<Vec<FilesystemStats>, String> {
        read_filesystem_stats()
    }
}

/// Reads the aggregate CPU counters from /proc/stat.
pub fn read_cpu_stat() -> Result<CpuStat, String> {
    let content = fs::read_to_string("/proc/stat")
        .map_err(|e| format!("Failed to read /proc/stat: {}", e))?;
    parse_cpu_stat(&content)
}

/// Parses the aggregate `cpu` line (not `cpuN`) of /proc/stat content.
pub fn parse_cpu_stat(content: &str) -> Result<CpuStat, String> {
    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.first() != Some(&"cpu") {
            continue;
        }
        if parts.len() < 8 {
            return Err(format!(
                "Invalid cpu line in /proc/stat: expected at least 8 fields, got {}",
                parts.len()
            ));
        }

        let field = |i: usize| parts.get(i).and_then(|v| v.parse::<u64>().ok()).unwrap_or(0);

        return Ok(CpuStat {
            user: field(1),
            nice: field(2),
            system: field(3),
            idle: field(4),
            iowait: field(5),
            irq: field(6),
            softirq: field(7),
            steal: field(8),
        });
    }

    Err("No aggregate cpu line found in /proc/stat".to_string())
}

/// Reads MemTotal and MemAvailable from /proc/meminfo.
pub fn read_memory_info() -> Result<MemoryInfo, String> {
    let content = fs::read_to_string("/proc/meminfo")
        .map_err(|e| format!("Failed to read /proc/meminfo: {}", e))?;
    parse_meminfo(&content)
}

/// Parses /proc/meminfo content; values are reported in kB.
pub fn parse_meminfo(content: &str) -> Result<MemoryInfo, String> {
    let mut total_bytes: Option<u64> = None;
    let mut available_bytes: Option<u64> = None;

    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("MemTotal:") {
            total_bytes = parse_kb_value(rest);
        } else if let Some(rest) = line.strip_prefix("MemAvailable:") {
            available_bytes = parse_kb_value(rest);
        }

        if total_bytes.is_some() && available_bytes.is_some() {
            break;
        }
    }

    match (total_bytes, available_bytes) {
        (Some(total), Some(available)) => Ok(MemoryInfo {
            total_bytes: total,
            available_bytes: available,
        }),
        _ => Err("Failed to parse MemTotal/MemAvailable from /proc/meminfo".to_string()),
    }
}

/// Parses the numeric part of a `<value> kB` field into bytes.
pub fn parse_kb_value(rest: &str) -> Option<u64> {
    rest.split_whitespace()
        .next()
        .and_then(|v| v.parse::<u64>().ok())
        .map(|kb| kb.saturating_mul(1024))
}

/// Identifies the processor via /proc/cpuinfo.
///
/// Returns the model name, or the number of logical processors when the
/// model is not exposed (common on ARM and some VMs).
pub fn read_processor_identity() -> Result<String, String> {
    let content = fs::read_to_string("/proc/cpuinfo")
        .map_err(|e| format!("Failed to read /proc/cpuinfo: {}", e))?;

    let mut processors = 0usize;
    for line in content.lines() {
        if let Some((key, value)) = line.split_once(':') {
            match key.trim() {
                "model name" | "Model" | "Hardware" => return Ok(value.trim().to_string()),
                "processor" => processors += 1,
                _ => {}
            }
        }
    }

    if processors == 0 {
        return Err("No processor entries found in /proc/cpuinfo".to_string());
    }
    Ok(format!("{} logical processors", processors))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROC_STAT: &str = "cpu  4705 356 584 3699176 23060 0 277 0 0 0\n\
                             cpu0 1393280 32966 572056 13343292 6130 0 17875 0 0 0\n\
                             intr 114930548 113199788 3 0 5 263 0 4 [... lots more numbers ...]\n";

    #[test]
    fn test_parse_cpu_stat_uses_aggregate_line() {
        let stat = parse_cpu_stat(PROC_STAT).unwrap();
        assert_eq!(stat.user, 4705);
        assert_eq!(stat.idle, 3699176);
        assert_eq!(stat.iowait, 23060);
        assert_eq!(stat.softirq, 277);
        assert_eq!(stat.total(), 4705 + 356 + 584 + 3699176 + 23060 + 277);
        assert_eq!(stat.idle_total(), 3699176 + 23060);
    }

    #[test]
    fn test_parse_cpu_stat_missing_line() {
        assert!(parse_cpu_stat("intr 1 2 3\n").is_err());
        assert!(parse_cpu_stat("cpu 1 2 3\n").is_err());
    }

    #[test]
    fn test_parse_meminfo() {
        let content = "MemTotal:        8388608 kB\nMemFree:          100000 kB\nMemAvailable:    1048576 kB\n";
        let info = parse_meminfo(content).unwrap();
        assert_eq!(info.total_bytes, 8 * 1024 * 1024 * 1024);
        assert_eq!(info.available_bytes, 1024 * 1024 * 1024);
    }

    #[test]
    fn test_parse_meminfo_missing_available() {
        assert!(parse_meminfo("MemTotal: 1024 kB\n").is_err());
    }

    #[test]
    fn test_live_procfs_source() {
        let source = ProcfsSource;
        if std::path::Path::new("/proc/stat").exists() {
            let cpu = source.cpu_times().unwrap();
            assert!(cpu.total() > 0);
            let mem = source.memory().unwrap();
            assert!(mem.total_bytes >= mem.available_bytes);
        }
    }
}
