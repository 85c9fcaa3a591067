//! Runtime introspection of the observed process.
//!
//! The JVM sampler reads heap, non-heap, thread, class and collector
//! figures through [`RuntimeProbe`]. Each figure is a separate call so a
//! failure of one never hides the others.
//!
//! [`ProcessRuntime`] maps those figures onto what /proc exposes for any
//! process: anonymous resident memory against the memory limit as "heap",
//! file-backed and shared resident memory as "non-heap", the thread count,
//! and the number of mapped shared objects in place of loaded classes.

use crate::system::parse_kb_value;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

/// Heap occupancy in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapUsage {
    pub used_bytes: u64,
    /// Upper bound of the heap; 0 when unbounded or unknown.
    pub max_bytes: u64,
}

/// Source of runtime statistics.
pub trait RuntimeProbe: Send + Sync {
    fn heap(&self) -> Result<HeapUsage, String>;

    fn non_heap_used_bytes(&self) -> Result<u64, String>;

    fn thread_count(&self) -> Result<u64, String>;

    fn loaded_class_count(&self) -> Result<u64, String>;

    /// Accumulated collection time of every collector, in milliseconds.
    /// Collectors that do not report a time return a negative value.
    fn gc_collection_times_ms(&self) -> Result<Vec<i64>, String>;
}

/// Fields of /proc/<pid>/status used by [`ProcessRuntime`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessStatus {
    pub rss_anon_bytes: u64,
    pub rss_file_bytes: u64,
    pub rss_shmem_bytes: u64,
    pub threads: u64,
}

/// Reads a process through /proc.
#[derive(Debug, Clone)]
pub struct ProcessRuntime {
    proc_dir: PathBuf,
}

impl ProcessRuntime {
    /// Observes `pid`, or this process when None.
    pub fn new(pid: Option<u32>) -> Self {
        let proc_dir = match pid {
            Some(pid) => PathBuf::from(format!("/proc/{}", pid)),
            None => PathBuf::from("/proc/self"),
        };
        Self { proc_dir }
    }

    fn status(&self) -> Result<ProcessStatus, String> {
        let path = self.proc_dir.join("status");
        let content = fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Ok(parse_process_status(&content))
    }

    /// cgroup v2 memory limit of the process, if one is set.
    fn cgroup_memory_limit(&self) -> Option<u64> {
        let cgroup = fs::read_to_string(self.proc_dir.join("cgroup")).ok()?;
        let relative = cgroup
            .lines()
            .find_map(|line| line.strip_prefix("0::"))?
            .trim_start_matches('/');
        let limit_path = PathBuf::from("/sys/fs/cgroup")
            .join(relative)
            .join("memory.max");
        let raw = fs::read_to_string(limit_path).ok()?;
        raw.trim().parse::<u64>().ok()
    }
}

impl RuntimeProbe for ProcessRuntime {
    fn heap(&self) -> Result<HeapUsage, String> {
        let status = self.status()?;
        let max_bytes = match self.cgroup_memory_limit() {
            Some(limit) => limit,
            None => crate::system::read_memory_info()
                .map(|m| m.total_bytes)
                .unwrap_or(0),
        };
        Ok(HeapUsage {
            used_bytes: status.rss_anon_bytes,
            max_bytes,
        })
    }

    fn non_heap_used_bytes(&self) -> Result<u64, String> {
        let status = self.status()?;
        Ok(status.rss_file_bytes + status.rss_shmem_bytes)
    }

    fn thread_count(&self) -> Result<u64, String> {
        Ok(self.status()?.threads)
    }

    fn loaded_class_count(&self) -> Result<u64, String> {
        let path = self.proc_dir.join("maps");
        let content = fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Ok(count_shared_objects(&content))
    }

    fn gc_collection_times_ms(&self) -> Result<Vec<i64>, String> {
        // A plain process has no collectors to report.
        Ok(Vec::new())
    }
}

/// Parses the memory and thread fields of /proc/<pid>/status.
pub fn parse_process_status(content: &str) -> ProcessStatus {
    let mut status = ProcessStatus::default();
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("RssAnon:") {
            status.rss_anon_bytes = parse_kb_value(rest).unwrap_or(0);
        } else if let Some(rest) = line.strip_prefix("RssFile:") {
            status.rss_file_bytes = parse_kb_value(rest).unwrap_or(0);
        } else if let Some(rest) = line.strip_prefix("RssShmem:") {
            status.rss_shmem_bytes = parse_kb_value(rest).unwrap_or(0);
        } else if let Some(rest) = line.strip_prefix("Threads:") {
            status.threads = rest.trim().parse().unwrap_or(0);
        }
    }
    status
}

/// Counts distinct shared objects mapped in /proc/<pid>/maps content.
pub fn count_shared_objects(maps: &str) -> u64 {
    maps.lines()
        .filter_map(|line| line.split_whitespace().nth(5))
        .filter(|path| path.ends_with(".so") || path.contains(".so."))
        .collect::<HashSet<_>>()
        .len() as u64
}
