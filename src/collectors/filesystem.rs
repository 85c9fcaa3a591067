//! Filesystem usage collector.
//!
//! This module enumerates mounted volumes from /proc/mounts and reads their
//! capacity through libc statvfs.

use std::fs;

/// Capacity of a single mounted volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesystemStats {
    pub device: String,
    pub mount_point: String,
    pub fstype: String,
    /// Total size of the volume in bytes.
    pub total_bytes: u64,
    /// Space available to unprivileged users, in bytes.
    pub available_bytes: u64,
}

/// A relevant line of /proc/mounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub device: String,
    pub mount_point: String,
    pub fstype: String,
}

/// Reads filesystem statistics from /proc/mounts and uses libc statvfs to get usage data.
///
/// Volumes that cannot be stat'ed are skipped. A mount point listed twice
/// (bind mounts) is reported once.
pub fn read_filesystem_stats() -> Result<Vec<FilesystemStats>, String> {
    let mounts_content = fs::read_to_string("/proc/mounts")
        .map_err(|e| format!("Failed to read /proc/mounts: {}", e))?;

    let mut stats: Vec<FilesystemStats> = Vec::new();

    for entry in parse_mounts(&mounts_content) {
        if stats.iter().any(|s| s.mount_point == entry.mount_point) {
            continue;
        }

        match get_statvfs_stats(&entry.mount_point) {
            Ok((total_bytes, available_bytes)) => stats.push(FilesystemStats {
                device: entry.device,
                mount_point: entry.mount_point,
                fstype: entry.fstype,
                total_bytes,
                available_bytes,
            }),
            Err(_) => continue, // Skip filesystems we can't stat
        }
    }

    Ok(stats)
}

/// Parses /proc/mounts content, dropping pseudo filesystems.
pub fn parse_mounts(content: &str) -> Vec<MountEntry> {
    content
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 3 {
                return None;
            }
            let mount_point = unescape_mount_path(parts[1]);
            if should_skip_filesystem(parts[2], &mount_point) {
                return None;
            }
            Some(MountEntry {
                device: parts[0].to_string(),
                mount_point,
                fstype: parts[2].to_string(),
            })
        })
        .collect()
}

/// /proc/mounts escapes whitespace in paths as octal (`\040` for space).
fn unescape_mount_path(raw: &str) -> String {
    raw.replace("\\040", " ")
        .replace("\\011", "\t")
        .replace("\\012", "\n")
        .replace("\\134", "\\")
}

/// Checks if a filesystem should be skipped based on type and mount point.
fn should_skip_filesystem(fstype: &str, mount_point: &str) -> bool {
    // Skip pseudo/virtual filesystems
    let skip_types = [
        "proc",
        "sysfs",
        "devpts",
        "devtmpfs",
        "tmpfs",
        "cgroup",
        "cgroup2",
        "pstore",
        "bpf",
        "debugfs",
        "tracefs",
        "fusectl",
        "configfs",
        "securityfs",
        "hugetlbfs",
        "mqueue",
        "autofs",
        "binfmt_misc",
        "overlay",
        "squashfs",
        "nsfs",
    ];

    if skip_types.contains(&fstype) {
        return true;
    }

    // Skip system mount points
    mount_point.starts_with("/proc")
        || mount_point.starts_with("/sys")
        || mount_point.starts_with("/dev")
        || mount_point.starts_with("/run")
        || mount_point.starts_with("/snap")
}

/// Gets (total, available) bytes using libc statvfs.
fn get_statvfs_stats(path: &str) -> Result<(u64, u64), String> {
    use std::ffi::CString;
    use std::mem;

    let c_path = CString::new(path).map_err(|e| format!("Invalid path: {}", e))?;

    // SAFETY: `stat` is a plain C struct that statvfs fully initializes on
    // success, and `c_path` is a valid NUL-terminated string for the call.
    unsafe {
        let mut stat: libc::statvfs = mem::zeroed();
        let result = libc::statvfs(c_path.as_ptr(), &mut stat);

        if result != 0 {
            return Err(format!("statvfs failed for {}", path));
        }

        let block_size = stat.f_frsize as u64;
        let total_bytes = block_size.saturating_mul(stat.f_blocks as u64);
        let available_bytes = block_size.saturating_mul(stat.f_bavail as u64);

        Ok((total_bytes, available_bytes))
    }
}
