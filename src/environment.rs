//! Hosting environment detection.
//!
//! Run once at startup. Three independent probes decide what the host lets
//! us introspect; the capability tier is a pure function of their results.
//! Container and shared-hosting flags are diagnostic only and never change
//! sampling behavior.
//!
//! Detection never fails: a probe that errors simply reports `false`.

use crate::collectors::{filesystem, netdev};
use crate::system;
use nix::unistd::geteuid;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Markers in `/proc/1/cgroup` that indicate a container runtime.
const CONTAINER_CGROUP_MARKERS: [&str; 4] = ["docker", "lxc", "kubepods", "containerd"];

/// Home directory fragments typical of game-server hosting panels.
const SHARED_HOME_MARKERS: [&str; 3] = ["/home/", "minecraft", "gameserver"];

/// How much OS-level introspection the process may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CapabilityTier {
    Full,
    Limited,
    Minimal,
    Restricted,
}

impl CapabilityTier {
    pub fn from_access(system: bool, disk: bool, network: bool) -> Self {
        if system && disk && network {
            CapabilityTier::Full
        } else if system && disk {
            CapabilityTier::Limited
        } else if system || disk {
            CapabilityTier::Minimal
        } else {
            CapabilityTier::Restricted
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CapabilityTier::Full => "Full system access - all features available",
            CapabilityTier::Limited => "Limited access - some features restricted",
            CapabilityTier::Minimal => "Minimal access - only basic features available",
            CapabilityTier::Restricted => "Restricted environment - only JVM metrics available",
        }
    }
}

impl fmt::Display for CapabilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CapabilityTier::Full => "FULL",
            CapabilityTier::Limited => "LIMITED",
            CapabilityTier::Minimal => "MINIMAL",
            CapabilityTier::Restricted => "RESTRICTED",
        };
        f.write_str(name)
    }
}

/// Result of environment detection. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostingEnvironment {
    pub tier: CapabilityTier,
    pub system_access: bool,
    pub disk_access: bool,
    pub network_access: bool,
    pub containerized: bool,
    pub shared_hosting: bool,
    pub running_as_root: bool,
}

impl HostingEnvironment {
    /// Runs every probe against the live system.
    pub fn detect() -> Self {
        let system_access = probe("System", probe_system_access);
        let disk_access = probe("Disk", probe_disk_access);
        let network_access = probe("Network", probe_network_access);
        let home = std::env::var("HOME").ok();

        Self::classify(
            system_access,
            disk_access,
            network_access,
            detect_container(),
            home.as_deref(),
            geteuid().is_root(),
        )
    }

    /// Builds an environment from probe results.
    pub fn classify(
        system_access: bool,
        disk_access: bool,
        network_access: bool,
        containerized: bool,
        home: Option<&str>,
        running_as_root: bool,
    ) -> Self {
        Self {
            tier: CapabilityTier::from_access(system_access, disk_access, network_access),
            system_access,
            disk_access,
            network_access,
            containerized,
            shared_hosting: is_shared_hosting(system_access, disk_access, home),
            running_as_root,
        }
    }

    /// An environment where every probe succeeded.
    pub fn full() -> Self {
        Self::classify(true, true, true, false, None, false)
    }

    pub fn can_monitor_cpu(&self) -> bool {
        self.system_access
    }

    pub fn can_monitor_ram(&self) -> bool {
        self.system_access
    }

    pub fn can_monitor_disk(&self) -> bool {
        self.disk_access
    }

    pub fn can_monitor_network(&self) -> bool {
        self.network_access
    }

    /// Only runtime metrics are worth attempting.
    pub fn should_use_jvm_fallback(&self) -> bool {
        matches!(self.tier, CapabilityTier::Minimal | CapabilityTier::Restricted)
    }

    pub fn log_summary(&self) {
        let mark = |ok: bool| if ok { "✓" } else { "✗" };
        info!("🔍 Hosting environment detection");
        info!("   Capability level: {} - {}", self.tier, self.tier.description());
        info!("   System access:  {}", mark(self.system_access));
        info!("   Disk access:    {}", mark(self.disk_access));
        info!("   Network access: {}", mark(self.network_access));
        info!(
            "   Containerized:  {}",
            if self.containerized { "Yes" } else { "No" }
        );
        info!(
            "   Shared hosting: {}",
            if self.shared_hosting { "Likely" } else { "Unlikely" }
        );

        if self.running_as_root {
            info!("   Running as root (uid=0)");
        } else {
            debug!("Not running as root - some /proc entries of other users may be unreadable");
        }

        if self.should_use_jvm_fallback() {
            warn!("⚠️  Restricted environment - monitoring is limited to runtime metrics");
        }
    }
}

fn probe(name: &str, check: fn() -> Result<(), String>) -> bool {
    match check() {
        Ok(()) => true,
        Err(e) => {
            debug!("{} access probe failed: {}", name, e);
            false
        }
    }
}

fn probe_system_access() -> Result<(), String> {
    let identity = system::read_processor_identity()?;
    debug!("Processor: {}", identity);
    Ok(())
}

fn probe_disk_access() -> Result<(), String> {
    let stores = filesystem::read_filesystem_stats()?;
    if stores.iter().any(|fs| fs.total_bytes > 0) {
        Ok(())
    } else {
        Err("no file stores with capacity".to_string())
    }
}

fn probe_network_access() -> Result<(), String> {
    let interfaces = netdev::read_netdev_stats()?;
    if interfaces.is_empty() {
        Err("no network interfaces".to_string())
    } else {
        Ok(())
    }
}

fn detect_container() -> bool {
    let cgroup = fs::read_to_string("/proc/1/cgroup").unwrap_or_default();
    cgroup_indicates_container(&cgroup)
        || Path::new("/.dockerenv").exists()
        || std::env::var("container").is_ok_and(|v| !v.is_empty())
}

pub fn cgroup_indicates_container(cgroup: &str) -> bool {
    CONTAINER_CGROUP_MARKERS
        .iter()
        .any(|marker| cgroup.contains(marker))
}

pub fn is_shared_hosting(system_access: bool, disk_access: bool, home: Option<&str>) -> bool {
    if !system_access || !disk_access {
        return true;
    }
    home.is_some_and(|home| SHARED_HOME_MARKERS.iter().any(|m| home.contains(m)))
}
