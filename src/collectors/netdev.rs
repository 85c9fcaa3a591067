//! Network interface enumeration.
//!
//! Reads /proc/net/dev. The capability detector only needs to know whether
//! interfaces can be listed; byte counters are kept for diagnostics.

use std::fs;

/// Counters of a single network interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetDevStats {
    pub interface: String,
    pub receive_bytes: u64,
    pub transmit_bytes: u64,
}

/// Reads network interface statistics from /proc/net/dev.
pub fn read_netdev_stats() -> Result<Vec<NetDevStats>, String> {
    let content = fs::read_to_string("/proc/net/dev")
        .map_err(|e| format!("Failed to read /proc/net/dev: {}", e))?;
    Ok(parse_netdev(&content))
}

/// Parses /proc/net/dev content.
pub fn parse_netdev(content: &str) -> Vec<NetDevStats> {
    content
        .lines()
        // Skip the two header lines
        .skip(2)
        .filter_map(|line| {
            let (interface, counters) = line.split_once(':')?;
            let values: Vec<&str> = counters.split_whitespace().collect();
            if values.len() < 16 {
                return None; // Skip malformed lines
            }
            Some(NetDevStats {
                interface: interface.trim().to_string(),
                receive_bytes: values[0].parse().unwrap_or(0),
                transmit_bytes: values[8].parse().unwrap_or(0),
            })
        })
        .collect()
}
