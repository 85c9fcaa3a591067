//! Metric samplers.
//!
//! Each sampler returns a normalized value and never fails: unavailable
//! sources degrade to zeroed samples and are logged at debug level.
//! The network and connection-quality samplers hold a staleness-window
//! cache so the expensive host queries run at most once per window.

pub mod connection;
pub mod cpu;
pub mod disk;
pub mod jvm;
pub mod memory;
pub mod network;

pub use connection::{ConnectionQualitySampler, CONNECTION_CACHE_WINDOW, MAX_PINGED_BACKENDS, PING_TIMEOUT};
pub use cpu::CpuSampler;
pub use disk::DiskSampler;
pub use jvm::JvmSampler;
pub use memory::MemorySampler;
pub use network::{NetworkSampler, NETWORK_CACHE_WINDOW};
