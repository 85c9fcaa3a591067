//! Proxy Usage Monitor Library
//!
//! Periodic resource monitoring for a game-server proxy host. Each tick
//! samples CPU, memory, disk, network, backend connection quality and
//! runtime heap usage, writes one line to a date-rotated usage log, and
//! evaluates the same values against alert thresholds. Alerts fan out to
//! console, file, Discord and Slack, with a per-kind cooldown.
//!
//! # Usage
//!
//! ```rust,no_run
//! use proxy_usage_monitor::{Config, HostingEnvironment, Monitor, Sources, StaticHost};
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let host = Arc::new(StaticHost::from_config(&config.proxy));
//! let sources = Sources::live(&config, host);
//! let monitor = Monitor::new(config, HostingEnvironment::detect(), sources)?;
//!
//! let outcome = monitor.tick().await;
//! println!("{}", outcome.line);
//! # Ok(())
//! # }
//! ```

pub mod alert;
pub mod cache;
pub mod collectors;
pub mod config;
pub mod environment;
pub mod error;
pub mod health;
pub mod host;
pub mod logwriter;
pub mod monitor;
pub mod notify;
pub mod pipeline_stats;
pub mod runtime;
pub mod sample;
pub mod samplers;
pub mod system;

// Re-export main types for convenience
pub use alert::{Alert, AlertKind, AlertManager, CooldownGate, Severity};
pub use config::{load_config, validate_config, Config, ValidationReport};
pub use environment::{CapabilityTier, HostingEnvironment};
pub use error::{ConfigError, MonitorError, NotifyError};
pub use health::{HealthReport, HealthStatus};
pub use host::{ProxyHost, StaticHost};
pub use monitor::{Monitor, MonitorStatus, Sources, TickOutcome};
pub use notify::{Dispatcher, WebhookClient, WebhookOutcome};
pub use pipeline_stats::PipelineStats;
pub use sample::TickSnapshot;
