//! Error types for the monitoring pipeline.
//!
//! Steady-state sampling never surfaces errors; these types cover
//! configuration loading, pipeline construction, explicit notification
//! requests and the host capability interface.

use std::path::PathBuf;
use std::time::Duration;

/// Failure to load or serialize a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Critical initialization failure: the pipeline cannot be constructed.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Configuration invalid: {0}")]
    InvalidConfig(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Failed to create log directory {path}: {source}")]
    LogDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors returned by explicitly requested notifications (test webhook, test alert).
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Alerts are disabled in the configuration")]
    AlertsDisabled,

    #[error("{0} webhook is not enabled")]
    ChannelDisabled(&'static str),

    #[error("{0} webhook URL is not configured")]
    MissingUrl(&'static str),

    #[error("Webhook delivery failed: {0}")]
    Delivery(String),
}

/// Failure of a host-provided query.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Host query unavailable: {0}")]
    Unavailable(String),
}

/// Failure to ping a backend server.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PingError {
    #[error("Ping timed out after {0:?}")]
    Timeout(Duration),

    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    #[error("Invalid backend address: {0}")]
    InvalidAddress(String),
}
