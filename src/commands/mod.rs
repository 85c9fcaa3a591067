//! CLI command implementations for proxy-usage-monitor.
//!
//! This module provides implementations for all CLI subcommands:
//! - `run`: The monitoring pipeline (default)
//! - `validate`: Configuration validation
//! - `test`: Test webhook and test alert
//! - `status`: Effective monitoring and alerting setup
//! - `env`: Hosting environment detection
//! - `sample`: One-off usage lines
//! - `config`: Configuration file generation

pub mod config;
pub mod env;
pub mod run;
pub mod sample;
pub mod status;
pub mod validate;

// Re-export command functions
pub use config::command_config;
pub use env::command_env;
pub use run::command_run;
pub use sample::command_sample;
pub use status::command_status;
pub use test::command_test;
pub use validate::command_validate;

use anyhow::Context;
use proxy_usage_monitor::config::{find_config_path, load_config_file, Config};
use proxy_usage_monitor::{HostingEnvironment, Monitor, Sources, StaticHost};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use crate::cli::Args;

/// Where the configuration comes from. Kept by `run` so SIGHUP can re-read it.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub path: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
}

impl ConfigSource {
    pub fn from_args(args: &Args) -> Self {
        let path = if args.no_config {
            None
        } else {
            args.config.clone().or_else(find_config_path)
        };
        Self {
            path,
            data_dir: args.data_dir.clone(),
        }
    }

    /// Loads the file (defaults when there is none) and applies CLI overrides.
    pub fn load(&self) -> anyhow::Result<Config> {
        let mut config = match &self.path {
            Some(path) if path.exists() => load_config_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            Some(path) => {
                warn!("Config file {} not found, using defaults", path.display());
                Config::default()
            }
            None => Config::default(),
        };

        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        Ok(config)
    }
}

/// Builds a monitor over the live system and the configured backends.
pub fn build_monitor(config: Config, environment: HostingEnvironment) -> anyhow::Result<Monitor> {
    let host = Arc::new(StaticHost::from_config(&config.proxy));
    let sources = Sources::live(&config, host);
    Monitor::new(config, environment, sources).context("Failed to initialize monitor")
}
