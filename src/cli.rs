//! CLI arguments and subcommands for proxy-usage-monitor.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Report format for `status` and `env`
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "proxy-usage-monitor",
    about = "Resource usage monitor and alerter for game-server proxies",
    long_about = "Resource usage monitor and alerter for game-server proxies.\n\n\
                  Samples CPU, memory, disk, network, backend connection quality and \
                  runtime heap usage on a fixed interval, writes a daily usage log and \
                  sends threshold alerts to console, file, Discord and Slack.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level
    #[arg(long, value_enum, default_value = "info", global = true)]
    pub log_level: LogLevel,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long, global = true, conflicts_with = "config")]
    pub no_config: bool,

    /// Override the data directory (logs/ lives under it)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the monitoring pipeline until interrupted (default)
    Run,

    /// Validate the configuration (return code 1 on errors)
    Validate,

    /// Send test notifications
    Test {
        #[command(subcommand)]
        target: TestTarget,
    },

    /// Show enabled monitors, alert channels and thresholds
    Status {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Detect and show the hosting environment
    Env {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Run a few ticks and print each usage line (nothing is dispatched)
    Sample {
        /// Number of ticks
        #[arg(short = 'n', long, default_value_t = 1)]
        iterations: usize,
    },

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },
}

/// What `test` sends
#[derive(Subcommand, Debug)]
pub enum TestTarget {
    /// Send the Discord test embed
    Webhook {
        /// Name shown as the initiator
        #[arg(long, default_value = "console")]
        sender: String,
    },

    /// Dispatch a simulated critical alert to every enabled channel
    Alert {
        /// Name shown as the initiator
        #[arg(long, default_value = "console")]
        sender: String,
    },
}
