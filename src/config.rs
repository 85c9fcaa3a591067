//! Configuration management for proxy-usage-monitor.
//!
//! This module handles loading and validating configuration from files.
//! It supports YAML, JSON, and TOML formats; every section carries serde
//! defaults so partial files are valid.

use crate::error::ConfigError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

// Default configuration constants
pub const DEFAULT_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_LOG_FILENAME: &str = "system-usage.log";
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DEFAULT_COOLDOWN_SECS: u64 = 300;
pub const DEFAULT_STATUS_REPORT_INTERVAL_SECS: u64 = 3600;
/// Upper bound for the sampling and status-report intervals (one week).
pub const MAX_INTERVAL_SECS: u64 = 7 * 24 * 3600;

/// Config files probed when no explicit path is given, in order.
pub const DEFAULT_CONFIG_PATHS: [&str; 4] = [
    "./proxy-usage-monitor.yaml",
    "./proxy-usage-monitor.yml",
    "./proxy-usage-monitor.json",
    "/etc/proxy-usage-monitor/config.yaml",
];

static DISCORD_WEBHOOK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://(?:(?:canary|ptb)\.)?discord(?:app)?\.com/api/webhooks/\d+/[\w-]+/?$")
        .expect("valid discord webhook regex")
});

static SLACK_WEBHOOK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://hooks\.slack\.com/(?:services|workflows|triggers)/[\w/-]+$")
        .expect("valid slack webhook regex")
});

/// Which samplers run on each tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Sampling interval in seconds. Values <= 0 fall back to 30.
    #[serde(default = "default_interval")]
    pub interval: i64,
    #[serde(default = "default_true")]
    pub cpu: bool,
    #[serde(default = "default_true")]
    pub ram: bool,
    #[serde(default = "default_true")]
    pub disk: bool,
    #[serde(default = "default_true")]
    pub network: bool,
    #[serde(default = "default_true")]
    pub jvm: bool,
    #[serde(default = "default_true", alias = "connection-quality")]
    pub connection_quality: bool,
}

impl MonitoringConfig {
    /// Interval actually used by the scheduler.
    pub fn effective_interval(&self) -> Duration {
        if self.interval <= 0 {
            Duration::from_secs(DEFAULT_INTERVAL_SECS)
        } else {
            Duration::from_secs((self.interval as u64).min(MAX_INTERVAL_SECS))
        }
    }

    pub fn any_enabled(&self) -> bool {
        self.cpu || self.ram || self.disk || self.network || self.jvm || self.connection_quality
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            cpu: true,
            ram: true,
            disk: true,
            network: true,
            jvm: true,
            connection_quality: true,
        }
    }
}

/// Usage log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// File name pattern. `%date%` is replaced with the current date.
    #[serde(default = "default_log_filename")]
    pub filename: String,
    /// Mirror each usage line to the console.
    #[serde(default)]
    pub console: bool,
    /// chrono strftime pattern for line timestamps.
    #[serde(default = "default_date_format", alias = "date-format")]
    pub date_format: String,
    /// Number of usage log files kept (0 = unlimited).
    #[serde(default = "default_max_files", alias = "max-files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filename: default_log_filename(),
            console: false,
            date_format: default_date_format(),
            max_files: default_max_files(),
        }
    }
}

/// Alert thresholds in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_cpu_threshold")]
    pub cpu: f64,
    #[serde(default = "default_ram_threshold")]
    pub ram: f64,
    #[serde(default = "default_disk_threshold")]
    pub disk: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu: default_cpu_threshold(),
            ram: default_ram_threshold(),
            disk: default_disk_threshold(),
        }
    }
}

/// Periodic status reports (Discord only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReportConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Seconds between reports.
    #[serde(default = "default_status_report_interval")]
    pub interval: u64,
}

impl Default for StatusReportConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: default_status_report_interval(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscordConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, alias = "webhook-url")]
    pub webhook_url: String,
    #[serde(default, alias = "status-reports")]
    pub status_reports: StatusReportConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlackConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, alias = "webhook-url")]
    pub webhook_url: String,
}

/// Alerting and notification channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub console: bool,
    #[serde(default = "default_true", alias = "log-to-file")]
    pub log_to_file: bool,
    /// Minimum seconds between two alerts of the same kind.
    #[serde(default = "default_cooldown")]
    pub cooldown: u64,
    // Tables stay after plain values so the TOML serializer accepts the struct.
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub slack: SlackConfig,
}

impl AlertsConfig {
    pub fn cooldown_duration(&self) -> Duration {
        Duration::from_secs(self.cooldown)
    }

    pub fn any_channel_enabled(&self) -> bool {
        self.console || self.log_to_file || self.discord.enabled || self.slack.enabled
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            console: true,
            log_to_file: true,
            cooldown: default_cooldown(),
            thresholds: Thresholds::default(),
            discord: DiscordConfig::default(),
            slack: SlackConfig::default(),
        }
    }
}

/// A backend server behind the proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub name: String,
    /// `host:port` used for reachability pings.
    pub address: String,
}

/// The proxy being observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Label used in webhook payloads.
    #[serde(default = "default_proxy_name")]
    pub name: String,
    #[serde(default, alias = "max-players")]
    pub max_players: u32,
    /// Process whose runtime statistics feed the JVM sampler (None = this process).
    #[serde(default)]
    pub pid: Option<u32>,
    #[serde(default)]
    pub backends: Vec<BackendConfig>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            name: default_proxy_name(),
            max_players: 0,
            pid: None,
            backends: Vec::new(),
        }
    }
}

/// Complete monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base directory; usage and alert logs live under `<data_dir>/logs`.
    #[serde(default = "default_data_dir", alias = "data-dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            monitoring: MonitoringConfig::default(),
            logging: LoggingConfig::default(),
            alerts: AlertsConfig::default(),
            proxy: ProxyConfig::default(),
        }
    }
}

impl Config {
    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

fn default_true() -> bool {
    true
}
fn default_interval() -> i64 {
    DEFAULT_INTERVAL_SECS as i64
}
fn default_log_filename() -> String {
    DEFAULT_LOG_FILENAME.to_string()
}
fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}
fn default_max_files() -> usize {
    7
}
fn default_cpu_threshold() -> f64 {
    80.0
}
fn default_ram_threshold() -> f64 {
    85.0
}
fn default_disk_threshold() -> f64 {
    90.0
}
fn default_cooldown() -> u64 {
    DEFAULT_COOLDOWN_SECS
}
fn default_status_report_interval() -> u64 {
    DEFAULT_STATUS_REPORT_INTERVAL_SECS
}
fn default_proxy_name() -> String {
    "Proxy".to_string()
}
fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validates a configuration, collecting every error and warning.
pub fn validate_config(cfg: &Config) -> ValidationReport {
    let mut report = ValidationReport::default();

    // Monitoring
    if cfg.monitoring.interval <= 0 {
        report.warnings.push(format!(
            "monitoring.interval is {}, falling back to {} seconds",
            cfg.monitoring.interval, DEFAULT_INTERVAL_SECS
        ));
    } else if cfg.monitoring.interval as u64 > MAX_INTERVAL_SECS {
        report.errors.push(format!(
            "monitoring.interval of {}s exceeds the maximum of {}s",
            cfg.monitoring.interval, MAX_INTERVAL_SECS
        ));
    } else if cfg.monitoring.interval < 5 {
        report.warnings.push(format!(
            "monitoring.interval of {}s is very short and may add noticeable overhead",
            cfg.monitoring.interval
        ));
    }
    if !cfg.monitoring.any_enabled() {
        report
            .warnings
            .push("All monitors are disabled, log lines will only contain timestamps".into());
    }

    // Logging
    if cfg.logging.filename.trim().is_empty() {
        report.errors.push("logging.filename must not be empty".into());
    } else if !cfg.logging.filename.ends_with(".log") {
        report.warnings.push(format!(
            "logging.filename '{}' has no .log extension, retention will not clean it up",
            cfg.logging.filename
        ));
    }
    if let Err(e) = check_date_format(&cfg.logging.date_format) {
        report.errors.push(e);
    }
    if cfg.logging.max_files == 0 {
        report
            .warnings
            .push("logging.max_files is 0, usage logs are kept forever".into());
    }

    // Thresholds
    let t = &cfg.alerts.thresholds;
    for (name, value) in [("cpu", t.cpu), ("ram", t.ram), ("disk", t.disk)] {
        if !(value > 0.0 && value <= 100.0) {
            report.errors.push(format!(
                "alerts.thresholds.{} must be within (0, 100], got {}",
                name, value
            ));
        }
    }

    if cfg.alerts.enabled {
        if cfg.alerts.cooldown == 0 {
            report
                .warnings
                .push("alerts.cooldown is 0, every tick may dispatch alerts".into());
        }
        if !cfg.alerts.any_channel_enabled() {
            report
                .warnings
                .push("Alerts are enabled but no alert channel is enabled".into());
        }
    }

    // Webhooks
    let discord = &cfg.alerts.discord;
    if discord.enabled {
        check_webhook_url(
            "alerts.discord.webhook_url",
            &discord.webhook_url,
            &DISCORD_WEBHOOK_RE,
            "Discord",
            &mut report,
        );
    }
    if discord.status_reports.enabled {
        if !discord.enabled {
            report.warnings.push(
                "Discord status reports are enabled but the Discord webhook is disabled".into(),
            );
        }
        if discord.status_reports.interval > MAX_INTERVAL_SECS {
            report.errors.push(format!(
                "alerts.discord.status_reports.interval of {}s exceeds the maximum of {}s",
                discord.status_reports.interval, MAX_INTERVAL_SECS
            ));
        } else if discord.status_reports.interval < 60 {
            report.warnings.push(format!(
                "Status report interval of {}s is very short",
                discord.status_reports.interval
            ));
        }
    }
    let slack = &cfg.alerts.slack;
    if slack.enabled {
        check_webhook_url(
            "alerts.slack.webhook_url",
            &slack.webhook_url,
            &SLACK_WEBHOOK_RE,
            "Slack",
            &mut report,
        );
    }

    // Proxy backends
    for backend in &cfg.proxy.backends {
        if parse_host_port(&backend.address).is_none() {
            report.errors.push(format!(
                "Backend '{}' has invalid address '{}', expected host:port",
                backend.name, backend.address
            ));
        }
    }

    report
}

fn check_webhook_url(
    field: &str,
    url: &str,
    pattern: &Regex,
    provider: &str,
    report: &mut ValidationReport,
) {
    if url.trim().is_empty() {
        report
            .errors
            .push(format!("{} is empty but the webhook is enabled", field));
    } else if !(url.starts_with("https://") || url.starts_with("http://")) {
        report
            .errors
            .push(format!("{} must be an http(s) URL, got '{}'", field, url));
    } else if !pattern.is_match(url) {
        report.warnings.push(format!(
            "{} does not look like a {} webhook URL",
            field, provider
        ));
    }
}

fn check_date_format(pattern: &str) -> Result<(), String> {
    use chrono::format::{Item, StrftimeItems};

    if pattern.is_empty() {
        return Err("logging.date_format must not be empty".into());
    }
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(format!("logging.date_format '{}' is not a valid strftime pattern", pattern));
    }
    Ok(())
}

/// Splits `host:port`, returning None when either part is missing or the port is invalid.
pub fn parse_host_port(address: &str) -> Option<(&str, u16)> {
    let (host, port) = address.rsplit_once(':')?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return None;
    }
    let port = port.parse::<u16>().ok()?;
    Some((host, port))
}

/// Returns the first existing default config path, if any.
pub fn find_config_path() -> Option<PathBuf> {
    DEFAULT_CONFIG_PATHS
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(Path::to_path_buf)
}

/// Loads configuration from an explicit path or the default locations.
///
/// A missing file yields the default configuration.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match find_config_path() {
            Some(p) => p,
            None => return Ok(Config::default()),
        },
    };

    if !path.exists() {
        return Ok(Config::default());
    }

    load_config_file(&path)
}

/// Parses one config file, choosing the format from its extension (YAML by default).
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config =
                serde_json::from_str(&content).map_err(|source| ConfigError::Json {
                    path: path.to_path_buf(),
                    source,
                })?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config =
                serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
                    path: path.to_path_buf(),
                    source,
                })?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}
