//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use proxy_usage_monitor::Config;

use crate::cli::ConfigFormat;

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> anyhow::Result<()> {
    let config = Config::default();
    let output = match output {
        Some(path) => path,
        None => PathBuf::from(match format {
            ConfigFormat::Yaml => "proxy-usage-monitor.yaml",
            ConfigFormat::Json => "proxy-usage-monitor.json",
            ConfigFormat::Toml => "proxy-usage-monitor.toml",
        }),
    };

    let content = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(&config)?,
        ConfigFormat::Toml => toml::to_string_pretty(&config)?,
        ConfigFormat::Yaml => {
            let mut content = serde_yaml::to_string(&config)?;
            if commented {
                content = add_config_comments(content);
            }
            content
        }
    };

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# Proxy Usage Monitor Configuration
# ==================================
#
# data_dir: "."                  # Usage and alert logs live in <data_dir>/logs
#
# Monitoring
# ----------
# interval: 30                   # Seconds between ticks (<= 0 falls back to 30)
# cpu / ram / disk: true         # System samplers
# network: true                  # Player load and backend reachability
# jvm: true                      # Runtime heap usage
# connection_quality: true       # Backend ping statistics
#
# Logging
# -------
# filename: "system-usage.log"   # "%date%" is replaced by yyyy-MM-dd, otherwise
#                                # the date is inserted before the extension
# console: false                 # Mirror each usage line to the console
# date_format: "%Y-%m-%d %H:%M:%S"
# max_files: 7                   # Usage logs kept (0 = unlimited)
#
# Alerts
# ------
# enabled: true
# console: true                  # Log alerts as warnings
# log_to_file: true              # Append alerts to logs/alerts.log
# cooldown: 300                  # Seconds between two alerts of the same kind
# thresholds:                    # Percent, each in (0, 100]
#   cpu: 80.0
#   ram: 85.0
#   disk: 90.0
# discord:
#   enabled: false
#   webhook_url: ""              # https://discord.com/api/webhooks/<id>/<token>
#   status_reports:
#     enabled: false
#     interval: 3600             # Seconds between status reports
# slack:
#   enabled: false
#   webhook_url: ""              # https://hooks.slack.com/services/...
#
# Proxy
# -----
# name: "Proxy"                  # Label used in webhook messages
# max_players: 0
# pid: null                      # Process whose runtime is sampled (null = self)
# backends:
#   - name: "lobby"
#     address: "127.0.0.1:25566"
"#;

    format!("{comments}\n{yaml}")
}
