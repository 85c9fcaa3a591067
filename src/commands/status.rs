//! Status command implementation.
//!
//! Shows what a `run` with the current configuration would monitor and
//! where its alerts would go.

use proxy_usage_monitor::{HostingEnvironment, MonitorStatus};

use crate::cli::OutputFormat;

use super::{build_monitor, ConfigSource};

pub fn command_status(source: ConfigSource, format: OutputFormat) -> anyhow::Result<()> {
    let config = source.load()?;
    let monitor = build_monitor(config, HostingEnvironment::detect())?;
    let status = monitor.status();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
        OutputFormat::Text => print!("{}", render_status(&status)),
    }
    Ok(())
}

fn render_status(status: &MonitorStatus) -> String {
    let list = |items: &[&str]| {
        if items.is_empty() {
            "none".to_string()
        } else {
            items.join(", ")
        }
    };
    let t = &status.thresholds;

    let mut out = String::new();
    out.push_str("📊 Proxy Usage Monitor - Status\n");
    out.push_str("===============================\n");
    out.push_str(&format!(
        "Environment:     {} - {}\n",
        status.environment.tier,
        status.environment.tier.description()
    ));
    out.push_str(&format!("Monitors:        {}\n", list(&status.monitors)));
    out.push_str(&format!("Interval:        {}s\n", status.interval_secs));
    out.push_str(&format!(
        "Alerts:          {}\n",
        if status.alerts_enabled { "enabled" } else { "disabled" }
    ));
    out.push_str(&format!("Alert channels:  {}\n", list(&status.channels)));
    out.push_str(&format!(
        "Thresholds:      CPU {:.1}% | RAM {:.1}% | Disk {:.1}%\n",
        t.cpu, t.ram, t.disk
    ));
    out.push_str(&format!("Cooldown:        {}s\n", status.cooldown_secs));
    match status.status_report_interval_secs {
        Some(secs) => out.push_str(&format!("Status reports:  every {}s\n", secs)),
        None => out.push_str("Status reports:  disabled\n"),
    }
    out
}
