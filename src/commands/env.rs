//! Env command implementation.
//!
//! Runs the hosting environment probes and prints the result.

use proxy_usage_monitor::HostingEnvironment;
use serde_json::json;

use crate::cli::OutputFormat;

pub fn command_env(format: OutputFormat) -> anyhow::Result<()> {
    let env = HostingEnvironment::detect();

    match format {
        OutputFormat::Json => {
            let report = json!({
                "tier": env.tier.to_string(),
                "description": env.tier.description(),
                "system_access": env.system_access,
                "disk_access": env.disk_access,
                "network_access": env.network_access,
                "containerized": env.containerized,
                "shared_hosting": env.shared_hosting,
                "running_as_root": env.running_as_root,
                "network_monitoring": env.can_monitor_network(),
                "jvm_fallback": env.should_use_jvm_fallback(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            let mark = |ok: bool| if ok { "✅" } else { "❌" };
            println!("🔍 Proxy Usage Monitor - Hosting Environment");
            println!("============================================");
            println!("Capability level: {} - {}", env.tier, env.tier.description());
            println!("   {} System access", mark(env.system_access));
            println!("   {} Disk access", mark(env.disk_access));
            println!("   {} Network access", mark(env.network_access));
            println!(
                "Containerized:    {}",
                if env.containerized { "Yes" } else { "No" }
            );
            println!(
                "Shared hosting:   {}",
                if env.shared_hosting { "Likely" } else { "Unlikely" }
            );
            println!(
                "Running as root:  {}",
                if env.running_as_root { "Yes" } else { "No" }
            );
            if env.should_use_jvm_fallback() {
                println!("\n⚠️  Only runtime (JVM) metrics are recommended in this environment");
            }
        }
    }
    Ok(())
}
