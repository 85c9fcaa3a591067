//! Run command implementation.
//!
//! Starts the periodic pipeline and keeps it running until SIGINT or
//! SIGTERM. SIGHUP re-reads the configuration file.

use std::sync::Arc;

use anyhow::Context;
use proxy_usage_monitor::{HostingEnvironment, Monitor};
use tokio::signal;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::{build_monitor, ConfigSource};

/// Runs the monitor until a shutdown signal arrives.
pub async fn command_run(source: ConfigSource) -> anyhow::Result<()> {
    info!(
        "Starting proxy-usage-monitor v{} ({})",
        env!("CARGO_PKG_VERSION"),
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")
    );

    let config = source.load()?;
    match &source.path {
        Some(path) => info!("Using configuration: {}", path.display()),
        None => info!("No configuration file, using defaults"),
    }

    let environment = HostingEnvironment::detect();
    environment.log_summary();

    let monitor = match build_monitor(config, environment) {
        Ok(monitor) => Arc::new(monitor),
        Err(e) => {
            error!("❌ {:#}", e);
            return Err(e);
        }
    };

    let cfg = monitor.config();
    info!(
        "📊 Monitoring every {}s, logs in {}",
        cfg.monitoring.effective_interval().as_secs(),
        cfg.logs_dir().display()
    );
    if cfg.alerts.enabled {
        info!(
            "🔔 Alerts enabled (cooldown {}s, CPU {:.1}%, RAM {:.1}%, Disk {:.1}%)",
            cfg.alerts.cooldown,
            cfg.alerts.thresholds.cpu,
            cfg.alerts.thresholds.ram,
            cfg.alerts.thresholds.disk
        );
    } else {
        info!("🔕 Alerts disabled");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let pipeline = tokio::spawn(Arc::clone(&monitor).run(shutdown_rx));
    let reloader = tokio::spawn(reload_on_hangup(Arc::clone(&monitor), source));

    shutdown_signal().await?;
    let _ = shutdown_tx.send(true);

    if let Err(e) = pipeline.await {
        error!("Monitor task ended abnormally: {}", e);
    }
    reloader.abort();

    monitor.drain_webhooks().await;
    info!("\n{}", monitor.stats().render_table());
    info!("proxy-usage-monitor stopped gracefully");
    Ok(())
}

/// Waits for SIGINT or SIGTERM.
async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
        .context("Failed to install SIGTERM handler")?;

    #[cfg(unix)]
    let terminate = terminate.recv();

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Option<()>>();

    tokio::select! {
        result = signal::ctrl_c() => {
            result.context("Failed to install Ctrl+C handler")?;
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
    Ok(())
}

/// Reloads the configuration on every SIGHUP. A failed reload keeps the
/// current configuration.
#[cfg(unix)]
async fn reload_on_hangup(monitor: Arc<Monitor>, source: ConfigSource) {
    let mut hangup = match signal::unix::signal(signal::unix::SignalKind::hangup()) {
        Ok(stream) => stream,
        Err(e) => {
            warn!("Failed to install SIGHUP handler, reload disabled: {}", e);
            return;
        }
    };

    while hangup.recv().await.is_some() {
        info!("Received SIGHUP, reloading configuration");
        if source.path.is_none() {
            warn!("⚠️  No configuration file to reload");
            continue;
        }

        let config = match source.load() {
            Ok(config) => config,
            Err(e) => {
                warn!("⚠️  Reload failed, keeping current configuration: {:#}", e);
                continue;
            }
        };

        if let Err(e) = monitor.reload(config) {
            warn!("⚠️  Reload rejected, keeping current configuration: {}", e);
        } else {
            debug!("Reload applied");
        }
    }
}

#[cfg(not(unix))]
async fn reload_on_hangup(_monitor: Arc<Monitor>, _source: ConfigSource) {}
