//! The sampling pipeline.
//!
//! [`Monitor`] owns every sampler, both staleness caches and the cooldown
//! state. One tick samples the enabled monitors, appends the usage line,
//! and hands the same values to the alert manager. Ticks never overlap:
//! the scheduler awaits each one before the next can start, and a tick
//! lock serializes ticks requested from elsewhere.
//!
//! Each scheduled tick runs in its own tokio task. A panic inside it is
//! caught as a `JoinError`, logged and counted, and the schedule carries
//! on.

use crate::alert::{AlertManager, AlertPass, EvaluationInput};
use crate::config::{validate_config, Config, Thresholds, MAX_INTERVAL_SECS};
use crate::environment::HostingEnvironment;
use crate::error::{MonitorError, NotifyError};
use crate::health::{self, HealthReport};
use crate::host::ProxyHost;
use crate::logwriter::{format_usage_fields, format_usage_line, LogWriter};
use crate::notify::{DispatchReceipt, Dispatcher, StatusReport, WebhookClient, WebhookOutcome};
use crate::pipeline_stats::{PipelineStats, StatsSnapshot};
use crate::runtime::{ProcessRuntime, RuntimeProbe};
use crate::sample::{MemorySample, NetworkSample, Reading, TickSnapshot};
use crate::samplers::{
    ConnectionQualitySampler, CpuSampler, DiskSampler, JvmSampler, MemorySampler, NetworkSampler,
};
use crate::system::{ProcfsSource, SystemSource};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Where the samplers read from.
#[derive(Clone)]
pub struct Sources {
    pub system: Arc<dyn SystemSource>,
    pub host: Arc<dyn ProxyHost>,
    pub runtime: Arc<dyn RuntimeProbe>,
}

impl Sources {
    /// `/proc` for the system and the runtime of `proxy.pid`.
    pub fn live(cfg: &Config, host: Arc<dyn ProxyHost>) -> Self {
        Self {
            system: Arc::new(ProcfsSource),
            host,
            runtime: Arc::new(ProcessRuntime::new(cfg.proxy.pid)),
        }
    }
}

/// Result of one tick.
#[derive(Debug)]
pub struct TickOutcome {
    pub snapshot: TickSnapshot,
    pub line: String,
    pub alerts: AlertPass,
}

/// Point-in-time description of the running pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatus {
    pub environment: HostingEnvironment,
    pub monitors: Vec<&'static str>,
    pub alerts_enabled: bool,
    pub channels: Vec<&'static str>,
    pub thresholds: Thresholds,
    pub interval_secs: u64,
    pub cooldown_secs: u64,
    /// None when status reports are off.
    pub status_report_interval_secs: Option<u64>,
    pub last_tick: Option<DateTime<Local>>,
    pub health: Option<HealthReport>,
    /// (hits, misses)
    pub network_cache: (u64, u64),
    pub connection_cache: (u64, u64),
    pub stats: StatsSnapshot,
}

pub struct Monitor {
    config: RwLock<Arc<Config>>,
    environment: HostingEnvironment,

    cpu: CpuSampler,
    memory: MemorySampler,
    disk: DiskSampler,
    network: NetworkSampler,
    connection: ConnectionQualitySampler,
    jvm: JvmSampler,

    alerts: AlertManager,
    stats: Arc<PipelineStats>,

    tick_lock: tokio::sync::Mutex<()>,
    last_snapshot: RwLock<Option<TickSnapshot>>,
    pending_webhooks: Mutex<Vec<JoinHandle<WebhookOutcome>>>,
    reloaded: Notify,
}

impl Monitor {
    /// Builds the pipeline. Fails only when it cannot run at all: invalid
    /// configuration, no HTTP client, or no log directory.
    pub fn new(
        config: Config,
        environment: HostingEnvironment,
        sources: Sources,
    ) -> Result<Self, MonitorError> {
        let report = validate_config(&config);
        if !report.is_valid() {
            return Err(MonitorError::InvalidConfig(report.errors.join("; ")));
        }
        for warning in &report.warnings {
            warn!("⚠️  Config: {}", warning);
        }

        let logs_dir = config.logs_dir();
        fs::create_dir_all(&logs_dir).map_err(|source| MonitorError::LogDirectory {
            path: logs_dir.clone(),
            source,
        })?;

        let stats = Arc::new(PipelineStats::new());
        let dispatcher = Dispatcher::new(WebhookClient::new()?, Arc::clone(&stats));

        Ok(Self {
            config: RwLock::new(Arc::new(config)),
            environment,
            cpu: CpuSampler::new(Arc::clone(&sources.system)),
            memory: MemorySampler::new(Arc::clone(&sources.system)),
            disk: DiskSampler::new(Arc::clone(&sources.system)),
            network: NetworkSampler::new(Arc::clone(&sources.host)),
            connection: ConnectionQualitySampler::new(Arc::clone(&sources.host)),
            jvm: JvmSampler::new(Arc::clone(&sources.runtime)),
            alerts: AlertManager::new(dispatcher, Arc::clone(&stats)),
            stats,
            tick_lock: tokio::sync::Mutex::new(()),
            last_snapshot: RwLock::new(None),
            pending_webhooks: Mutex::new(Vec::new()),
            reloaded: Notify::new(),
        })
    }

    /// Current configuration. Cheap to call; the returned value is never
    /// mutated.
    pub fn config(&self) -> Arc<Config> {
        match self.config.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn environment(&self) -> &HostingEnvironment {
        &self.environment
    }

    pub fn stats(&self) -> &Arc<PipelineStats> {
        &self.stats
    }

    pub fn last_snapshot(&self) -> Option<TickSnapshot> {
        self.last_snapshot.read().ok().and_then(|guard| guard.clone())
    }

    /// Runs every enabled sampler once. Nothing is logged or dispatched.
    pub async fn collect(&self) -> TickSnapshot {
        let _guard = self.tick_lock.lock().await;
        self.collect_locked(&self.config()).await
    }

    async fn collect_locked(&self, cfg: &Config) -> TickSnapshot {
        let m = &cfg.monitoring;
        let env = &self.environment;
        let mut snapshot = TickSnapshot::empty(Local::now());

        if m.cpu {
            snapshot.cpu = if env.can_monitor_cpu() {
                Reading::Sampled(self.cpu.sample())
            } else {
                Reading::Unavailable
            };
        }
        if m.ram {
            snapshot.memory = if env.can_monitor_ram() {
                Reading::Sampled(self.memory.sample())
            } else {
                Reading::Unavailable
            };
        }
        if m.disk {
            snapshot.disks = if env.can_monitor_disk() {
                Reading::Sampled(self.disk.sample())
            } else {
                Reading::Unavailable
            };
        }
        if m.network {
            snapshot.network = Reading::Sampled(self.network.sample());
        }
        if m.jvm {
            snapshot.jvm = Reading::Sampled(self.jvm.sample());
        }
        if m.connection_quality {
            snapshot.connection = Reading::Sampled(self.connection.sample().await);
        }

        snapshot
    }

    /// One full tick: sample, write the usage line, evaluate and dispatch.
    pub async fn tick(&self) -> TickOutcome {
        let _guard = self.tick_lock.lock().await;
        let started = Instant::now();
        let cfg = self.config();

        let snapshot = self.collect_locked(&cfg).await;
        let line = format_usage_line(&snapshot, &cfg.logging.date_format);

        let writer = LogWriter::from_config(&cfg);
        if let Err(e) = writer.append(&line, snapshot.timestamp) {
            warn!("Failed to write to log file in {}: {}", writer.logs_dir().display(), e);
            self.stats.record_log_write_failure();
        }
        if cfg.logging.console {
            info!("System Usage: {}", format_usage_fields(&snapshot));
        }

        // Unavailable or disabled readings evaluate as zero.
        let input = EvaluationInput {
            cpu_usage: snapshot.cpu.sampled().copied().unwrap_or(0.0),
            memory: snapshot.memory.sampled(),
            disks: snapshot.disks.sampled().map(Vec::as_slice),
        };
        let mut alerts = self.alerts.check_and_dispatch(&cfg, &input, Instant::now());
        self.track_webhooks(alerts.receipts.iter_mut().flat_map(|r| r.webhook_tasks.drain(..)));

        if let Ok(mut last) = self.last_snapshot.write() {
            *last = Some(snapshot.clone());
        }

        self.stats
            .record_tick(started.elapsed().as_secs_f64() * 1000.0);

        TickOutcome {
            snapshot,
            line,
            alerts,
        }
    }

    /// Runs the schedule until `shutdown` turns true or its sender is
    /// dropped. The first tick fires immediately.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut first_start = true;

        loop {
            let cfg = self.config();
            let period = cfg.monitoring.effective_interval();
            let start = if first_start {
                tokio::time::Instant::now()
            } else {
                tokio::time::Instant::now() + period
            };
            first_start = false;

            let mut ticker = interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut reporter = status_report_interval(&cfg);

            info!(
                "⏱️  Sampling every {}s{}",
                period.as_secs(),
                match &reporter {
                    Some(r) => format!(", status reports every {}s", r.period().as_secs()),
                    None => String::new(),
                }
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => self.run_scheduled_tick().await,
                    _ = next_report(&mut reporter) => {
                        if let Some(task) = self.send_status_report() {
                            self.track_webhooks(std::iter::once(task));
                        }
                    }
                    _ = self.reloaded.notified() => {
                        debug!("Rescheduling after configuration reload");
                        break;
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            info!("🛑 Sampling stopped");
                            return;
                        }
                    }
                }
            }
        }
    }

    async fn run_scheduled_tick(self: &Arc<Self>) {
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            this.tick().await;
        });
        if let Err(e) = handle.await {
            error!("❌ Sampling tick failed: {}", e);
            self.stats.record_tick_failure();
        }
    }

    /// Applies a new configuration. Cooldown state and caches carry over.
    /// An invalid configuration is rejected and the current one stays.
    pub fn reload(&self, config: Config) -> Result<(), MonitorError> {
        let report = validate_config(&config);
        if !report.is_valid() {
            return Err(MonitorError::InvalidConfig(report.errors.join("; ")));
        }
        for warning in &report.warnings {
            warn!("⚠️  Config: {}", warning);
        }

        let current = self.config();
        if current.proxy.backends != config.proxy.backends || current.proxy.pid != config.proxy.pid
        {
            warn!("⚠️  Changes to proxy.backends and proxy.pid take effect after a restart");
        }

        let logs_dir = config.logs_dir();
        fs::create_dir_all(&logs_dir).map_err(|source| MonitorError::LogDirectory {
            path: logs_dir.clone(),
            source,
        })?;

        match self.config.write() {
            Ok(mut guard) => *guard = Arc::new(config),
            Err(poisoned) => *poisoned.into_inner() = Arc::new(config),
        }
        self.reloaded.notify_one();
        info!("🔄 Configuration reloaded");
        Ok(())
    }

    /// Expires every cooldown and dispatches a simulated critical alert.
    pub fn send_test_alert(&self, sender: &str) -> Result<DispatchReceipt, NotifyError> {
        self.alerts
            .send_test_alert(&self.config(), sender, Instant::now())
    }

    /// Sends the Discord test embed and waits for the outcome.
    pub async fn send_test_webhook(&self, sender: &str) -> Result<WebhookOutcome, NotifyError> {
        self.alerts
            .dispatcher()
            .send_test_webhook(&self.config(), sender)
            .await
    }

    /// Sends a status report built from the latest tick. Skipped before the
    /// first tick and when status reports are off.
    pub fn send_status_report(&self) -> Option<JoinHandle<WebhookOutcome>> {
        let cfg = self.config();
        if !cfg.alerts.discord.status_reports.enabled {
            return None;
        }
        let Some(snapshot) = self.last_snapshot() else {
            debug!("Status report skipped: no tick has completed yet");
            return None;
        };

        let report = build_status_report(&snapshot, &cfg.alerts.thresholds);
        self.alerts.dispatcher().send_status_report(&cfg, &report)
    }

    pub fn status(&self) -> MonitorStatus {
        let cfg = self.config();
        let m = &cfg.monitoring;
        let a = &cfg.alerts;

        let monitors = [
            ("cpu", m.cpu),
            ("ram", m.ram),
            ("disk", m.disk),
            ("network", m.network),
            ("jvm", m.jvm),
            ("connection_quality", m.connection_quality),
        ]
        .into_iter()
        .filter_map(|(name, on)| on.then_some(name))
        .collect();

        let channels = [
            ("console", a.console),
            ("file", a.log_to_file),
            ("discord", a.discord.enabled),
            ("slack", a.slack.enabled),
        ]
        .into_iter()
        .filter_map(|(name, on)| on.then_some(name))
        .collect();

        let last = self.last_snapshot();
        let health = last.as_ref().map(|s| health_of(s, &a.thresholds));

        MonitorStatus {
            environment: self.environment.clone(),
            monitors,
            alerts_enabled: a.enabled,
            channels,
            thresholds: a.thresholds,
            interval_secs: m.effective_interval().as_secs(),
            cooldown_secs: a.cooldown,
            status_report_interval_secs: a
                .discord
                .status_reports
                .enabled
                .then_some(a.discord.status_reports.interval),
            last_tick: last.map(|s| s.timestamp),
            health,
            network_cache: self.network.cache_counters(),
            connection_cache: self.connection.cache_counters(),
            stats: self.stats.snapshot(),
        }
    }

    /// Waits for webhook deliveries still in flight. Each is bounded by the
    /// webhook timeout.
    pub async fn drain_webhooks(&self) {
        let pending: Vec<_> = match self.pending_webhooks.lock() {
            Ok(mut guard) => guard.drain(..).collect(),
            Err(poisoned) => poisoned.into_inner().drain(..).collect(),
        };
        if pending.is_empty() {
            return;
        }
        info!("⏳ Waiting for {} webhook deliveries", pending.len());
        for task in pending {
            let _ = task.await;
        }
    }

    fn track_webhooks(&self, tasks: impl Iterator<Item = JoinHandle<WebhookOutcome>>) {
        let mut pending = match self.pending_webhooks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        pending.retain(|task| !task.is_finished());
        pending.extend(tasks);
    }
}

fn health_of(snapshot: &TickSnapshot, thresholds: &Thresholds) -> HealthReport {
    let memory = snapshot.memory.sampled().copied().unwrap_or_default();
    let disks = snapshot.disks.sampled().cloned().unwrap_or_default();
    health::classify(thresholds, snapshot.cpu_percent(), memory.usage_percent, &disks)
}

/// Status report payload inputs from a tick snapshot.
pub fn build_status_report(snapshot: &TickSnapshot, thresholds: &Thresholds) -> StatusReport {
    StatusReport {
        cpu_percent: snapshot.cpu_percent(),
        memory: snapshot
            .memory
            .sampled()
            .copied()
            .unwrap_or_else(MemorySample::zeroed),
        network: snapshot
            .network
            .sampled()
            .copied()
            .unwrap_or_else(NetworkSample::default),
        disks: snapshot.disks.sampled().cloned().unwrap_or_default(),
        health: health_of(snapshot, thresholds).overall,
    }
}

fn status_report_interval(cfg: &Config) -> Option<Interval> {
    let reports = &cfg.alerts.discord.status_reports;
    if !reports.enabled || !cfg.alerts.discord.enabled {
        return None;
    }
    let period = Duration::from_secs(reports.interval.clamp(1, MAX_INTERVAL_SECS));
    let mut interval = interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    Some(interval)
}

async fn next_report(reporter: &mut Option<Interval>) {
    match reporter {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertKind;
    use crate::host::StaticHost;
    use crate::runtime::HeapUsage;
    use crate::system::{CpuStat, MemoryInfo};
    use crate::collectors::filesystem::FilesystemStats;

    const GIB: u64 = 1024 * 1024 * 1024;

    /// Reports a fixed memory state and a CPU that is busy 90% of each step.
    struct HotSystem {
        step: Mutex<u64>,
    }

    impl SystemSource for HotSystem {
        fn cpu_times(&self) -> Result<CpuStat, String> {
            let mut step = self.step.lock().unwrap();
            *step += 1;
            Ok(CpuStat {
                user: 90 * *step,
                idle: 10 * *step,
                ..Default::default()
            })
        }

        fn memory(&self) -> Result<MemoryInfo, String> {
            Ok(MemoryInfo {
                total_bytes: 8 * GIB,
                available_bytes: GIB,
            })
        }

        fn volumes(&self) -> Result<Vec<FilesystemStats>, String> {
            Ok(vec![FilesystemStats {
                device: "/dev/sda1".into(),
                mount_point: "/".into(),
                fstype: "ext4".into(),
                total_bytes: 100 * GIB,
                available_bytes: 50 * GIB,
            }])
        }
    }

    struct NoRuntime;

    impl RuntimeProbe for NoRuntime {
        fn heap(&self) -> Result<HeapUsage, String> {
            Err("unsupported".into())
        }
        fn non_heap_used_bytes(&self) -> Result<u64, String> {
            Err("unsupported".into())
        }
        fn thread_count(&self) -> Result<u64, String> {
            Err("unsupported".into())
        }
        fn loaded_class_count(&self) -> Result<u64, String> {
            Err("unsupported".into())
        }
        fn gc_collection_times_ms(&self) -> Result<Vec<i64>, String> {
            Err("unsupported".into())
        }
    }

    fn sources() -> Sources {
        Sources {
            system: Arc::new(HotSystem { step: Mutex::new(0) }),
            host: Arc::new(StaticHost::new(Vec::new(), 100)),
            runtime: Arc::new(NoRuntime),
        }
    }

    fn config(dir: &std::path::Path) -> Config {
        let mut cfg = Config::default();
        cfg.data_dir = dir.to_path_buf();
        cfg.alerts.console = false;
        cfg
    }

    #[tokio::test]
    async fn test_tick_writes_line_and_alerts() {
        let dir = tempfile::tempdir().unwrap();
        let monitor =
            Monitor::new(config(dir.path()), HostingEnvironment::full(), sources()).unwrap();

        let outcome = monitor.tick().await;
        assert!(outcome.line.contains("CPU: 90.00%"));
        assert!(outcome.line.contains("RAM: 7.00 GB/8.00 GB (87.50%)"));
        assert!(outcome.line.contains("JVM: Heap 0.0%"));
        assert!(outcome
            .alerts
            .dispatched
            .contains(&AlertKind::SystemCritical));

        let second = monitor.tick().await;
        assert!(second.alerts.dispatched.is_empty());
        assert_eq!(monitor.stats().snapshot().ticks_total, 2);
        assert!(monitor.last_snapshot().is_some());
    }

    #[tokio::test]
    async fn test_restricted_environment_logs_na() {
        let dir = tempfile::tempdir().unwrap();
        let env = HostingEnvironment::classify(false, false, false, false, None, false);
        let monitor = Monitor::new(config(dir.path()), env, sources()).unwrap();

        let outcome = monitor.tick().await;
        assert!(outcome.line.contains("CPU: N/A | RAM: N/A | Disk: N/A"));
        assert!(outcome.alerts.dispatched.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path());
        cfg.alerts.thresholds.cpu = 150.0;
        assert!(matches!(
            Monitor::new(cfg.clone(), HostingEnvironment::full(), sources()),
            Err(MonitorError::InvalidConfig(_))
        ));

        let monitor =
            Monitor::new(config(dir.path()), HostingEnvironment::full(), sources()).unwrap();
        assert!(monitor.reload(cfg).is_err());
        assert_eq!(monitor.config().alerts.thresholds.cpu, 80.0);
    }

    #[tokio::test]
    async fn test_reload_keeps_cooldowns() {
        let dir = tempfile::tempdir().unwrap();
        let monitor =
            Monitor::new(config(dir.path()), HostingEnvironment::full(), sources()).unwrap();
        monitor.tick().await;

        let mut updated = config(dir.path());
        updated.monitoring.interval = 10;
        monitor.reload(updated).unwrap();
        assert_eq!(monitor.status().interval_secs, 10);

        let outcome = monitor.tick().await;
        assert!(outcome.alerts.dispatched.is_empty());
        assert!(!outcome.alerts.suppressed.is_empty());
    }

    #[tokio::test]
    async fn test_status_report_needs_a_tick() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path());
        cfg.alerts.discord.status_reports.enabled = true;
        let monitor = Monitor::new(cfg, HostingEnvironment::full(), sources()).unwrap();
        assert!(monitor.send_status_report().is_none());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = Arc::new(
            Monitor::new(config(dir.path()), HostingEnvironment::full(), sources()).unwrap(),
        );
        let (tx, rx) = watch::channel(false);
        let runner = tokio::spawn(Arc::clone(&monitor).run(rx));

        tokio::time::sleep(Duration::from_millis(200)).await;
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), runner)
            .await
            .unwrap()
            .unwrap();
        assert!(monitor.stats().snapshot().ticks_total >= 1);
    }

    #[test]
    fn test_build_status_report() {
        let mut snapshot = TickSnapshot::empty(Local::now());
        snapshot.cpu = Reading::Sampled(0.85);
        snapshot.memory = Reading::Sampled(MemorySample::from_totals(8 * GIB, GIB));
        let report = build_status_report(&snapshot, &Thresholds::default());
        assert_eq!(report.health, crate::health::HealthStatus::Critical);
        assert!(report.disks.is_empty());
        assert_eq!(report.network, NetworkSample::default());
    }
}
