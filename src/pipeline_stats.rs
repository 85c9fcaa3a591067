//! Running statistics about the pipeline itself.
//!
//! Tracks tick timing and failures, alert gating results, webhook outcomes
//! and log write failures. Everything is lock-free except the running
//! min/max/avg accumulators, which take a short mutex.

use serde::Serialize;
use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Min/max/avg/last of tick durations in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DurationSummary {
    pub last: f64,
    pub avg: f64,
    pub max: f64,
    pub min: f64,
}

#[derive(Default)]
struct Accumulator {
    ticks: u64,
    total: f64,
    summary: DurationSummary,
}

/// Tick duration accumulator behind a short mutex.
#[derive(Default)]
pub struct TickTimings {
    inner: Mutex<Accumulator>,
}

impl TickTimings {
    pub fn record(&self, duration_ms: f64) {
        let Ok(mut acc) = self.inner.lock() else {
            return;
        };
        let first = acc.ticks == 0;
        acc.ticks += 1;
        acc.total += duration_ms;
        let avg = acc.total / acc.ticks as f64;
        let s = &mut acc.summary;
        s.last = duration_ms;
        s.avg = avg;
        s.max = if first { duration_ms } else { s.max.max(duration_ms) };
        s.min = if first { duration_ms } else { s.min.min(duration_ms) };
    }

    pub fn summary(&self) -> DurationSummary {
        self.inner
            .lock()
            .map(|acc| acc.summary)
            .unwrap_or_default()
    }
}

/// Counters shared by the monitor, the alert manager and the dispatcher.
pub struct PipelineStats {
    pub tick_duration_ms: TickTimings,
    pub ticks_total: AtomicU64,
    pub ticks_failed: AtomicU64,

    pub alerts_dispatched: AtomicU64,
    pub alerts_suppressed: AtomicU64,

    pub webhooks_delivered: AtomicU64,
    pub webhooks_failed: AtomicU64,

    pub log_write_failures: AtomicU64,

    pub start_time: Instant,
}

impl Default for PipelineStats {
    fn default() -> Self {
        Self {
            tick_duration_ms: TickTimings::default(),
            ticks_total: AtomicU64::new(0),
            ticks_failed: AtomicU64::new(0),
            alerts_dispatched: AtomicU64::new(0),
            alerts_suppressed: AtomicU64::new(0),
            webhooks_delivered: AtomicU64::new(0),
            webhooks_failed: AtomicU64::new(0),
            log_write_failures: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }
}

/// Point-in-time copy of [`PipelineStats`], used for JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub ticks_total: u64,
    pub ticks_failed: u64,
    pub tick_duration_last_ms: f64,
    pub tick_duration_avg_ms: f64,
    pub tick_duration_max_ms: f64,
    pub tick_duration_min_ms: f64,
    pub alerts_dispatched: u64,
    pub alerts_suppressed: u64,
    pub webhooks_delivered: u64,
    pub webhooks_failed: u64,
    pub log_write_failures: u64,
    pub uptime_seconds: u64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record_tick(&self, duration_ms: f64) {
        self.tick_duration_ms.record(duration_ms);
        self.ticks_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a tick that panicked; it still counts toward the total.
    pub fn record_tick_failure(&self) {
        self.ticks_total.fetch_add(1, Ordering::Relaxed);
        self.ticks_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_alert_pass(&self, dispatched: usize, suppressed: usize) {
        self.alerts_dispatched
            .fetch_add(dispatched as u64, Ordering::Relaxed);
        self.alerts_suppressed
            .fetch_add(suppressed as u64, Ordering::Relaxed);
    }

    pub fn record_webhook(&self, delivered: bool) {
        if delivered {
            self.webhooks_delivered.fetch_add(1, Ordering::Relaxed);
        } else {
            self.webhooks_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_log_write_failure(&self) {
        self.log_write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let durations = self.tick_duration_ms.summary();
        StatsSnapshot {
            ticks_total: self.ticks_total.load(Ordering::Relaxed),
            ticks_failed: self.ticks_failed.load(Ordering::Relaxed),
            tick_duration_last_ms: durations.last,
            tick_duration_avg_ms: durations.avg,
            tick_duration_max_ms: durations.max,
            tick_duration_min_ms: durations.min,
            alerts_dispatched: self.alerts_dispatched.load(Ordering::Relaxed),
            alerts_suppressed: self.alerts_suppressed.load(Ordering::Relaxed),
            webhooks_delivered: self.webhooks_delivered.load(Ordering::Relaxed),
            webhooks_failed: self.webhooks_failed.load(Ordering::Relaxed),
            log_write_failures: self.log_write_failures.load(Ordering::Relaxed),
            uptime_seconds: self.get_uptime_seconds(),
        }
    }

    pub fn render_table(&self) -> String {
        let s = self.snapshot();
        let left_col = 26usize;
        let col_w = 12usize;

        let mut out = String::new();

        writeln!(out, "PIPELINE STATISTICS").ok();
        writeln!(out, "===================").ok();
        writeln!(out).ok();

        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "",
            "current",
            "average",
            "max",
            "min",
            left = left_col,
            col = col_w
        )
        .ok();

        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "tick_duration (ms)",
            format!("{:.1}", s.tick_duration_last_ms),
            format!("{:.1}", s.tick_duration_avg_ms),
            format!("{:.1}", s.tick_duration_max_ms),
            format!("{:.1}", s.tick_duration_min_ms),
            left = left_col,
            col = col_w
        )
        .ok();

        writeln!(out).ok();
        for (label, value) in [
            ("ticks_total", s.ticks_total),
            ("ticks_failed", s.ticks_failed),
            ("alerts_dispatched", s.alerts_dispatched),
            ("alerts_suppressed", s.alerts_suppressed),
            ("webhooks_delivered", s.webhooks_delivered),
            ("webhooks_failed", s.webhooks_failed),
            ("log_write_failures", s.log_write_failures),
        ] {
            writeln!(out, "{:left$} | {:^col$}", label, value, left = left_col, col = col_w).ok();
        }

        writeln!(out).ok();
        writeln!(
            out,
            "uptime: {:.1}h",
            s.uptime_seconds as f64 / 3600.0
        )
        .ok();

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_timings() {
        let timings = TickTimings::default();
        assert_eq!(timings.summary(), DurationSummary::default());

        timings.record(10.0);
        timings.record(30.0);
        timings.record(20.0);
        assert_eq!(
            timings.summary(),
            DurationSummary {
                last: 20.0,
                avg: 20.0,
                max: 30.0,
                min: 10.0,
            }
        );
    }

    #[test]
    fn test_counters() {
        let stats = PipelineStats::new();
        stats.record_tick(12.0);
        stats.record_tick_failure();
        stats.record_alert_pass(2, 1);
        stats.record_webhook(true);
        stats.record_webhook(false);
        stats.record_webhook(false);
        stats.record_log_write_failure();

        let s = stats.snapshot();
        assert_eq!(s.ticks_total, 2);
        assert_eq!(s.ticks_failed, 1);
        assert_eq!(s.alerts_dispatched, 2);
        assert_eq!(s.alerts_suppressed, 1);
        assert_eq!(s.webhooks_delivered, 1);
        assert_eq!(s.webhooks_failed, 2);
        assert_eq!(s.log_write_failures, 1);
        assert_eq!(s.tick_duration_last_ms, 12.0);
    }

    #[test]
    fn test_render_table() {
        let stats = PipelineStats::new();
        stats.record_tick(5.0);
        let table = stats.render_table();
        assert!(table.starts_with("PIPELINE STATISTICS"));
        assert!(table.contains("tick_duration (ms)"));
        assert!(table.contains("ticks_total"));
        assert!(table.contains("uptime:"));
    }
}
