//! Evaluate, gate and dispatch.

use super::{Alert, AlertKind, CooldownGate, EvaluationInput, ThresholdEvaluator};
use crate::config::Config;
use crate::error::NotifyError;
use crate::notify::{DispatchReceipt, Dispatcher};
use crate::pipeline_stats::PipelineStats;
use crate::sample::{format_bytes, MemorySample};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

const GIB: u64 = 1024 * 1024 * 1024;

/// Simulated CPU load used by the test alert.
pub const TEST_CPU_USAGE: f64 = 0.85;

/// Result of one evaluation pass.
#[derive(Debug, Default)]
pub struct AlertPass {
    pub dispatched: Vec<AlertKind>,
    pub suppressed: Vec<AlertKind>,
    pub receipts: Vec<DispatchReceipt>,
}

impl AlertPass {
    /// Waits for every webhook started during the pass.
    pub async fn wait(self) -> Vec<crate::notify::WebhookOutcome> {
        let mut outcomes = Vec::new();
        for receipt in self.receipts {
            outcomes.extend(receipt.wait().await);
        }
        outcomes
    }
}

/// Owns the cooldown state for the lifetime of the pipeline.
///
/// Thresholds, channels and the cooldown duration are read from the config
/// passed to each call, so a reload takes effect on the next pass while the
/// cooldown timestamps carry over.
pub struct AlertManager {
    gate: CooldownGate,
    dispatcher: Dispatcher,
    stats: Arc<PipelineStats>,
}

impl AlertManager {
    pub fn new(dispatcher: Dispatcher, stats: Arc<PipelineStats>) -> Self {
        Self {
            gate: CooldownGate::new(),
            dispatcher,
            stats,
        }
    }

    pub fn gate(&self) -> &CooldownGate {
        &self.gate
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Evaluates `input` and dispatches every alert whose kind is not
    /// cooling down. Does nothing when alerts are disabled.
    pub fn check_and_dispatch(
        &self,
        cfg: &Config,
        input: &EvaluationInput<'_>,
        now: Instant,
    ) -> AlertPass {
        let mut pass = AlertPass::default();
        if !cfg.alerts.enabled {
            return pass;
        }

        let evaluator = ThresholdEvaluator::new(cfg.alerts.thresholds);
        let cooldown = cfg.alerts.cooldown_duration();

        for alert in evaluator.evaluate(input) {
            if self.gate.try_acquire(alert.kind, now, cooldown) {
                pass.receipts.push(self.dispatcher.dispatch(cfg, &alert));
                pass.dispatched.push(alert.kind);
            } else {
                debug!("{} alert suppressed by cooldown", alert.kind.code());
                pass.suppressed.push(alert.kind);
            }
        }

        self.stats
            .record_alert_pass(pass.dispatched.len(), pass.suppressed.len());
        pass
    }

    /// Expires every cooldown and dispatches a simulated critical alert.
    pub fn send_test_alert(
        &self,
        cfg: &Config,
        sender: &str,
        now: Instant,
    ) -> Result<DispatchReceipt, NotifyError> {
        if !cfg.alerts.enabled {
            return Err(NotifyError::AlertsDisabled);
        }

        let cooldown = cfg.alerts.cooldown_duration();
        self.gate.force_expire_all(now, cooldown);

        let alert = Alert::test(AlertKind::SystemCritical, test_alert_message(cfg, sender));
        // Goes through the gate like any alert; the forced expiry lets it pass.
        self.gate.try_acquire(alert.kind, now, cooldown);
        let receipt = self.dispatcher.dispatch(cfg, &alert);
        self.stats.record_alert_pass(1, 0);
        Ok(receipt)
    }
}

/// Body of the simulated alert: CPU at 85%, 7 of 8 GiB memory in use.
pub fn test_alert_message(cfg: &Config, sender: &str) -> String {
    let memory = MemorySample::from_totals(8 * GIB, GIB);
    let t = &cfg.alerts.thresholds;
    format!(
        "TEST ALERT - Simulated high resource usage (initiated by {}):\n\
         • CPU Usage: {:.1}% (threshold: {:.1}%)\n\
         • RAM Usage: {:.1}% (threshold: {:.1}%)\n\
         • Used Memory: {} / {}\n\
         • Available Memory: {}\n\n\
         This is a test alert to verify that your alert system is working correctly.",
        sender,
        TEST_CPU_USAGE * 100.0,
        t.cpu,
        memory.usage_percent,
        t.ram,
        format_bytes(memory.used_bytes),
        format_bytes(memory.total_bytes),
        format_bytes(memory.available_bytes),
    )
}
