//! Notification fan-out.
//!
//! The [`Dispatcher`] sends one alert to every enabled channel. Console and
//! file channels run inline on the caller and swallow their own failures.
//! Webhook channels (Discord, Slack) are spawned as independent tokio tasks;
//! their [`WebhookOutcome`] is logged and counted, and handed back in a
//! [`DispatchReceipt`] for callers that want to wait, such as the
//! `test alert` command. The sampling tick never waits on them.

pub mod discord;
pub mod file;
pub mod slack;
pub mod webhook;

pub use discord::StatusReport;
pub use webhook::{WebhookClient, WebhookOutcome, WEBHOOK_TIMEOUT};

use crate::alert::Alert;
use crate::config::Config;
use crate::error::NotifyError;
use crate::pipeline_stats::PipelineStats;
use chrono::{Local, Utc};
use serde_json::Value;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Webhook tasks started by one dispatch.
#[derive(Debug, Default)]
pub struct DispatchReceipt {
    pub webhook_tasks: Vec<JoinHandle<WebhookOutcome>>,
}

impl DispatchReceipt {
    /// Waits for every webhook task. A task that panicked is reported as a
    /// network error.
    pub async fn wait(self) -> Vec<WebhookOutcome> {
        let mut outcomes = Vec::with_capacity(self.webhook_tasks.len());
        for task in self.webhook_tasks {
            outcomes.push(match task.await {
                Ok(outcome) => outcome,
                Err(e) => WebhookOutcome::NetworkError(format!("webhook task failed: {}", e)),
            });
        }
        outcomes
    }
}

/// Sends alerts, status reports and test messages.
pub struct Dispatcher {
    webhooks: WebhookClient,
    stats: Arc<PipelineStats>,
}

impl Dispatcher {
    pub fn new(webhooks: WebhookClient, stats: Arc<PipelineStats>) -> Self {
        Self { webhooks, stats }
    }

    /// Fans `alert` out to the channels enabled in `cfg.alerts`.
    pub fn dispatch(&self, cfg: &Config, alert: &Alert) -> DispatchReceipt {
        let alerts = &cfg.alerts;

        if alerts.console {
            warn!("🚨 PERFORMANCE ALERT: {}", alert.message);
        }

        if alerts.log_to_file {
            let path = cfg.logs_dir().join(file::ALERT_LOG_FILENAME);
            let line = file::format_alert_line(alert, Local::now(), &cfg.logging.date_format);
            if let Err(e) = file::append_line(&path, &line) {
                warn!("Failed to write alert to {}: {}", path.display(), e);
                self.stats.record_log_write_failure();
            }
        }

        let mut receipt = DispatchReceipt::default();
        let now = Utc::now();

        if alerts.discord.enabled && !alerts.discord.webhook_url.is_empty() {
            let payload = discord::alert_payload(alert, &cfg.proxy.name, now);
            receipt
                .webhook_tasks
                .extend(self.spawn_webhook("Discord", &alerts.discord.webhook_url, payload));
        }

        if alerts.slack.enabled && !alerts.slack.webhook_url.is_empty() {
            let payload = slack::alert_payload(alert, now);
            receipt
                .webhook_tasks
                .extend(self.spawn_webhook("Slack", &alerts.slack.webhook_url, payload));
        }

        receipt
    }

    /// Sends the periodic status report to Discord. Returns None when
    /// Discord is not configured.
    pub fn send_status_report(
        &self,
        cfg: &Config,
        report: &StatusReport,
    ) -> Option<JoinHandle<WebhookOutcome>> {
        let discord = &cfg.alerts.discord;
        if !discord.enabled || discord.webhook_url.is_empty() {
            debug!("Status report skipped: Discord webhook not configured");
            return None;
        }
        let payload = discord::status_report_payload(report, Utc::now());
        self.spawn_webhook("Discord status report", &discord.webhook_url, payload)
    }

    /// Sends the Discord test embed and waits for the outcome.
    pub async fn send_test_webhook(
        &self,
        cfg: &Config,
        sender: &str,
    ) -> Result<WebhookOutcome, NotifyError> {
        let discord = &cfg.alerts.discord;
        if !discord.enabled {
            return Err(NotifyError::ChannelDisabled("Discord"));
        }
        if discord.webhook_url.is_empty() {
            return Err(NotifyError::MissingUrl("Discord"));
        }

        let payload = discord::test_payload(sender, &cfg.proxy.name, Utc::now());
        let outcome = self.webhooks.post_json(&discord.webhook_url, &payload).await;
        record_outcome(&self.stats, "Discord test", &outcome);

        if outcome.is_delivered() {
            Ok(outcome)
        } else {
            Err(NotifyError::Delivery(outcome.to_string()))
        }
    }

    fn spawn_webhook(
        &self,
        channel: &'static str,
        url: &str,
        payload: Value,
    ) -> Option<JoinHandle<WebhookOutcome>> {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("No async runtime available, {} webhook not sent", channel);
                return None;
            }
        };

        let client = self.webhooks.clone();
        let stats = Arc::clone(&self.stats);
        let url = url.to_string();
        Some(handle.spawn(async move {
            let outcome = client.post_json(&url, &payload).await;
            record_outcome(&stats, channel, &outcome);
            outcome
        }))
    }
}

fn record_outcome(stats: &PipelineStats, channel: &str, outcome: &WebhookOutcome) {
    if outcome.is_delivered() {
        debug!("{} webhook sent successfully", channel);
    } else {
        warn!("{} webhook {}", channel, outcome);
    }
    stats.record_webhook(outcome.is_delivered());
}
