//! Outbound webhook delivery.

use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Per-request timeout for every webhook channel.
pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!(
    "proxy-usage-monitor/",
    env!("CARGO_PKG_VERSION"),
    " (System Monitor)"
);

/// Result of one webhook delivery. Only ever logged; never propagated to
/// the sampling path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Delivered(u16),
    Timeout,
    /// Status >= 400 with the response body.
    HttpError(u16, String),
    NetworkError(String),
}

impl WebhookOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, WebhookOutcome::Delivered(_))
    }
}

impl fmt::Display for WebhookOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebhookOutcome::Delivered(status) => write!(f, "delivered ({})", status),
            WebhookOutcome::Timeout => write!(f, "timed out - network may be slow"),
            WebhookOutcome::HttpError(status, body) => {
                write!(f, "returned error status: {} - {}", status, body)
            }
            WebhookOutcome::NetworkError(msg) => write!(f, "network error: {}", msg),
        }
    }
}

/// Shared HTTP client for webhook channels. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: reqwest::Client,
}

impl WebhookClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(WEBHOOK_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// POSTs `payload` as JSON and classifies the result.
    pub async fn post_json(&self, url: &str, payload: &Value) -> WebhookOutcome {
        let response = match self.client.post(url).json(payload).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return WebhookOutcome::Timeout,
            Err(e) => return WebhookOutcome::NetworkError(e.to_string()),
        };

        let status = response.status();
        if status.as_u16() >= 400 {
            let body = response.text().await.unwrap_or_default();
            return WebhookOutcome::HttpError(status.as_u16(), body);
        }

        debug!("Webhook POST to {} returned {}", redact(url), status);
        WebhookOutcome::Delivered(status.as_u16())
    }
}

/// Strips the path of a webhook URL, which carries its secret token.
pub fn redact(url: &str) -> String {
    match url.find("://") {
        Some(scheme_end) => {
            let rest = &url[scheme_end + 3..];
            let host = rest.split('/').next().unwrap_or(rest);
            format!("{}://{}/...", &url[..scheme_end], host)
        }
        None => "<invalid url>".to_string(),
    }
}
