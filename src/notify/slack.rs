//! Slack incoming-webhook payload.

use crate::alert::Alert;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

pub fn alert_payload(alert: &Alert, now: DateTime<Utc>) -> Value {
    json!({
        "text": format!("{} *{}*", alert.kind.emoji(), alert.kind.display_name()),
        "attachments": [{
            "color": alert.kind.severity().slack_color(),
            "fields": [{
                "title": "Details",
                "value": alert.message,
                "short": false
            }],
            "footer": "Proxy Usage Monitor",
            "ts": now.timestamp()
        }]
    })
}
