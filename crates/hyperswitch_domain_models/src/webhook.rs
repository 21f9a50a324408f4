//! `Webhook` and `WebhookDelivery` (§3), plus the canonical event envelope
//! `EmitEvent` (§4.11) builds and the dispatcher ships.

use masking::Secret;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::enums::WebhookDeliveryStatus;

/// A merchant's registered destination endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webhook {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub url: String,
    pub secret: Secret<String>,
    /// Event-type strings this endpoint subscribes to, or `["*"]` for all.
    pub events: Vec<String>,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
}

impl Webhook {
    pub fn subscribes_to(&self, event_type: &str) -> bool {
        self.events.iter().any(|e| e == "*" || e == event_type)
    }
}

/// A single delivery attempt record (§3, §4.11). No foreign key to
/// `Webhook`: a webhook may be deleted while deliveries remain in-flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDelivery {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub event_type: String,
    pub event_id: Uuid,
    pub endpoint_url: String,
    pub payload: serde_json::Value,
    pub attempt: u32,
    pub max_attempts: u32,
    pub status_code: Option<u16>,
    pub response_body: Option<String>,
    pub error: Option<String>,
    pub next_retry_at: OffsetDateTime,
    pub delivered: bool,
    pub delivered_at: Option<OffsetDateTime>,
    pub status: WebhookDeliveryStatus,
}

impl WebhookDelivery {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// The backoff schedule named in §4.11: 30s, 5m, 30m for attempts
    /// 1, 2, 3. Anything past the table falls back to the last entry.
    pub fn backoff_for_attempt(attempt: u32) -> time::Duration {
        match attempt {
            1 => time::Duration::seconds(30),
            2 => time::Duration::minutes(5),
            _ => time::Duration::minutes(30),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }
}

/// `{id, type, created, data:{object}}` — the payload both the webhook
/// dispatcher signs and the merchant's endpoint receives (§4.11 step 2).
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    pub id: Uuid,
    pub r#type: String,
    pub created: i64,
    pub data: EventData,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn webhook(events: &[&str]) -> Webhook {
        Webhook {
            id: Uuid::nil(),
            merchant_id: Uuid::nil(),
            url: "https://example.com/hook".to_string(),
            secret: Secret::new("whsec".to_string()),
            events: events.iter().map(|s| s.to_string()).collect(),
            is_active: true,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn wildcard_subscription_matches_any_event() {
        assert!(webhook(&["*"]).subscribes_to("payment_intent.succeeded"));
    }

    #[test]
    fn specific_subscription_only_matches_its_own_events() {
        let hook = webhook(&["payment_intent.succeeded"]);
        assert!(hook.subscribes_to("payment_intent.succeeded"));
        assert!(!hook.subscribes_to("refund.failed"));
    }

    #[test]
    fn backoff_schedule_matches_the_three_named_steps() {
        assert_eq!(WebhookDelivery::backoff_for_attempt(1), time::Duration::seconds(30));
        assert_eq!(WebhookDelivery::backoff_for_attempt(2), time::Duration::minutes(5));
        assert_eq!(WebhookDelivery::backoff_for_attempt(3), time::Duration::minutes(30));
    }
}
