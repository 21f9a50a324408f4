//! The webhook dispatcher loop (C11's background half). Drains
//! `WebhookDelivery` rows the orchestrator enqueued, POSTs the signed
//! payload, and reschedules on failure per the backoff table. Mirrors the
//! teacher's `scheduler` crate in spirit — a standalone binary-backing
//! library driven by `router`'s `bin/scheduler.rs` — but the only job left
//! in this scope is webhook delivery, not the teacher's generic process
//! tracker/producer-consumer queue.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use common_utils::crypto::hmac_sha256_hex;
use error_stack::ResultExt;
use hyperswitch_domain_models::errors::StorageError;
use hyperswitch_domain_models::webhook::WebhookDelivery;
use masking::PeekInterface;
use storage_impl::{StorageInterface, WebhookDeliveryUpdate};
use time::OffsetDateTime;

/// At most this many pending deliveries are claimed per dispatch pass
/// (§4.11's "small batches (≤50)").
pub const DISPATCH_BATCH_SIZE: i64 = 50;

/// Per-attempt HTTP timeout for a webhook POST (§5).
pub const DELIVERY_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Response bodies are stored truncated so a chatty endpoint can't bloat
/// the `webhook_deliveries` table (SPEC_FULL §3's supplemented bound).
const RESPONSE_BODY_TRUNCATE_BYTES: usize = 2048;

pub struct WebhookDispatcher {
    storage: Arc<dyn StorageInterface>,
    http: reqwest::Client,
}

impl WebhookDispatcher {
    pub fn new(storage: Arc<dyn StorageInterface>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()
            .expect("reqwest client with a fixed timeout always builds");
        Self { storage, http }
    }

    /// Runs dispatch passes on `poll_interval` until `shutdown` resolves.
    pub async fn run(&self, poll_interval: StdDuration, mut shutdown: tokio::sync::oneshot::Receiver<()>) {
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    router_env::logger::info!("webhook dispatcher shutting down");
                    return;
                }
                _ = tokio::time::sleep(poll_interval) => {
                    if let Err(error) = self.dispatch_once().await {
                        router_env::logger::warn!(?error, "webhook dispatch pass failed");
                    }
                }
            }
        }
    }

    /// Claims one batch of due deliveries and attempts each. Returns how
    /// many deliveries were processed (delivered or rescheduled).
    pub async fn dispatch_once(&self) -> error_stack::Result<usize, StorageError> {
        let now = OffsetDateTime::now_utc();
        let pending = self
            .storage
            .fetch_pending_webhook_deliveries(now, DISPATCH_BATCH_SIZE)
            .await
            .attach_printable("failed to fetch pending webhook deliveries")?;
        for delivery in &pending {
            self.attempt_delivery(delivery, now).await;
        }
        Ok(pending.len())
    }

    async fn attempt_delivery(&self, delivery: &WebhookDelivery, now: OffsetDateTime) {
        let secret = match self.resolve_secret(delivery).await {
            Some(secret) => secret,
            None => {
                // The subscribing webhook was deleted after the delivery was
                // enqueued; nothing to sign against, so the delivery can
                // never succeed. Mark it exhausted rather than retry forever.
                router_env::logger::warn!(
                    delivery_id = %delivery.id,
                    "no active webhook left to source a signing secret, abandoning delivery"
                );
                let _ = self
                    .storage
                    .update_webhook_delivery(
                        delivery.id,
                        WebhookDeliveryUpdate {
                            error: Some("subscribing webhook no longer active".to_string()),
                            attempt: Some(delivery.max_attempts),
                            ..Default::default()
                        },
                    )
                    .await;
                return;
            }
        };

        let body = serde_json::to_vec(&delivery.payload).unwrap_or_default();
        let timestamp = now.unix_timestamp();
        let signature = hmac_sha256_hex(secret.peek().as_bytes(), format!("{timestamp}.{}", String::from_utf8_lossy(&body)).as_bytes());

        let response = self
            .http
            .post(&delivery.endpoint_url)
            .header("Content-Type", "application/json")
            .header("X-Webhook-Event", &delivery.event_type)
            .header("X-Webhook-Id", delivery.event_id.to_string())
            .header("X-Webhook-Timestamp", timestamp.to_string())
            .header("X-Webhook-Signature", format!("t={timestamp}, v1={signature}"))
            .body(body)
            .send()
            .await;

        let update = match response {
            Ok(response) if response.status().is_success() => {
                WebhookDeliveryUpdate {
                    delivered: Some(true),
                    delivered_at: Some(now),
                    status_code: Some(response.status().as_u16()),
                    status: Some(hyperswitch_domain_models::enums::WebhookDeliveryStatus::Delivered),
                    ..Default::default()
                }
            }
            Ok(response) => {
                let status_code = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                self.reschedule(delivery, now, Some(status_code), None, truncate(&body))
            }
            Err(error) => self.reschedule(delivery, now, None, Some(error.to_string()), None),
        };

        router_env::metrics::WEBHOOK_DELIVERY_ATTEMPT_COUNT.add(1);
        if let Err(error) = self.storage.update_webhook_delivery(delivery.id, update).await {
            router_env::logger::warn!(?error, delivery_id = %delivery.id, "failed to persist webhook delivery outcome");
        }
    }

    fn reschedule(
        &self,
        delivery: &WebhookDelivery,
        now: OffsetDateTime,
        status_code: Option<u16>,
        error: Option<String>,
        response_body: Option<String>,
    ) -> WebhookDeliveryUpdate {
        let next_attempt = delivery.attempt + 1;
        let exhausted = WebhookDelivery { attempt: next_attempt, ..delivery.clone() }.is_exhausted();
        WebhookDeliveryUpdate {
            attempt: Some(next_attempt),
            status_code,
            error,
            response_body,
            next_retry_at: Some(now + WebhookDelivery::backoff_for_attempt(delivery.attempt)),
            status: Some(if exhausted {
                hyperswitch_domain_models::enums::WebhookDeliveryStatus::Failed
            } else {
                hyperswitch_domain_models::enums::WebhookDeliveryStatus::Pending
            }),
            ..Default::default()
        }
    }

    async fn resolve_secret(&self, delivery: &WebhookDelivery) -> Option<masking::Secret<String>> {
        let webhooks = self
            .storage
            .find_active_webhooks_for_merchant(delivery.merchant_id)
            .await
            .ok()?;
        webhooks
            .into_iter()
            .find(|hook| hook.url == delivery.endpoint_url)
            .map(|hook| hook.secret)
    }
}

fn truncate(body: &str) -> Option<String> {
    if body.len() <= RESPONSE_BODY_TRUNCATE_BYTES {
        return Some(body.to_string());
    }
    let mut end = RESPONSE_BODY_TRUNCATE_BYTES;
    while end > 0 && !body.is_char_boundary(end) {
        end -= 1;
    }
    Some(body[..end].to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hyperswitch_domain_models::enums::WebhookDeliveryStatus;
    use hyperswitch_domain_models::webhook::{Webhook, WebhookDelivery};
    use masking::Secret;
    use storage_impl::mock_db::MockDb;
    use uuid::Uuid;
    use wiremock::matchers::{header_exists, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn delivery(merchant_id: Uuid, endpoint_url: String) -> WebhookDelivery {
        let now = OffsetDateTime::now_utc();
        WebhookDelivery {
            id: Uuid::new_v4(),
            merchant_id,
            event_type: "payment_intent.succeeded".to_string(),
            event_id: Uuid::new_v4(),
            endpoint_url,
            payload: serde_json::json!({"type": "payment_intent.succeeded"}),
            attempt: 1,
            max_attempts: WebhookDelivery::DEFAULT_MAX_ATTEMPTS,
            status_code: None,
            response_body: None,
            error: None,
            next_retry_at: now,
            delivered: false,
            delivered_at: None,
            status: WebhookDeliveryStatus::Pending,
        }
    }

    #[tokio::test]
    async fn a_successful_post_marks_the_delivery_delivered() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header_exists("X-Webhook-Signature"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let mock_db = Arc::new(MockDb::new());
        let merchant_id = Uuid::new_v4();
        mock_db
            .seed_merchant(hyperswitch_domain_models::merchant::Merchant {
                id: merchant_id,
                routing_config: hyperswitch_domain_models::merchant::RoutingConfig::default(),
            })
            .await;
        mock_db
            .seed_webhook(Webhook {
                id: Uuid::new_v4(),
                merchant_id,
                url: server.uri(),
                secret: Secret::new("whsec_test".to_string()),
                events: vec!["*".to_string()],
                is_active: true,
                created_at: OffsetDateTime::now_utc(),
            })
            .await;
        let inserted = mock_db
            .insert_webhook_delivery(delivery(merchant_id, server.uri()))
            .await
            .unwrap();

        let dispatcher = WebhookDispatcher::new(mock_db.clone());
        let processed = dispatcher.dispatch_once().await.unwrap();
        assert_eq!(processed, 1);

        let stored = mock_db.get_webhook_delivery(inserted.id).await.unwrap();
        assert!(stored.delivered);
        assert_eq!(stored.status, WebhookDeliveryStatus::Delivered);
    }

    #[test]
    fn truncate_never_splits_a_multi_byte_character() {
        // One ASCII byte then 3-byte `€` characters puts the 2048-byte cut
        // point one byte into a character, so a naive byte slice would panic.
        let mut body = String::from("x");
        body.extend(std::iter::repeat('€').take(RESPONSE_BODY_TRUNCATE_BYTES));
        assert!(body.len() > RESPONSE_BODY_TRUNCATE_BYTES);
        let truncated = truncate(&body).unwrap();
        assert!(truncated.len() <= RESPONSE_BODY_TRUNCATE_BYTES);
        assert!(body.starts_with(&truncated));
    }

    #[test]
    fn truncate_leaves_a_short_body_untouched() {
        let truncated = truncate("short body").unwrap();
        assert_eq!(truncated, "short body");
    }

    #[tokio::test]
    async fn a_non_2xx_response_reschedules_with_backoff() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mock_db = Arc::new(MockDb::new());
        let merchant_id = Uuid::new_v4();
        mock_db
            .seed_merchant(hyperswitch_domain_models::merchant::Merchant {
                id: merchant_id,
                routing_config: hyperswitch_domain_models::merchant::RoutingConfig::default(),
            })
            .await;
        mock_db
            .seed_webhook(Webhook {
                id: Uuid::new_v4(),
                merchant_id,
                url: server.uri(),
                secret: Secret::new("whsec_test".to_string()),
                events: vec!["*".to_string()],
                is_active: true,
                created_at: OffsetDateTime::now_utc(),
            })
            .await;
        let inserted = mock_db
            .insert_webhook_delivery(delivery(merchant_id, server.uri()))
            .await
            .unwrap();

        let dispatcher = WebhookDispatcher::new(mock_db.clone());
        dispatcher.dispatch_once().await.unwrap();

        let stored = mock_db.get_webhook_delivery(inserted.id).await.unwrap();
        assert!(!stored.delivered);
        assert_eq!(stored.attempt, 2);
        assert_eq!(stored.status_code, Some(500));
        assert!(stored.next_retry_at > OffsetDateTime::now_utc());
    }
}
