//! `EmitEvent` (§4.11 steps 1-5), the orchestrator's synchronous half:
//! mint an event, fan it out to every subscribing webhook as a pending
//! delivery row. The background half — signing, POSTing, retrying — is
//! the dispatcher in the `scheduler` crate.

use common_utils::date_time::Clock;
use hyperswitch_domain_models::enums::WebhookDeliveryStatus;
use hyperswitch_domain_models::webhook::{EventData, EventEnvelope, WebhookDelivery};
use storage_impl::StorageInterface;
use uuid::Uuid;

/// Never fails the caller: a broken webhook fetch or insert is logged and
/// swallowed, per §4.11 "event emission failures must never roll back the
/// originating transaction."
pub async fn emit_event(
    store: &dyn StorageInterface,
    clock: &dyn Clock,
    merchant_id: Uuid,
    event_type: &str,
    object: serde_json::Value,
) {
    let webhooks = match store.find_active_webhooks_for_merchant(merchant_id).await {
        Ok(webhooks) => webhooks,
        Err(error) => {
            router_env::logger::warn!(
                error = ?error,
                merchant_id = %merchant_id,
                event_type,
                "failed to load webhooks while emitting an event"
            );
            return;
        }
    };

    let event_id = common_utils::ids::new_uuid();
    let now = clock.now();
    let envelope = EventEnvelope {
        id: event_id,
        r#type: event_type.to_string(),
        created: clock.unix_timestamp(),
        data: EventData { object },
    };
    let payload = serde_json::to_value(&envelope).unwrap_or_else(|_| serde_json::json!({"id": event_id, "type": event_type}));

    for webhook in webhooks.iter().filter(|webhook| webhook.subscribes_to(event_type)) {
        let delivery = WebhookDelivery {
            id: common_utils::ids::new_uuid(),
            merchant_id,
            event_type: event_type.to_string(),
            event_id,
            endpoint_url: webhook.url.clone(),
            payload: payload.clone(),
            attempt: 1,
            max_attempts: WebhookDelivery::DEFAULT_MAX_ATTEMPTS,
            status_code: None,
            response_body: None,
            error: None,
            next_retry_at: now,
            delivered: false,
            delivered_at: None,
            status: WebhookDeliveryStatus::Pending,
        };
        if let Err(error) = store.insert_webhook_delivery(delivery).await {
            router_env::logger::warn!(
                error = ?error,
                merchant_id = %merchant_id,
                webhook_id = %webhook.id,
                "failed to record a webhook delivery"
            );
        }
    }
}
