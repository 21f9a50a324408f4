//! An in-memory `StorageInterface`, used by the test suite and by
//! deployments with no Postgres configured. Mirrors the teacher's
//! `MockDb` (`storage_impl::mock_db`): `tokio::sync::RwLock`-guarded maps,
//! a linear scan per query, and the same conditional-update semantics a
//! real `UPDATE ... WHERE status = expected` would give.

use std::collections::HashMap;

use async_trait::async_trait;
use common_utils::date_time::Clock;
use common_utils::errors::CustomResult;
use error_stack::{Report, ResultExt};
use hyperswitch_domain_models::api_key::{ApiKey, KeyType};
use hyperswitch_domain_models::charge::Charge;
use hyperswitch_domain_models::enums::{ChargeStatus, IntentStatus};
use hyperswitch_domain_models::errors::StorageError;
use hyperswitch_domain_models::merchant::Merchant;
use hyperswitch_domain_models::payment_intent::PaymentIntent;
use hyperswitch_domain_models::refund::Refund;
use hyperswitch_domain_models::webhook::{Webhook, WebhookDelivery};
use masking::PeekInterface;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{AccessLogEntry, ChargeUpdate, PaymentIntentUpdate, StorageInterface, WebhookDeliveryUpdate};

#[derive(Default)]
pub struct MockDb {
    merchants: RwLock<HashMap<Uuid, Merchant>>,
    api_keys: RwLock<HashMap<Uuid, ApiKey>>,
    payment_intents: RwLock<HashMap<Uuid, PaymentIntent>>,
    charges: RwLock<HashMap<Uuid, Charge>>,
    refunds: RwLock<HashMap<Uuid, Refund>>,
    webhooks: RwLock<HashMap<Uuid, Webhook>>,
    webhook_deliveries: RwLock<HashMap<Uuid, WebhookDelivery>>,
    access_logs: RwLock<Vec<AccessLogEntry>>,
}

impl MockDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test/seed helper: the core never creates merchants (§1 non-goal),
    /// so fixtures insert them directly.
    pub async fn seed_merchant(&self, merchant: Merchant) {
        self.merchants.write().await.insert(merchant.id, merchant);
    }

    pub async fn seed_api_key(&self, key: ApiKey) {
        self.api_keys.write().await.insert(key.id, key);
    }

    pub async fn seed_webhook(&self, webhook: Webhook) {
        self.webhooks.write().await.insert(webhook.id, webhook);
    }

    /// Test-only accessor: inspect a delivery's stored state without going
    /// through the `fetch_pending_webhook_deliveries` filter.
    pub async fn get_webhook_delivery(&self, id: Uuid) -> Option<WebhookDelivery> {
        self.webhook_deliveries.read().await.get(&id).cloned()
    }

    /// Test-only accessor: `access_log` has no read path on `StorageInterface`.
    pub async fn access_log_count(&self) -> usize {
        self.access_logs.read().await.len()
    }
}

#[async_trait]
impl StorageInterface for MockDb {
    async fn find_merchant_by_id(&self, merchant_id: Uuid) -> CustomResult<Merchant, StorageError> {
        self.merchants
            .read()
            .await
            .get(&merchant_id)
            .cloned()
            .ok_or_else(|| Report::new(StorageError::NotFound))
    }

    async fn find_active_api_key(
        &self,
        key_type: KeyType,
        lookup_value: &str,
    ) -> CustomResult<ApiKey, StorageError> {
        self.api_keys
            .read()
            .await
            .values()
            .find(|k| k.key_type == key_type && k.lookup_value.peek() == lookup_value && k.is_active)
            .cloned()
            .ok_or_else(|| Report::new(StorageError::NotFound))
    }

    async fn touch_api_key(&self, id: Uuid, now: OffsetDateTime) -> CustomResult<(), StorageError> {
        if let Some(key) = self.api_keys.write().await.get_mut(&id) {
            key.last_used_at = Some(now);
        }
        Ok(())
    }

    async fn insert_payment_intent(&self, intent: PaymentIntent) -> CustomResult<PaymentIntent, StorageError> {
        self.payment_intents.write().await.insert(intent.id, intent.clone());
        Ok(intent)
    }

    async fn find_payment_intent_by_id(
        &self,
        merchant_id: Uuid,
        id: Uuid,
    ) -> CustomResult<PaymentIntent, StorageError> {
        self.payment_intents
            .read()
            .await
            .get(&id)
            .filter(|i| i.merchant_id == merchant_id)
            .cloned()
            .ok_or_else(|| Report::new(StorageError::NotFound))
    }

    async fn list_payment_intents(
        &self,
        merchant_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> CustomResult<(Vec<PaymentIntent>, i64), StorageError> {
        let guard = self.payment_intents.read().await;
        let mut matching: Vec<PaymentIntent> =
            guard.values().filter(|i| i.merchant_id == merchant_id).cloned().collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn update_payment_intent_conditional(
        &self,
        merchant_id: Uuid,
        id: Uuid,
        expected_status: Option<IntentStatus>,
        update: PaymentIntentUpdate,
    ) -> CustomResult<PaymentIntent, StorageError> {
        let mut guard = self.payment_intents.write().await;
        let intent = guard
            .get_mut(&id)
            .filter(|i| i.merchant_id == merchant_id)
            .ok_or_else(|| Report::new(StorageError::NotFound))?;
        if let Some(expected) = expected_status {
            if intent.status != expected {
                return Err(Report::new(StorageError::PreconditionFailed))
                    .attach_printable("status precondition failed");
            }
        }
        if let Some(status) = update.status {
            intent.status = status;
        }
        if let Some(amount) = update.amount {
            intent.amount = amount;
        }
        if let Some(pm) = update.payment_method {
            intent.payment_method = Some(pm);
        }
        if let Some(routing) = update.acquirer_routing {
            intent.acquirer_routing = routing;
        }
        if let Some(metadata) = update.metadata {
            intent.metadata = metadata;
        }
        if let Some(description) = update.description {
            intent.description = Some(description);
        }
        intent.modified_at = common_utils::date_time::SystemClock.now();
        Ok(intent.clone())
    }

    async fn insert_charge(&self, charge: Charge) -> CustomResult<Charge, StorageError> {
        self.charges.write().await.insert(charge.id, charge.clone());
        Ok(charge)
    }

    async fn find_charge_by_id(&self, merchant_id: Uuid, id: Uuid) -> CustomResult<Charge, StorageError> {
        self.charges
            .read()
            .await
            .get(&id)
            .filter(|c| c.merchant_id == merchant_id)
            .cloned()
            .ok_or_else(|| Report::new(StorageError::NotFound))
    }

    async fn find_charge_by_payment_intent_id(
        &self,
        merchant_id: Uuid,
        payment_intent_id: Uuid,
    ) -> CustomResult<Option<Charge>, StorageError> {
        Ok(self
            .charges
            .read()
            .await
            .values()
            .find(|c| c.merchant_id == merchant_id && c.payment_intent_id == payment_intent_id)
            .cloned())
    }

    async fn update_charge_conditional(
        &self,
        merchant_id: Uuid,
        id: Uuid,
        expected_status: ChargeStatus,
        update: ChargeUpdate,
    ) -> CustomResult<Charge, StorageError> {
        let mut guard = self.charges.write().await;
        let charge = guard
            .get_mut(&id)
            .filter(|c| c.merchant_id == merchant_id)
            .ok_or_else(|| Report::new(StorageError::NotFound))?;
        if charge.status != expected_status {
            return Err(Report::new(StorageError::PreconditionFailed));
        }
        if let Some(status) = update.status {
            charge.status = status;
        }
        if let Some(amount_captured) = update.amount_captured {
            charge.amount_captured = amount_captured;
        }
        if let Some(reference) = update.acquirer_reference {
            charge.acquirer_reference = Some(reference);
        }
        if let Some(code) = update.authorization_code {
            charge.authorization_code = Some(code);
        }
        if let Some(network) = update.network {
            charge.network = Some(network);
        }
        if let Some(response) = update.processor_response {
            charge.processor_response = response;
        }
        charge.modified_at = common_utils::date_time::SystemClock.now();
        Ok(charge.clone())
    }

    async fn atomic_refund_update(
        &self,
        merchant_id: Uuid,
        charge_id: Uuid,
        add_refunded_amount: hyperswitch_domain_models::money::MinorUnit,
    ) -> CustomResult<Charge, StorageError> {
        let mut guard = self.charges.write().await;
        let charge = guard
            .get_mut(&charge_id)
            .filter(|c| c.merchant_id == merchant_id)
            .ok_or_else(|| Report::new(StorageError::NotFound))?;
        let new_refunded = charge
            .amount_refunded
            .checked_add(add_refunded_amount)
            .ok_or_else(|| Report::new(StorageError::DatabaseError("refund amount overflow".to_string())))?;
        if new_refunded.get_amount_as_i64() > charge.amount_captured.get_amount_as_i64() {
            return Err(Report::new(StorageError::PreconditionFailed))
                .attach_printable("refund would exceed amount_captured");
        }
        charge.amount_refunded = new_refunded;
        charge.status = if new_refunded.get_amount_as_i64() == charge.amount_captured.get_amount_as_i64() {
            ChargeStatus::Refunded
        } else {
            ChargeStatus::PartiallyRefunded
        };
        charge.modified_at = common_utils::date_time::SystemClock.now();
        Ok(charge.clone())
    }

    async fn insert_refund(&self, refund: Refund) -> CustomResult<Refund, StorageError> {
        self.refunds.write().await.insert(refund.id, refund.clone());
        Ok(refund)
    }

    async fn find_refund_by_id(&self, merchant_id: Uuid, id: Uuid) -> CustomResult<Refund, StorageError> {
        self.refunds
            .read()
            .await
            .get(&id)
            .filter(|r| r.merchant_id == merchant_id)
            .cloned()
            .ok_or_else(|| Report::new(StorageError::NotFound))
    }

    async fn list_refunds(
        &self,
        merchant_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> CustomResult<(Vec<Refund>, i64), StorageError> {
        let guard = self.refunds.read().await;
        let mut matching: Vec<Refund> =
            guard.values().filter(|r| r.merchant_id == merchant_id).cloned().collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn find_active_webhooks_for_merchant(&self, merchant_id: Uuid) -> CustomResult<Vec<Webhook>, StorageError> {
        Ok(self
            .webhooks
            .read()
            .await
            .values()
            .filter(|w| w.merchant_id == merchant_id && w.is_active)
            .cloned()
            .collect())
    }

    async fn insert_webhook_delivery(
        &self,
        delivery: WebhookDelivery,
    ) -> CustomResult<WebhookDelivery, StorageError> {
        self.webhook_deliveries.write().await.insert(delivery.id, delivery.clone());
        Ok(delivery)
    }

    async fn fetch_pending_webhook_deliveries(
        &self,
        now: OffsetDateTime,
        limit: i64,
    ) -> CustomResult<Vec<WebhookDelivery>, StorageError> {
        let guard = self.webhook_deliveries.read().await;
        let mut pending: Vec<WebhookDelivery> = guard
            .values()
            .filter(|d| !d.delivered && d.next_retry_at <= now)
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.next_retry_at.cmp(&b.next_retry_at));
        pending.truncate(limit.max(0) as usize);
        Ok(pending)
    }

    async fn update_webhook_delivery(
        &self,
        id: Uuid,
        update: WebhookDeliveryUpdate,
    ) -> CustomResult<WebhookDelivery, StorageError> {
        let mut guard = self.webhook_deliveries.write().await;
        let delivery = guard.get_mut(&id).ok_or_else(|| Report::new(StorageError::NotFound))?;
        if let Some(delivered) = update.delivered {
            delivery.delivered = delivered;
        }
        if let Some(delivered_at) = update.delivered_at {
            delivery.delivered_at = Some(delivered_at);
        }
        if let Some(status_code) = update.status_code {
            delivery.status_code = Some(status_code);
        }
        if let Some(response_body) = update.response_body {
            delivery.response_body = Some(response_body);
        }
        if let Some(error) = update.error {
            delivery.error = Some(error);
        }
        if let Some(next_retry_at) = update.next_retry_at {
            delivery.next_retry_at = next_retry_at;
        }
        if let Some(attempt) = update.attempt {
            delivery.attempt = attempt;
        }
        if let Some(status) = update.status {
            delivery.status = status;
        }
        Ok(delivery.clone())
    }

    async fn insert_access_log(&self, entry: AccessLogEntry) -> CustomResult<(), StorageError> {
        self.access_logs.write().await.push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperswitch_domain_models::enums::ConfirmationMethod;
    use hyperswitch_domain_models::money::{Currency, MinorUnit};
    use hyperswitch_domain_models::payment_intent::{AcquirerRouting, PaymentIntentMetadata};

    fn sample_intent(merchant_id: Uuid) -> PaymentIntent {
        let now = common_utils::date_time::SystemClock.now();
        PaymentIntent {
            id: common_utils::ids::new_uuid(),
            merchant_id,
            customer_id: None,
            amount: MinorUnit::new(1000),
            currency: Currency::MXN,
            capture_method: hyperswitch_domain_models::enums::CaptureMethod::Automatic,
            confirmation_method: ConfirmationMethod::Automatic,
            status: IntentStatus::RequiresPaymentMethod,
            payment_method: None,
            acquirer_routing: AcquirerRouting::default(),
            metadata: PaymentIntentMetadata::default(),
            description: None,
            created_at: now,
            modified_at: now,
        }
    }

    #[tokio::test]
    async fn conditional_update_rejects_a_stale_expected_status() {
        let db = MockDb::new();
        let merchant_id = common_utils::ids::new_uuid();
        let intent = sample_intent(merchant_id);
        let id = intent.id;
        db.insert_payment_intent(intent).await.unwrap();

        let result = db
            .update_payment_intent_conditional(
                merchant_id,
                id,
                Some(IntentStatus::Processing),
                PaymentIntentUpdate {
                    status: Some(IntentStatus::Succeeded),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(
            result.unwrap_err().current_context(),
            StorageError::PreconditionFailed
        ));
    }

    #[tokio::test]
    async fn a_merchant_cannot_read_another_merchants_intent() {
        let db = MockDb::new();
        let owner = common_utils::ids::new_uuid();
        let intruder = common_utils::ids::new_uuid();
        let intent = sample_intent(owner);
        let id = intent.id;
        db.insert_payment_intent(intent).await.unwrap();

        let result = db.find_payment_intent_by_id(intruder, id).await;
        assert!(matches!(result.unwrap_err().current_context(), StorageError::NotFound));
    }

    #[tokio::test]
    async fn atomic_refund_update_derives_partially_refunded_then_refunded() {
        let db = MockDb::new();
        let merchant_id = common_utils::ids::new_uuid();
        let charge = Charge {
            id: common_utils::ids::new_uuid(),
            merchant_id,
            payment_intent_id: common_utils::ids::new_uuid(),
            amount_authorized: MinorUnit::new(40000),
            amount_captured: MinorUnit::new(40000),
            amount_refunded: MinorUnit::new(0),
            currency: Currency::MXN,
            status: ChargeStatus::Captured,
            acquirer_name: "mock".to_string(),
            acquirer_reference: None,
            authorization_code: Some("999999".to_string()),
            network: None,
            processor_response: Default::default(),
            created_at: common_utils::date_time::SystemClock.now(),
            modified_at: common_utils::date_time::SystemClock.now(),
        };
        let charge_id = charge.id;
        db.insert_charge(charge).await.unwrap();

        let after_first = db
            .atomic_refund_update(merchant_id, charge_id, MinorUnit::new(15000))
            .await
            .unwrap();
        assert_eq!(after_first.status, ChargeStatus::PartiallyRefunded);

        let after_second = db
            .atomic_refund_update(merchant_id, charge_id, MinorUnit::new(25000))
            .await
            .unwrap();
        assert_eq!(after_second.status, ChargeStatus::Refunded);

        let over_refund = db
            .atomic_refund_update(merchant_id, charge_id, MinorUnit::new(1))
            .await;
        assert!(matches!(
            over_refund.unwrap_err().current_context(),
            StorageError::PreconditionFailed
        ));
    }
}
