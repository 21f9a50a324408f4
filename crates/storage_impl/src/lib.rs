//! The repository port (§4.1): typed, merchant-scoped CRUD behind one
//! `StorageInterface` trait object, exactly as the teacher's
//! `db::StorageInterface` unifies its Postgres and mock backends.
//!
//! Every query that can be merchant-scoped is; a fetch that misses the
//! merchant filter returns `StorageError::NotFound` rather than another
//! merchant's row. State transitions go through the `*_conditional`
//! methods, which translate to `UPDATE ... WHERE status = expected` and
//! return `StorageError::PreconditionFailed` on a zero-row result — the
//! "no per-intent mutex" design (§9).

pub mod mock_db;
#[cfg(feature = "postgres")]
pub mod postgres_db;
pub mod updates;

use async_trait::async_trait;
use common_utils::errors::CustomResult;
use hyperswitch_domain_models::api_key::{ApiKey, KeyType};
use hyperswitch_domain_models::charge::Charge;
use hyperswitch_domain_models::enums::IntentStatus;
use hyperswitch_domain_models::errors::StorageError;
use hyperswitch_domain_models::merchant::Merchant;
use hyperswitch_domain_models::payment_intent::PaymentIntent;
use hyperswitch_domain_models::refund::Refund;
use hyperswitch_domain_models::webhook::{Webhook, WebhookDelivery};
use time::OffsetDateTime;
use uuid::Uuid;

pub use updates::{ChargeUpdate, PaymentIntentUpdate, WebhookDeliveryUpdate};

/// A single best-effort access-log row (§4.9 step 7, supplemented).
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    pub request_id: String,
    pub merchant_id: Option<Uuid>,
    pub route: String,
    pub method: String,
    pub status: u16,
    pub duration_ms: u64,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub idempotency_key: Option<String>,
    pub created_at: OffsetDateTime,
}

#[async_trait]
pub trait StorageInterface: Send + Sync {
    async fn find_merchant_by_id(&self, merchant_id: Uuid) -> CustomResult<Merchant, StorageError>;

    async fn find_active_api_key(
        &self,
        key_type: KeyType,
        lookup_value: &str,
    ) -> CustomResult<ApiKey, StorageError>;

    /// Fire-and-forget: callers must not fail the request on error.
    async fn touch_api_key(&self, id: Uuid, now: OffsetDateTime) -> CustomResult<(), StorageError>;

    async fn insert_payment_intent(&self, intent: PaymentIntent) -> CustomResult<PaymentIntent, StorageError>;

    async fn find_payment_intent_by_id(
        &self,
        merchant_id: Uuid,
        id: Uuid,
    ) -> CustomResult<PaymentIntent, StorageError>;

    async fn list_payment_intents(
        &self,
        merchant_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> CustomResult<(Vec<PaymentIntent>, i64), StorageError>;

    /// Conditional update: succeeds only if the stored row's status is
    /// still `expected_status` (or `expected_status` is `None` to skip
    /// the check, for field-only patches like `PATCH`).
    async fn update_payment_intent_conditional(
        &self,
        merchant_id: Uuid,
        id: Uuid,
        expected_status: Option<IntentStatus>,
        update: PaymentIntentUpdate,
    ) -> CustomResult<PaymentIntent, StorageError>;

    async fn insert_charge(&self, charge: Charge) -> CustomResult<Charge, StorageError>;

    async fn find_charge_by_id(&self, merchant_id: Uuid, id: Uuid) -> CustomResult<Charge, StorageError>;

    async fn find_charge_by_payment_intent_id(
        &self,
        merchant_id: Uuid,
        payment_intent_id: Uuid,
    ) -> CustomResult<Option<Charge>, StorageError>;

    async fn update_charge_conditional(
        &self,
        merchant_id: Uuid,
        id: Uuid,
        expected_status: hyperswitch_domain_models::enums::ChargeStatus,
        update: ChargeUpdate,
    ) -> CustomResult<Charge, StorageError>;

    /// §4.1's `AtomicRefundUpdate`: compare-and-set that derives the new
    /// `status` from `amount_refunded` vs `amount_captured`.
    async fn atomic_refund_update(
        &self,
        merchant_id: Uuid,
        charge_id: Uuid,
        add_refunded_amount: hyperswitch_domain_models::money::MinorUnit,
    ) -> CustomResult<Charge, StorageError>;

    async fn insert_refund(&self, refund: Refund) -> CustomResult<Refund, StorageError>;

    async fn find_refund_by_id(&self, merchant_id: Uuid, id: Uuid) -> CustomResult<Refund, StorageError>;

    async fn list_refunds(
        &self,
        merchant_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> CustomResult<(Vec<Refund>, i64), StorageError>;

    async fn find_active_webhooks_for_merchant(
        &self,
        merchant_id: Uuid,
    ) -> CustomResult<Vec<Webhook>, StorageError>;

    async fn insert_webhook_delivery(
        &self,
        delivery: WebhookDelivery,
    ) -> CustomResult<WebhookDelivery, StorageError>;

    /// `delivered=false AND next_retry_at<=now`, at most `limit` rows
    /// (§4.11's dispatcher batch size).
    async fn fetch_pending_webhook_deliveries(
        &self,
        now: OffsetDateTime,
        limit: i64,
    ) -> CustomResult<Vec<WebhookDelivery>, StorageError>;

    async fn update_webhook_delivery(
        &self,
        id: Uuid,
        update: WebhookDeliveryUpdate,
    ) -> CustomResult<WebhookDelivery, StorageError>;

    async fn insert_access_log(&self, entry: AccessLogEntry) -> CustomResult<(), StorageError>;
}
