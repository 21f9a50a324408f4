//! The Postgres-backed `StorageInterface`, run through
//! `async-bb8-diesel` so a synchronous `diesel::PgConnection` executes off
//! the async runtime's blocking pool exactly as the teacher's `db` crate
//! wires up `bb8`/`diesel`.

use async_bb8_diesel::AsyncRunQueryDsl;
use async_trait::async_trait;
use common_utils::errors::CustomResult;
use diesel::prelude::*;
use error_stack::{Report, ResultExt};
use hyperswitch_domain_models::api_key::{ApiKey, KeyType};
use hyperswitch_domain_models::charge::Charge;
use hyperswitch_domain_models::enums::{ChargeStatus, IntentStatus};
use hyperswitch_domain_models::errors::StorageError;
use hyperswitch_domain_models::merchant::Merchant;
use hyperswitch_domain_models::payment_intent::PaymentIntent;
use hyperswitch_domain_models::refund::Refund;
use hyperswitch_domain_models::webhook::{Webhook, WebhookDelivery};
use time::OffsetDateTime;
use uuid::Uuid;

use super::models::{
    ApiKeyRow, ChargeRow, MerchantRow, PaymentIntentRow, RefundRow, WebhookDeliveryRow, WebhookRow,
};
use super::schema::{api_keys, charges, merchants, payment_intents, refunds, webhook_deliveries, webhooks};
use crate::{AccessLogEntry, ChargeUpdate, PaymentIntentUpdate, StorageInterface, WebhookDeliveryUpdate};

pub type PgPool = bb8::Pool<async_bb8_diesel::ConnectionManager<diesel::PgConnection>>;

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> CustomResult<async_bb8_diesel::Connection<diesel::PgConnection>, StorageError> {
        self.pool
            .get_owned()
            .await
            .change_context(StorageError::DatabaseError("failed to acquire a pool connection".to_string()))
    }
}

fn map_diesel_error(err: diesel::result::Error) -> Report<StorageError> {
    match err {
        diesel::result::Error::NotFound => Report::new(StorageError::NotFound),
        diesel::result::Error::DatabaseError(diesel::result::DatabaseErrorKind::UniqueViolation, _) => {
            Report::new(StorageError::UniqueViolation)
        }
        other => Report::new(StorageError::DatabaseError(other.to_string())),
    }
}

#[async_trait]
impl StorageInterface for PostgresStore {
    async fn find_merchant_by_id(&self, merchant_id: Uuid) -> CustomResult<Merchant, StorageError> {
        let conn = self.conn().await?;
        let row: MerchantRow = merchants::table
            .filter(merchants::id.eq(merchant_id))
            .first_async(&conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(row.into())
    }

    async fn find_active_api_key(
        &self,
        key_type: KeyType,
        lookup_value: &str,
    ) -> CustomResult<ApiKey, StorageError> {
        let conn = self.conn().await?;
        let key_type_str = match key_type {
            KeyType::Public => "public",
            KeyType::Secret => "secret",
        };
        let row: ApiKeyRow = api_keys::table
            .filter(api_keys::key_type.eq(key_type_str))
            .filter(api_keys::lookup_value.eq(lookup_value))
            .filter(api_keys::is_active.eq(true))
            .first_async(&conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(row.into())
    }

    async fn touch_api_key(&self, id: Uuid, now: OffsetDateTime) -> CustomResult<(), StorageError> {
        let conn = self.conn().await?;
        diesel::update(api_keys::table.filter(api_keys::id.eq(id)))
            .set(api_keys::last_used_at.eq(now))
            .execute_async(&conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn insert_payment_intent(&self, intent: PaymentIntent) -> CustomResult<PaymentIntent, StorageError> {
        let conn = self.conn().await?;
        let row: PaymentIntentRow = diesel::insert_into(payment_intents::table)
            .values(PaymentIntentRow::from(intent))
            .get_result_async(&conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(row.into())
    }

    async fn find_payment_intent_by_id(
        &self,
        merchant_id: Uuid,
        id: Uuid,
    ) -> CustomResult<PaymentIntent, StorageError> {
        let conn = self.conn().await?;
        let row: PaymentIntentRow = payment_intents::table
            .filter(payment_intents::id.eq(id))
            .filter(payment_intents::merchant_id.eq(merchant_id))
            .first_async(&conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(row.into())
    }

    async fn list_payment_intents(
        &self,
        merchant_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> CustomResult<(Vec<PaymentIntent>, i64), StorageError> {
        let conn = self.conn().await?;
        let total: i64 = payment_intents::table
            .filter(payment_intents::merchant_id.eq(merchant_id))
            .count()
            .get_result_async(&conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<PaymentIntentRow> = payment_intents::table
            .filter(payment_intents::merchant_id.eq(merchant_id))
            .order(payment_intents::created_at.desc())
            .limit(limit)
            .offset(offset)
            .load_async(&conn)
            .await
            .map_err(map_diesel_error)?;
        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// `UPDATE payment_intents SET ... WHERE id = ? AND merchant_id = ?
    /// AND status = ?` — a zero-row result means another writer already
    /// moved the intent, mapped to `PreconditionFailed` (§9).
    async fn update_payment_intent_conditional(
        &self,
        merchant_id: Uuid,
        id: Uuid,
        expected_status: Option<IntentStatus>,
        update: PaymentIntentUpdate,
    ) -> CustomResult<PaymentIntent, StorageError> {
        let conn = self.conn().await?;
        let current: PaymentIntentRow = payment_intents::table
            .filter(payment_intents::id.eq(id))
            .filter(payment_intents::merchant_id.eq(merchant_id))
            .first_async(&conn)
            .await
            .map_err(map_diesel_error)?;
        let mut next: PaymentIntent = current.into();
        if let Some(expected) = expected_status {
            if next.status != expected {
                return Err(Report::new(StorageError::PreconditionFailed));
            }
        }
        if let Some(status) = update.status {
            next.status = status;
        }
        if let Some(amount) = update.amount {
            next.amount = amount;
        }
        if let Some(pm) = update.payment_method {
            next.payment_method = Some(pm);
        }
        if let Some(routing) = update.acquirer_routing {
            next.acquirer_routing = routing;
        }
        if let Some(metadata) = update.metadata {
            next.metadata = metadata;
        }
        if let Some(description) = update.description {
            next.description = Some(description);
        }
        next.modified_at = OffsetDateTime::now_utc();

        let affected = match expected_status {
            Some(expected) => {
                diesel::update(
                    payment_intents::table
                        .filter(payment_intents::id.eq(id))
                        .filter(payment_intents::merchant_id.eq(merchant_id))
                        .filter(payment_intents::status.eq(expected.to_string())),
                )
                .set(PaymentIntentRow::from(next.clone()))
                .execute_async(&conn)
                .await
                .map_err(map_diesel_error)?
            }
            None => diesel::update(
                payment_intents::table
                    .filter(payment_intents::id.eq(id))
                    .filter(payment_intents::merchant_id.eq(merchant_id)),
            )
            .set(PaymentIntentRow::from(next.clone()))
            .execute_async(&conn)
            .await
            .map_err(map_diesel_error)?,
        };
        if affected == 0 {
            return Err(Report::new(StorageError::PreconditionFailed));
        }
        Ok(next)
    }

    async fn insert_charge(&self, charge: Charge) -> CustomResult<Charge, StorageError> {
        let conn = self.conn().await?;
        let row: ChargeRow = diesel::insert_into(charges::table)
            .values(ChargeRow::from(charge))
            .get_result_async(&conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(row.into())
    }

    async fn find_charge_by_id(&self, merchant_id: Uuid, id: Uuid) -> CustomResult<Charge, StorageError> {
        let conn = self.conn().await?;
        let row: ChargeRow = charges::table
            .filter(charges::id.eq(id))
            .filter(charges::merchant_id.eq(merchant_id))
            .first_async(&conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(row.into())
    }

    async fn find_charge_by_payment_intent_id(
        &self,
        merchant_id: Uuid,
        payment_intent_id: Uuid,
    ) -> CustomResult<Option<Charge>, StorageError> {
        let conn = self.conn().await?;
        let row: Option<ChargeRow> = charges::table
            .filter(charges::payment_intent_id.eq(payment_intent_id))
            .filter(charges::merchant_id.eq(merchant_id))
            .first_async(&conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Into::into))
    }

    async fn update_charge_conditional(
        &self,
        merchant_id: Uuid,
        id: Uuid,
        expected_status: ChargeStatus,
        update: ChargeUpdate,
    ) -> CustomResult<Charge, StorageError> {
        let conn = self.conn().await?;
        let current: ChargeRow = charges::table
            .filter(charges::id.eq(id))
            .filter(charges::merchant_id.eq(merchant_id))
            .first_async(&conn)
            .await
            .map_err(map_diesel_error)?;
        let mut next: Charge = current.into();
        if next.status != expected_status {
            return Err(Report::new(StorageError::PreconditionFailed));
        }
        if let Some(status) = update.status {
            next.status = status;
        }
        if let Some(amount_captured) = update.amount_captured {
            next.amount_captured = amount_captured;
        }
        if let Some(reference) = update.acquirer_reference {
            next.acquirer_reference = Some(reference);
        }
        if let Some(code) = update.authorization_code {
            next.authorization_code = Some(code);
        }
        if let Some(network) = update.network {
            next.network = Some(network);
        }
        if let Some(response) = update.processor_response {
            next.processor_response = response;
        }
        next.modified_at = OffsetDateTime::now_utc();

        let affected = diesel::update(
            charges::table
                .filter(charges::id.eq(id))
                .filter(charges::merchant_id.eq(merchant_id))
                .filter(charges::status.eq(expected_status.to_string())),
        )
        .set(ChargeRow::from(next.clone()))
        .execute_async(&conn)
        .await
        .map_err(map_diesel_error)?;
        if affected == 0 {
            return Err(Report::new(StorageError::PreconditionFailed));
        }
        Ok(next)
    }

    async fn atomic_refund_update(
        &self,
        merchant_id: Uuid,
        charge_id: Uuid,
        add_refunded_amount: hyperswitch_domain_models::money::MinorUnit,
    ) -> CustomResult<Charge, StorageError> {
        let conn = self.conn().await?;
        let current: ChargeRow = charges::table
            .filter(charges::id.eq(charge_id))
            .filter(charges::merchant_id.eq(merchant_id))
            .first_async(&conn)
            .await
            .map_err(map_diesel_error)?;
        let mut next: Charge = current.into();
        let new_refunded = next
            .amount_refunded
            .checked_add(add_refunded_amount)
            .ok_or_else(|| Report::new(StorageError::DatabaseError("refund amount overflow".to_string())))?;
        if new_refunded.get_amount_as_i64() > next.amount_captured.get_amount_as_i64() {
            return Err(Report::new(StorageError::PreconditionFailed));
        }
        let previous_refunded = next.amount_refunded;
        next.amount_refunded = new_refunded;
        next.status = if new_refunded.get_amount_as_i64() == next.amount_captured.get_amount_as_i64() {
            ChargeStatus::Refunded
        } else {
            ChargeStatus::PartiallyRefunded
        };
        next.modified_at = OffsetDateTime::now_utc();

        let affected = diesel::update(
            charges::table
                .filter(charges::id.eq(charge_id))
                .filter(charges::merchant_id.eq(merchant_id))
                .filter(charges::amount_refunded.eq(previous_refunded.get_amount_as_i64())),
        )
        .set(ChargeRow::from(next.clone()))
        .execute_async(&conn)
        .await
        .map_err(map_diesel_error)?;
        if affected == 0 {
            return Err(Report::new(StorageError::PreconditionFailed));
        }
        Ok(next)
    }

    async fn insert_refund(&self, refund: Refund) -> CustomResult<Refund, StorageError> {
        let conn = self.conn().await?;
        let row: RefundRow = diesel::insert_into(refunds::table)
            .values(RefundRow::from(refund))
            .get_result_async(&conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(row.into())
    }

    async fn find_refund_by_id(&self, merchant_id: Uuid, id: Uuid) -> CustomResult<Refund, StorageError> {
        let conn = self.conn().await?;
        let row: RefundRow = refunds::table
            .filter(refunds::id.eq(id))
            .filter(refunds::merchant_id.eq(merchant_id))
            .first_async(&conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(row.into())
    }

    async fn list_refunds(
        &self,
        merchant_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> CustomResult<(Vec<Refund>, i64), StorageError> {
        let conn = self.conn().await?;
        let total: i64 = refunds::table
            .filter(refunds::merchant_id.eq(merchant_id))
            .count()
            .get_result_async(&conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<RefundRow> = refunds::table
            .filter(refunds::merchant_id.eq(merchant_id))
            .order(refunds::created_at.desc())
            .limit(limit)
            .offset(offset)
            .load_async(&conn)
            .await
            .map_err(map_diesel_error)?;
        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn find_active_webhooks_for_merchant(&self, merchant_id: Uuid) -> CustomResult<Vec<Webhook>, StorageError> {
        let conn = self.conn().await?;
        let rows: Vec<WebhookRow> = webhooks::table
            .filter(webhooks::merchant_id.eq(merchant_id))
            .filter(webhooks::is_active.eq(true))
            .load_async(&conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert_webhook_delivery(
        &self,
        delivery: WebhookDelivery,
    ) -> CustomResult<WebhookDelivery, StorageError> {
        let conn = self.conn().await?;
        let row: WebhookDeliveryRow = diesel::insert_into(webhook_deliveries::table)
            .values(WebhookDeliveryRow::from(delivery))
            .get_result_async(&conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(row.into())
    }

    async fn fetch_pending_webhook_deliveries(
        &self,
        now: OffsetDateTime,
        limit: i64,
    ) -> CustomResult<Vec<WebhookDelivery>, StorageError> {
        let conn = self.conn().await?;
        let rows: Vec<WebhookDeliveryRow> = webhook_deliveries::table
            .filter(webhook_deliveries::delivered.eq(false))
            .filter(webhook_deliveries::next_retry_at.le(now))
            .order(webhook_deliveries::next_retry_at.asc())
            .limit(limit)
            .load_async(&conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_webhook_delivery(
        &self,
        id: Uuid,
        update: WebhookDeliveryUpdate,
    ) -> CustomResult<WebhookDelivery, StorageError> {
        let conn = self.conn().await?;
        let current: WebhookDeliveryRow = webhook_deliveries::table
            .filter(webhook_deliveries::id.eq(id))
            .first_async(&conn)
            .await
            .map_err(map_diesel_error)?;
        let mut next: WebhookDelivery = current.into();
        if let Some(delivered) = update.delivered {
            next.delivered = delivered;
        }
        if let Some(delivered_at) = update.delivered_at {
            next.delivered_at = Some(delivered_at);
        }
        if let Some(status_code) = update.status_code {
            next.status_code = Some(status_code);
        }
        if let Some(response_body) = update.response_body {
            next.response_body = Some(response_body);
        }
        if let Some(error) = update.error {
            next.error = Some(error);
        }
        if let Some(next_retry_at) = update.next_retry_at {
            next.next_retry_at = next_retry_at;
        }
        if let Some(attempt) = update.attempt {
            next.attempt = attempt;
        }
        if let Some(status) = update.status {
            next.status = status;
        }
        diesel::update(webhook_deliveries::table.filter(webhook_deliveries::id.eq(id)))
            .set(WebhookDeliveryRow::from(next.clone()))
            .execute_async(&conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(next)
    }

    async fn insert_access_log(&self, entry: AccessLogEntry) -> CustomResult<(), StorageError> {
        // Access logs are best-effort and intentionally not modelled as a
        // diesel table (§4.9 step 7, supplemented): a dropped log line
        // must never fail the request it describes.
        router_env::logger::info!(
            request_id = %entry.request_id,
            route = %entry.route,
            method = %entry.method,
            status = entry.status,
            duration_ms = entry.duration_ms,
            "access log"
        );
        Ok(())
    }
}
