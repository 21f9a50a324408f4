//! Row structs diesel maps the `postgres_db::schema` tables onto, plus
//! `From` conversions to and from the canonical domain types. Statuses and
//! currencies are stored as their `Display`/`FromStr` strings (via
//! `strum`) rather than native Postgres enums, so adding a variant is a
//! migration-free deploy.

use std::str::FromStr;

use diesel::prelude::*;
use hyperswitch_domain_models::api_key::{ApiKey, KeyType};
use hyperswitch_domain_models::charge::{Charge, ProcessorResponse};
use hyperswitch_domain_models::enums::{CaptureMethod, ChargeStatus, ConfirmationMethod, IntentStatus, RefundStatus, WebhookDeliveryStatus};
use hyperswitch_domain_models::merchant::Merchant;
use hyperswitch_domain_models::money::{Currency, MinorUnit};
use hyperswitch_domain_models::payment_intent::{AcquirerRouting, PaymentIntent, PaymentIntentMetadata};
use hyperswitch_domain_models::payment_method::PaymentMethodDisplay;
use hyperswitch_domain_models::refund::Refund;
use hyperswitch_domain_models::webhook::{Webhook, WebhookDelivery};
use masking::Secret;
use time::OffsetDateTime;
use uuid::Uuid;

use super::schema::*;

#[derive(Queryable, Insertable)]
#[diesel(table_name = merchants)]
pub struct MerchantRow {
    pub id: Uuid,
    pub routing_config: serde_json::Value,
}

impl From<MerchantRow> for Merchant {
    fn from(row: MerchantRow) -> Self {
        Self {
            id: row.id,
            routing_config: serde_json::from_value(row.routing_config).unwrap_or_default(),
        }
    }
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = api_keys)]
pub struct ApiKeyRow {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub key_type: String,
    pub lookup_value: String,
    pub is_active: bool,
    pub last_used_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl From<ApiKeyRow> for ApiKey {
    fn from(row: ApiKeyRow) -> Self {
        Self {
            id: row.id,
            merchant_id: row.merchant_id,
            key_type: if row.key_type == "secret" { KeyType::Secret } else { KeyType::Public },
            lookup_value: Secret::new(row.lookup_value),
            is_active: row.is_active,
            last_used_at: row.last_used_at,
            created_at: row.created_at,
        }
    }
}

#[derive(Queryable, Insertable, AsChangeset)]
#[diesel(table_name = payment_intents)]
pub struct PaymentIntentRow {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub amount: i64,
    pub currency: String,
    pub capture_method: String,
    pub confirmation_method: String,
    pub status: String,
    pub payment_method: Option<serde_json::Value>,
    pub acquirer_routing: serde_json::Value,
    pub metadata: serde_json::Value,
    pub description: Option<String>,
    pub created_at: OffsetDateTime,
    pub modified_at: OffsetDateTime,
}

impl From<PaymentIntent> for PaymentIntentRow {
    fn from(intent: PaymentIntent) -> Self {
        Self {
            id: intent.id,
            merchant_id: intent.merchant_id,
            customer_id: intent.customer_id,
            amount: intent.amount.get_amount_as_i64(),
            currency: intent.currency.to_string(),
            capture_method: intent.capture_method.to_string(),
            confirmation_method: intent.confirmation_method.to_string(),
            status: intent.status.to_string(),
            payment_method: intent.payment_method.map(|pm| serde_json::to_value(pm).unwrap_or_default()),
            acquirer_routing: serde_json::to_value(&intent.acquirer_routing).unwrap_or_default(),
            metadata: serde_json::to_value(&intent.metadata).unwrap_or_default(),
            description: intent.description,
            created_at: intent.created_at,
            modified_at: intent.modified_at,
        }
    }
}

impl From<PaymentIntentRow> for PaymentIntent {
    fn from(row: PaymentIntentRow) -> Self {
        Self {
            id: row.id,
            merchant_id: row.merchant_id,
            customer_id: row.customer_id,
            amount: MinorUnit::new(row.amount),
            currency: Currency::from_str(&row.currency).unwrap_or(Currency::USD),
            capture_method: CaptureMethod::from_str(&row.capture_method).unwrap_or_default(),
            confirmation_method: ConfirmationMethod::from_str(&row.confirmation_method).unwrap_or_default(),
            status: IntentStatus::from_str(&row.status).unwrap_or_default(),
            payment_method: row
                .payment_method
                .and_then(|v| serde_json::from_value::<PaymentMethodDisplay>(v).ok()),
            acquirer_routing: serde_json::from_value(row.acquirer_routing).unwrap_or_default(),
            metadata: serde_json::from_value(row.metadata).unwrap_or_default(),
            description: row.description,
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

#[derive(Queryable, Insertable, AsChangeset)]
#[diesel(table_name = charges)]
pub struct ChargeRow {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub payment_intent_id: Uuid,
    pub amount_authorized: i64,
    pub amount_captured: i64,
    pub amount_refunded: i64,
    pub currency: String,
    pub status: String,
    pub acquirer_name: String,
    pub acquirer_reference: Option<String>,
    pub authorization_code: Option<String>,
    pub network: Option<String>,
    pub processor_response: serde_json::Value,
    pub created_at: OffsetDateTime,
    pub modified_at: OffsetDateTime,
}

impl From<Charge> for ChargeRow {
    fn from(charge: Charge) -> Self {
        Self {
            id: charge.id,
            merchant_id: charge.merchant_id,
            payment_intent_id: charge.payment_intent_id,
            amount_authorized: charge.amount_authorized.get_amount_as_i64(),
            amount_captured: charge.amount_captured.get_amount_as_i64(),
            amount_refunded: charge.amount_refunded.get_amount_as_i64(),
            currency: charge.currency.to_string(),
            status: charge.status.to_string(),
            acquirer_name: charge.acquirer_name,
            acquirer_reference: charge.acquirer_reference,
            authorization_code: charge.authorization_code,
            network: charge.network,
            processor_response: serde_json::to_value(&charge.processor_response).unwrap_or_default(),
            created_at: charge.created_at,
            modified_at: charge.modified_at,
        }
    }
}

impl From<ChargeRow> for Charge {
    fn from(row: ChargeRow) -> Self {
        Self {
            id: row.id,
            merchant_id: row.merchant_id,
            payment_intent_id: row.payment_intent_id,
            amount_authorized: MinorUnit::new(row.amount_authorized),
            amount_captured: MinorUnit::new(row.amount_captured),
            amount_refunded: MinorUnit::new(row.amount_refunded),
            currency: Currency::from_str(&row.currency).unwrap_or(Currency::USD),
            status: ChargeStatus::from_str(&row.status).unwrap_or(ChargeStatus::Failed),
            acquirer_name: row.acquirer_name,
            acquirer_reference: row.acquirer_reference,
            authorization_code: row.authorization_code,
            network: row.network,
            processor_response: serde_json::from_value::<ProcessorResponse>(row.processor_response)
                .unwrap_or_default(),
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = refunds)]
pub struct RefundRow {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub charge_id: Uuid,
    pub amount: i64,
    pub currency: String,
    pub reason: Option<String>,
    pub status: String,
    pub acquirer_reference: Option<String>,
    pub created_at: OffsetDateTime,
    pub modified_at: OffsetDateTime,
}

impl From<Refund> for RefundRow {
    fn from(refund: Refund) -> Self {
        Self {
            id: refund.id,
            merchant_id: refund.merchant_id,
            charge_id: refund.charge_id,
            amount: refund.amount.get_amount_as_i64(),
            currency: refund.currency.to_string(),
            reason: refund.reason,
            status: refund.status.to_string(),
            acquirer_reference: refund.acquirer_reference,
            created_at: refund.created_at,
            modified_at: refund.modified_at,
        }
    }
}

impl From<RefundRow> for Refund {
    fn from(row: RefundRow) -> Self {
        Self {
            id: row.id,
            merchant_id: row.merchant_id,
            charge_id: row.charge_id,
            amount: MinorUnit::new(row.amount),
            currency: Currency::from_str(&row.currency).unwrap_or(Currency::USD),
            reason: row.reason,
            status: RefundStatus::from_str(&row.status).unwrap_or(RefundStatus::Failed),
            acquirer_reference: row.acquirer_reference,
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = webhooks)]
pub struct WebhookRow {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub url: String,
    pub secret: String,
    pub events: Vec<String>,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
}

impl From<WebhookRow> for Webhook {
    fn from(row: WebhookRow) -> Self {
        Self {
            id: row.id,
            merchant_id: row.merchant_id,
            url: row.url,
            secret: Secret::new(row.secret),
            events: row.events,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(Queryable, Insertable, AsChangeset)]
#[diesel(table_name = webhook_deliveries)]
pub struct WebhookDeliveryRow {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub event_type: String,
    pub event_id: Uuid,
    pub endpoint_url: String,
    pub payload: serde_json::Value,
    pub attempt: i32,
    pub max_attempts: i32,
    pub status_code: Option<i32>,
    pub response_body: Option<String>,
    pub error: Option<String>,
    pub next_retry_at: OffsetDateTime,
    pub delivered: bool,
    pub delivered_at: Option<OffsetDateTime>,
    pub status: String,
}

impl From<WebhookDelivery> for WebhookDeliveryRow {
    fn from(delivery: WebhookDelivery) -> Self {
        Self {
            id: delivery.id,
            merchant_id: delivery.merchant_id,
            event_type: delivery.event_type,
            event_id: delivery.event_id,
            endpoint_url: delivery.endpoint_url,
            payload: delivery.payload,
            attempt: delivery.attempt as i32,
            max_attempts: delivery.max_attempts as i32,
            status_code: delivery.status_code.map(i32::from),
            response_body: delivery.response_body,
            error: delivery.error,
            next_retry_at: delivery.next_retry_at,
            delivered: delivery.delivered,
            delivered_at: delivery.delivered_at,
            status: delivery.status.to_string(),
        }
    }
}

impl From<WebhookDeliveryRow> for WebhookDelivery {
    fn from(row: WebhookDeliveryRow) -> Self {
        Self {
            id: row.id,
            merchant_id: row.merchant_id,
            event_type: row.event_type,
            event_id: row.event_id,
            endpoint_url: row.endpoint_url,
            payload: row.payload,
            attempt: row.attempt as u32,
            max_attempts: row.max_attempts as u32,
            status_code: row.status_code.map(|c| c as u16),
            response_body: row.response_body,
            error: row.error,
            next_retry_at: row.next_retry_at,
            delivered: row.delivered,
            delivered_at: row.delivered_at,
            status: WebhookDeliveryStatus::from_str(&row.status).unwrap_or(WebhookDeliveryStatus::Pending),
        }
    }
}
