//! Patch structs for the conditional-update methods. Modelled on the
//! teacher's `*Update` enums in `diesel_models`, flattened to plain
//! optional-field structs since this workspace's entities carry far
//! fewer columns.

use hyperswitch_domain_models::charge::ProcessorResponse;
use hyperswitch_domain_models::enums::{ChargeStatus, IntentStatus};
use hyperswitch_domain_models::money::MinorUnit;
use hyperswitch_domain_models::payment_intent::{AcquirerRouting, PaymentIntentMetadata};
use hyperswitch_domain_models::payment_method::PaymentMethodDisplay;

#[derive(Debug, Clone, Default)]
pub struct PaymentIntentUpdate {
    pub status: Option<IntentStatus>,
    pub amount: Option<MinorUnit>,
    pub payment_method: Option<PaymentMethodDisplay>,
    pub acquirer_routing: Option<AcquirerRouting>,
    pub metadata: Option<PaymentIntentMetadata>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ChargeUpdate {
    pub status: Option<ChargeStatus>,
    pub amount_captured: Option<MinorUnit>,
    pub acquirer_reference: Option<String>,
    pub authorization_code: Option<String>,
    pub network: Option<String>,
    pub processor_response: Option<ProcessorResponse>,
}

#[derive(Debug, Clone, Default)]
pub struct WebhookDeliveryUpdate {
    pub delivered: Option<bool>,
    pub delivered_at: Option<time::OffsetDateTime>,
    pub status_code: Option<u16>,
    pub response_body: Option<String>,
    pub error: Option<String>,
    pub next_retry_at: Option<time::OffsetDateTime>,
    pub attempt: Option<u32>,
    pub status: Option<hyperswitch_domain_models::enums::WebhookDeliveryStatus>,
}
