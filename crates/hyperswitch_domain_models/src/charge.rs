//! `Charge` (§3): zero-or-one per successful adapter call on an intent.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::enums::ChargeStatus;
use crate::money::{Currency, MinorUnit};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProcessorResponse {
    pub code: Option<String>,
    pub message: Option<String>,
    pub avs: Option<String>,
    pub cvv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Charge {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub payment_intent_id: Uuid,
    pub amount_authorized: MinorUnit,
    pub amount_captured: MinorUnit,
    pub amount_refunded: MinorUnit,
    pub currency: Currency,
    pub status: ChargeStatus,
    pub acquirer_name: String,
    pub acquirer_reference: Option<String>,
    pub authorization_code: Option<String>,
    pub network: Option<String>,
    pub processor_response: ProcessorResponse,
    pub created_at: OffsetDateTime,
    pub modified_at: OffsetDateTime,
}

impl Charge {
    /// `amount_captured - amount_refunded`, the ceiling on a new refund
    /// (§4.8 Refund step, §8 boundary scenario 4).
    pub fn remaining_refundable(&self) -> MinorUnit {
        self.amount_captured
            .checked_sub(self.amount_refunded)
            .unwrap_or(MinorUnit::new(0))
    }
}
