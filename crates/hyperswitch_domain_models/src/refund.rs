//! `Refund` (§3): child of `Charge`, created by the atomic refund update.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::enums::RefundStatus;
use crate::money::{Currency, MinorUnit};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub charge_id: Uuid,
    pub amount: MinorUnit,
    pub currency: Currency,
    pub reason: Option<String>,
    pub status: RefundStatus,
    pub acquirer_reference: Option<String>,
    pub created_at: OffsetDateTime,
    pub modified_at: OffsetDateTime,
}

/// Request body for `POST /api/v1/refunds` (§4.10). `amount` absent means
/// "refund everything still refundable" (§8 scenario 4).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CreateRefundRequest {
    pub charge_id: Uuid,
    pub amount: Option<i64>,
    pub reason: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}
