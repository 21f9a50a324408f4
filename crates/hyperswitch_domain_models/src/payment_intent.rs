//! `PaymentIntent` (§3): the merchant-scoped orchestration record that
//! lives for the whole confirm → capture/3DS → terminal-state lifecycle.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::connector_types::BillingAddress;
use crate::enums::{CaptureMethod, ConfirmationMethod, IntentStatus};
use crate::money::{Currency, MinorUnit};
use crate::payment_method::{PaymentMethodDisplay, PaymentMethodInput};

/// The resolved route stored on the intent after the first adapter call,
/// so retries and the 3DS continuation leg hit the same acquirer (§4.7
/// step 1).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AcquirerRouting {
    pub selected_route: Option<SelectedRoute>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedRoute {
    pub adapter: String,
    pub merchant_ref: Option<String>,
}

/// 3DS continuation data stashed in `metadata.three_ds` while the intent
/// sits in `requires_action`, read back by `CompleteAuthentication`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreeDsContinuation {
    pub flow: String,
    pub redirect_url: String,
    pub method_url: Option<String>,
    pub data: serde_json::Value,
    /// The client's `return_url` from the confirm request, echoed back
    /// unchanged in `next_action.redirect_to_url` (§4.10).
    pub return_url: Option<String>,
    /// Carried forward so `CompleteAuthentication` can build a
    /// `ContinueInput` without a second adapter round trip to recover it.
    pub acquirer_reference: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PaymentIntentMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub three_ds: Option<ThreeDsContinuation>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub amount: MinorUnit,
    pub currency: Currency,
    pub capture_method: CaptureMethod,
    pub confirmation_method: ConfirmationMethod,
    pub status: IntentStatus,
    pub payment_method: Option<PaymentMethodDisplay>,
    pub acquirer_routing: AcquirerRouting,
    pub metadata: PaymentIntentMetadata,
    pub description: Option<String>,
    pub created_at: OffsetDateTime,
    pub modified_at: OffsetDateTime,
}

impl PaymentIntent {
    /// Non-terminal states permit `PATCH` and re-confirmation attempts
    /// (§4.10, §3 invariant "once succeeded/canceled, terminal").
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, IntentStatus::Succeeded | IntentStatus::Canceled)
    }
}

/// Request body for `POST /api/v1/payment_intents` (§4.10).
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentIntentRequest {
    pub amount: i64,
    pub currency: Currency,
    pub customer_id: Option<Uuid>,
    #[serde(default)]
    pub capture_method: CaptureMethod,
    #[serde(default)]
    pub confirmation_method: ConfirmationMethod,
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Request body for `PATCH /api/v1/payment_intents/:id`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdatePaymentIntentRequest {
    pub amount: Option<i64>,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Request body for `POST /api/v1/payment_intents/:id/capture`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CaptureRequest {
    pub amount_to_capture: Option<i64>,
}

/// Request body for `POST /api/v1/payment_intents/:id/confirm` (§4.10).
/// `payment_method` is either a raw card object or a single-use `tok_`
/// token string, per `PaymentMethodInput`'s untagged encoding.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmPaymentIntentRequest {
    pub payment_method: PaymentMethodInput,
    #[serde(default)]
    pub billing_details: Option<BillingAddress>,
    pub return_url: Option<String>,
}

/// Request body for `POST /api/v1/payment_intents/:id/complete_authentication`,
/// the 3DS return leg (§4.8 `CompleteAuthentication`).
#[derive(Debug, Clone, Deserialize)]
pub struct CompleteAuthenticationRequest {
    pub pares: String,
    pub transaction_id: Option<String>,
    pub md: Option<String>,
}
