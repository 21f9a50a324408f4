//! The canonical adapter I/O contract (§4.4): acquirer-neutral request and
//! response types every adapter implementation (mock, CyberSource, …)
//! speaks, so the orchestrator never imports a vendor wire format.

use masking::Secret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::charge::ProcessorResponse;
use crate::money::{Currency, MinorUnit};

/// Carried on every outbound adapter call so per-request deadlines and
/// request ids show up in acquirer-side logs and tracing spans alike.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub merchant_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct CardPaymentMethodData {
    pub network: Option<String>,
    pub brand: Option<String>,
    pub last4: Option<String>,
    pub exp_month: Secret<String>,
    pub exp_year: Secret<String>,
    /// Present only for direct (non-tokenized) processing; absent once an
    /// acquirer has its own vaulted token for a returning card.
    pub card_number: Option<Secret<String>>,
    pub card_cvc: Option<Secret<String>>,
    pub tokenization_reference: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CustomerDetails {
    pub id: Option<String>,
    pub email: Option<Secret<String>>,
    pub name: Option<Secret<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillingAddress {
    pub line1: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ThreeDsHints {
    pub return_url: Option<String>,
}

/// The resolved route (§4.7) an adapter call is bound to.
#[derive(Debug, Clone)]
pub struct AcquirerRoute {
    pub adapter: String,
    pub merchant_ref: Option<String>,
    pub config: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct AuthorizeInput {
    pub context: RequestContext,
    pub payment_intent_id: Uuid,
    pub amount: MinorUnit,
    pub currency: Currency,
    pub payment_method: CardPaymentMethodData,
    pub customer: Option<CustomerDetails>,
    pub billing_address: Option<BillingAddress>,
    pub three_ds_hints: Option<ThreeDsHints>,
    pub route: AcquirerRoute,
    pub statement_descriptor: Option<String>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct ThreeDsData {
    pub flow: String,
    pub redirect_url: String,
    pub method_url: Option<String>,
    pub data: serde_json::Value,
}

/// §4.4's tagged outcome: the orchestrator matches exhaustively on this
/// instead of inspecting a vendor status string.
#[derive(Debug, Clone)]
pub enum AuthorizeOutcome {
    Authorized {
        amount_authorized: MinorUnit,
        acquirer_reference: Option<String>,
        authorization_code: Option<String>,
        network: Option<String>,
        processor_response: ProcessorResponse,
    },
    RequiresAction {
        acquirer_reference: Option<String>,
        three_ds: ThreeDsData,
    },
    Failed {
        processor_response: ProcessorResponse,
    },
}

#[derive(Debug, Clone)]
pub struct AuthorizeOutput {
    pub outcome: AuthorizeOutcome,
}

/// The PaRes return leg (§4.8 CompleteAuthentication). `requires_action`
/// is not a legal outcome from this call.
#[derive(Debug, Clone)]
pub struct ContinueInput {
    pub context: RequestContext,
    pub route: AcquirerRoute,
    pub acquirer_reference: Option<String>,
    pub pares: String,
    pub transaction_id: Option<String>,
    pub md: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CaptureInput {
    pub context: RequestContext,
    pub route: AcquirerRoute,
    pub acquirer_reference: String,
    pub amount: MinorUnit,
    pub currency: Currency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementOutcome {
    Succeeded,
    Pending,
    Failed,
}

#[derive(Debug, Clone)]
pub struct CaptureOutput {
    pub outcome: SettlementOutcome,
    pub acquirer_reference: Option<String>,
    pub processor_response: ProcessorResponse,
}

#[derive(Debug, Clone)]
pub struct RefundInput {
    pub context: RequestContext,
    pub route: AcquirerRoute,
    pub acquirer_reference: String,
    pub amount: MinorUnit,
    pub currency: Currency,
}

#[derive(Debug, Clone)]
pub struct RefundOutput {
    pub outcome: SettlementOutcome,
    pub acquirer_reference: Option<String>,
    pub processor_response: ProcessorResponse,
}

#[derive(Debug, Clone)]
pub struct VoidInput {
    pub context: RequestContext,
    pub route: AcquirerRoute,
    pub acquirer_reference: String,
}

#[derive(Debug, Clone)]
pub struct VoidOutput {
    pub outcome: SettlementOutcome,
    pub acquirer_reference: Option<String>,
    pub processor_response: ProcessorResponse,
}

/// A normalised inbound acquirer webhook event, emitted by the optional
/// `HandleWebhook` capability (§4.4 item 6). Not required for the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalEvent {
    pub acquirer_reference: String,
    pub event_type: String,
    pub raw: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_outcome_matches_exhaustively() {
        let outcome = AuthorizeOutcome::Failed {
            processor_response: ProcessorResponse {
                code: Some("05".to_string()),
                message: Some("Do not honor".to_string()),
                ..Default::default()
            },
        };
        let is_failed = matches!(outcome, AuthorizeOutcome::Failed { .. });
        assert!(is_failed);
    }
}
