//! Enumerations shared by payment intents, charges, and refunds (§3).

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The payment intent lifecycle (§3, §4.8). Transitions are enforced by
/// the orchestrator state machine, not by this type itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IntentStatus {
    RequiresPaymentMethod,
    RequiresAction,
    Processing,
    Succeeded,
    Canceled,
    Failed,
}

impl Default for IntentStatus {
    fn default() -> Self {
        Self::RequiresPaymentMethod
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CaptureMethod {
    Automatic,
    Manual,
}

impl Default for CaptureMethod {
    fn default() -> Self {
        Self::Automatic
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConfirmationMethod {
    Automatic,
    Manual,
}

impl Default for ConfirmationMethod {
    fn default() -> Self {
        Self::Automatic
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RefundStatus {
    Pending,
    Succeeded,
    Failed,
}

/// §3's Charge lifecycle. `PartiallyRefunded` and `Refunded` are reached
/// only via `AtomicRefundUpdate` (C1) comparing `amount_refunded` against
/// `amount_captured`; nothing else sets them directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChargeStatus {
    Authorized,
    Captured,
    PartiallyRefunded,
    Refunded,
    Voided,
    Failed,
}

/// Distinguishes a raw card submitted in-flight from a tokenized, at-rest
/// payment method; see the PAN-handling design note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethodType {
    Card,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WebhookDeliveryStatus {
    Pending,
    Delivered,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_status_round_trips_through_json() {
        let s = serde_json::to_string(&IntentStatus::RequiresAction).unwrap();
        assert_eq!(s, "\"requires_action\"");
        let back: IntentStatus = serde_json::from_str(&s).unwrap();
        assert_eq!(back, IntentStatus::RequiresAction);
    }

    #[test]
    fn capture_method_defaults_to_automatic() {
        assert_eq!(CaptureMethod::default(), CaptureMethod::Automatic);
    }

    #[test]
    fn charge_status_serializes_snake_case() {
        let s = serde_json::to_string(&ChargeStatus::PartiallyRefunded).unwrap();
        assert_eq!(s, "\"partially_refunded\"");
    }
}
