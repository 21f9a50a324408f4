//! The in-flight/at-rest payment-method split the PAN design note
//! requires: `CardDetails` carries the raw PAN/CVV and only ever appears in
//! an adapter-bound request; `PaymentMethodDisplay` is all the repository
//! write path is able to accept, so leaking a PAN into storage is a type
//! error, not a discipline problem.

use masking::{PeekInterface, Secret};
use serde::{Deserialize, Serialize};

use crate::enums::PaymentMethodType;

/// Raw card data as submitted by the merchant's client. Never persisted;
/// never logged as anything but its `Debug` redaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardDetails {
    pub card_number: Secret<String>,
    pub card_exp_month: Secret<String>,
    pub card_exp_year: Secret<String>,
    pub card_cvc: Secret<String>,
    pub card_holder_name: Option<Secret<String>>,
}

impl CardDetails {
    pub fn last4(&self) -> String {
        let number = self.card_number.peek();
        let len = number.len();
        number[len.saturating_sub(4)..].to_string()
    }

    /// A best-effort brand guess from the IIN range; good enough for
    /// display, never used for routing or risk decisions.
    pub fn brand(&self) -> String {
        let number = self.card_number.peek();
        match number.chars().next() {
            Some('4') => "visa".to_string(),
            Some('5') => "mastercard".to_string(),
            Some('3') => "amex".to_string(),
            _ => "unknown".to_string(),
        }
    }
}

/// What confirm accepts in place of a raw card: a single-use reference
/// into the clock/random/crypto port's KV store (C2/C3), prefixed `tok_`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenReference(pub String);

impl TokenReference {
    pub const PREFIX: &'static str = "tok_";

    pub fn is_token(candidate: &str) -> bool {
        candidate.starts_with(Self::PREFIX)
    }
}

/// Either shape confirm's `payment_method` field may take on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PaymentMethodInput {
    Card(CardDetails),
    Token(String),
}

/// The display-only, at-rest projection stored on a `PaymentIntent`. This
/// is the only payment-method shape the repository write path accepts.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PaymentMethodDisplay {
    pub r#type: Option<PaymentMethodType>,
    pub brand: Option<String>,
    pub last4: Option<String>,
    pub exp_month: Option<String>,
    pub exp_year: Option<String>,
    pub token_reference: Option<String>,
}

impl From<&CardDetails> for PaymentMethodDisplay {
    fn from(card: &CardDetails) -> Self {
        Self {
            r#type: Some(PaymentMethodType::Card),
            brand: Some(card.brand()),
            last4: Some(card.last4()),
            exp_month: Some(card.card_exp_month.peek().clone()),
            exp_year: Some(card.card_exp_year.peek().clone()),
            token_reference: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> CardDetails {
        CardDetails {
            card_number: Secret::new("4111111111111111".to_string()),
            card_exp_month: Secret::new("12".to_string()),
            card_exp_year: Secret::new("2030".to_string()),
            card_cvc: Secret::new("123".to_string()),
            card_holder_name: None,
        }
    }

    #[test]
    fn display_projection_never_carries_the_full_pan() {
        let display = PaymentMethodDisplay::from(&card());
        assert_eq!(display.last4.as_deref(), Some("1111"));
        assert_eq!(display.brand.as_deref(), Some("visa"));
        let serialized = serde_json::to_string(&display).unwrap();
        assert!(!serialized.contains("4111111111111111"));
    }

    #[test]
    fn token_reference_is_recognised_by_prefix() {
        assert!(TokenReference::is_token("tok_abc123"));
        assert!(!TokenReference::is_token("4111111111111111"));
    }
}
