//! `ApiKey` (§3): the two key kinds the authentication middleware (§4.9
//! step 4) looks up by, and never anything the handler sees raw.

use masking::Secret;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyType {
    Public,
    Secret,
}

impl KeyType {
    pub const PUBLIC_PREFIX: &'static str = "pk_";
    pub const SECRET_PREFIX: &'static str = "sk_";

    /// Classifies a bearer token by prefix; `None` means "reject as
    /// invalid api key" (§4.9 step 4).
    pub fn from_prefix(token: &str) -> Option<Self> {
        if token.starts_with(Self::SECRET_PREFIX) {
            Some(Self::Secret)
        } else if token.starts_with(Self::PUBLIC_PREFIX) {
            Some(Self::Public)
        } else {
            None
        }
    }
}

/// What the repository stores: a public key verbatim, a secret key as
/// hex(SHA-256(key)) so the plaintext never lands in the database.
#[derive(Debug, Clone)]
pub struct ApiKey {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub key_type: KeyType,
    /// Verbatim for `Public`, hex(SHA-256(..)) for `Secret`.
    pub lookup_value: Secret<String>,
    pub is_active: bool,
    pub last_used_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

/// Context attached by the auth middleware and threaded down the request
/// (§4.9's "context variables that must flow down").
#[derive(Debug, Clone)]
pub struct AuthenticatedMerchant {
    pub merchant_id: Uuid,
    pub key_type: KeyType,
    pub api_key_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_prefix_is_classified_as_secret() {
        assert_eq!(KeyType::from_prefix("sk_live_abc"), Some(KeyType::Secret));
    }

    #[test]
    fn public_prefix_is_classified_as_public() {
        assert_eq!(KeyType::from_prefix("pk_live_abc"), Some(KeyType::Public));
    }

    #[test]
    fn unknown_prefix_is_rejected() {
        assert_eq!(KeyType::from_prefix("whatever_abc"), None);
    }
}
