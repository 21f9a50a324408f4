//! Id generation: UUIDv4 for primary keys, and `prefix_<24 url-safe chars>`
//! style short ids for things a human reads off an API response (request
//! ids, tokens).

use uuid::Uuid;

pub fn new_uuid() -> Uuid {
    Uuid::new_v4()
}

/// `req_` + 24 URL-safe characters, as §4.9 step 2 specifies for a
/// generated request id.
pub fn generate_id_with_len(prefix: &str, len: usize) -> String {
    format!("{prefix}_{}", nanoid::nanoid!(len))
}

pub fn generate_request_id() -> String {
    generate_id_with_len("req", 24)
}

pub fn generate_event_id() -> String {
    new_uuid().to_string()
}

/// A single-use card-token reference: `tok_` + 24 chars, consumed once via
/// the Key/Value port (§4.8 step 4).
pub fn generate_token_reference() -> String {
    generate_id_with_len("tok", 24)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_have_the_req_prefix_and_expected_length() {
        let id = generate_request_id();
        assert!(id.starts_with("req_"));
        assert_eq!(id.len(), "req_".len() + 24);
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(generate_request_id(), generate_request_id());
    }
}
