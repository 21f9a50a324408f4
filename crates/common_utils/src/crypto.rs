//! SHA-256, HMAC-SHA-256 and cryptographically secure randomness, backed by
//! `ring`. The rest of the workspace (idempotency body hashes, API key
//! hashing, the CyberSource HTTP Signature, webhook signing) goes through
//! these functions rather than reaching for `ring` directly, so the
//! primitive choice is changed in one place if it ever needs to be.

use rand::RngCore;
use ring::hmac;

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let digest = ring::digest::digest(&ring::digest::SHA256, data);
    let mut out = [0u8; 32];
    out.copy_from_slice(digest.as_ref());
    out
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// HMAC-SHA-256 over `message`, keyed by `key`. Used for the CyberSource
/// HTTP Signature (§4.6) and webhook delivery signing (§4.11).
pub fn hmac_sha256(key: &[u8], message: &[u8]) -> Vec<u8> {
    let signing_key = hmac::Key::new(hmac::HMAC_SHA256, key);
    hmac::sign(&signing_key, message).as_ref().to_vec()
}

pub fn hmac_sha256_hex(key: &[u8], message: &[u8]) -> String {
    hex::encode(hmac_sha256(key, message))
}

/// `n` cryptographically secure random bytes, for short-lived token
/// references and similar.
pub fn secure_random_bytes(n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    buf
}
