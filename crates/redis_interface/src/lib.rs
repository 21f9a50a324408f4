//! The Key/Value port (C2): `Get`/`SetWithTTL`/`Increment` over Redis via
//! `fred`, sub-millisecond storage for rate-limit counters, idempotency
//! records, and short-lived card tokens (§4.2).

pub mod errors;
pub mod kv;

pub use kv::{KvStore, RedisSettings};
