//! C2's error surface: distinct from C1's `StorageError` so the rate-limit
//! and idempotency middleware can fail open on KV errors without
//! confusing them with a real repository miss.

use error_stack::Report;

#[derive(Debug, thiserror::Error)]
pub enum RedisError {
    #[error("redis command failed: {0}")]
    Command(String),
    #[error("failed to (de)serialize a redis value")]
    Serialization,
    #[error("redis connection pool is not initialised")]
    NotInitialized,
}

pub type RedisResult<T> = Result<T, Report<RedisError>>;
