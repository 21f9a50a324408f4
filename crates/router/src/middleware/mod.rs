//! The wrapping pipeline (§4.9): CORS, request id, auth, rate limit,
//! idempotency, access log, applied to `/api/v1/*` in that order via
//! `actix_web::middleware::from_fn`. Each stage is its own module so the
//! ordering in `routes::configure` is the only place the pipeline is
//! actually assembled.

pub mod access_log;
pub mod auth;
pub mod idempotency;
pub mod rate_limit;
pub mod request_id;

use std::time::Duration;

use crate::app_state::AppState;

pub(crate) const API_PREFIX: &str = "/api/v1/";

/// One KV read, routed to Redis or the in-process fallback (§4.2).
pub(crate) async fn kv_get(state: &AppState, key: &str) -> Option<String> {
    match state.kv.as_ref() {
        redis_interface::kv::KvBackend::Redis(store) => store.get(key).await.ok().flatten(),
        redis_interface::kv::KvBackend::None => state.kv_fallback.get(key),
    }
}

pub(crate) async fn kv_set_with_ttl(state: &AppState, key: &str, value: &str, ttl: Duration) {
    match state.kv.as_ref() {
        redis_interface::kv::KvBackend::Redis(store) => {
            let _ = store.set_with_ttl(key, value, ttl).await;
        }
        redis_interface::kv::KvBackend::None => state.kv_fallback.set_with_ttl(key, value, ttl),
    }
}

pub(crate) async fn kv_set_if_not_exists_with_ttl(state: &AppState, key: &str, value: &str, ttl: Duration) -> bool {
    match state.kv.as_ref() {
        redis_interface::kv::KvBackend::Redis(store) => store.set_if_not_exists_with_ttl(key, value, ttl).await.unwrap_or(true),
        redis_interface::kv::KvBackend::None => state.kv_fallback.set_if_not_exists_with_ttl(key, value, ttl),
    }
}

pub(crate) async fn kv_increment(state: &AppState, key: &str, window: Duration) -> i64 {
    match state.kv.as_ref() {
        // A store error fails the counter open rather than blocking every
        // request behind a broken Redis (§5 "fails open with a logged warning").
        redis_interface::kv::KvBackend::Redis(store) => store.increment(key, window).await.unwrap_or(1),
        redis_interface::kv::KvBackend::None => state.kv_fallback.increment(key, window),
    }
}

/// Request id attached to `ServiceRequest` extensions by `request_id`,
/// read back by `access_log` and by handlers building an error body.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// §4.10's uniform error envelope: `{"error":{"type","message","request_id"}}`.
pub fn json_error(status: actix_web::http::StatusCode, error_type: &str, message: &str, request_id: &str) -> actix_web::HttpResponse {
    actix_web::HttpResponse::build(status).json(serde_json::json!({
        "error": {
            "type": error_type,
            "message": message,
            "request_id": request_id,
        }
    }))
}
