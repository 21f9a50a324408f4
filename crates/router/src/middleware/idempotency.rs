//! §4.9 step 6: idempotency for `POST`/`PATCH` under `/api/v1/*`, keyed by
//! `(merchant_id, endpoint, Idempotency-Key)`. No header means "proceed
//! uncached"; a hit replays the stored response; a hash mismatch is a
//! conflict, never a silent overwrite.

use std::time::Duration;

use actix_web::body::{to_bytes, BoxBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::http::{Method, StatusCode};
use actix_web::middleware::Next;
use actix_web::{web, Error, HttpResponse};
use base64::Engine;
use hyperswitch_domain_models::api_key::AuthenticatedMerchant;
use serde::{Deserialize, Serialize};

use super::{json_error, kv_get, kv_set_if_not_exists_with_ttl, kv_set_with_ttl, API_PREFIX};
use crate::app_state::AppState;

const BASE64: base64::engine::general_purpose::GeneralPurpose = base64::engine::general_purpose::STANDARD;

/// Placeholder value reserved via `kv_set_if_not_exists_with_ttl` while a
/// request is in flight, so a second request with the same key can't slip
/// past the `kv_get` miss before the first one finishes and caches its
/// response.
const RESERVATION_MARKER: &str = "__reserved__";

#[derive(Debug, Serialize, Deserialize)]
struct CachedResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
    body_hash: String,
}

pub async fn idempotency(mut req: ServiceRequest, next: Next<impl MessageBody>) -> Result<ServiceResponse<BoxBody>, Error> {
    let applies = req.path().starts_with(API_PREFIX) && matches!(*req.method(), Method::POST | Method::PATCH);
    if !applies {
        let res = next.call(req).await?;
        return Ok(res.map_into_boxed_body());
    }

    let request_id = req
        .extensions()
        .get::<super::RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_default();
    let Some(key) = req
        .headers()
        .get("Idempotency-Key")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
    else {
        let res = next.call(req).await?;
        return Ok(res.map_into_boxed_body());
    };
    let Some(merchant) = req.extensions().get::<AuthenticatedMerchant>().cloned() else {
        let res = next.call(req).await?;
        return Ok(res.map_into_boxed_body());
    };
    let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
        let res = next.call(req).await?;
        return Ok(res.map_into_boxed_body());
    };

    let endpoint = req.path().to_string();
    let body_bytes = buffer_request_body(&mut req).await?;
    let body_hash = common_utils::crypto::sha256_hex(&body_bytes);
    let cache_key = format!("idempotency:{}:{}:{}", merchant.merchant_id, endpoint, key);

    let reservation_ttl = Duration::from_secs(state.settings.idempotency.ttl_seconds);

    if let Some(raw) = kv_get(&state, &cache_key).await {
        if raw == RESERVATION_MARKER {
            let (http_req, _) = req.into_parts();
            let response = json_error(
                StatusCode::CONFLICT,
                "idempotency_conflict",
                "a request with this idempotency key is already being processed",
                &request_id,
            );
            return Ok(ServiceResponse::new(http_req, response));
        }
        if let Ok(cached) = serde_json::from_str::<CachedResponse>(&raw) {
            if cached.body_hash == body_hash {
                let (http_req, _) = req.into_parts();
                let mut response = HttpResponse::build(StatusCode::from_u16(cached.status).unwrap_or(StatusCode::OK))
                    .body(BASE64.decode(&cached.body).unwrap_or_default());
                for (name, value) in &cached.headers {
                    if let (Ok(name), Ok(value)) = (HeaderName::try_from(name.as_str()), HeaderValue::from_str(value)) {
                        response.headers_mut().insert(name, value);
                    }
                }
                response
                    .headers_mut()
                    .insert(HeaderName::from_static("idempotency-replayed"), HeaderValue::from_static("true"));
                return Ok(ServiceResponse::new(http_req, response));
            }
            let (http_req, _) = req.into_parts();
            let response = json_error(StatusCode::CONFLICT, "idempotency_conflict", "idempotency key reused with a different request body", &request_id);
            return Ok(ServiceResponse::new(http_req, response));
        }
    } else if !kv_set_if_not_exists_with_ttl(&state, &cache_key, RESERVATION_MARKER, reservation_ttl).await {
        // Lost the race to a concurrent request carrying the same key.
        let (http_req, _) = req.into_parts();
        let response = json_error(
            StatusCode::CONFLICT,
            "idempotency_conflict",
            "a request with this idempotency key is already being processed",
            &request_id,
        );
        return Ok(ServiceResponse::new(http_req, response));
    }

    let res = next.call(req).await?;
    let status = res.status();
    let headers: Vec<(String, String)> = res
        .headers()
        .iter()
        .filter(|(name, _)| name.as_str().to_ascii_lowercase() != "set-cookie")
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.to_string(), v.to_string())))
        .collect();
    let (http_req, response) = res.into_parts();
    let body = to_bytes(response.into_body()).await.unwrap_or_default();

    let cached = CachedResponse {
        status: status.as_u16(),
        headers,
        body: BASE64.encode(&body),
        body_hash,
    };
    if let Ok(serialized) = serde_json::to_string(&cached) {
        kv_set_with_ttl(&state, &cache_key, &serialized, reservation_ttl).await;
    }

    let mut rebuilt = HttpResponse::build(status).body(body);
    for (name, value) in &cached.headers {
        if let (Ok(name), Ok(value)) = (HeaderName::try_from(name.as_str()), HeaderValue::from_str(value)) {
            rebuilt.headers_mut().insert(name, value);
        }
    }
    Ok(ServiceResponse::new(http_req, rebuilt))
}

/// Reads the whole request payload so the body hash can be computed,
/// then hands an equivalent payload back so the handler's extractor
/// still sees the full body.
async fn buffer_request_body(req: &mut ServiceRequest) -> Result<web::Bytes, Error> {
    let bytes = req.extract::<web::Bytes>().await?;
    req.set_payload(actix_web::dev::Payload::from(bytes.clone()));
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use actix_web::middleware::from_fn;
    use actix_web::{test, web, App};
    use hyperswitch_domain_models::api_key::{AuthenticatedMerchant, KeyType};
    use redis_interface::kv::KvBackend;
    use storage_impl::mock_db::MockDb;
    use uuid::Uuid;

    use super::*;
    use crate::configs::Settings;

    async fn stamp_merchant(mut req: ServiceRequest, next: actix_web::middleware::Next<impl MessageBody>) -> Result<ServiceResponse<impl MessageBody>, Error> {
        req.extensions_mut().insert(AuthenticatedMerchant { merchant_id: Uuid::nil(), key_type: KeyType::Secret, api_key_id: Uuid::nil() });
        next.call(req).await
    }

    async fn counting_handler(counter: web::Data<AtomicUsize>, body: web::Bytes) -> HttpResponse {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        HttpResponse::Created().json(serde_json::json!({"call": n, "echoed_len": body.len()}))
    }

    fn test_app_state() -> AppState {
        let store: Arc<dyn storage_impl::StorageInterface> = Arc::new(MockDb::new());
        AppState::new(store, KvBackend::None, Settings::default())
    }

    #[actix_web::test]
    async fn a_repeated_key_with_the_same_body_replays_the_first_response() {
        let state = test_app_state();
        let counter = web::Data::new(AtomicUsize::new(0));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .app_data(counter.clone())
                .wrap(from_fn(idempotency))
                .wrap(from_fn(stamp_merchant))
                .route("/api/v1/widgets", web::post().to(counting_handler)),
        )
        .await;

        let req1 = test::TestRequest::post()
            .uri("/api/v1/widgets")
            .insert_header(("Idempotency-Key", "key-1"))
            .set_payload("same body")
            .to_request();
        let res1 = test::call_service(&app, req1).await;
        assert_eq!(res1.status(), StatusCode::CREATED);
        let body1 = test::read_body(res1).await;

        let req2 = test::TestRequest::post()
            .uri("/api/v1/widgets")
            .insert_header(("Idempotency-Key", "key-1"))
            .set_payload("same body")
            .to_request();
        let res2 = test::call_service(&app, req2).await;
        assert_eq!(res2.headers().get("idempotency-replayed").unwrap(), "true");
        let body2 = test::read_body(res2).await;
        assert_eq!(body1, body2);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn a_repeated_key_with_a_different_body_is_a_conflict() {
        let state = test_app_state();
        let counter = web::Data::new(AtomicUsize::new(0));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .app_data(counter.clone())
                .wrap(from_fn(idempotency))
                .wrap(from_fn(stamp_merchant))
                .route("/api/v1/widgets", web::post().to(counting_handler)),
        )
        .await;

        let req1 = test::TestRequest::post()
            .uri("/api/v1/widgets")
            .insert_header(("Idempotency-Key", "key-1"))
            .set_payload("body a")
            .to_request();
        test::call_service(&app, req1).await;

        let req2 = test::TestRequest::post()
            .uri("/api/v1/widgets")
            .insert_header(("Idempotency-Key", "key-1"))
            .set_payload("body b")
            .to_request();
        let res2 = test::call_service(&app, req2).await;
        assert_eq!(res2.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn a_key_already_reserved_by_an_in_flight_request_is_rejected_before_the_handler_runs() {
        let state = test_app_state();
        let cache_key = format!("idempotency:{}:{}:{}", Uuid::nil(), "/api/v1/widgets", "key-1");
        assert!(state.kv_fallback.set_if_not_exists_with_ttl(&cache_key, RESERVATION_MARKER, Duration::from_secs(60)));

        let counter = web::Data::new(AtomicUsize::new(0));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .app_data(counter.clone())
                .wrap(from_fn(idempotency))
                .wrap(from_fn(stamp_merchant))
                .route("/api/v1/widgets", web::post().to(counting_handler)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/widgets")
            .insert_header(("Idempotency-Key", "key-1"))
            .set_payload("same body")
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    async fn no_idempotency_key_means_every_call_runs_the_handler() {
        let state = test_app_state();
        let counter = web::Data::new(AtomicUsize::new(0));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .app_data(counter.clone())
                .wrap(from_fn(idempotency))
                .wrap(from_fn(stamp_merchant))
                .route("/api/v1/widgets", web::post().to(counting_handler)),
        )
        .await;

        for _ in 0..2 {
            let req = test::TestRequest::post().uri("/api/v1/widgets").set_payload("body").to_request();
            test::call_service(&app, req).await;
        }
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
