//! §4.9 step 5: fixed-window counter keyed by `merchant_id:METHOD:path`,
//! applied only to `/api/v1/*` after authentication. The three
//! `X-RateLimit-*` headers are always emitted, on both the allowed and
//! the rejected path.

use std::time::Duration;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::http::StatusCode;
use actix_web::middleware::Next;
use actix_web::{web, Error};
use hyperswitch_domain_models::api_key::AuthenticatedMerchant;

use super::{json_error, kv_increment, API_PREFIX};
use crate::app_state::AppState;

pub async fn rate_limit(req: ServiceRequest, next: Next<impl MessageBody>) -> Result<ServiceResponse<impl MessageBody>, Error> {
    if !req.path().starts_with(API_PREFIX) {
        return Ok(next.call(req).await?.map_into_left_body());
    }

    let request_id = req
        .extensions()
        .get::<super::RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_default();
    let Some(merchant) = req.extensions().get::<AuthenticatedMerchant>().cloned() else {
        return Ok(next.call(req).await?.map_into_left_body());
    };
    let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
        return Ok(next.call(req).await?.map_into_left_body());
    };

    let key = format!("ratelimit:{}:{}:{}", merchant.merchant_id, req.method(), req.path());
    let window = Duration::from_millis(state.settings.rate_limit.window_ms);
    let limit = state.settings.rate_limit.max_requests;
    let count = kv_increment(&state, &key, window).await;
    let remaining = (i64::from(limit) - count).max(0);
    let reset = state.clock.unix_timestamp() + window.as_secs() as i64;

    if count > i64::from(limit) {
        let (http_req, _) = req.into_parts();
        let response = json_error(StatusCode::TOO_MANY_REQUESTS, "rate_limited", "too many requests", &request_id);
        let mut res = ServiceResponse::new(http_req, response).map_into_right_body();
        set_rate_limit_headers(&mut res, limit, remaining, reset);
        return Ok(res);
    }

    let mut res = next.call(req).await?.map_into_left_body();
    set_rate_limit_headers(&mut res, limit, remaining, reset);
    Ok(res)
}

fn set_rate_limit_headers<B>(res: &mut ServiceResponse<B>, limit: u32, remaining: i64, reset: i64) {
    let headers = res.headers_mut();
    if let Ok(v) = HeaderValue::from_str(&limit.to_string()) {
        headers.insert(HeaderName::from_static("x-ratelimit-limit"), v);
    }
    if let Ok(v) = HeaderValue::from_str(&remaining.to_string()) {
        headers.insert(HeaderName::from_static("x-ratelimit-remaining"), v);
    }
    if let Ok(v) = HeaderValue::from_str(&reset.to_string()) {
        headers.insert(HeaderName::from_static("x-ratelimit-reset"), v);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::middleware::from_fn;
    use actix_web::{test, App, HttpResponse};
    use redis_interface::kv::KvBackend;
    use storage_impl::mock_db::MockDb;
    use uuid::Uuid;

    use super::*;
    use crate::configs::{RateLimit, Settings};

    async fn stamp_merchant(mut req: ServiceRequest, next: actix_web::middleware::Next<impl MessageBody>) -> Result<ServiceResponse<impl MessageBody>, Error> {
        req.extensions_mut().insert(AuthenticatedMerchant { merchant_id: Uuid::nil(), key_type: hyperswitch_domain_models::api_key::KeyType::Secret, api_key_id: Uuid::nil() });
        next.call(req).await
    }

    async fn ok() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    fn test_app_state(max_requests: u32) -> AppState {
        let store: Arc<dyn StorageInterface> = Arc::new(MockDb::new());
        let settings = Settings { rate_limit: RateLimit { max_requests, window_ms: 60_000 }, ..Settings::default() };
        AppState::new(store, KvBackend::None, settings)
    }

    #[actix_web::test]
    async fn requests_within_the_window_pass_through_with_headers() {
        let state = test_app_state(2);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .wrap(from_fn(rate_limit))
                .wrap(from_fn(stamp_merchant))
                .route("/api/v1/widgets", web::get().to(ok)),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/widgets").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers().get("x-ratelimit-limit").unwrap(), "2");
        assert_eq!(res.headers().get("x-ratelimit-remaining").unwrap(), "1");
    }

    #[actix_web::test]
    async fn exceeding_the_window_is_rejected_with_429() {
        let state = test_app_state(1);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .wrap(from_fn(rate_limit))
                .wrap(from_fn(stamp_merchant))
                .route("/api/v1/widgets", web::get().to(ok)),
        )
        .await;

        let first = test::TestRequest::get().uri("/api/v1/widgets").to_request();
        assert_eq!(test::call_service(&app, first).await.status(), StatusCode::OK);

        let second = test::TestRequest::get().uri("/api/v1/widgets").to_request();
        let res = test::call_service(&app, second).await;
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(res.headers().get("x-ratelimit-remaining").unwrap(), "0");
    }

    #[actix_web::test]
    async fn unauthenticated_requests_are_never_rate_limited() {
        let state = test_app_state(1);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .wrap(from_fn(rate_limit))
                .route("/api/v1/widgets", web::get().to(ok)),
        )
        .await;

        for _ in 0..3 {
            let req = test::TestRequest::get().uri("/api/v1/widgets").to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        }
    }
}
