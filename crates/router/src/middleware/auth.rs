//! §4.9 step 4: API key authentication, only on `/api/v1/*`. A `sk_`
//! token is looked up by `sha256(token)` in hex so the plaintext key is
//! never stored; a `pk_` token is looked up verbatim. Anything else, or
//! an inactive/missing key, is rejected before the handler ever runs.

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::middleware::Next;
use actix_web::{web, Error};
use common_utils::date_time::Clock;
use hyperswitch_domain_models::api_key::{AuthenticatedMerchant, KeyType};
use storage_impl::StorageInterface;

use super::{json_error, API_PREFIX};
use crate::app_state::AppState;

/// Extractor wrapping `AuthenticatedMerchant` (defined outside this
/// crate, hence the newtype) so handlers can pull it out of the request
/// the way they pull out `web::Path`/`web::Json`.
pub struct Authed(pub AuthenticatedMerchant);

impl actix_web::FromRequest for Authed {
    type Error = actix_web::Error;
    type Future = std::future::Ready<Result<Self, Self::Error>>;

    fn from_request(req: &actix_web::HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let result = req
            .extensions()
            .get::<AuthenticatedMerchant>()
            .cloned()
            .map(Authed)
            .ok_or_else(|| actix_web::error::ErrorUnauthorized("missing or invalid api key"));
        std::future::ready(result)
    }
}

pub async fn authenticate(req: ServiceRequest, next: Next<impl MessageBody>) -> Result<ServiceResponse<impl MessageBody>, Error> {
    if !req.path().starts_with(API_PREFIX) {
        return Ok(next.call(req).await?.map_into_left_body());
    }

    let request_id = req
        .extensions()
        .get::<super::RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_default();

    let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
        let (http_req, _) = req.into_parts();
        let response = json_error(StatusCode::INTERNAL_SERVER_ERROR, "api_error", "server misconfigured", &request_id);
        return Ok(ServiceResponse::new(http_req, response).map_into_right_body());
    };

    let token = req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let Some(token) = token else {
        let (http_req, _) = req.into_parts();
        let response = json_error(StatusCode::UNAUTHORIZED, "authentication_error", "missing or invalid api key", &request_id);
        return Ok(ServiceResponse::new(http_req, response).map_into_right_body());
    };

    let Some(key_type) = KeyType::from_prefix(token) else {
        let (http_req, _) = req.into_parts();
        let response = json_error(StatusCode::UNAUTHORIZED, "authentication_error", "missing or invalid api key", &request_id);
        return Ok(ServiceResponse::new(http_req, response).map_into_right_body());
    };

    let lookup_value = match key_type {
        KeyType::Secret => common_utils::crypto::sha256_hex(token.as_bytes()),
        KeyType::Public => token.to_string(),
    };

    let found = state.store.find_active_api_key(key_type, &lookup_value).await;
    let Ok(api_key) = found else {
        let (http_req, _) = req.into_parts();
        let response = json_error(StatusCode::UNAUTHORIZED, "authentication_error", "missing or invalid api key", &request_id);
        return Ok(ServiceResponse::new(http_req, response).map_into_right_body());
    };

    // Best-effort: auth must not fail the request if this write fails.
    let _ = state.store.touch_api_key(api_key.id, state.clock.now()).await;

    let (http_req, payload) = req.into_parts();
    http_req.extensions_mut().insert(AuthenticatedMerchant {
        merchant_id: api_key.merchant_id,
        key_type: api_key.key_type,
        api_key_id: api_key.id,
    });
    let req = ServiceRequest::from_parts(http_req, payload);
    Ok(next.call(req).await?.map_into_left_body())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::middleware::from_fn;
    use actix_web::{test, web, App, HttpResponse};
    use masking::Secret;
    use redis_interface::kv::KvBackend;
    use storage_impl::mock_db::MockDb;
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::*;
    use crate::configs::Settings;

    async fn echo(authed: Authed) -> HttpResponse {
        HttpResponse::Ok().body(authed.0.merchant_id.to_string())
    }

    async fn ok() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    async fn test_state_with_secret_key() -> (AppState, Uuid, String) {
        let mock_db = Arc::new(MockDb::new());
        let merchant_id = Uuid::new_v4();
        let token = "sk_test_abc123".to_string();
        mock_db
            .seed_api_key(hyperswitch_domain_models::api_key::ApiKey {
                id: Uuid::new_v4(),
                merchant_id,
                key_type: KeyType::Secret,
                lookup_value: Secret::new(common_utils::crypto::sha256_hex(token.as_bytes())),
                is_active: true,
                last_used_at: None,
                created_at: OffsetDateTime::now_utc(),
            })
            .await;
        let store: Arc<dyn StorageInterface> = mock_db;
        let state = AppState::new(store, KvBackend::None, Settings::default());
        (state, merchant_id, token)
    }

    #[actix_web::test]
    async fn a_valid_secret_key_authenticates_the_merchant() {
        let (state, merchant_id, token) = test_state_with_secret_key().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .wrap(from_fn(authenticate))
                .route("/api/v1/echo", web::get().to(echo)),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/api/v1/echo")
            .insert_header((actix_web::http::header::AUTHORIZATION, format!("Bearer {token}")))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = test::read_body(res).await;
        assert_eq!(body, merchant_id.to_string().as_bytes());
    }

    #[actix_web::test]
    async fn a_missing_bearer_token_is_unauthorized() {
        let (state, _, _) = test_state_with_secret_key().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .wrap(from_fn(authenticate))
                .route("/api/v1/echo", web::get().to(echo)),
        )
        .await;
        let req = test::TestRequest::get().uri("/api/v1/echo").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn an_unknown_key_is_unauthorized() {
        let (state, _, _) = test_state_with_secret_key().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .wrap(from_fn(authenticate))
                .route("/api/v1/echo", web::get().to(echo)),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/api/v1/echo")
            .insert_header((actix_web::http::header::AUTHORIZATION, "Bearer sk_does_not_exist"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn requests_outside_the_api_prefix_are_never_authenticated() {
        let (state, _, _) = test_state_with_secret_key().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .wrap(from_fn(authenticate))
                .route("/", web::get().to(ok)),
        )
        .await;
        let req = test::TestRequest::get().uri("/").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}
