//! §4.9 step 7: one best-effort row per request, recorded after the
//! handler runs. A failure to write it never touches the response
//! already computed.

use std::time::Instant;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Next;
use actix_web::{web, Error};
use hyperswitch_domain_models::api_key::AuthenticatedMerchant;
use storage_impl::{AccessLogEntry, StorageInterface};

use super::RequestId;
use crate::app_state::AppState;

pub async fn access_log(req: ServiceRequest, next: Next<impl MessageBody>) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let start = Instant::now();
    let request_id = req.extensions().get::<RequestId>().map(|r| r.0.clone()).unwrap_or_default();
    let route = req.match_pattern().unwrap_or_else(|| req.path().to_string());
    let method = req.method().to_string();
    let ip = req.connection_info().realip_remote_addr().map(str::to_string);
    let user_agent = req
        .headers()
        .get(actix_web::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let idempotency_key = req.headers().get("Idempotency-Key").and_then(|v| v.to_str().ok()).map(str::to_string);
    let state = req.app_data::<web::Data<AppState>>().cloned();

    let res = next.call(req).await?;
    let status = res.status().as_u16();
    let merchant_id = res.request().extensions().get::<AuthenticatedMerchant>().map(|m| m.merchant_id);

    if let Some(state) = state {
        let entry = AccessLogEntry {
            request_id,
            merchant_id,
            route,
            method,
            status,
            duration_ms: start.elapsed().as_millis() as u64,
            ip,
            user_agent,
            idempotency_key,
            created_at: state.clock.now(),
        };
        if let Err(error) = state.store.insert_access_log(entry).await {
            router_env::logger::warn!(error = ?error, "failed to record an access log entry");
        }
    }

    Ok(res)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::middleware::from_fn;
    use actix_web::{test, App, HttpResponse};
    use redis_interface::kv::KvBackend;
    use storage_impl::mock_db::MockDb;

    use super::*;
    use crate::configs::Settings;

    async fn ok() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    #[actix_web::test]
    async fn a_request_records_one_access_log_row() {
        let mock_db = Arc::new(MockDb::new());
        let store: Arc<dyn StorageInterface> = mock_db.clone();
        let state = AppState::new(store, KvBackend::None, Settings::default());
        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).wrap(from_fn(access_log)).route("/api/v1/widgets", web::get().to(ok)),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/widgets").to_request();
        test::call_service(&app, req).await;

        assert_eq!(mock_db.access_log_count().await, 1);
    }
}
