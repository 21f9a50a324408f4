//! `GET /` (§4.10): unauthenticated liveness probe, outside `/api/v1` and
//! outside the middleware pipeline entirely.

use actix_web::HttpResponse;
use serde::Serialize;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    environment: router_env::Env,
}

#[tracing::instrument(skip_all)]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse { status: "ok", environment: router_env::config::current_env() })
}
