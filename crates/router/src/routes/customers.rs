//! `/api/v1/customers/*` (§4.10): a thin pass-through CRUD over
//! [`crate::customer_directory::CustomerDirectory`]. No adapter call, no
//! orchestrator state machine — customers are not part of the acquirer
//! contract this system owns.

use actix_web::{web, HttpRequest, HttpResponse};
use uuid::Uuid;

use super::{request_id_of, ListResponse, Pagination};
use crate::app_state::AppState;
use crate::customer_directory::{CreateCustomerRequest, CustomerSearchQuery, UpdateCustomerRequest};
use crate::middleware::auth::Authed;
use crate::middleware::json_error;

#[tracing::instrument(skip_all)]
pub async fn create(state: web::Data<AppState>, auth: Authed, body: web::Json<CreateCustomerRequest>) -> HttpResponse {
    let customer = state.customers.create(auth.0.merchant_id, body.into_inner()).await;
    HttpResponse::Created().json(customer)
}

#[tracing::instrument(skip_all)]
pub async fn retrieve(http_req: HttpRequest, state: web::Data<AppState>, auth: Authed, path: web::Path<Uuid>) -> HttpResponse {
    match state.customers.find(auth.0.merchant_id, path.into_inner()).await {
        Some(customer) => HttpResponse::Ok().json(customer),
        None => not_found(&http_req),
    }
}

#[tracing::instrument(skip_all)]
pub async fn update(
    http_req: HttpRequest,
    state: web::Data<AppState>,
    auth: Authed,
    path: web::Path<Uuid>,
    body: web::Json<UpdateCustomerRequest>,
) -> HttpResponse {
    match state.customers.update(auth.0.merchant_id, path.into_inner(), body.into_inner()).await {
        Some(customer) => HttpResponse::Ok().json(customer),
        None => not_found(&http_req),
    }
}

#[tracing::instrument(skip_all)]
pub async fn delete(http_req: HttpRequest, state: web::Data<AppState>, auth: Authed, path: web::Path<Uuid>) -> HttpResponse {
    if state.customers.delete(auth.0.merchant_id, path.into_inner()).await {
        HttpResponse::Ok().json(serde_json::json!({"deleted": true}))
    } else {
        not_found(&http_req)
    }
}

#[tracing::instrument(skip_all)]
pub async fn list(state: web::Data<AppState>, auth: Authed, query: web::Query<Pagination>, search: web::Query<CustomerSearchQuery>) -> HttpResponse {
    let (customers, total_count) = state
        .customers
        .list(auth.0.merchant_id, &search, query.limit as usize, query.offset as usize)
        .await;
    HttpResponse::Ok().json(ListResponse::new(customers, total_count as i64, &query))
}

fn not_found(http_req: &HttpRequest) -> HttpResponse {
    json_error(actix_web::http::StatusCode::NOT_FOUND, "invalid_request_error", "no such customer", &request_id_of(http_req))
}
