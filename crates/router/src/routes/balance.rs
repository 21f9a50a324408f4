//! `/api/v1/balance/*` (§4.10): read-only aggregations over
//! [`crate::balance_ledger::BalanceLedger`], populated by the
//! orchestrator as charges settle and refunds land.

use actix_web::{web, HttpRequest, HttpResponse};
use uuid::Uuid;

use super::{request_id_of, ListResponse, Pagination};
use crate::app_state::AppState;
use crate::middleware::auth::Authed;
use crate::middleware::json_error;

#[tracing::instrument(skip_all)]
pub async fn list_transactions(state: web::Data<AppState>, auth: Authed, query: web::Query<Pagination>) -> HttpResponse {
    let (transactions, total_count) = state.balance.list(auth.0.merchant_id, query.limit, query.offset).await;
    HttpResponse::Ok().json(ListResponse::new(transactions, total_count, &query))
}

#[tracing::instrument(skip_all)]
pub async fn retrieve_transaction(http_req: HttpRequest, state: web::Data<AppState>, auth: Authed, path: web::Path<Uuid>) -> HttpResponse {
    match state.balance.find(auth.0.merchant_id, path.into_inner()).await {
        Some(transaction) => HttpResponse::Ok().json(transaction),
        None => json_error(
            actix_web::http::StatusCode::NOT_FOUND,
            "invalid_request_error",
            "no such balance transaction",
            &request_id_of(&http_req),
        ),
    }
}

#[tracing::instrument(skip_all)]
pub async fn summary(state: web::Data<AppState>, auth: Authed) -> HttpResponse {
    HttpResponse::Ok().json(state.balance.summary(auth.0.merchant_id).await)
}
