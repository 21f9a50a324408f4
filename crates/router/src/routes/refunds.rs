//! `/api/v1/refunds/*` (§4.10): create goes through the orchestrator
//! (it calls the adapter); retrieve/list are plain repository reads.

use actix_web::{web, HttpRequest, HttpResponse};
use error_stack::ResultExt;
use hyperswitch_domain_models::errors::{ApiErrorResponse, ApplicationResponse, StorageErrorExt};
use hyperswitch_domain_models::refund::CreateRefundRequest;
use uuid::Uuid;

use super::{request_id_of, respond, ListResponse, Pagination};
use crate::app_state::AppState;
use crate::core::orchestrator;
use crate::middleware::auth::Authed;

#[tracing::instrument(skip_all)]
pub async fn create(http_req: HttpRequest, state: web::Data<AppState>, auth: Authed, body: web::Json<CreateRefundRequest>) -> HttpResponse {
    let request_id = request_id_of(&http_req);
    let result = orchestrator::refund(&state, auth.0.merchant_id, request_id.clone(), body.into_inner()).await;
    respond(result, &request_id)
}

#[tracing::instrument(skip_all)]
pub async fn retrieve(http_req: HttpRequest, state: web::Data<AppState>, auth: Authed, path: web::Path<Uuid>) -> HttpResponse {
    let result = state
        .store
        .find_refund_by_id(auth.0.merchant_id, path.into_inner())
        .await
        .to_not_found_response(ApiErrorResponse::NotFound { message: "no such refund".to_string() })
        .map(ApplicationResponse::Json);
    respond(result, &request_id_of(&http_req))
}

#[tracing::instrument(skip_all)]
pub async fn list(http_req: HttpRequest, state: web::Data<AppState>, auth: Authed, query: web::Query<Pagination>) -> HttpResponse {
    match state
        .store
        .list_refunds(auth.0.merchant_id, query.limit, query.offset)
        .await
        .change_context(ApiErrorResponse::InternalServerError)
    {
        Ok((refunds, total_count)) => HttpResponse::Ok().json(ListResponse::new(refunds, total_count, &query)),
        Err(report) => super::error_response(&report, &request_id_of(&http_req)),
    }
}
