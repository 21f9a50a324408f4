//! `/api/v1/payment_intents/*` (§4.10): thin handlers over the
//! orchestrator's five entry points plus the plain repository CRUD that
//! never touches an adapter.

use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use error_stack::ResultExt;
use hyperswitch_domain_models::enums::IntentStatus;
use hyperswitch_domain_models::errors::{ApiErrorResponse, ApplicationResponse, RouterResponse, StorageErrorExt};
use hyperswitch_domain_models::payment_intent::{
    CaptureRequest, CompleteAuthenticationRequest, ConfirmPaymentIntentRequest, CreatePaymentIntentRequest, PaymentIntent,
    UpdatePaymentIntentRequest,
};
use serde::Serialize;
use storage_impl::{PaymentIntentUpdate, StorageInterface};
use uuid::Uuid;

use super::{request_id_of, ListResponse, Pagination};
use crate::app_state::AppState;
use crate::core::orchestrator;
use crate::middleware::auth::Authed;

#[derive(Serialize)]
struct RedirectToUrl {
    url: String,
    return_url: Option<String>,
}

#[derive(Serialize)]
struct NextAction {
    redirect_to_url: RedirectToUrl,
}

/// Decorates a `requires_action` intent with `next_action.redirect_to_url`
/// (§4.10); every other status is returned as plain `PaymentIntent` JSON.
fn decorate(intent: PaymentIntent) -> serde_json::Value {
    let mut value = serde_json::to_value(&intent).unwrap_or(serde_json::Value::Null);
    if intent.status == IntentStatus::RequiresAction {
        if let Some(three_ds) = &intent.metadata.three_ds {
            let next_action = NextAction {
                redirect_to_url: RedirectToUrl { url: three_ds.redirect_url.clone(), return_url: three_ds.return_url.clone() },
            };
            if let (Some(object), Ok(next_action)) = (value.as_object_mut(), serde_json::to_value(&next_action)) {
                object.insert("next_action".to_string(), next_action);
            }
        }
    }
    value
}

fn respond_intent(result: RouterResponse<PaymentIntent>, request_id: &str) -> HttpResponse {
    match result {
        Ok(ApplicationResponse::Json(intent)) => HttpResponse::Ok().json(decorate(intent)),
        Ok(ApplicationResponse::JsonWithStatusCode(intent, code)) => {
            HttpResponse::build(StatusCode::from_u16(code).unwrap_or(StatusCode::OK)).json(decorate(intent))
        }
        Err(report) => super::error_response(&report, request_id),
    }
}

#[tracing::instrument(skip_all)]
pub async fn create(http_req: HttpRequest, state: web::Data<AppState>, auth: Authed, body: web::Json<CreatePaymentIntentRequest>) -> HttpResponse {
    let request = body.into_inner();
    if request.amount <= 0 {
        return super::error_response(
            &error_stack::report!(ApiErrorResponse::ValidationError {
                message: "amount must be greater than zero".to_string(),
                param: Some("amount".to_string()),
            }),
            &request_id_of(&http_req),
        );
    }
    let now = state.clock.now();
    let intent = PaymentIntent {
        id: common_utils::ids::new_uuid(),
        merchant_id: auth.0.merchant_id,
        customer_id: request.customer_id,
        amount: hyperswitch_domain_models::money::MinorUnit::new(request.amount),
        currency: request.currency,
        capture_method: request.capture_method,
        confirmation_method: request.confirmation_method,
        status: IntentStatus::RequiresPaymentMethod,
        payment_method: None,
        acquirer_routing: Default::default(),
        metadata: hyperswitch_domain_models::payment_intent::PaymentIntentMetadata { three_ds: None, extra: request.metadata },
        description: request.description,
        created_at: now,
        modified_at: now,
    };
    match state.store.insert_payment_intent(intent).await.change_context(ApiErrorResponse::InternalServerError) {
        Ok(intent) => HttpResponse::Created().json(decorate(intent)),
        Err(report) => super::error_response(&report, &request_id_of(&http_req)),
    }
}

#[tracing::instrument(skip_all)]
pub async fn retrieve(http_req: HttpRequest, state: web::Data<AppState>, auth: Authed, path: web::Path<Uuid>) -> HttpResponse {
    let result = state
        .store
        .find_payment_intent_by_id(auth.0.merchant_id, path.into_inner())
        .await
        .to_not_found_response(ApiErrorResponse::NotFound { message: "no such payment intent".to_string() })
        .map(ApplicationResponse::Json);
    respond_intent(result, &request_id_of(&http_req))
}

#[tracing::instrument(skip_all)]
pub async fn list(http_req: HttpRequest, state: web::Data<AppState>, auth: Authed, query: web::Query<Pagination>) -> HttpResponse {
    match state
        .store
        .list_payment_intents(auth.0.merchant_id, query.limit, query.offset)
        .await
        .change_context(ApiErrorResponse::InternalServerError)
    {
        Ok((intents, total_count)) => {
            let data: Vec<serde_json::Value> = intents.into_iter().map(decorate).collect();
            HttpResponse::Ok().json(ListResponse::new(data, total_count, &query))
        }
        Err(report) => super::error_response(&report, &request_id_of(&http_req)),
    }
}

#[tracing::instrument(skip_all)]
pub async fn update(
    http_req: HttpRequest,
    state: web::Data<AppState>,
    auth: Authed,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePaymentIntentRequest>,
) -> HttpResponse {
    let merchant_id = auth.0.merchant_id;
    let id = path.into_inner();
    let request_id = request_id_of(&http_req);

    let intent = match state
        .store
        .find_payment_intent_by_id(merchant_id, id)
        .await
        .to_not_found_response(ApiErrorResponse::NotFound { message: "no such payment intent".to_string() })
    {
        Ok(intent) => intent,
        Err(report) => return super::error_response(&report, &request_id),
    };
    if intent.is_terminal() {
        return super::error_response(
            &error_stack::report!(ApiErrorResponse::InvalidState {
                message: format!("cannot update a payment intent in status `{}`", intent.status),
            }),
            &request_id,
        );
    }
    let request = body.into_inner();
    let update = PaymentIntentUpdate {
        amount: request.amount.map(hyperswitch_domain_models::money::MinorUnit::new),
        description: request.description,
        metadata: request.metadata.map(|extra| hyperswitch_domain_models::payment_intent::PaymentIntentMetadata {
            three_ds: intent.metadata.three_ds.clone(),
            extra,
        }),
        ..Default::default()
    };
    let result = state
        .store
        .update_payment_intent_conditional(merchant_id, id, None, update)
        .await
        .to_not_found_response(ApiErrorResponse::InvalidState { message: "payment intent changed concurrently".to_string() })
        .map(ApplicationResponse::Json);
    respond_intent(result, &request_id)
}

#[tracing::instrument(skip_all)]
pub async fn confirm(
    http_req: HttpRequest,
    state: web::Data<AppState>,
    auth: Authed,
    path: web::Path<Uuid>,
    body: web::Json<ConfirmPaymentIntentRequest>,
) -> HttpResponse {
    let request_id = request_id_of(&http_req);
    let result = orchestrator::confirm(&state, auth.0.merchant_id, path.into_inner(), request_id.clone(), body.into_inner()).await;
    respond_intent(result, &request_id)
}

#[tracing::instrument(skip_all)]
pub async fn complete_authentication(
    http_req: HttpRequest,
    state: web::Data<AppState>,
    auth: Authed,
    path: web::Path<Uuid>,
    body: web::Json<CompleteAuthenticationRequest>,
) -> HttpResponse {
    let request_id = request_id_of(&http_req);
    let result = orchestrator::complete_authentication(&state, auth.0.merchant_id, path.into_inner(), request_id.clone(), body.into_inner()).await;
    respond_intent(result, &request_id)
}

#[tracing::instrument(skip_all)]
pub async fn capture(
    http_req: HttpRequest,
    state: web::Data<AppState>,
    auth: Authed,
    path: web::Path<Uuid>,
    body: web::Json<CaptureRequest>,
) -> HttpResponse {
    let request_id = request_id_of(&http_req);
    let result = orchestrator::capture(&state, auth.0.merchant_id, path.into_inner(), request_id.clone(), body.into_inner()).await;
    respond_intent(result, &request_id)
}

#[tracing::instrument(skip_all)]
pub async fn cancel(http_req: HttpRequest, state: web::Data<AppState>, auth: Authed, path: web::Path<Uuid>) -> HttpResponse {
    let request_id = request_id_of(&http_req);
    let result = orchestrator::cancel(&state, auth.0.merchant_id, path.into_inner(), request_id.clone()).await;
    respond_intent(result, &request_id)
}
