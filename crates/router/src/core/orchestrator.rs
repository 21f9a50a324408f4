//! The state machine driving the acquirer contract (§4.8): five entry
//! points, each loading its aggregate, picking/reusing a route, calling
//! the adapter, and folding the outcome into a state transition plus an
//! emitted event. No operation here rolls back on an event-emission
//! failure; those are logged by `events::emit_event` and otherwise
//! ignored.

use error_stack::{report, ResultExt};
use hyperswitch_domain_models::charge::Charge;
use hyperswitch_domain_models::connector_types::{
    AcquirerRoute, AuthorizeInput, AuthorizeOutcome, CaptureInput, ContinueInput, RefundInput, RequestContext,
    SettlementOutcome, ThreeDsHints, VoidInput,
};
use hyperswitch_domain_models::enums::{ChargeStatus, IntentStatus, RefundStatus};
use hyperswitch_domain_models::errors::{ApiErrorResponse, ApplicationResponse, RouterResponse, StorageErrorExt};
use hyperswitch_domain_models::events as event_types;
use hyperswitch_domain_models::merchant::Merchant;
use hyperswitch_domain_models::money::MinorUnit;
use hyperswitch_domain_models::payment_intent::{
    AcquirerRouting, CaptureRequest, CompleteAuthenticationRequest, ConfirmPaymentIntentRequest, PaymentIntent,
    PaymentIntentMetadata, SelectedRoute, ThreeDsContinuation,
};
use hyperswitch_domain_models::payment_method::{CardDetails, PaymentMethodDisplay, PaymentMethodInput, TokenReference};
use hyperswitch_domain_models::refund::{CreateRefundRequest, Refund};
use hyperswitch_interfaces::connector_integration::PaymentConnector;
use redis_interface::kv::KvBackend;
use storage_impl::{ChargeUpdate, PaymentIntentUpdate};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::core::{events::emit_event, routing::pick_route};

/// Turns a `ConnectorError` (transport/capability failure) into the
/// HTTP-facing taxonomy. Distinct from a domain decline, which arrives as
/// an `Outcome::Failed` and is handled separately at each call site.
fn adapter_error(error: hyperswitch_domain_models::errors::ConnectorError) -> error_stack::Report<ApiErrorResponse> {
    use hyperswitch_domain_models::errors::ConnectorError;
    match error {
        ConnectorError::Timeout => report!(ApiErrorResponse::Timeout),
        ConnectorError::NotFound(_) | ConnectorError::CapabilityNotSupported(..) => {
            report!(ApiErrorResponse::InvalidRequestError { message: error.to_string() })
        }
        ConnectorError::RequestEncodingFailed
        | ConnectorError::ResponseDeserializationFailed
        | ConnectorError::TransportError(_) => report!(ApiErrorResponse::InternalServerError),
    }
}

async fn load_merchant(state: &AppState, merchant_id: Uuid) -> Result<Merchant, error_stack::Report<ApiErrorResponse>> {
    state
        .store
        .find_merchant_by_id(merchant_id)
        .await
        .to_not_found_response(ApiErrorResponse::NotFound { message: "no such merchant".to_string() })
}

fn route_for(selected: &SelectedRoute, merchant: &Merchant) -> AcquirerRoute {
    let config = merchant
        .routing_config
        .enabled_adapter(&selected.adapter)
        .map(|entry| entry.config.clone())
        .unwrap_or_else(|| serde_json::json!({}));
    AcquirerRoute {
        adapter: selected.adapter.clone(),
        merchant_ref: selected.merchant_ref.clone(),
        config,
    }
}

/// §4.8 step 4: a `tok_`-prefixed reference is a single-use pointer into
/// the Key/Value port. Resolves and immediately deletes it; PAN and CVC
/// never reach the repository either way.
async fn resolve_payment_method(
    state: &AppState,
    input: PaymentMethodInput,
) -> Result<CardDetails, error_stack::Report<ApiErrorResponse>> {
    match input {
        PaymentMethodInput::Card(card) => Ok(card),
        PaymentMethodInput::Token(token) => {
            if !TokenReference::is_token(&token) {
                return Err(report!(ApiErrorResponse::ValidationError {
                    message: "payment_method token must be prefixed `tok_`".to_string(),
                    param: Some("payment_method".to_string()),
                }));
            }
            consume_token(state, &token).await
        }
    }
}

async fn consume_token(state: &AppState, token: &str) -> Result<CardDetails, error_stack::Report<ApiErrorResponse>> {
    let key = format!("token:{token}");
    let raw = match state.kv.as_ref() {
        KvBackend::Redis(store) => store.get(&key).await.ok().flatten(),
        KvBackend::None => state.kv_fallback.get(&key),
    };
    let raw = raw.ok_or_else(|| {
        report!(ApiErrorResponse::InvalidRequestError {
            message: "unknown or already-used token reference".to_string(),
        })
    })?;
    match state.kv.as_ref() {
        KvBackend::Redis(store) => {
            let _ = store.delete(&key).await;
        }
        KvBackend::None => state.kv_fallback.delete(&key),
    }
    serde_json::from_str::<CardDetails>(&raw).change_context(ApiErrorResponse::InternalServerError)
}

fn to_json(value: &impl serde::Serialize) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

/// **Confirm** (§4.8): the only entry point that calls `adapter.Authorize`.
pub async fn confirm(
    state: &AppState,
    merchant_id: Uuid,
    payment_intent_id: Uuid,
    request_id: String,
    request: ConfirmPaymentIntentRequest,
) -> RouterResponse<PaymentIntent> {
    let intent = state
        .store
        .find_payment_intent_by_id(merchant_id, payment_intent_id)
        .await
        .to_not_found_response(ApiErrorResponse::NotFound { message: "no such payment intent".to_string() })?;

    if intent.status != IntentStatus::RequiresPaymentMethod {
        return Err(report!(ApiErrorResponse::InvalidState {
            message: format!("cannot confirm a payment intent in status `{}`", intent.status),
        }));
    }
    if intent.amount.is_zero() {
        return Err(report!(ApiErrorResponse::ValidationError {
            message: "amount must be greater than zero".to_string(),
            param: Some("amount".to_string()),
        }));
    }

    let merchant = load_merchant(state, merchant_id).await?;
    let route = pick_route(&intent, &merchant.routing_config, &state.settings);
    let adapter = state.registry.get(&route.adapter).map_err(adapter_error)?;

    let card = resolve_payment_method(state, request.payment_method).await?;
    let display = PaymentMethodDisplay::from(&card);

    let authorize_input = AuthorizeInput {
        context: RequestContext { request_id: request_id.clone(), merchant_id },
        payment_intent_id: intent.id,
        amount: intent.amount,
        currency: intent.currency,
        payment_method: hyperswitch_domain_models::connector_types::CardPaymentMethodData {
            network: None,
            brand: Some(card.brand()),
            last4: Some(card.last4()),
            exp_month: card.card_exp_month.clone(),
            exp_year: card.card_exp_year.clone(),
            card_number: Some(card.card_number.clone()),
            card_cvc: Some(card.card_cvc.clone()),
            tokenization_reference: None,
        },
        customer: None,
        billing_address: request.billing_details.clone(),
        three_ds_hints: request
            .return_url
            .clone()
            .map(|return_url| ThreeDsHints { return_url: Some(return_url) }),
        route: route.clone(),
        statement_descriptor: None,
        metadata: intent.metadata.extra.clone(),
    };

    let output = adapter.authorize(authorize_input).await.map_err(adapter_error)?;
    let selected_route = SelectedRoute { adapter: route.adapter.clone(), merchant_ref: route.merchant_ref.clone() };
    let now = state.clock.now();

    let updated = match output.outcome {
        AuthorizeOutcome::Authorized { amount_authorized, acquirer_reference, authorization_code, network, processor_response } => {
            let charge_status = if intent.capture_method == hyperswitch_domain_models::enums::CaptureMethod::Automatic {
                ChargeStatus::Captured
            } else {
                ChargeStatus::Authorized
            };
            let amount_captured = if charge_status == ChargeStatus::Captured { amount_authorized } else { MinorUnit::new(0) };
            let charge = Charge {
                id: common_utils::ids::new_uuid(),
                merchant_id,
                payment_intent_id: intent.id,
                amount_authorized,
                amount_captured,
                amount_refunded: MinorUnit::new(0),
                currency: intent.currency,
                status: charge_status,
                acquirer_name: route.adapter.clone(),
                acquirer_reference,
                authorization_code,
                network,
                processor_response,
                created_at: now,
                modified_at: now,
            };
            state.store.insert_charge(charge.clone()).await.change_context(ApiErrorResponse::InternalServerError)?;

            let new_status = if charge_status == ChargeStatus::Captured { IntentStatus::Succeeded } else { IntentStatus::Processing };
            let updated = state
                .store
                .update_payment_intent_conditional(
                    merchant_id,
                    intent.id,
                    Some(IntentStatus::RequiresPaymentMethod),
                    PaymentIntentUpdate {
                        status: Some(new_status),
                        payment_method: Some(display),
                        acquirer_routing: Some(AcquirerRouting { selected_route: Some(selected_route) }),
                        ..Default::default()
                    },
                )
                .await
                .to_not_found_response(ApiErrorResponse::InvalidState {
                    message: "payment intent changed concurrently".to_string(),
                })?;

            if charge_status == ChargeStatus::Captured {
                state.balance.record(merchant_id, crate::balance_ledger::BalanceTransactionType::Charge, amount_captured, charge.currency, charge.id, now).await;
            }
            emit_event(state.store.as_ref(), state.clock.as_ref(), merchant_id, event_types::charge::AUTHORIZED, to_json(&charge)).await;
            let intent_event = if new_status == IntentStatus::Succeeded { event_types::payment_intent::SUCCEEDED } else { event_types::payment_intent::PROCESSING };
            emit_event(state.store.as_ref(), state.clock.as_ref(), merchant_id, intent_event, to_json(&updated)).await;
            updated
        }
        AuthorizeOutcome::RequiresAction { acquirer_reference, three_ds } => {
            let metadata = PaymentIntentMetadata {
                three_ds: Some(ThreeDsContinuation {
                    flow: three_ds.flow,
                    redirect_url: three_ds.redirect_url,
                    method_url: three_ds.method_url,
                    data: three_ds.data,
                    return_url: request.return_url.clone(),
                    acquirer_reference,
                }),
                extra: intent.metadata.extra.clone(),
            };
            let updated = state
                .store
                .update_payment_intent_conditional(
                    merchant_id,
                    intent.id,
                    Some(IntentStatus::RequiresPaymentMethod),
                    PaymentIntentUpdate {
                        status: Some(IntentStatus::RequiresAction),
                        payment_method: Some(display),
                        acquirer_routing: Some(AcquirerRouting { selected_route: Some(selected_route) }),
                        metadata: Some(metadata),
                        ..Default::default()
                    },
                )
                .await
                .to_not_found_response(ApiErrorResponse::InvalidState {
                    message: "payment intent changed concurrently".to_string(),
                })?;
            emit_event(state.store.as_ref(), state.clock.as_ref(), merchant_id, event_types::payment_intent::REQUIRES_ACTION, to_json(&updated)).await;
            updated
        }
        AuthorizeOutcome::Failed { processor_response } => {
            let charge = Charge {
                id: common_utils::ids::new_uuid(),
                merchant_id,
                payment_intent_id: intent.id,
                amount_authorized: intent.amount,
                amount_captured: MinorUnit::new(0),
                amount_refunded: MinorUnit::new(0),
                currency: intent.currency,
                status: ChargeStatus::Failed,
                acquirer_name: route.adapter.clone(),
                acquirer_reference: None,
                authorization_code: None,
                network: None,
                processor_response: processor_response.clone(),
                created_at: now,
                modified_at: now,
            };
            state.store.insert_charge(charge.clone()).await.change_context(ApiErrorResponse::InternalServerError)?;
            let updated = state
                .store
                .update_payment_intent_conditional(
                    merchant_id,
                    intent.id,
                    Some(IntentStatus::RequiresPaymentMethod),
                    PaymentIntentUpdate {
                        status: Some(IntentStatus::Failed),
                        payment_method: Some(display),
                        acquirer_routing: Some(AcquirerRouting { selected_route: Some(selected_route) }),
                        ..Default::default()
                    },
                )
                .await
                .to_not_found_response(ApiErrorResponse::InvalidState {
                    message: "payment intent changed concurrently".to_string(),
                })?;
            emit_event(state.store.as_ref(), state.clock.as_ref(), merchant_id, event_types::charge::FAILED, to_json(&charge)).await;
            emit_event(state.store.as_ref(), state.clock.as_ref(), merchant_id, event_types::payment_intent::FAILED, to_json(&updated)).await;
            return Err(report!(ApiErrorResponse::ProcessorDeclined {
                message: processor_response.message.unwrap_or_else(|| "the payment was declined".to_string()),
                code: processor_response.code,
            }));
        }
    };

    Ok(ApplicationResponse::Json(updated))
}

/// **CompleteAuthentication** (§4.8): the 3DS return leg. `requires_action`
/// is not a legal outcome from this call.
pub async fn complete_authentication(
    state: &AppState,
    merchant_id: Uuid,
    payment_intent_id: Uuid,
    request_id: String,
    request: CompleteAuthenticationRequest,
) -> RouterResponse<PaymentIntent> {
    let intent = state
        .store
        .find_payment_intent_by_id(merchant_id, payment_intent_id)
        .await
        .to_not_found_response(ApiErrorResponse::NotFound { message: "no such payment intent".to_string() })?;

    if intent.status != IntentStatus::RequiresAction {
        return Err(report!(ApiErrorResponse::InvalidState {
            message: format!("cannot complete authentication for a payment intent in status `{}`", intent.status),
        }));
    }
    let three_ds = intent.metadata.three_ds.clone().ok_or_else(|| {
        report!(ApiErrorResponse::InvalidState { message: "no pending 3DS continuation for this payment intent".to_string() })
    })?;
    let selected_route = intent
        .acquirer_routing
        .selected_route
        .clone()
        .ok_or_else(|| report!(ApiErrorResponse::InternalServerError))?;

    let merchant = load_merchant(state, merchant_id).await?;
    let route = route_for(&selected_route, &merchant);
    let adapter = state.registry.get(&route.adapter).map_err(adapter_error)?;
    let three_ds_adapter = adapter.as_three_ds().ok_or_else(|| {
        report!(ApiErrorResponse::InvalidRequestError {
            message: format!("adapter `{}` does not support 3DS continuation", route.adapter),
        })
    })?;

    let output = three_ds_adapter
        .authorize_with_three_ds(ContinueInput {
            context: RequestContext { request_id, merchant_id },
            route: route.clone(),
            acquirer_reference: three_ds.acquirer_reference.clone(),
            pares: request.pares,
            transaction_id: request.transaction_id,
            md: request.md,
        })
        .await
        .map_err(adapter_error)?;

    let now = state.clock.now();
    let cleared_metadata = PaymentIntentMetadata { three_ds: None, extra: intent.metadata.extra.clone() };

    let updated = match output.outcome {
        AuthorizeOutcome::Authorized { amount_authorized, acquirer_reference, authorization_code, network, processor_response } => {
            let charge_status = if intent.capture_method == hyperswitch_domain_models::enums::CaptureMethod::Automatic {
                ChargeStatus::Captured
            } else {
                ChargeStatus::Authorized
            };
            let amount_captured = if charge_status == ChargeStatus::Captured { amount_authorized } else { MinorUnit::new(0) };
            let charge = Charge {
                id: common_utils::ids::new_uuid(),
                merchant_id,
                payment_intent_id: intent.id,
                amount_authorized,
                amount_captured,
                amount_refunded: MinorUnit::new(0),
                currency: intent.currency,
                status: charge_status,
                acquirer_name: route.adapter.clone(),
                acquirer_reference,
                authorization_code,
                network,
                processor_response,
                created_at: now,
                modified_at: now,
            };
            state.store.insert_charge(charge.clone()).await.change_context(ApiErrorResponse::InternalServerError)?;
            let new_status = if charge_status == ChargeStatus::Captured { IntentStatus::Succeeded } else { IntentStatus::Processing };
            let updated = state
                .store
                .update_payment_intent_conditional(
                    merchant_id,
                    intent.id,
                    Some(IntentStatus::RequiresAction),
                    PaymentIntentUpdate { status: Some(new_status), metadata: Some(cleared_metadata), ..Default::default() },
                )
                .await
                .to_not_found_response(ApiErrorResponse::InvalidState { message: "payment intent changed concurrently".to_string() })?;
            if charge_status == ChargeStatus::Captured {
                state.balance.record(merchant_id, crate::balance_ledger::BalanceTransactionType::Charge, amount_captured, charge.currency, charge.id, now).await;
            }
            emit_event(state.store.as_ref(), state.clock.as_ref(), merchant_id, event_types::charge::AUTHORIZED, to_json(&charge)).await;
            let intent_event = if new_status == IntentStatus::Succeeded { event_types::payment_intent::SUCCEEDED } else { event_types::payment_intent::PROCESSING };
            emit_event(state.store.as_ref(), state.clock.as_ref(), merchant_id, intent_event, to_json(&updated)).await;
            updated
        }
        AuthorizeOutcome::RequiresAction { .. } => {
            return Err(report!(ApiErrorResponse::InternalServerError));
        }
        AuthorizeOutcome::Failed { processor_response } => {
            let charge = Charge {
                id: common_utils::ids::new_uuid(),
                merchant_id,
                payment_intent_id: intent.id,
                amount_authorized: intent.amount,
                amount_captured: MinorUnit::new(0),
                amount_refunded: MinorUnit::new(0),
                currency: intent.currency,
                status: ChargeStatus::Failed,
                acquirer_name: route.adapter.clone(),
                acquirer_reference: None,
                authorization_code: None,
                network: None,
                processor_response: processor_response.clone(),
                created_at: now,
                modified_at: now,
            };
            state.store.insert_charge(charge.clone()).await.change_context(ApiErrorResponse::InternalServerError)?;
            let updated = state
                .store
                .update_payment_intent_conditional(
                    merchant_id,
                    intent.id,
                    Some(IntentStatus::RequiresAction),
                    PaymentIntentUpdate { status: Some(IntentStatus::Failed), metadata: Some(cleared_metadata), ..Default::default() },
                )
                .await
                .to_not_found_response(ApiErrorResponse::InvalidState { message: "payment intent changed concurrently".to_string() })?;
            emit_event(state.store.as_ref(), state.clock.as_ref(), merchant_id, event_types::charge::FAILED, to_json(&charge)).await;
            emit_event(state.store.as_ref(), state.clock.as_ref(), merchant_id, event_types::payment_intent::FAILED, to_json(&updated)).await;
            return Err(report!(ApiErrorResponse::ProcessorDeclined {
                message: processor_response.message.unwrap_or_else(|| "the payment was declined".to_string()),
                code: processor_response.code,
            }));
        }
    };

    Ok(ApplicationResponse::Json(updated))
}

/// **Capture** (§4.8). Amount defaults to the charge's `amount_authorized`.
pub async fn capture(
    state: &AppState,
    merchant_id: Uuid,
    payment_intent_id: Uuid,
    request_id: String,
    request: CaptureRequest,
) -> RouterResponse<PaymentIntent> {
    let intent = state
        .store
        .find_payment_intent_by_id(merchant_id, payment_intent_id)
        .await
        .to_not_found_response(ApiErrorResponse::NotFound { message: "no such payment intent".to_string() })?;
    let charge = state
        .store
        .find_charge_by_payment_intent_id(merchant_id, intent.id)
        .await
        .change_context(ApiErrorResponse::InternalServerError)?
        .ok_or_else(|| report!(ApiErrorResponse::InvalidState { message: "no charge to capture for this payment intent".to_string() }))?;

    if charge.status != ChargeStatus::Authorized {
        return Err(report!(ApiErrorResponse::InvalidState {
            message: format!("cannot capture a charge in status `{}`", charge.status),
        }));
    }
    let amount = request.amount_to_capture.map(MinorUnit::new).unwrap_or(charge.amount_authorized);
    if amount.get_amount_as_i64() <= 0 || amount.get_amount_as_i64() > charge.amount_authorized.get_amount_as_i64() {
        return Err(report!(ApiErrorResponse::ValidationError {
            message: "amount_to_capture must be greater than zero and no more than the authorized amount".to_string(),
            param: Some("amount_to_capture".to_string()),
        }));
    }

    let selected_route = intent
        .acquirer_routing
        .selected_route
        .clone()
        .ok_or_else(|| report!(ApiErrorResponse::InternalServerError))?;
    let merchant = load_merchant(state, merchant_id).await?;
    let route = route_for(&selected_route, &merchant);
    let adapter = state.registry.get(&route.adapter).map_err(adapter_error)?;
    let acquirer_reference = charge
        .acquirer_reference
        .clone()
        .ok_or_else(|| report!(ApiErrorResponse::InternalServerError))?;

    let output = adapter
        .capture(CaptureInput {
            context: RequestContext { request_id, merchant_id },
            route,
            acquirer_reference,
            amount,
            currency: charge.currency,
        })
        .await
        .map_err(adapter_error)?;

    match output.outcome {
        SettlementOutcome::Succeeded | SettlementOutcome::Pending => {
            state
                .store
                .update_charge_conditional(
                    merchant_id,
                    charge.id,
                    ChargeStatus::Authorized,
                    ChargeUpdate {
                        status: Some(ChargeStatus::Captured),
                        amount_captured: Some(amount),
                        processor_response: Some(output.processor_response.clone()),
                        ..Default::default()
                    },
                )
                .await
                .to_not_found_response(ApiErrorResponse::InvalidState { message: "charge changed concurrently".to_string() })?;
            let updated = state
                .store
                .update_payment_intent_conditional(
                    merchant_id,
                    intent.id,
                    Some(intent.status),
                    PaymentIntentUpdate { status: Some(IntentStatus::Succeeded), ..Default::default() },
                )
                .await
                .to_not_found_response(ApiErrorResponse::InvalidState { message: "payment intent changed concurrently".to_string() })?;
            state
                .balance
                .record(merchant_id, crate::balance_ledger::BalanceTransactionType::Charge, amount, charge.currency, charge.id, state.clock.now())
                .await;
            emit_event(state.store.as_ref(), state.clock.as_ref(), merchant_id, event_types::charge::CAPTURED, to_json(&charge)).await;
            Ok(ApplicationResponse::Json(updated))
        }
        SettlementOutcome::Failed => Err(report!(ApiErrorResponse::ProcessorDeclined {
            message: output.processor_response.message.unwrap_or_else(|| "the capture was declined".to_string()),
            code: output.processor_response.code,
        })),
    }
}

/// **Refund** (§4.8). Default amount is whatever remains refundable.
pub async fn refund(state: &AppState, merchant_id: Uuid, request_id: String, request: CreateRefundRequest) -> RouterResponse<Refund> {
    let charge = state
        .store
        .find_charge_by_id(merchant_id, request.charge_id)
        .await
        .to_not_found_response(ApiErrorResponse::NotFound { message: "no such charge".to_string() })?;

    if !matches!(charge.status, ChargeStatus::Captured | ChargeStatus::PartiallyRefunded) {
        return Err(report!(ApiErrorResponse::InvalidState {
            message: format!("cannot refund a charge in status `{}`", charge.status),
        }));
    }
    let remaining = charge.remaining_refundable();
    let amount = request.amount.map(MinorUnit::new).unwrap_or(remaining);
    if amount.get_amount_as_i64() <= 0 || amount.get_amount_as_i64() > remaining.get_amount_as_i64() {
        return Err(report!(ApiErrorResponse::ValidationError {
            message: "refund amount must be greater than zero and no more than the remaining refundable amount".to_string(),
            param: Some("amount".to_string()),
        }));
    }

    let intent = state
        .store
        .find_payment_intent_by_id(merchant_id, charge.payment_intent_id)
        .await
        .to_not_found_response(ApiErrorResponse::NotFound { message: "no such payment intent".to_string() })?;
    let selected_route = intent
        .acquirer_routing
        .selected_route
        .clone()
        .ok_or_else(|| report!(ApiErrorResponse::InternalServerError))?;
    let merchant = load_merchant(state, merchant_id).await?;
    let route = route_for(&selected_route, &merchant);
    let adapter = state.registry.get(&route.adapter).map_err(adapter_error)?;
    let acquirer_reference = charge
        .acquirer_reference
        .clone()
        .ok_or_else(|| report!(ApiErrorResponse::InternalServerError))?;

    let output = adapter
        .refund(RefundInput {
            context: RequestContext { request_id, merchant_id },
            route,
            acquirer_reference,
            amount,
            currency: charge.currency,
        })
        .await
        .map_err(adapter_error)?;

    match output.outcome {
        SettlementOutcome::Succeeded | SettlementOutcome::Pending => {
            let now = state.clock.now();
            let status = if output.outcome == SettlementOutcome::Pending { RefundStatus::Pending } else { RefundStatus::Succeeded };
            let refund = Refund {
                id: common_utils::ids::new_uuid(),
                merchant_id,
                charge_id: charge.id,
                amount,
                currency: charge.currency,
                reason: request.reason,
                status,
                acquirer_reference: output.acquirer_reference.clone(),
                created_at: now,
                modified_at: now,
            };
            let inserted = state.store.insert_refund(refund).await.change_context(ApiErrorResponse::InternalServerError)?;
            state
                .store
                .atomic_refund_update(merchant_id, charge.id, amount)
                .await
                .to_not_found_response(ApiErrorResponse::InvalidState { message: "charge changed concurrently".to_string() })?;
            state
                .balance
                .record(merchant_id, crate::balance_ledger::BalanceTransactionType::Refund, amount, charge.currency, charge.id, now)
                .await;
            emit_event(state.store.as_ref(), state.clock.as_ref(), merchant_id, event_types::refund::CREATED, to_json(&inserted)).await;
            emit_event(state.store.as_ref(), state.clock.as_ref(), merchant_id, event_types::refund::SUCCEEDED, to_json(&inserted)).await;
            Ok(ApplicationResponse::Json(inserted))
        }
        SettlementOutcome::Failed => {
            emit_event(
                state.store.as_ref(),
                state.clock.as_ref(),
                merchant_id,
                event_types::refund::FAILED,
                serde_json::json!({"charge_id": charge.id, "amount": amount.get_amount_as_i64()}),
            )
            .await;
            Err(report!(ApiErrorResponse::ProcessorDeclined {
                message: output.processor_response.message.unwrap_or_else(|| "the refund was declined".to_string()),
                code: output.processor_response.code,
            }))
        }
    }
}

/// **Void** (§4.8), reached through `cancel` (§4.10's
/// `payment_intents/:id/cancel`). An intent with no charge yet is
/// canceled in place; an authorized, uncaptured charge is voided at the
/// acquirer first.
pub async fn cancel(state: &AppState, merchant_id: Uuid, payment_intent_id: Uuid, request_id: String) -> RouterResponse<PaymentIntent> {
    let intent = state
        .store
        .find_payment_intent_by_id(merchant_id, payment_intent_id)
        .await
        .to_not_found_response(ApiErrorResponse::NotFound { message: "no such payment intent".to_string() })?;

    if intent.status == IntentStatus::Succeeded {
        return Err(report!(ApiErrorResponse::InvalidState {
            message: "a succeeded payment intent cannot be canceled".to_string(),
        }));
    }
    if intent.status == IntentStatus::Canceled {
        return Ok(ApplicationResponse::Json(intent));
    }

    let charge_opt = state
        .store
        .find_charge_by_payment_intent_id(merchant_id, intent.id)
        .await
        .change_context(ApiErrorResponse::InternalServerError)?;

    let Some(charge) = charge_opt else {
        let updated = state
            .store
            .update_payment_intent_conditional(
                merchant_id,
                intent.id,
                Some(intent.status),
                PaymentIntentUpdate { status: Some(IntentStatus::Canceled), ..Default::default() },
            )
            .await
            .to_not_found_response(ApiErrorResponse::InvalidState { message: "payment intent changed concurrently".to_string() })?;
        emit_event(state.store.as_ref(), state.clock.as_ref(), merchant_id, event_types::payment_intent::CANCELED, to_json(&updated)).await;
        return Ok(ApplicationResponse::Json(updated));
    };

    if charge.status != ChargeStatus::Authorized {
        return Err(report!(ApiErrorResponse::InvalidState {
            message: format!("cannot void a charge in status `{}`", charge.status),
        }));
    }

    let selected_route = intent
        .acquirer_routing
        .selected_route
        .clone()
        .ok_or_else(|| report!(ApiErrorResponse::InternalServerError))?;
    let merchant = load_merchant(state, merchant_id).await?;
    let route = route_for(&selected_route, &merchant);
    let adapter = state.registry.get(&route.adapter).map_err(adapter_error)?;
    let void_adapter = adapter.as_void().ok_or_else(|| {
        report!(ApiErrorResponse::InvalidRequestError { message: format!("adapter `{}` does not support void", route.adapter) })
    })?;
    let acquirer_reference = charge
        .acquirer_reference
        .clone()
        .ok_or_else(|| report!(ApiErrorResponse::InternalServerError))?;

    let output = void_adapter
        .void(VoidInput { context: RequestContext { request_id, merchant_id }, route, acquirer_reference })
        .await
        .map_err(adapter_error)?;

    match output.outcome {
        SettlementOutcome::Succeeded | SettlementOutcome::Pending => {
            state
                .store
                .update_charge_conditional(
                    merchant_id,
                    charge.id,
                    ChargeStatus::Authorized,
                    ChargeUpdate { status: Some(ChargeStatus::Voided), processor_response: Some(output.processor_response.clone()), ..Default::default() },
                )
                .await
                .to_not_found_response(ApiErrorResponse::InvalidState { message: "charge changed concurrently".to_string() })?;
            let updated = state
                .store
                .update_payment_intent_conditional(
                    merchant_id,
                    intent.id,
                    Some(intent.status),
                    PaymentIntentUpdate { status: Some(IntentStatus::Canceled), ..Default::default() },
                )
                .await
                .to_not_found_response(ApiErrorResponse::InvalidState { message: "payment intent changed concurrently".to_string() })?;
            emit_event(state.store.as_ref(), state.clock.as_ref(), merchant_id, event_types::charge::VOIDED, to_json(&charge)).await;
            emit_event(state.store.as_ref(), state.clock.as_ref(), merchant_id, event_types::payment_intent::CANCELED, to_json(&updated)).await;
            Ok(ApplicationResponse::Json(updated))
        }
        SettlementOutcome::Failed => Err(report!(ApiErrorResponse::ProcessorDeclined {
            message: output.processor_response.message.unwrap_or_else(|| "the void was declined".to_string()),
            code: output.processor_response.code,
        })),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hyperswitch_domain_models::enums::{CaptureMethod, ConfirmationMethod, IntentStatus};
    use hyperswitch_domain_models::merchant::{Merchant, RoutingConfig};
    use hyperswitch_domain_models::money::{Currency, MinorUnit};
    use hyperswitch_domain_models::payment_intent::{AcquirerRouting, PaymentIntentMetadata};
    use hyperswitch_domain_models::payment_method::{CardDetails, PaymentMethodInput};
    use masking::Secret;
    use redis_interface::kv::KvBackend;
    use storage_impl::mock_db::MockDb;
    use storage_impl::StorageInterface;
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::*;
    use crate::configs::Settings;

    async fn test_state() -> (AppState, Uuid) {
        let mock_db = Arc::new(MockDb::new());
        let merchant_id = Uuid::new_v4();
        mock_db.seed_merchant(Merchant { id: merchant_id, routing_config: RoutingConfig::default() }).await;
        let store: Arc<dyn StorageInterface> = mock_db;
        let state = AppState::new(store, KvBackend::None, Settings::default());
        (state, merchant_id)
    }

    fn card(card_number: &str) -> PaymentMethodInput {
        PaymentMethodInput::Card(CardDetails {
            card_number: Secret::new(card_number.to_string()),
            card_exp_month: Secret::new("12".to_string()),
            card_exp_year: Secret::new("2030".to_string()),
            card_cvc: Secret::new("123".to_string()),
            card_holder_name: None,
        })
    }

    fn new_intent(merchant_id: Uuid, amount: i64, capture_method: CaptureMethod) -> PaymentIntent {
        let now = OffsetDateTime::now_utc();
        PaymentIntent {
            id: Uuid::new_v4(),
            merchant_id,
            customer_id: None,
            amount: MinorUnit::new(amount),
            currency: Currency::USD,
            capture_method,
            confirmation_method: ConfirmationMethod::Automatic,
            status: IntentStatus::RequiresPaymentMethod,
            payment_method: None,
            acquirer_routing: AcquirerRouting::default(),
            metadata: PaymentIntentMetadata::default(),
            description: None,
            created_at: now,
            modified_at: now,
        }
    }

    fn confirm_request(payment_method: PaymentMethodInput) -> ConfirmPaymentIntentRequest {
        ConfirmPaymentIntentRequest { payment_method, billing_details: None, return_url: Some("https://merchant.test/return".to_string()) }
    }

    #[tokio::test]
    async fn automatic_capture_authorizes_and_captures_in_one_step() {
        let (state, merchant_id) = test_state().await;
        let intent = new_intent(merchant_id, 10_000, CaptureMethod::Automatic);
        state.store.insert_payment_intent(intent.clone()).await.unwrap();

        let response = confirm(&state, merchant_id, intent.id, "req_1".to_string(), confirm_request(card("4111111111111111"))).await.unwrap();
        let ApplicationResponse::Json(updated) = response else { panic!("expected Json") };
        assert_eq!(updated.status, IntentStatus::Succeeded);

        let charge = state.store.find_charge_by_payment_intent_id(merchant_id, intent.id).await.unwrap().unwrap();
        assert_eq!(charge.status, ChargeStatus::Captured);
        assert_eq!(charge.amount_captured.get_amount_as_i64(), 10_000);

        let summary = state.balance.summary(merchant_id).await;
        assert_eq!(summary.balances.len(), 1);
        assert_eq!(summary.balances[0].available, 10_000);
    }

    #[tokio::test]
    async fn manual_capture_leaves_the_charge_authorized_until_captured() {
        let (state, merchant_id) = test_state().await;
        let intent = new_intent(merchant_id, 5_000, CaptureMethod::Manual);
        state.store.insert_payment_intent(intent.clone()).await.unwrap();

        let response = confirm(&state, merchant_id, intent.id, "req_1".to_string(), confirm_request(card("4111111111111111"))).await.unwrap();
        let ApplicationResponse::Json(updated) = response else { panic!("expected Json") };
        assert_eq!(updated.status, IntentStatus::Processing);

        let charge = state.store.find_charge_by_payment_intent_id(merchant_id, intent.id).await.unwrap().unwrap();
        assert_eq!(charge.status, ChargeStatus::Authorized);
        assert!(state.balance.summary(merchant_id).await.balances.is_empty());

        let captured = capture(&state, merchant_id, intent.id, "req_2".to_string(), CaptureRequest { amount_to_capture: None }).await.unwrap();
        let ApplicationResponse::Json(captured_intent) = captured else { panic!("expected Json") };
        assert_eq!(captured_intent.status, IntentStatus::Succeeded);
        let summary = state.balance.summary(merchant_id).await;
        assert_eq!(summary.balances[0].available, 5_000);
    }

    #[tokio::test]
    async fn a_declining_amount_fails_the_intent_and_records_no_balance() {
        let (state, merchant_id) = test_state().await;
        let intent = new_intent(merchant_id, 99_900, CaptureMethod::Automatic);
        state.store.insert_payment_intent(intent.clone()).await.unwrap();

        let error = confirm(&state, merchant_id, intent.id, "req_1".to_string(), confirm_request(card("4111111111111111"))).await.unwrap_err();
        assert!(matches!(error.current_context(), ApiErrorResponse::ProcessorDeclined { .. }));

        let stored = state.store.find_payment_intent_by_id(merchant_id, intent.id).await.unwrap();
        assert_eq!(stored.status, IntentStatus::Failed);
        assert!(state.balance.summary(merchant_id).await.balances.is_empty());
    }

    #[tokio::test]
    async fn a_requires_action_amount_parks_the_intent_pending_three_ds() {
        let (state, merchant_id) = test_state().await;
        let intent = new_intent(merchant_id, 66_600, CaptureMethod::Automatic);
        state.store.insert_payment_intent(intent.clone()).await.unwrap();

        let response = confirm(&state, merchant_id, intent.id, "req_1".to_string(), confirm_request(card("4111111111111111"))).await.unwrap();
        let ApplicationResponse::Json(updated) = response else { panic!("expected Json") };
        assert_eq!(updated.status, IntentStatus::RequiresAction);
        assert!(updated.metadata.three_ds.is_some());

        let completed = complete_authentication(
            &state,
            merchant_id,
            intent.id,
            "req_2".to_string(),
            CompleteAuthenticationRequest { pares: "opaque-pares".to_string(), transaction_id: None, md: None },
        )
        .await
        .unwrap();
        let ApplicationResponse::Json(completed_intent) = completed else { panic!("expected Json") };
        assert_eq!(completed_intent.status, IntentStatus::Succeeded);
        assert!(completed_intent.metadata.three_ds.is_none());
    }

    #[tokio::test]
    async fn confirming_twice_is_rejected_with_invalid_state() {
        let (state, merchant_id) = test_state().await;
        let intent = new_intent(merchant_id, 10_000, CaptureMethod::Automatic);
        state.store.insert_payment_intent(intent.clone()).await.unwrap();

        confirm(&state, merchant_id, intent.id, "req_1".to_string(), confirm_request(card("4111111111111111"))).await.unwrap();
        let error = confirm(&state, merchant_id, intent.id, "req_2".to_string(), confirm_request(card("4111111111111111"))).await.unwrap_err();
        assert!(matches!(error.current_context(), ApiErrorResponse::InvalidState { .. }));
    }

    #[tokio::test]
    async fn a_partial_refund_leaves_the_charge_partially_refunded() {
        let (state, merchant_id) = test_state().await;
        let intent = new_intent(merchant_id, 10_000, CaptureMethod::Automatic);
        state.store.insert_payment_intent(intent.clone()).await.unwrap();
        confirm(&state, merchant_id, intent.id, "req_1".to_string(), confirm_request(card("4111111111111111"))).await.unwrap();
        let charge = state.store.find_charge_by_payment_intent_id(merchant_id, intent.id).await.unwrap().unwrap();

        let refund_response = refund(
            &state,
            merchant_id,
            "req_2".to_string(),
            CreateRefundRequest { charge_id: charge.id, amount: Some(4_000), reason: None, metadata: Default::default() },
        )
        .await
        .unwrap();
        let ApplicationResponse::Json(created) = refund_response else { panic!("expected Json") };
        assert_eq!(created.status, RefundStatus::Succeeded);

        let updated_charge = state.store.find_charge_by_id(merchant_id, charge.id).await.unwrap();
        assert_eq!(updated_charge.status, ChargeStatus::PartiallyRefunded);
        assert_eq!(updated_charge.amount_refunded.get_amount_as_i64(), 4_000);

        let summary = state.balance.summary(merchant_id).await;
        assert_eq!(summary.balances[0].available, 6_000);
    }

    #[tokio::test]
    async fn refunding_more_than_remaining_is_rejected() {
        let (state, merchant_id) = test_state().await;
        let intent = new_intent(merchant_id, 10_000, CaptureMethod::Automatic);
        state.store.insert_payment_intent(intent.clone()).await.unwrap();
        confirm(&state, merchant_id, intent.id, "req_1".to_string(), confirm_request(card("4111111111111111"))).await.unwrap();
        let charge = state.store.find_charge_by_payment_intent_id(merchant_id, intent.id).await.unwrap().unwrap();

        let error = refund(
            &state,
            merchant_id,
            "req_2".to_string(),
            CreateRefundRequest { charge_id: charge.id, amount: Some(10_001), reason: None, metadata: Default::default() },
        )
        .await
        .unwrap_err();
        assert!(matches!(error.current_context(), ApiErrorResponse::ValidationError { .. }));
    }

    #[tokio::test]
    async fn canceling_an_intent_with_no_charge_yet_just_marks_it_canceled() {
        let (state, merchant_id) = test_state().await;
        let intent = new_intent(merchant_id, 10_000, CaptureMethod::Manual);
        state.store.insert_payment_intent(intent.clone()).await.unwrap();

        let response = cancel(&state, merchant_id, intent.id, "req_1".to_string()).await.unwrap();
        let ApplicationResponse::Json(updated) = response else { panic!("expected Json") };
        assert_eq!(updated.status, IntentStatus::Canceled);
    }

    #[tokio::test]
    async fn canceling_an_authorized_charge_voids_it_at_the_acquirer() {
        let (state, merchant_id) = test_state().await;
        let intent = new_intent(merchant_id, 5_000, CaptureMethod::Manual);
        state.store.insert_payment_intent(intent.clone()).await.unwrap();
        confirm(&state, merchant_id, intent.id, "req_1".to_string(), confirm_request(card("4111111111111111"))).await.unwrap();

        let response = cancel(&state, merchant_id, intent.id, "req_2".to_string()).await.unwrap();
        let ApplicationResponse::Json(updated) = response else { panic!("expected Json") };
        assert_eq!(updated.status, IntentStatus::Canceled);

        let charge = state.store.find_charge_by_payment_intent_id(merchant_id, intent.id).await.unwrap().unwrap();
        assert_eq!(charge.status, ChargeStatus::Voided);
    }
}
