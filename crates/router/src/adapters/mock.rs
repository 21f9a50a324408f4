//! The deterministic-by-amount test adapter (§4.5). No network calls; a
//! small simulated delay stands in for one, so tests that rely on
//! concurrent confirms actually exercise interleaving.

use async_trait::async_trait;
use hyperswitch_domain_models::charge::ProcessorResponse;
use hyperswitch_domain_models::connector_types::{
    AuthorizeInput, AuthorizeOutcome, AuthorizeOutput, CaptureInput, CaptureOutput, RefundInput, RefundOutput,
    SettlementOutcome, ThreeDsData, VoidInput, VoidOutput,
};
use hyperswitch_domain_models::errors::ConnectorError;
use hyperswitch_domain_models::money::MinorUnit;
use hyperswitch_interfaces::connector_integration::{ConnectorResult, PaymentConnector, SupportsThreeDs, SupportsVoid};
use rand::Rng;

/// Amount (minor units) that always comes back `requires_action`.
const REQUIRES_ACTION_AMOUNT: i64 = 66_600;
/// Amount (minor units) that always comes back `failed`, code `05`.
const DECLINE_AMOUNT: i64 = 99_900;

pub struct MockAdapter;

impl MockAdapter {
    pub fn new() -> Self {
        Self
    }

    async fn simulated_delay() {
        let millis = rand::thread_rng().gen_range(50..=150);
        tokio::time::sleep(std::time::Duration::from_millis(millis)).await;
    }
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentConnector for MockAdapter {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn authorize(&self, input: AuthorizeInput) -> ConnectorResult<AuthorizeOutput> {
        Self::simulated_delay().await;
        let amount = input.amount.get_amount_as_i64();
        let outcome = if amount == REQUIRES_ACTION_AMOUNT {
            AuthorizeOutcome::RequiresAction {
                acquirer_reference: Some(format!("mock_ref_{}", input.payment_intent_id)),
                three_ds: ThreeDsData {
                    flow: "redirect".to_string(),
                    redirect_url: format!("https://mock.acquirer.test/3ds/{}", input.payment_intent_id),
                    method_url: None,
                    data: serde_json::json!({}),
                },
            }
        } else if amount == DECLINE_AMOUNT {
            AuthorizeOutcome::Failed {
                processor_response: ProcessorResponse {
                    code: Some("05".to_string()),
                    message: Some("Do not honor".to_string()),
                    avs: None,
                    cvv: None,
                    raw: None,
                },
            }
        } else {
            AuthorizeOutcome::Authorized {
                amount_authorized: input.amount,
                acquirer_reference: Some(format!("mock_ref_{}", input.payment_intent_id)),
                authorization_code: Some("999999".to_string()),
                network: input.payment_method.network.clone(),
                processor_response: ProcessorResponse {
                    code: Some("00".to_string()),
                    message: Some("Approved".to_string()),
                    avs: Some("Y".to_string()),
                    cvv: Some("M".to_string()),
                    raw: None,
                },
            }
        };
        Ok(AuthorizeOutput { outcome })
    }

    async fn capture(&self, input: CaptureInput) -> ConnectorResult<CaptureOutput> {
        Self::simulated_delay().await;
        Ok(CaptureOutput {
            outcome: SettlementOutcome::Succeeded,
            acquirer_reference: Some(input.acquirer_reference),
            processor_response: approved_response(),
        })
    }

    async fn refund(&self, input: RefundInput) -> ConnectorResult<RefundOutput> {
        Self::simulated_delay().await;
        Ok(RefundOutput {
            outcome: SettlementOutcome::Succeeded,
            acquirer_reference: Some(input.acquirer_reference),
            processor_response: approved_response(),
        })
    }

    fn as_void(&self) -> Option<&dyn SupportsVoid> {
        Some(self)
    }

    fn as_three_ds(&self) -> Option<&dyn SupportsThreeDs> {
        Some(self)
    }
}

#[async_trait]
impl SupportsVoid for MockAdapter {
    async fn void(&self, input: VoidInput) -> ConnectorResult<VoidOutput> {
        Self::simulated_delay().await;
        Ok(VoidOutput {
            outcome: SettlementOutcome::Succeeded,
            acquirer_reference: Some(input.acquirer_reference),
            processor_response: approved_response(),
        })
    }
}

#[async_trait]
impl SupportsThreeDs for MockAdapter {
    async fn authorize_with_three_ds(
        &self,
        input: hyperswitch_domain_models::connector_types::ContinueInput,
    ) -> ConnectorResult<AuthorizeOutput> {
        Self::simulated_delay().await;
        if input.pares.is_empty() {
            return Err(ConnectorError::ResponseDeserializationFailed);
        }
        Ok(AuthorizeOutput {
            outcome: AuthorizeOutcome::Authorized {
                amount_authorized: MinorUnit::new(66_600),
                acquirer_reference: input.acquirer_reference,
                authorization_code: Some("999999".to_string()),
                network: None,
                processor_response: approved_response(),
            },
        })
    }
}

fn approved_response() -> ProcessorResponse {
    ProcessorResponse {
        code: Some("00".to_string()),
        message: Some("Approved".to_string()),
        avs: Some("Y".to_string()),
        cvv: Some("M".to_string()),
        raw: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperswitch_domain_models::connector_types::{AcquirerRoute, CardPaymentMethodData, RequestContext};
    use hyperswitch_domain_models::money::Currency;
    use masking::Secret;

    fn authorize_input(amount: i64) -> AuthorizeInput {
        AuthorizeInput {
            context: RequestContext {
                request_id: "req_test".to_string(),
                merchant_id: uuid::Uuid::nil(),
            },
            payment_intent_id: uuid::Uuid::nil(),
            amount: MinorUnit::new(amount),
            currency: Currency::MXN,
            payment_method: CardPaymentMethodData {
                network: Some("visa".to_string()),
                brand: Some("visa".to_string()),
                last4: Some("1111".to_string()),
                exp_month: Secret::new("12".to_string()),
                exp_year: Secret::new("2030".to_string()),
                card_number: Some(Secret::new("4111111111111111".to_string())),
                card_cvc: Some(Secret::new("123".to_string())),
                tokenization_reference: None,
            },
            customer: None,
            billing_address: None,
            three_ds_hints: None,
            route: AcquirerRoute {
                adapter: "mock".to_string(),
                merchant_ref: None,
                config: serde_json::json!({}),
            },
            statement_descriptor: None,
            metadata: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn amount_66600_requires_action() {
        let adapter = MockAdapter::new();
        let output = adapter.authorize(authorize_input(66_600)).await.unwrap();
        assert!(matches!(output.outcome, AuthorizeOutcome::RequiresAction { .. }));
    }

    #[tokio::test]
    async fn amount_99900_is_declined_with_code_05() {
        let adapter = MockAdapter::new();
        let output = adapter.authorize(authorize_input(99_900)).await.unwrap();
        match output.outcome {
            AuthorizeOutcome::Failed { processor_response } => {
                assert_eq!(processor_response.code.as_deref(), Some("05"));
            }
            other => panic!("expected a decline, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn any_other_amount_is_authorized() {
        let adapter = MockAdapter::new();
        let output = adapter.authorize(authorize_input(10_000)).await.unwrap();
        match output.outcome {
            AuthorizeOutcome::Authorized { authorization_code, network, .. } => {
                assert_eq!(authorization_code.as_deref(), Some("999999"));
                assert_eq!(network.as_deref(), Some("visa"));
            }
            other => panic!("expected an authorization, got {other:?}"),
        }
    }
}
