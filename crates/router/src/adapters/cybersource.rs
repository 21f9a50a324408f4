//! CyberSource (§4.6): HTTP Signature (draft) authentication over a REST
//! payments API. Per-call credentials come from the resolved route's
//! `config` blob (merchant id at acquirer, key id, secret key, base url,
//! host header), not from process-wide settings — each merchant routes to
//! their own CyberSource account.

use base64::Engine;
use common_utils::crypto::{hmac_sha256, sha256};
use common_utils::date_time::format_rfc1123;
use hyperswitch_domain_models::charge::ProcessorResponse;
use hyperswitch_domain_models::connector_types::{
    AuthorizeInput, AuthorizeOutcome, AuthorizeOutput, CaptureInput, CaptureOutput, ContinueInput, RefundInput,
    RefundOutput, SettlementOutcome, ThreeDsData, VoidInput, VoidOutput,
};
use hyperswitch_domain_models::errors::ConnectorError;
use hyperswitch_domain_models::money::MinorUnit;
use hyperswitch_interfaces::connector_integration::{ConnectorResult, PaymentConnector, SupportsThreeDs, SupportsVoid};
use masking::{PeekInterface, Secret};
use serde::Deserialize;

const BASE64: base64::engine::general_purpose::GeneralPurpose = base64::engine::general_purpose::STANDARD;

/// Parsed out of `AcquirerRoute.config` at call time (§4.6 "Config carries
/// merchant id at acquirer, key id, secret key...").
#[derive(Debug, Clone, Deserialize)]
pub struct CyberSourceConfig {
    pub merchant_id: String,
    pub key_id: String,
    pub secret_key: Secret<String>,
    pub base_url: String,
    pub host: String,
}

pub struct CyberSourceAdapter {
    http: reqwest::Client,
}

impl CyberSourceAdapter {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    fn config_from(config: &serde_json::Value) -> ConnectorResult<CyberSourceConfig> {
        serde_json::from_value(config.clone()).map_err(|_| ConnectorError::RequestEncodingFailed)
    }

    /// Builds the `Signature` header value and the raw `Digest` alongside
    /// it, following the exact field order §4.6 step 3 mandates.
    fn sign(config: &CyberSourceConfig, method: &str, path: &str, date: &str, digest: &str) -> String {
        let signing_string = format!(
            "host: {host}\ndate: {date}\n(request-target): {method} {path}\ndigest: {digest}\nv-c-merchant-id: {merchant_id}",
            host = config.host,
            method = method.to_lowercase(),
            merchant_id = config.merchant_id,
        );
        let raw_secret = BASE64.decode(config.secret_key.peek()).unwrap_or_default();
        let signature = BASE64.encode(hmac_sha256(&raw_secret, signing_string.as_bytes()));
        format!(
            "keyid=\"{keyid}\", algorithm=\"HmacSHA256\", headers=\"host date (request-target) digest v-c-merchant-id\", signature=\"{signature}\"",
            keyid = config.key_id,
        )
    }

    async fn post(
        &self,
        config: &CyberSourceConfig,
        path: &str,
        body: &serde_json::Value,
    ) -> ConnectorResult<serde_json::Value> {
        let compact_body = serde_json::to_vec(body).map_err(|_| ConnectorError::RequestEncodingFailed)?;
        let digest = format!("SHA-256={}", BASE64.encode(sha256(&compact_body)));
        let date = format_rfc1123(time::OffsetDateTime::now_utc());
        let signature = Self::sign(config, "POST", path, &date, &digest);
        let url = format!("{}{}", config.base_url, path);

        let response = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .header("v-c-merchant-id", &config.merchant_id)
            .header("Date", &date)
            .header("Host", &config.host)
            .header("Digest", &digest)
            .header("Signature", signature)
            .body(compact_body)
            .send()
            .await
            .map_err(|e| ConnectorError::TransportError(e.to_string()))?;

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|_| ConnectorError::ResponseDeserializationFailed)
    }
}

impl Default for CyberSourceAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// `minor_units / 100` formatted with exactly two fractional digits, per
/// §4.6's "order amount as decimal string".
fn decimal_amount(amount: MinorUnit) -> String {
    let value = amount.get_amount_as_i64();
    format!("{}.{:02}", value / 100, value.abs() % 100)
}

fn processor_response_from(response: &serde_json::Value) -> ProcessorResponse {
    ProcessorResponse {
        code: response
            .get("processorInformation")
            .and_then(|p| p.get("responseCode"))
            .and_then(|v| v.as_str())
            .map(str::to_string),
        message: response
            .get("errorInformation")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .map(str::to_string),
        avs: response
            .get("processorInformation")
            .and_then(|p| p.get("avs"))
            .and_then(|a| a.get("code"))
            .and_then(|v| v.as_str())
            .map(str::to_string),
        cvv: None,
        raw: Some(response.clone()),
    }
}

#[async_trait::async_trait]
impl PaymentConnector for CyberSourceAdapter {
    fn name(&self) -> &'static str {
        "cybersource"
    }

    async fn authorize(&self, input: AuthorizeInput) -> ConnectorResult<AuthorizeOutput> {
        let config = Self::config_from(&input.route.config)?;
        let billing = input.billing_address.as_ref();
        // provisional default: CyberSource's sample payloads fall back to
        // MX/00000 when the merchant did not collect a billing address.
        let bill_to = serde_json::json!({
            "address1": billing.and_then(|b| b.line1.clone()).unwrap_or_default(),
            "locality": billing.and_then(|b| b.city.clone()).unwrap_or_default(),
            "administrativeArea": billing.and_then(|b| b.state.clone()).unwrap_or_default(),
            "country": billing.and_then(|b| b.country.clone()).unwrap_or_else(|| "MX".to_string()),
            "postalCode": billing.and_then(|b| b.postal_code.clone()).unwrap_or_else(|| "00000".to_string()),
        });

        let mut payment_information = serde_json::json!({
            "card": {
                "expirationMonth": input.payment_method.exp_month.peek(),
                "expirationYear": input.payment_method.exp_year.peek(),
            }
        });
        if let Some(number) = &input.payment_method.card_number {
            payment_information["card"]["number"] = serde_json::json!(number.peek());
        }
        if let Some(cvc) = &input.payment_method.card_cvc {
            payment_information["card"]["securityCode"] = serde_json::json!(cvc.peek());
        }

        let mut body = serde_json::json!({
            "processingInformation": {"capture": false, "commerceIndicator": "internet"},
            "orderInformation": {
                "amountDetails": {"totalAmount": decimal_amount(input.amount), "currency": input.currency},
                "billTo": bill_to,
            },
            "paymentInformation": payment_information,
        });
        if let Some(hints) = &input.three_ds_hints {
            if let Some(return_url) = &hints.return_url {
                body["consumerAuthenticationInformation"] = serde_json::json!({"returnUrl": return_url});
            }
        }

        let response = self.post(&config, "/pts/v2/payments", &body).await?;
        Ok(AuthorizeOutput { outcome: map_authorize_response(&response, input.amount) })
    }

    async fn capture(&self, input: CaptureInput) -> ConnectorResult<CaptureOutput> {
        let config = Self::config_from(&input.route.config)?;
        let path = format!("/pts/v2/payments/{}/captures", input.acquirer_reference);
        let body = serde_json::json!({
            "orderInformation": {"amountDetails": {"totalAmount": decimal_amount(input.amount), "currency": input.currency}},
        });
        let response = self.post(&config, &path, &body).await?;
        Ok(CaptureOutput {
            outcome: map_settlement_status(&response),
            acquirer_reference: Some(input.acquirer_reference),
            processor_response: processor_response_from(&response),
        })
    }

    async fn refund(&self, input: RefundInput) -> ConnectorResult<RefundOutput> {
        let config = Self::config_from(&input.route.config)?;
        let path = format!("/pts/v2/payments/{}/refunds", input.acquirer_reference);
        let body = serde_json::json!({
            "orderInformation": {"amountDetails": {"totalAmount": decimal_amount(input.amount), "currency": input.currency}},
        });
        let response = self.post(&config, &path, &body).await?;
        Ok(RefundOutput {
            outcome: map_settlement_status(&response),
            acquirer_reference: Some(input.acquirer_reference),
            processor_response: processor_response_from(&response),
        })
    }

    fn as_void(&self) -> Option<&dyn SupportsVoid> {
        Some(self)
    }

    fn as_three_ds(&self) -> Option<&dyn SupportsThreeDs> {
        Some(self)
    }
}

#[async_trait::async_trait]
impl SupportsVoid for CyberSourceAdapter {
    async fn void(&self, input: VoidInput) -> ConnectorResult<VoidOutput> {
        let config = Self::config_from(&input.route.config)?;
        let path = format!("/pts/v2/payments/{}/voids", input.acquirer_reference);
        let response = self.post(&config, &path, &serde_json::json!({})).await?;
        let status = response.get("status").and_then(|v| v.as_str()).unwrap_or_default();
        let outcome = if matches!(status, "VOIDED" | "REVERSED") {
            SettlementOutcome::Succeeded
        } else {
            SettlementOutcome::Failed
        };
        Ok(VoidOutput {
            outcome,
            acquirer_reference: Some(input.acquirer_reference),
            processor_response: processor_response_from(&response),
        })
    }
}

#[async_trait::async_trait]
impl SupportsThreeDs for CyberSourceAdapter {
    async fn authorize_with_three_ds(&self, input: ContinueInput) -> ConnectorResult<AuthorizeOutput> {
        let config = Self::config_from(&input.route.config)?;
        let acquirer_reference = input.acquirer_reference.clone().ok_or(ConnectorError::RequestEncodingFailed)?;
        let path = format!("/pts/v2/payments/{acquirer_reference}");
        let body = serde_json::json!({
            "consumerAuthenticationInformation": {
                "authenticationTransactionId": input.transaction_id,
                "paSpecificationVersion": input.md,
                "pares": input.pares,
            }
        });
        let response = self.post(&config, &path, &body).await?;
        Ok(AuthorizeOutput { outcome: map_authorize_response(&response, MinorUnit::new(0)) })
    }
}

fn map_authorize_response(response: &serde_json::Value, requested_amount: MinorUnit) -> AuthorizeOutcome {
    let status = response.get("status").and_then(|v| v.as_str()).unwrap_or_default();
    let acquirer_reference = response.get("id").and_then(|v| v.as_str()).map(str::to_string);
    match status {
        "AUTHORIZED" => AuthorizeOutcome::Authorized {
            amount_authorized: requested_amount,
            acquirer_reference,
            authorization_code: response
                .get("processorInformation")
                .and_then(|p| p.get("approvalCode"))
                .and_then(|v| v.as_str())
                .map(str::to_string),
            network: response
                .get("processorInformation")
                .and_then(|p| p.get("network"))
                .and_then(|v| v.as_str())
                .map(str::to_string),
            processor_response: processor_response_from(response),
        },
        "PENDING_AUTHENTICATION" => AuthorizeOutcome::RequiresAction {
            acquirer_reference,
            three_ds: ThreeDsData {
                flow: "redirect".to_string(),
                redirect_url: response
                    .get("consumerAuthenticationInformation")
                    .and_then(|c| c.get("acsUrl"))
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                method_url: response
                    .get("consumerAuthenticationInformation")
                    .and_then(|c| c.get("stepUpUrl"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
                data: response
                    .get("consumerAuthenticationInformation")
                    .cloned()
                    .unwrap_or_else(|| serde_json::json!({})),
            },
        },
        _ => AuthorizeOutcome::Failed {
            processor_response: processor_response_from(response),
        },
    }
}

fn map_settlement_status(response: &serde_json::Value) -> SettlementOutcome {
    match response.get("status").and_then(|v| v.as_str()) {
        Some("PENDING") => SettlementOutcome::Succeeded,
        _ => SettlementOutcome::Failed,
    }
}
