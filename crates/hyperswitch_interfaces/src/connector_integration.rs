//! `PaymentConnector`: the four required operations every adapter
//! implements, plus three optional capability traits the orchestrator
//! probes for before dispatch (§4.4, Design Note "Adapter capabilities").

use async_trait::async_trait;
use hyperswitch_domain_models::connector_types::{
    AuthorizeInput, AuthorizeOutput, CanonicalEvent, CaptureInput, CaptureOutput, ContinueInput,
    RefundInput, RefundOutput, VoidInput, VoidOutput,
};
use hyperswitch_domain_models::errors::ConnectorError;

pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// The required capability set (§4.4 items 1-3). `name()` is the key the
/// registry is keyed by and the value stored in a resolved route.
///
/// The three `as_*` methods are how the orchestrator probes for an
/// optional capability (§9 "Adapter capabilities") without downcasting:
/// an adapter that implements e.g. `SupportsVoid` overrides `as_void` to
/// return `Some(self)`; the default `None` means "not supported".
#[async_trait]
pub trait PaymentConnector: Send + Sync {
    fn name(&self) -> &'static str;

    async fn authorize(&self, input: AuthorizeInput) -> ConnectorResult<AuthorizeOutput>;
    async fn capture(&self, input: CaptureInput) -> ConnectorResult<CaptureOutput>;
    async fn refund(&self, input: RefundInput) -> ConnectorResult<RefundOutput>;

    fn as_void(&self) -> Option<&dyn SupportsVoid> {
        None
    }

    fn as_three_ds(&self) -> Option<&dyn SupportsThreeDs> {
        None
    }

    fn as_webhooks(&self) -> Option<&dyn SupportsWebhooks> {
        None
    }
}

/// Optional: acquirers that can reverse an authorization before capture.
#[async_trait]
pub trait SupportsVoid: PaymentConnector {
    async fn void(&self, input: VoidInput) -> ConnectorResult<VoidOutput>;
}

/// Optional: acquirers offering a deferred/continuation-style 3DS flow.
#[async_trait]
pub trait SupportsThreeDs: PaymentConnector {
    async fn authorize_with_three_ds(&self, input: ContinueInput) -> ConnectorResult<AuthorizeOutput>;
}

/// Optional: acquirers that can translate their native webhook payload
/// into the canonical event shape.
pub trait SupportsWebhooks: PaymentConnector {
    fn handle_webhook(
        &self,
        raw_body: &[u8],
        headers: &std::collections::HashMap<String, String>,
    ) -> ConnectorResult<Vec<CanonicalEvent>>;
}
