//! The adapter trait acquirer connectors implement (§4.4) and the
//! process-wide registry (§4.4, §5 "shared resources") the orchestrator
//! resolves them through.

pub mod connector_integration;
pub mod registry;

pub use connector_integration::{
    PaymentConnector, SupportsThreeDs, SupportsVoid, SupportsWebhooks,
};
pub use registry::ConnectorRegistry;
