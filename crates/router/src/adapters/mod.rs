//! The two adapters this workspace ships (C5, C6), registered into the
//! process-wide [`ConnectorRegistry`] at startup. Adding a third acquirer
//! means writing one more `PaymentConnector` impl and one more
//! `registry.register(..)` call here — nothing else in the orchestrator
//! changes, per §4.4's capability-probe design.

pub mod cybersource;
pub mod mock;

use std::sync::Arc;

use hyperswitch_interfaces::registry::ConnectorRegistry;

pub fn register_default_adapters(registry: &ConnectorRegistry) {
    registry.register(Arc::new(mock::MockAdapter::new()));
    registry.register(Arc::new(cybersource::CyberSourceAdapter::new()));
}
