//! The process-wide adapter registry (§4.4, §5): immutable after startup,
//! so no locking is needed once the server is serving traffic.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use hyperswitch_domain_models::errors::ConnectorError;
use router_env::logger;

use crate::connector_integration::PaymentConnector;

#[derive(Default)]
pub struct ConnectorRegistry {
    adapters: RwLock<HashMap<String, Arc<dyn PaymentConnector>>>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent: re-registering a name overwrites the previous entry
    /// and logs a warning, rather than erroring (§4.4).
    pub fn register(&self, adapter: Arc<dyn PaymentConnector>) {
        let name = adapter.name().to_string();
        let mut guard = self.adapters.write().expect("connector registry lock poisoned");
        if guard.contains_key(&name) {
            logger::warn!(adapter = %name, "overwriting an already-registered adapter");
        }
        guard.insert(name, adapter);
    }

    /// Fails listing the currently available names, per §4.4's
    /// "adapter not found" contract.
    pub fn get(&self, name: &str) -> Result<Arc<dyn PaymentConnector>, ConnectorError> {
        let guard = self.adapters.read().expect("connector registry lock poisoned");
        guard
            .get(name)
            .cloned()
            .ok_or_else(|| ConnectorError::NotFound(name.to_string()))
    }

    pub fn available_names(&self) -> Vec<String> {
        let guard = self.adapters.read().expect("connector registry lock poisoned");
        guard.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hyperswitch_domain_models::connector_types::*;

    struct Stub;

    #[async_trait]
    impl PaymentConnector for Stub {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn authorize(&self, _input: AuthorizeInput) -> Result<AuthorizeOutput, ConnectorError> {
            unimplemented!()
        }

        async fn capture(&self, _input: CaptureInput) -> Result<CaptureOutput, ConnectorError> {
            unimplemented!()
        }

        async fn refund(&self, _input: RefundInput) -> Result<RefundOutput, ConnectorError> {
            unimplemented!()
        }
    }

    #[test]
    fn unregistered_adapter_lists_available_names_in_the_error() {
        let registry = ConnectorRegistry::new();
        registry.register(Arc::new(Stub));
        let err = registry.get("cybersource").unwrap_err();
        match err {
            ConnectorError::NotFound(name) => assert_eq!(name, "cybersource"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(registry.available_names(), vec!["stub".to_string()]);
    }

    #[test]
    fn re_registering_a_name_overwrites_the_previous_entry() {
        let registry = ConnectorRegistry::new();
        registry.register(Arc::new(Stub));
        registry.register(Arc::new(Stub));
        assert_eq!(registry.available_names().len(), 1);
    }
}
