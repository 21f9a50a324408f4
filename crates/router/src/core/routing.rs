//! `PickRoute` (§4.7): resolves once per intent, then stays pinned so
//! retries and the 3DS continuation leg always hit the same acquirer.

use hyperswitch_domain_models::connector_types::AcquirerRoute;
use hyperswitch_domain_models::merchant::RoutingConfig;
use hyperswitch_domain_models::payment_intent::{PaymentIntent, SelectedRoute};

use crate::configs::Settings;

/// `merchantConfig.strategy` values other than `"default"` are reserved
/// (§4.7 step 3) and fall back to the same path as `"default"`.
pub fn pick_route(intent: &PaymentIntent, routing_config: &RoutingConfig, settings: &Settings) -> AcquirerRoute {
    if let Some(selected) = &intent.acquirer_routing.selected_route {
        return resolve(selected, routing_config);
    }

    if let Some(adapter_name) = &routing_config.default_adapter {
        if let Some(entry) = routing_config.enabled_adapter(adapter_name) {
            return AcquirerRoute {
                adapter: entry.adapter.clone(),
                merchant_ref: entry.merchant_ref.clone(),
                config: entry.config.clone(),
            };
        }
    }

    let fallback_adapter = if settings.routing.default_adapter.is_empty() {
        "mock".to_string()
    } else {
        settings.routing.default_adapter.clone()
    };
    AcquirerRoute {
        adapter: fallback_adapter,
        merchant_ref: None,
        config: serde_json::json!({}),
    }
}

fn resolve(selected: &SelectedRoute, routing_config: &RoutingConfig) -> AcquirerRoute {
    let config = routing_config
        .enabled_adapter(&selected.adapter)
        .map(|entry| entry.config.clone())
        .unwrap_or_else(|| serde_json::json!({}));
    AcquirerRoute {
        adapter: selected.adapter.clone(),
        merchant_ref: selected.merchant_ref.clone(),
        config,
    }
}
