//! `Merchant` (§3): the external aggregate root. The core only consumes
//! `id` and `routing_config`; everything else about a merchant account is
//! deliberately out of scope (§1).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One enabled acquirer entry under a merchant's routing config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfigEntry {
    pub adapter: String,
    pub enabled: bool,
    #[serde(default)]
    pub merchant_ref: Option<String>,
    #[serde(default)]
    pub config: serde_json::Value,
}

/// §4.7's routing strategy selector. `"rules"` and `"smart"` are reserved
/// and, per the spec, fall back to the default path until built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RoutingStrategy {
    Default,
    Rules,
    Smart,
}

impl Default for RoutingStrategy {
    fn default() -> Self {
        Self::Default
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RoutingConfig {
    #[serde(default)]
    pub strategy: RoutingStrategy,
    pub default_adapter: Option<String>,
    #[serde(default)]
    pub adapters: Vec<AdapterConfigEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Merchant {
    pub id: Uuid,
    pub routing_config: RoutingConfig,
}

impl RoutingConfig {
    pub fn enabled_adapter(&self, name: &str) -> Option<&AdapterConfigEntry> {
        self.adapters.iter().find(|a| a.adapter == name && a.enabled)
    }
}
