//! The process-wide, request-shared state (§5's "shared resources" list):
//! repository handle, KV backend, adapter registry, clock, settings, and
//! the customer directory. Exactly the teacher's `routes::AppState`,
//! narrowed to this system's ports.

use std::sync::Arc;

use common_utils::date_time::{Clock, SystemClock};
use hyperswitch_interfaces::registry::ConnectorRegistry;
use redis_interface::kv::KvBackend;
use storage_impl::StorageInterface;

use crate::balance_ledger::BalanceLedger;
use crate::configs::Settings;
use crate::customer_directory::CustomerDirectory;
use crate::kv_fallback::InMemoryKv;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StorageInterface>,
    pub kv: Arc<KvBackend>,
    /// Always present; only consulted when `kv` is `KvBackend::None`
    /// (§4.2's "repository-backed fallback" — this workspace keeps it
    /// in-process rather than round-tripping to the repository).
    pub kv_fallback: Arc<InMemoryKv>,
    pub registry: Arc<ConnectorRegistry>,
    pub clock: Arc<dyn Clock>,
    pub settings: Arc<Settings>,
    pub customers: Arc<CustomerDirectory>,
    pub balance: Arc<BalanceLedger>,
}

impl AppState {
    pub fn new(store: Arc<dyn StorageInterface>, kv: KvBackend, settings: Settings) -> Self {
        let registry = Arc::new(ConnectorRegistry::new());
        crate::adapters::register_default_adapters(&registry);
        Self {
            store,
            kv: Arc::new(kv),
            kv_fallback: Arc::new(InMemoryKv::new()),
            registry,
            clock: Arc::new(SystemClock),
            settings: Arc::new(settings),
            customers: Arc::new(CustomerDirectory::new()),
            balance: Arc::new(BalanceLedger::new()),
        }
    }
}
