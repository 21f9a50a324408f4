//! Logging and environment-awareness shared by every binary in the
//! workspace. Re-exports [`tracing`] and [`tracing::instrument`] so core
//! modules depend on one crate for both, the way the teacher's `router_env`
//! does for the rest of the router.

pub mod config;
pub mod logger;
pub mod metrics;

pub use tracing;
pub use tracing::instrument;
pub use tracing_subscriber;

/// Environment the process is running in. Surfaced by the `GET /` health
/// check and folded into every log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Env {
    Development,
    Sandbox,
    Production,
}

impl Default for Env {
    fn default() -> Self {
        Self::Development
    }
}

/// Named flows, attached to the tracing span of every request so access
/// logs and traces can be grouped by business operation rather than by
/// route string.
#[derive(Debug, Clone, Copy, strum::Display)]
pub enum Flow {
    HealthCheck,
    PaymentIntentsCreate,
    PaymentIntentsRetrieve,
    PaymentIntentsList,
    PaymentIntentsUpdate,
    PaymentsConfirm,
    PaymentsCompleteAuthentication,
    PaymentsCapture,
    PaymentsCancel,
    RefundsCreate,
    RefundsRetrieve,
    RefundsList,
    CustomersCreate,
    CustomersRetrieve,
    CustomersUpdate,
    CustomersDelete,
    CustomersList,
    BalanceTransactionsList,
    BalanceTransactionsRetrieve,
    BalanceSummary,
}

/// Initialize the global `tracing` subscriber. Returns a guard that must be
/// held for the lifetime of the process (it owns the non-blocking writer).
pub fn setup(service_name: &str, env: Env) -> tracing_appender::non_blocking::WorkerGuard {
    logger::init(service_name, env)
}
