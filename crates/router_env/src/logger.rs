//! Structured JSON logging to stdout, plus the `log::info!`-style macros
//! re-exported under `router_env::logger` so call sites read
//! `logger::info!(..)` the way the teacher's codebase does.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::Env;

pub fn init(service_name: &str, env: Env) -> tracing_appender::non_blocking::WorkerGuard {
    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match env {
        Env::Production => EnvFilter::new("info"),
        Env::Sandbox => EnvFilter::new("info,router=debug"),
        Env::Development => EnvFilter::new("debug"),
    });

    let fmt_layer = fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_target(true)
        .with_current_span(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();

    tracing::info!(service = service_name, environment = %env, "logger initialized");
    guard
}

pub use tracing::{debug, error, info, warn};
