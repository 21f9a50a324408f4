//! The webhook dispatcher binary (§4.11): polls `webhook_deliveries` for
//! due rows and POSTs them, independently of the `router` HTTP process.

use std::sync::Arc;
use std::time::Duration;

use common_utils::signals::wait_for_shutdown_signal;
use router::configs::Settings;
use scheduler::WebhookDispatcher;
use storage_impl::mock_db::MockDb;

const POLL_INTERVAL: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    let env = router_env::config::current_env();
    let _guard = router_env::setup("scheduler", env);

    let _settings = Settings::new().unwrap_or_else(|error| {
        router_env::logger::warn!(?error, "failed to load configuration, falling back to defaults");
        Settings::default()
    });

    // This binary runs as a separate process from `router` and, absent a
    // shared Postgres deployment, keeps its own in-memory store: there is
    // nothing to dispatch unless deliveries were enqueued in this same
    // process. A real deployment points both binaries at the same
    // `postgres`-backed `StorageInterface`.
    let store: Arc<dyn storage_impl::StorageInterface> = Arc::new(MockDb::new());
    let dispatcher = WebhookDispatcher::new(store);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let shutdown = tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        let _ = shutdown_tx.send(());
    });

    router_env::logger::info!(poll_interval_secs = POLL_INTERVAL.as_secs(), "starting webhook dispatcher");
    dispatcher.run(POLL_INTERVAL, shutdown_rx).await;
    let _ = shutdown.await;
}
