//! Graceful shutdown: waits for SIGTERM/SIGINT and lets in-flight requests
//! drain before the process exits, the way the teacher's `signals` feature
//! wires up `signal-hook-tokio`.

use futures::StreamExt;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook_tokio::Signals;

pub async fn wait_for_shutdown_signal() {
    let Ok(mut signals) = Signals::new([SIGTERM, SIGINT]) else {
        // Fall back to ctrl_c alone if registering the signal set fails.
        let _ = tokio::signal::ctrl_c().await;
        return;
    };
    signals.next().await;
}
