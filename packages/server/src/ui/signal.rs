//! Shutdown signal.

use tokio::sync::watch;

/// Resolves once the hub has been asked to stop.
///
/// The flag is raised by the `stop` admin command, which the console and the
/// Ctrl+C handler both go through.
pub async fn shutdown_signal(mut stop: watch::Receiver<bool>) {
    while !*stop.borrow_and_update() {
        if stop.changed().await.is_err() {
            // Sender dropped without a stop request: keep serving
            std::future::pending::<()>().await;
        }
    }
    tracing::info!("Shutdown requested, stopping listener");
}
