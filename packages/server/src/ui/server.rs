//! Server execution logic.

use std::{net::SocketAddr, sync::Arc};

use axum::{Router, routing::get};
use tokio::{net::TcpListener, sync::watch};
use tower_http::trace::TraceLayer;

use super::{
    handler::{get_stats, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Room21 chat server
///
/// This struct owns the handler state and the shutdown flag raised by the admin
/// `stop` command.
///
/// # Example
///
/// ```ignore
/// let listener = TcpListener::bind("0.0.0.0:3000").await?;
/// let hub = bootstrap::assemble(config, "data", listener.local_addr()?.to_string()).await;
/// hub.server.serve(listener).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    shutdown: watch::Receiver<bool>,
}

impl Server {
    /// Create a new Server instance
    pub fn new(state: AppState, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            state: Arc::new(state),
            shutdown,
        }
    }

    /// Build the router
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/stats", get(get_stats))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Serve on an already bound listener until the shutdown flag is raised
    ///
    /// # Errors
    ///
    /// Returns an error if there's an error during server execution.
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        let app = self.router();

        tracing::info!(
            "Room21 chat server listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/ws", listener.local_addr()?);

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal(self.shutdown))
        .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
