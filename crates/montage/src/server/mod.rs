//! HTTP boundary: routes, CORS, body limits, and server lifecycle.

mod error;
mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use montage_core::Montage;
use tower_http::cors::{Any, CorsLayer};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub montage: Arc<Montage>,
    pub request_timeout: Duration,
}

/// Build the router for `montage`, sized by its `[server]` settings.
pub fn router(montage: Arc<Montage>) -> Router {
    let server = &montage.config().server;
    let body_limit = usize::try_from(server.max_body_mb.saturating_mul(1024 * 1024))
        .unwrap_or(usize::MAX);
    let state = AppState {
        request_timeout: Duration::from_millis(server.request_timeout_ms),
        montage: Arc::clone(&montage),
    };

    // Browsers call the endpoint cross-origin and send a preflight first.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", post(handlers::merge))
        .route("/merge", post(handlers::merge))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn run(montage: Arc<Montage>, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {addr}: {e}"))?;
    let local = listener.local_addr()?;
    let app = router(montage);

    tracing::info!(%local, "Montage server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Montage server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
