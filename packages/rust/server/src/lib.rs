//! Market analyst HTTP server.
//!
//! Axum-based REST entrypoint for the SWOT pipeline.

pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use analyst_core::SwotPipeline;
use analyst_shared::{AnalystError, Result};
use axum::{Router, routing::post};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/analyze", post(routes::analyze::analyze))
        .route("/report", post(routes::report::report))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn run_server(pipeline: Arc<SwotPipeline>, addr: SocketAddr) -> Result<()> {
    let app = create_router(AppState::new(pipeline));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AnalystError::Network(format!("failed to bind {addr}: {e}")))?;
    tracing::info!(%addr, "server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| AnalystError::Network(format!("server error: {e}")))?;
    Ok(())
}
