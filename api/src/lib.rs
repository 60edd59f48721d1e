use std::net::SocketAddr;
use std::sync::Arc;

pub mod core;
pub mod error_handler;
mod routes;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;
use tracing::info;

use crate::core::app_state::AppState;
use crate::error_handler::AppError;
use crate::routes::{
    health::health_route::health, metrics::metrics_route::metrics,
    webhook::github_webhook_route::github_webhook,
};

pub async fn start() -> Result<(), AppError> {
    let state = Arc::new(AppState::from_env().await?);

    let app = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/webhooks/github", post(github_webhook))
        .with_state(state);

    let host_url = std::env::var("API_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into());

    // Bind to address
    let listener = tokio::net::TcpListener::bind(&host_url)
        .await
        .map_err(AppError::Bind)?;
    info!("listening on {host_url}");

    // Start server with graceful shutdown on Ctrl+C. Connect info feeds the
    // per-IP rate limiter.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(AppError::Server)?;

    Ok(())
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    // Wait for the Ctrl+C signal
    signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");
}
