//! Health and metrics endpoints

use crate::server::AppState;
use axum::extract::Extension;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Serialize;

/// Health and metrics routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
}

/// Simple health response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    cache_backend: &'static str,
    models: usize,
    timestamp: chrono::DateTime<chrono::Utc>,
}

async fn health(Extension(state): Extension<AppState>) -> Json<HealthResponse> {
    let models = state
        .registry
        .try_snapshot()
        .map(|s| s.models().len())
        .unwrap_or(0);
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        cache_backend: state.cache_backend,
        models,
        timestamp: chrono::Utc::now(),
    })
}

async fn metrics(Extension(state): Extension<AppState>) -> Json<crate::metrics::MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
