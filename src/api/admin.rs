//! Admin endpoints

use crate::middleware::auth::RequireAuth;
use crate::server::AppState;
use axum::extract::Extension;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use axum::Router;
use modelgate_routing::RegistryConfig;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

/// Admin routes
pub fn admin_routes() -> Router {
    Router::new().route("/admin/reload", post(reload_models))
}

#[derive(Debug, Serialize)]
struct ReloadResponse {
    reloaded: bool,
    models: usize,
    source: String,
}

/// Re-read the model catalogue file and swap it in atomically.
/// Requests already in flight keep the snapshot they started with.
async fn reload_models(_auth: RequireAuth, Extension(state): Extension<AppState>) -> Response {
    let Some(path) = state.config.models_file.clone() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "No models_file configured; the built-in catalogue cannot be reloaded"
            })),
        )
            .into_response();
    };

    let raw = match tokio::fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(path = %path, error = %e, "failed to read model catalogue");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("Failed to read '{path}': {e}")})),
            )
                .into_response();
        }
    };
    let config = match RegistryConfig::from_toml_str(&raw) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path, error = %e, "model catalogue did not parse");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("Failed to parse '{path}': {e}")})),
            )
                .into_response();
        }
    };

    let models = state.registry.load(&config);
    info!(path = %path, models, "model catalogue reloaded");
    Json(ReloadResponse {
        reloaded: true,
        models,
        source: path,
    })
    .into_response()
}
