//! Web API module for the gateway
//!
//! Endpoints:
//! - `POST /v1/chat/completions` — routed chat completion proxy
//! - `GET /v1/models` — the model catalogue, OpenAI list shape
//! - `GET /health`, `GET /metrics` — liveness and counters
//! - `POST /admin/reload` — reload the model catalogue

pub mod admin;
pub mod chat;
pub mod health;
pub mod models;

use axum::Router;

pub use admin::admin_routes;
pub use chat::chat_routes;
pub use health::health_routes;
pub use models::models_routes;

/// Create the API router with all endpoints
pub fn api_router() -> Router {
    Router::new()
        .merge(chat_routes())
        .merge(models_routes())
        .merge(health_routes())
        .merge(admin_routes())
}
