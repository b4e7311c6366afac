//! Model catalogue endpoint

use crate::error::ApiError;
use crate::server::AppState;
use axum::extract::Extension;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use modelgate_routing::ModelInfo;
use serde::Serialize;

/// Model listing routes
pub fn models_routes() -> Router {
    Router::new().route("/v1/models", get(list_models))
}

/// OpenAI-style model list
#[derive(Debug, Serialize)]
struct ModelList {
    object: &'static str,
    data: Vec<ModelListEntry>,
}

/// One catalogue entry, OpenAI shape plus routing metadata
#[derive(Debug, Serialize)]
struct ModelListEntry {
    id: String,
    object: &'static str,
    owned_by: String,
    capabilities: Vec<&'static str>,
    quality_tier: &'static str,
    context_length: u32,
    cost_per_1m_input_tokens: f64,
    cost_per_1m_output_tokens: f64,
    supports_vision: bool,
    supports_tools: bool,
}

impl ModelListEntry {
    fn from_info(model: &ModelInfo) -> Self {
        Self {
            id: model.id.clone(),
            object: "model",
            owned_by: model.provider.clone(),
            capabilities: model.capabilities.iter().map(|c| c.as_str()).collect(),
            quality_tier: model.quality_tier.as_str(),
            context_length: model.context_length,
            cost_per_1m_input_tokens: model.cost_per_1m_input,
            cost_per_1m_output_tokens: model.cost_per_1m_output,
            supports_vision: model.supports_vision,
            supports_tools: model.supports_tools,
        }
    }
}

async fn list_models(Extension(state): Extension<AppState>) -> Response {
    let Some(snapshot) = state.registry.try_snapshot() else {
        return ApiError::RegistryUnavailable.into_response();
    };
    let list = ModelList {
        object: "list",
        data: snapshot
            .models()
            .iter()
            .map(ModelListEntry::from_info)
            .collect(),
    };
    Json(list).into_response()
}
