//! Chat completion endpoint
//!
//! Validates the request, routes it to a model, rewrites the model
//! field to the provider's native name and relays the provider
//! response verbatim, with routing metadata in response headers.

use crate::error::ApiError;
use crate::middleware::auth::RequireAuth;
use crate::server::AppState;
use crate::validation::validate_request;
use axum::body::{Body, Bytes};
use axum::extract::Extension;
use axum::http::header::HeaderName;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use modelgate_routing::{RouteRequest, RoutingDecision, RoutingStrategy};
use serde_json::Value;
use std::str::FromStr;
use tracing::{info, instrument};
use uuid::Uuid;

/// Chat completion routes
pub fn chat_routes() -> Router {
    Router::new().route("/v1/chat/completions", post(chat_completion))
}

#[instrument(skip_all)]
async fn chat_completion(
    _auth: RequireAuth,
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let trace_id = Uuid::new_v4().to_string();
    state.metrics.request();

    match handle(&state, &headers, &body, &trace_id).await {
        Ok(response) => response,
        Err(error) => {
            state.metrics.error();
            error.into_response_with_trace(&trace_id)
        }
    }
}

async fn handle(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
    trace_id: &str,
) -> Result<Response, ApiError> {
    let snapshot = state.registry.try_snapshot();
    let request = validate_request(
        body,
        state.config.routing.max_request_chars,
        snapshot.as_ref(),
    )?;

    let strategy = headers
        .get("x-routing-strategy")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| RoutingStrategy::from_str(v).ok());
    let max_cost = headers
        .get("x-max-cost")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|cost| cost.is_finite() && *cost >= 0.0);

    let decision = state
        .engine
        .route(&RouteRequest {
            model: request.model.as_deref(),
            messages: &request.messages,
            tools: request.tools.as_deref(),
            strategy,
            max_cost,
        })
        .await;
    if decision.provider == "unknown" {
        return Err(ApiError::RegistryUnavailable);
    }

    info!(
        trace_id = %trace_id,
        model = %decision.model,
        category = %decision.category,
        "forwarding chat completion"
    );

    // The provider sees its own model name, not our prefixed id.
    let native_model = decision
        .model
        .split_once('/')
        .map_or(decision.model.as_str(), |(_, name)| name);
    let mut payload: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::InvalidPayload(format!("Request body is not valid JSON: {e}")))?;
    payload["model"] = Value::String(native_model.to_string());

    let upstream = state
        .upstream
        .chat_completion(&decision.provider, payload)
        .await?;

    let status =
        StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = Response::builder().status(status);
    if let Some(content_type) = &upstream.content_type {
        builder = builder.header("content-type", content_type);
    }
    let mut response = builder
        .body(Body::from_stream(upstream.body))
        .map_err(|e| ApiError::Upstream(format!("Failed to build response: {e}")))?;
    attach_routing_headers(response.headers_mut(), &decision, trace_id);
    Ok(response)
}

fn attach_routing_headers(headers: &mut HeaderMap, decision: &RoutingDecision, trace_id: &str) {
    let pairs = [
        ("x-route-model", decision.model.as_str()),
        ("x-route-provider", decision.provider.as_str()),
        ("x-route-reason", decision.reason.as_str()),
        ("x-classification", decision.category.as_str()),
        ("x-trace-id", trace_id),
    ];
    for (name, value) in pairs {
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert(HeaderName::from_static(name), value);
        }
    }
    if let Ok(value) = HeaderValue::from_str(&decision.estimated_cost_per_1m.to_string()) {
        headers.insert(
            HeaderName::from_static("x-estimated-cost-per-1m"),
            value,
        );
    }
}
