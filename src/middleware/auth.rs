//! Authentication middleware for Axum
//!
//! Validates Bearer tokens or API keys against the configured key set.
//! When no keys are configured, authentication is disabled and every
//! request passes.

use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Configured API keys, injected as an extension
#[derive(Debug, Clone, Default)]
pub struct ApiKeys(pub Arc<HashSet<String>>);

impl ApiKeys {
    /// Build from a list of keys
    #[must_use]
    pub fn new(keys: impl IntoIterator<Item = String>) -> Self {
        Self(Arc::new(keys.into_iter().collect()))
    }

    fn is_enabled(&self) -> bool {
        !self.0.is_empty()
    }

    fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }
}

/// JSON error response for auth failures
#[derive(Debug, Serialize)]
struct AuthErrorResponse {
    error: String,
    code: String,
}

/// Auth rejection type
pub struct AuthRejection {
    status: StatusCode,
    body: AuthErrorResponse,
}

impl AuthRejection {
    fn missing() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            body: AuthErrorResponse {
                error: "Authentication required. Provide Authorization: Bearer <key> or X-API-Key header.".to_string(),
                code: "unauthorized".to_string(),
            },
        }
    }

    fn invalid() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            body: AuthErrorResponse {
                error: "Invalid API key".to_string(),
                code: "invalid_credentials".to_string(),
            },
        }
    }

    fn misconfigured() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: AuthErrorResponse {
                error: "API key set not configured".to_string(),
                code: "internal_error".to_string(),
            },
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Axum extractor that requires a valid API key.
///
/// Extracts the key from:
/// 1. `Authorization: Bearer <key>` header
/// 2. `X-API-Key: <key>` header
pub struct RequireAuth;

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let keys = parts
            .extensions
            .get::<ApiKeys>()
            .ok_or_else(AuthRejection::misconfigured)?;

        if !keys.is_enabled() {
            return Ok(RequireAuth);
        }

        let key = extract_key(parts).ok_or_else(AuthRejection::missing)?;
        if !keys.contains(&key) {
            return Err(AuthRejection::invalid());
        }
        Ok(RequireAuth)
    }
}

/// Extract the API key from request headers
fn extract_key(parts: &Parts) -> Option<String> {
    if let Some(auth_header) = parts.headers.get("authorization") {
        if let Ok(value) = auth_header.to_str() {
            if let Some(key) = value.strip_prefix("Bearer ") {
                return Some(key.trim().to_string());
            }
        }
    }

    if let Some(api_key_header) = parts.headers.get("x-api-key") {
        if let Ok(value) = api_key_header.to_str() {
            return Some(value.trim().to_string());
        }
    }

    None
}
