//! API error taxonomy
//!
//! Every externally visible failure maps to a fixed HTTP status and
//! stable error code, and carries a trace id for correlation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Request-level errors surfaced to callers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Body is not a structured JSON object
    #[error("{0}")]
    InvalidPayload(String),

    /// `model` is present but not `<provider>/<model>` shaped
    #[error("{0}")]
    InvalidModelFormat(String),

    /// Provider (or provider segment) is unknown or empty
    #[error("{0}")]
    UnknownProvider(String),

    /// `messages` is missing, empty or malformed
    #[error("{0}")]
    InvalidMessages(String),

    /// Request content exceeds the configured budget
    #[error("{0}")]
    TokenLimitExceeded(String),

    /// The model registry cannot be queried
    #[error("model registry unavailable")]
    RegistryUnavailable,

    /// Caller exceeded the request rate limit
    #[error("rate limit exceeded")]
    RateLimitExceeded,

    /// Upstream provider failure
    #[error("{0}")]
    Upstream(String),
}

impl ApiError {
    /// HTTP status for this error
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidPayload(_)
            | Self::InvalidModelFormat(_)
            | Self::UnknownProvider(_)
            | Self::InvalidMessages(_) => StatusCode::BAD_REQUEST,
            Self::TokenLimitExceeded(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RegistryUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Stable machine-readable code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            // InvalidMessages shares invalid_payload on the wire.
            Self::InvalidPayload(_) | Self::InvalidMessages(_) => "invalid_payload",
            Self::InvalidModelFormat(_) => "invalid_model_format",
            Self::UnknownProvider(_) => "unknown_provider",
            Self::TokenLimitExceeded(_) => "token_limit_exceeded",
            Self::RegistryUnavailable => "model_registry_unavailable",
            Self::RateLimitExceeded => "rate_limit_exceeded",
            Self::Upstream(_) => "upstream_error",
        }
    }

    /// Render with an existing trace id
    #[must_use]
    pub fn into_response_with_trace(self, trace_id: &str) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: ErrorDetail {
                message: self.to_string(),
                code: self.code(),
            },
            trace_id: trace_id.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// JSON error envelope
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Error detail
    pub error: ErrorDetail,
    /// Correlation id
    pub trace_id: String,
}

/// Message and code of one error
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Human-readable message
    pub message: String,
    /// Stable error code
    pub code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let trace_id = Uuid::new_v4().to_string();
        self.into_response_with_trace(&trace_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_code_mapping() {
        let cases: [(ApiError, StatusCode, &str); 8] = [
            (
                ApiError::InvalidPayload("x".into()),
                StatusCode::BAD_REQUEST,
                "invalid_payload",
            ),
            (
                ApiError::InvalidModelFormat("x".into()),
                StatusCode::BAD_REQUEST,
                "invalid_model_format",
            ),
            (
                ApiError::UnknownProvider("x".into()),
                StatusCode::BAD_REQUEST,
                "unknown_provider",
            ),
            (
                ApiError::InvalidMessages("x".into()),
                StatusCode::BAD_REQUEST,
                "invalid_payload",
            ),
            (
                ApiError::TokenLimitExceeded("x".into()),
                StatusCode::PAYLOAD_TOO_LARGE,
                "token_limit_exceeded",
            ),
            (
                ApiError::RegistryUnavailable,
                StatusCode::SERVICE_UNAVAILABLE,
                "model_registry_unavailable",
            ),
            (
                ApiError::RateLimitExceeded,
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limit_exceeded",
            ),
            (
                ApiError::Upstream("x".into()),
                StatusCode::BAD_GATEWAY,
                "upstream_error",
            ),
        ];
        for (error, status, code) in cases {
            assert_eq!(error.status(), status);
            assert_eq!(error.code(), code);
        }
    }
}
