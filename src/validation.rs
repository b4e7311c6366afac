//! Request validation
//!
//! Checks run in a fixed order so that a request failing several checks
//! always reports the same error: payload shape, model id format,
//! messages, size budget, then registry-backed provider checks last.

use crate::error::ApiError;
use modelgate_routing::{ChatMessage, RegistrySnapshot};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// An OpenAI-style chat completion request
///
/// Unknown fields are preserved in `extra` so they can be forwarded to
/// the upstream provider untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionRequest {
    /// Explicit `<provider>/<model>` id, if the caller chose one
    pub model: Option<String>,
    /// Conversation messages
    pub messages: Vec<ChatMessage>,
    /// Tool declarations
    pub tools: Option<Vec<Value>>,
    /// Streaming flag, relayed to the provider
    pub stream: Option<bool>,
    /// Fields we do not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Validate a raw request body.
///
/// `snapshot` is `None` when the registry cannot be queried; that only
/// matters once every registry-independent check has passed.
pub fn validate_request(
    body: &[u8],
    max_chars: usize,
    snapshot: Option<&Arc<RegistrySnapshot>>,
) -> Result<ChatCompletionRequest, ApiError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::InvalidPayload(format!("Request body is not valid JSON: {e}")))?;
    let object = value
        .as_object()
        .ok_or_else(|| ApiError::InvalidPayload("Request body must be a JSON object".to_string()))?;

    let model = validate_model_field(object)?;
    validate_messages_field(object)?;

    let total_chars = content_chars(object);
    if total_chars > max_chars {
        return Err(ApiError::TokenLimitExceeded(format!(
            "Request content is {total_chars} characters; the limit is {max_chars}"
        )));
    }

    if let Some(ref id) = model {
        let snapshot = snapshot.ok_or(ApiError::RegistryUnavailable)?;
        // Split already verified by validate_model_field.
        if let Some((provider, _)) = id.split_once('/') {
            if !snapshot.provider_known(provider) {
                return Err(ApiError::UnknownProvider(format!(
                    "Unknown provider '{provider}'"
                )));
            }
        }
    }

    serde_json::from_value(value)
        .map_err(|e| ApiError::InvalidPayload(format!("Request body is malformed: {e}")))
}

/// `model` is optional; when present it must be a non-empty
/// `<provider>/<model>` string. An empty provider or model segment is
/// reported as an unknown provider rather than a format error.
fn validate_model_field(object: &Map<String, Value>) -> Result<Option<String>, ApiError> {
    let Some(raw) = object.get("model") else {
        return Ok(None);
    };
    if raw.is_null() {
        return Ok(None);
    }
    let id = raw.as_str().ok_or_else(|| {
        ApiError::InvalidPayload("Field 'model' must be a string".to_string())
    })?;

    let Some((provider, name)) = id.split_once('/') else {
        return Err(ApiError::InvalidModelFormat(format!(
            "Model id '{id}' must look like '<provider>/<model>'"
        )));
    };
    if provider.is_empty() {
        return Err(ApiError::UnknownProvider(
            "Model id has an empty provider segment".to_string(),
        ));
    }
    if name.is_empty() {
        return Err(ApiError::UnknownProvider(format!(
            "Model id '{id}' has an empty model segment"
        )));
    }
    Ok(Some(id.to_string()))
}

fn validate_messages_field(object: &Map<String, Value>) -> Result<(), ApiError> {
    let raw = object.get("messages").ok_or_else(|| {
        ApiError::InvalidMessages("Field 'messages' is required".to_string())
    })?;
    let items = raw.as_array().ok_or_else(|| {
        ApiError::InvalidMessages("Field 'messages' must be an array".to_string())
    })?;
    if items.is_empty() {
        return Err(ApiError::InvalidMessages(
            "Field 'messages' must not be empty".to_string(),
        ));
    }
    for (index, item) in items.iter().enumerate() {
        serde_json::from_value::<ChatMessage>(item.clone()).map_err(|e| {
            ApiError::InvalidMessages(format!("messages[{index}] is malformed: {e}"))
        })?;
    }
    Ok(())
}

/// Total characters across every message's textual content.
fn content_chars(object: &Map<String, Value>) -> usize {
    let Some(items) = object.get("messages").and_then(Value::as_array) else {
        return 0;
    };
    items
        .iter()
        .filter_map(|item| serde_json::from_value::<ChatMessage>(item.clone()).ok())
        .map(|message| message.text().chars().count())
        .sum()
}
