//! Upstream provider client
//!
//! Forwards the (possibly rewritten) chat payload to the provider's
//! OpenAI-compatible endpoint and relays the response body as a stream
//! so SSE responses pass through untouched.

use crate::config::UpstreamConfig;
use crate::error::ApiError;
use async_trait::async_trait;
use axum::body::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Response relayed from a provider
pub struct UpstreamResponse {
    /// Provider HTTP status
    pub status: u16,
    /// Provider content type, if any
    pub content_type: Option<String>,
    /// Raw body stream
    pub body: BoxStream<'static, std::io::Result<Bytes>>,
}

/// Client for OpenAI-compatible providers
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Send one chat completion payload to the named provider
    async fn chat_completion(
        &self,
        provider: &str,
        payload: Value,
    ) -> Result<UpstreamResponse, ApiError>;
}

struct ProviderEndpoint {
    base_url: String,
    api_key: Option<String>,
}

/// HTTP implementation over reqwest
pub struct HttpUpstream {
    client: reqwest::Client,
    providers: HashMap<String, ProviderEndpoint>,
}

impl HttpUpstream {
    /// Build from config, resolving API keys from the environment
    pub fn new(config: &UpstreamConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Upstream(format!("Failed to build HTTP client: {e}")))?;

        let providers = config
            .providers
            .iter()
            .map(|(name, provider)| {
                let api_key = provider
                    .api_key_env
                    .as_deref()
                    .and_then(|var| std::env::var(var).ok())
                    .filter(|key| !key.is_empty());
                if api_key.is_none() && provider.api_key_env.is_some() {
                    debug!(provider = %name, "no API key in environment");
                }
                let endpoint = ProviderEndpoint {
                    base_url: provider.base_url.trim_end_matches('/').to_string(),
                    api_key,
                };
                (name.clone(), endpoint)
            })
            .collect();

        Ok(Self { client, providers })
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstream {
    async fn chat_completion(
        &self,
        provider: &str,
        payload: Value,
    ) -> Result<UpstreamResponse, ApiError> {
        let endpoint = self.providers.get(provider).ok_or_else(|| {
            ApiError::Upstream(format!("No endpoint configured for provider '{provider}'"))
        })?;

        let url = format!("{}/chat/completions", endpoint.base_url);
        let mut request = self.client.post(&url).json(&payload);
        if let Some(key) = &endpoint.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            warn!(provider = %provider, error = %e, "upstream request failed");
            ApiError::Upstream(format!("Request to provider '{provider}' failed: {e}"))
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(std::io::Error::other))
            .boxed();

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;

    #[tokio::test]
    async fn test_unconfigured_provider_is_upstream_error() {
        let config = UpstreamConfig {
            providers: HashMap::new(),
            timeout_secs: 5,
        };
        let upstream = HttpUpstream::new(&config).unwrap();
        let error = upstream
            .chat_completion("nowhere", serde_json::json!({}))
            .await
            .err();
        assert!(matches!(error, Some(ApiError::Upstream(_))));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_upstream_error() {
        let config = UpstreamConfig {
            providers: HashMap::from([(
                "local".to_string(),
                ProviderConfig {
                    base_url: "http://127.0.0.1:1/v1".to_string(),
                    api_key_env: None,
                },
            )]),
            timeout_secs: 2,
        };
        let upstream = HttpUpstream::new(&config).unwrap();
        let error = upstream
            .chat_completion("local", serde_json::json!({"model": "x"}))
            .await
            .err();
        assert!(matches!(error, Some(ApiError::Upstream(_))));
    }
}
