//! Gateway configuration
//!
//! Loaded from a TOML file; every section has defaults so an empty
//! file (or a missing one) yields a working local setup.

use crate::middleware::rate_limit::RateLimitSettings;
use anyhow::Context;
use modelgate_routing::{ClassifierMode, RoutingStrategy};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// HTTP listener
    #[serde(default)]
    pub server: ServerConfig,
    /// Classification cache backend
    #[serde(default)]
    pub redis: RedisConfig,
    /// Prompt classifier
    #[serde(default)]
    pub classifier: ClassifierConfig,
    /// Routing defaults
    #[serde(default)]
    pub routing: RoutingConfig,
    /// API key auth
    #[serde(default)]
    pub auth: AuthConfig,
    /// Request throttling
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    /// Upstream providers
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Optional model catalogue file (TOML); built-in defaults otherwise
    #[serde(default)]
    pub models_file: Option<String>,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Redis cache settings
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Connection URL; in-memory cache when absent
    #[serde(default)]
    pub url: Option<String>,
    /// Classification entry TTL in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: None,
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Classifier settings
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    /// Which classifier stages run
    #[serde(default)]
    pub mode: ClassifierMode,
    /// Base URL of the classification LLM; rules only when absent
    #[serde(default)]
    pub llm_base_url: Option<String>,
    /// Model served at `llm_base_url`
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    /// Classification request timeout in seconds
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
    /// Character count that flips a prompt to long-context
    #[serde(default = "default_long_context_threshold")]
    pub long_context_threshold: usize,
}

fn default_llm_model() -> String {
    "llama3.2".to_string()
}
fn default_llm_timeout_secs() -> u64 {
    15
}
fn default_long_context_threshold() -> usize {
    modelgate_routing::DEFAULT_LONG_CONTEXT_THRESHOLD
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            mode: ClassifierMode::default(),
            llm_base_url: None,
            llm_model: default_llm_model(),
            timeout_secs: default_llm_timeout_secs(),
            long_context_threshold: default_long_context_threshold(),
        }
    }
}

/// Routing defaults
#[derive(Debug, Clone, Deserialize)]
pub struct RoutingConfig {
    /// Strategy used when the request does not override it
    #[serde(default)]
    pub default_strategy: RoutingStrategy,
    /// Character budget for request content
    #[serde(default = "default_max_request_chars")]
    pub max_request_chars: usize,
}

fn default_max_request_chars() -> usize {
    200_000
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_strategy: RoutingStrategy::default(),
            max_request_chars: default_max_request_chars(),
        }
    }
}

/// API key auth settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Accepted keys; auth disabled when empty
    #[serde(default)]
    pub api_keys: Vec<String>,
}

/// Upstream provider settings
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Provider name to endpoint
    #[serde(default = "default_providers")]
    pub providers: HashMap<String, ProviderConfig>,
    /// Upstream request timeout in seconds
    #[serde(default = "default_upstream_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_upstream_timeout_secs() -> u64 {
    120
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            timeout_secs: default_upstream_timeout_secs(),
        }
    }
}

/// One provider endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// OpenAI-compatible base URL (up to and including the version segment)
    pub base_url: String,
    /// Environment variable holding the provider API key
    #[serde(default)]
    pub api_key_env: Option<String>,
}

impl ProviderConfig {
    fn new(base_url: &str, api_key_env: Option<&str>) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key_env: api_key_env.map(str::to_string),
        }
    }
}

fn default_providers() -> HashMap<String, ProviderConfig> {
    HashMap::from([
        (
            "openai".to_string(),
            ProviderConfig::new("https://api.openai.com/v1", Some("OPENAI_API_KEY")),
        ),
        (
            "groq".to_string(),
            ProviderConfig::new("https://api.groq.com/openai/v1", Some("GROQ_API_KEY")),
        ),
        (
            "deepseek".to_string(),
            ProviderConfig::new("https://api.deepseek.com/v1", Some("DEEPSEEK_API_KEY")),
        ),
        (
            "gemini".to_string(),
            ProviderConfig::new(
                "https://generativelanguage.googleapis.com/v1beta/openai",
                Some("GEMINI_API_KEY"),
            ),
        ),
        (
            "anthropic".to_string(),
            ProviderConfig::new("https://api.anthropic.com/v1", Some("ANTHROPIC_API_KEY")),
        ),
        (
            "ollama".to_string(),
            ProviderConfig::new("http://localhost:11434/v1", None),
        ),
    ])
}

impl AppConfig {
    /// Load from a TOML file; defaults when the file does not exist
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.redis.cache_ttl_secs, 3600);
        assert!(config.auth.api_keys.is_empty());
        assert!(config.upstream.providers.contains_key("openai"));
        assert!(config.models_file.is_none());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            port = 9000

            [redis]
            url = "redis://localhost:6379"

            [routing]
            default_strategy = "quality-first"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.redis.url.as_deref(), Some("redis://localhost:6379"));
        assert_eq!(
            config.routing.default_strategy,
            RoutingStrategy::QualityFirst
        );
        assert_eq!(config.routing.max_request_chars, 200_000);
    }

    #[test]
    fn test_provider_override() {
        let config: AppConfig = toml::from_str(
            r#"
            [upstream.providers.openai]
            base_url = "http://localhost:9999/v1"
            "#,
        )
        .unwrap();
        // Explicit provider tables replace the default map wholesale.
        assert_eq!(config.upstream.providers.len(), 1);
        assert_eq!(
            config.upstream.providers["openai"].base_url,
            "http://localhost:9999/v1"
        );
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let config = AppConfig::load(Path::new("/nonexistent/modelgate.toml")).unwrap();
        assert_eq!(config.server.port, 8080);
    }
}
