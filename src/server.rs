//! Server assembly
//!
//! Builds the shared state from configuration, wires the router with
//! its layers and runs the listener.

use crate::config::AppConfig;
use crate::metrics::Metrics;
use crate::middleware::auth::ApiKeys;
use crate::middleware::rate_limit::RateLimitLayer;
use crate::upstream::{HttpUpstream, UpstreamClient};
use anyhow::Context;
use axum::extract::Extension;
use axum::Router;
use modelgate_routing::{
    connect_cache, ClassifierMode, HybridClassifier, LlmClassifier, LlmClassifierConfig,
    ModelRegistry, RegistryConfig, RoutingEngine, RulesClassifier,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared application state, injected as an extension
#[derive(Clone)]
pub struct AppState {
    /// Model catalogue
    pub registry: Arc<ModelRegistry>,
    /// Routing engine
    pub engine: Arc<RoutingEngine>,
    /// Provider client
    pub upstream: Arc<dyn UpstreamClient>,
    /// Gateway counters
    pub metrics: Arc<Metrics>,
    /// Loaded configuration
    pub config: Arc<AppConfig>,
    /// Which classification cache backend was elected at startup
    pub cache_backend: &'static str,
}

/// Build the application state from configuration
pub async fn build_state(config: AppConfig) -> anyhow::Result<AppState> {
    let registry = Arc::new(load_registry(&config)?);

    let cache = connect_cache(config.redis.url.as_deref()).await;
    let cache_backend = cache.backend();

    let rules = RulesClassifier::new(config.classifier.long_context_threshold);
    let llm = match &config.classifier.llm_base_url {
        Some(base_url) => {
            let llm_config = LlmClassifierConfig::default()
                .with_base_url(base_url.clone())
                .with_model(config.classifier.llm_model.clone())
                .with_timeout(Duration::from_secs(config.classifier.timeout_secs));
            Some(LlmClassifier::new(llm_config).context("building LLM classifier")?)
        }
        None => {
            if config.classifier.mode != ClassifierMode::RulesOnly {
                warn!("no classifier LLM configured; rules tier only");
            }
            None
        }
    };
    let classifier = HybridClassifier::from_parts(rules, llm, config.classifier.mode);

    let metrics = Arc::new(Metrics::default());
    let engine = RoutingEngine::new(Arc::new(classifier), Arc::clone(&registry), cache)
        .with_strategy(config.routing.default_strategy)
        .with_cache_ttl(Duration::from_secs(config.redis.cache_ttl_secs))
        .with_metrics(Arc::clone(&metrics) as Arc<dyn modelgate_routing::RoutingMetrics>);

    let upstream = HttpUpstream::new(&config.upstream)
        .map_err(|e| anyhow::anyhow!("building upstream client: {e}"))?;

    Ok(AppState {
        registry,
        engine: Arc::new(engine),
        upstream: Arc::new(upstream),
        metrics,
        config: Arc::new(config),
        cache_backend,
    })
}

fn load_registry(config: &AppConfig) -> anyhow::Result<ModelRegistry> {
    match &config.models_file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading model catalogue {path}"))?;
            let registry_config = RegistryConfig::from_toml_str(&raw)
                .map_err(|e| anyhow::anyhow!("parsing model catalogue {path}: {e}"))?;
            Ok(ModelRegistry::new(&registry_config))
        }
        None => {
            info!("no models_file configured; using built-in catalogue");
            Ok(ModelRegistry::default())
        }
    }
}

/// Build the full router with all layers applied
pub fn build_router(state: AppState) -> Router {
    let rate_limit_layer = RateLimitLayer::new(&state.config.rate_limit);
    if state.config.rate_limit.enabled {
        rate_limit_layer.state().spawn_cleanup();
        info!(
            rpm = state.config.rate_limit.requests_per_minute,
            global_rpm = state.config.rate_limit.global_requests_per_minute,
            "rate limiting enabled"
        );
    } else {
        info!("rate limiting disabled");
    }

    let api_keys = ApiKeys::new(state.config.auth.api_keys.iter().cloned());
    if api_keys.0.is_empty() {
        warn!("no API keys configured; authentication disabled");
    }

    crate::api::api_router()
        .layer(Extension(state))
        .layer(Extension(api_keys))
        .layer(rate_limit_layer)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until shutdown
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;

    let state = build_state(config).await?;
    let app = build_router(state);

    info!("gateway listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("binding listener")?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("HTTP server error")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
