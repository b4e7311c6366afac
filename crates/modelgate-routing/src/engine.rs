//! Routing engine
//!
//! Single pass per request: explicit-model pass-through, else cache-checked
//! classification, then strategy selection with a fallback ladder. Routing
//! never fails a request; when the registry has nothing to offer the
//! engine emits a degraded decision and leaves the upstream collaborator
//! to surface the error.

use crate::cache::{cache_key, ClassificationCache, DEFAULT_CACHE_TTL};
use crate::category::TaskCategory;
use crate::classifier::Classifier;
use crate::message::ChatMessage;
use crate::metrics::{NoopMetrics, RoutingMetrics};
use crate::registry::{ModelInfo, ModelRegistry};
use crate::strategy::{
    route_cost_optimized, route_local_only, route_quality_first, RoutingStrategy,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

/// The outcome of routing one request
#[derive(Debug, Clone)]
pub struct RoutingDecision {
    /// Chosen model id (`<provider>/<model>`, or `"unknown"` when degraded)
    pub model: String,
    /// Provider of the chosen model
    pub provider: String,
    /// Category label that drove the choice (`"explicit"` for pass-through)
    pub category: String,
    /// Human-readable explanation of the choice
    pub reason: String,
    /// Input cost of the chosen model per 1M tokens (USD)
    pub estimated_cost_per_1m: f64,
}

impl RoutingDecision {
    fn for_model(model: &ModelInfo, category: &str, reason: String) -> Self {
        Self {
            model: model.id.clone(),
            provider: model.provider.clone(),
            category: category.to_string(),
            reason,
            estimated_cost_per_1m: model.cost_per_1m_input,
        }
    }

    fn degraded(category: &str, reason: String) -> Self {
        Self {
            model: "unknown".to_string(),
            provider: "unknown".to_string(),
            category: category.to_string(),
            reason,
            estimated_cost_per_1m: 0.0,
        }
    }
}

/// One routing request as seen by the engine
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteRequest<'a> {
    /// Explicit model id supplied by the caller, if any
    pub model: Option<&'a str>,
    /// Conversation messages
    pub messages: &'a [ChatMessage],
    /// Tool declarations, if any
    pub tools: Option<&'a [serde_json::Value]>,
    /// Per-request strategy override
    pub strategy: Option<RoutingStrategy>,
    /// Per-request cost ceiling in dollars
    pub max_cost: Option<f64>,
}

/// Orchestrates classification, caching and model selection
pub struct RoutingEngine {
    classifier: Arc<dyn Classifier>,
    registry: Arc<ModelRegistry>,
    cache: Arc<dyn ClassificationCache>,
    metrics: Arc<dyn RoutingMetrics>,
    default_strategy: RoutingStrategy,
    cache_ttl: Duration,
}

impl RoutingEngine {
    /// Create an engine with the default strategy and cache TTL
    #[must_use]
    pub fn new(
        classifier: Arc<dyn Classifier>,
        registry: Arc<ModelRegistry>,
        cache: Arc<dyn ClassificationCache>,
    ) -> Self {
        Self {
            classifier,
            registry,
            cache,
            metrics: Arc::new(NoopMetrics),
            default_strategy: RoutingStrategy::default(),
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Set the process-wide default strategy
    #[must_use]
    pub fn with_strategy(mut self, strategy: RoutingStrategy) -> Self {
        self.default_strategy = strategy;
        self
    }

    /// Set the classification cache TTL
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Attach a metrics sink
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn RoutingMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Route one request to a model. Never fails.
    #[instrument(skip(self, request))]
    pub async fn route(&self, request: &RouteRequest<'_>) -> RoutingDecision {
        let Some(snapshot) = self.registry.try_snapshot() else {
            return RoutingDecision::degraded(
                "unknown",
                "Model registry unavailable".to_string(),
            );
        };

        // Explicit user intent always wins: no classification, no cache.
        if let Some(id) = request.model {
            if let Some(model) = snapshot.get_model(id) {
                debug!(model = %id, "explicit model pass-through");
                let decision = RoutingDecision::for_model(
                    model,
                    "explicit",
                    "User-specified model".to_string(),
                );
                self.metrics.routed(&decision.model);
                return decision;
            }
        }

        let category = self.classify_cached(request).await;
        let strategy = request.strategy.unwrap_or(self.default_strategy);

        let selected = match strategy {
            RoutingStrategy::CostOptimized => {
                route_cost_optimized(category, &snapshot, request.max_cost)
            }
            RoutingStrategy::QualityFirst => route_quality_first(category, &snapshot),
            RoutingStrategy::LocalOnly => route_local_only(category, &snapshot),
        };

        let decision = match selected {
            Some(model) => RoutingDecision::for_model(
                model,
                category.as_str(),
                format!("{strategy} strategy for '{category}' task"),
            ),
            None => self.fallback_decision(&snapshot, category),
        };

        info!(
            model = %decision.model,
            category = %decision.category,
            strategy = %strategy,
            "routing decision"
        );
        self.metrics.routed(&decision.model);
        decision
    }

    /// Fallback ladder when the strategy found no capable model:
    /// general-chat default, then first registered model, then degraded.
    fn fallback_decision(
        &self,
        snapshot: &crate::registry::RegistrySnapshot,
        category: TaskCategory,
    ) -> RoutingDecision {
        if let Some(model) = snapshot
            .default_for_task(TaskCategory::GeneralChat)
            .and_then(|id| snapshot.get_model(id))
        {
            return RoutingDecision::for_model(
                model,
                category.as_str(),
                format!("No model supports '{category}'; using general_chat default"),
            );
        }
        if let Some(model) = snapshot.models().first() {
            return RoutingDecision::for_model(
                model,
                category.as_str(),
                format!("No model supports '{category}'; using first registered model"),
            );
        }
        RoutingDecision::degraded(
            category.as_str(),
            "Model registry is empty; no model available".to_string(),
        )
    }

    /// Cache-aside classification. Concurrent duplicate classifications of
    /// the same key are tolerated; classification is idempotent.
    async fn classify_cached(&self, request: &RouteRequest<'_>) -> TaskCategory {
        let key = cache_key(request.messages);

        if let Some(cached) = self.cache.get(&key).await {
            // An unknown label is a miss, not an error.
            if let Some(category) = TaskCategory::parse(&cached) {
                debug!(category = %category, "classification cache hit");
                self.metrics.cache_hit();
                return category;
            }
        }
        self.metrics.cache_miss();

        let started = Instant::now();
        let category = self
            .classifier
            .classify(request.messages, request.tools)
            .await;
        self.metrics.classification(category, started.elapsed());

        self.cache.set(&key, category.as_str(), self.cache_ttl).await;
        category
    }
}
