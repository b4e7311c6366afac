//! modelgate-routing - prompt classification and model routing
//!
//! The routing decision subsystem of the modelgate gateway: given an
//! OpenAI-style chat request, decide which upstream model should serve it.
//!
//! # Module Structure
//!
//! - `category`: the closed taxonomy of prompt intents
//! - `message`: OpenAI-shaped chat messages
//! - `classifier`: rules, LLM and hybrid classifiers
//! - `registry`: model catalogue with snapshot-swap reload
//! - `strategy`: cost/quality/local selection strategies
//! - `cache`: classification cache (Redis with in-memory fallback)
//! - `engine`: the routing engine tying it all together
//! - `metrics`: the counter sink the engine reports into

pub mod cache;
pub mod category;
pub mod classifier;
pub mod engine;
pub mod error;
pub mod message;
pub mod metrics;
pub mod registry;
pub mod strategy;


pub use cache::{
    cache_key, connect_cache, ClassificationCache, MemoryCache, RedisCache, DEFAULT_CACHE_TTL,
};
pub use category::TaskCategory;
pub use classifier::{
    Classifier, ClassifierMode, ClassifierStage, HybridClassifier, LlmClassifier,
    LlmClassifierConfig, RulesClassifier, DEFAULT_LONG_CONTEXT_THRESHOLD,
};
pub use engine::{RouteRequest, RoutingDecision, RoutingEngine};
pub use error::{Error, Result};
pub use message::{last_user_text, ChatMessage, ContentPart, MessageContent, Role};
pub use metrics::{NoopMetrics, RoutingMetrics};
pub use registry::{
    ModelEntry, ModelInfo, ModelRegistry, QualityTier, RegistryConfig, RegistrySnapshot,
};
pub use strategy::{
    route_cost_optimized, route_local_only, route_quality_first, select_best_quality,
    select_cheapest, select_cost_optimized, RoutingStrategy,
};
