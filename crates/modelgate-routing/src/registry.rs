//! Model registry
//!
//! Catalogue of available models, their capabilities, costs and quality
//! tier, plus per-category default routes. Read-heavy: every request reads
//! the active snapshot; a reload builds a new snapshot and swaps it in
//! atomically so in-flight reads never observe a partial catalogue.

use crate::category::TaskCategory;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

// ============================================================================
// Model metadata
// ============================================================================

/// Coarse quality ranking used as a tiebreaker against cost
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    /// Acceptable for trivial tasks
    #[default]
    Good,
    /// Solid general-purpose quality
    Great,
    /// Frontier quality
    Excellent,
}

impl QualityTier {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Great => "great",
            Self::Excellent => "excellent",
        }
    }
}

/// A model known to the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Globally unique id, `<provider>/<model>`
    pub id: String,
    /// Provider name (first segment of the id)
    pub provider: String,
    /// Categories this model can serve
    pub capabilities: Vec<TaskCategory>,
    /// Context window in tokens
    pub context_length: u32,
    /// Cost per 1M input tokens (USD)
    pub cost_per_1m_input: f64,
    /// Cost per 1M output tokens (USD)
    pub cost_per_1m_output: f64,
    /// Quality tier
    pub quality_tier: QualityTier,
    /// Whether the model accepts image input
    pub supports_vision: bool,
    /// Whether the model supports tool calling
    pub supports_tools: bool,
}

impl ModelInfo {
    /// Whether this model costs nothing to run (local or free tier)
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.cost_per_1m_input == 0.0
    }

    /// Whether this model can serve the given category
    #[must_use]
    pub fn supports_task(&self, category: TaskCategory) -> bool {
        self.capabilities.contains(&category)
    }
}

// ============================================================================
// Declarative configuration
// ============================================================================

/// One model entry in the registry document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    /// Provider name
    pub provider: String,
    /// Categories this model can serve
    #[serde(default)]
    pub capabilities: Vec<TaskCategory>,
    /// Context window in tokens
    #[serde(default = "default_context_length")]
    pub context_length: u32,
    /// Cost per 1M input tokens (USD)
    #[serde(default)]
    pub cost_per_1m_input_tokens: f64,
    /// Cost per 1M output tokens (USD)
    #[serde(default)]
    pub cost_per_1m_output_tokens: f64,
    /// Quality tier
    #[serde(default)]
    pub quality_tier: QualityTier,
    /// Whether the model accepts image input
    #[serde(default)]
    pub supports_vision: bool,
    /// Whether the model supports tool calling
    #[serde(default)]
    pub supports_tools: bool,
}

fn default_context_length() -> u32 {
    128_000
}

/// Declarative registry document: model id -> entry, plus default routes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Model catalogue keyed by `<provider>/<model>` id
    #[serde(default)]
    pub models: BTreeMap<String, ModelEntry>,
    /// Default model id per category label
    #[serde(default)]
    pub task_routing: BTreeMap<String, String>,
}

impl RegistryConfig {
    /// Parse a TOML registry document
    ///
    /// # Errors
    ///
    /// Returns a config error when the document is not valid TOML.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("invalid registry document: {e}")))
    }
}

impl Default for RegistryConfig {
    /// Built-in catalogue so the gateway can route without a config file
    fn default() -> Self {
        use TaskCategory::*;

        let text_tasks = vec![
            SimpleChat,
            GeneralChat,
            Coding,
            Math,
            Translation,
            Summarization,
            CreativeWriting,
        ];

        let mut models = BTreeMap::new();
        models.insert(
            "ollama/llama3.2".to_string(),
            ModelEntry {
                provider: "ollama".to_string(),
                capabilities: text_tasks.clone(),
                context_length: 128_000,
                cost_per_1m_input_tokens: 0.0,
                cost_per_1m_output_tokens: 0.0,
                quality_tier: QualityTier::Good,
                supports_vision: false,
                supports_tools: false,
            },
        );
        models.insert(
            "groq/llama-3.1-8b-instant".to_string(),
            ModelEntry {
                provider: "groq".to_string(),
                capabilities: text_tasks.clone(),
                context_length: 131_072,
                cost_per_1m_input_tokens: 0.05,
                cost_per_1m_output_tokens: 0.08,
                quality_tier: QualityTier::Good,
                supports_vision: false,
                supports_tools: true,
            },
        );
        models.insert(
            "deepseek/deepseek-chat".to_string(),
            ModelEntry {
                provider: "deepseek".to_string(),
                capabilities: {
                    let mut caps = text_tasks.clone();
                    caps.push(FunctionCalling);
                    caps
                },
                context_length: 64_000,
                cost_per_1m_input_tokens: 0.14,
                cost_per_1m_output_tokens: 0.28,
                quality_tier: QualityTier::Great,
                supports_vision: false,
                supports_tools: true,
            },
        );
        models.insert(
            "gemini/gemini-2.5-flash".to_string(),
            ModelEntry {
                provider: "gemini".to_string(),
                capabilities: {
                    let mut caps = text_tasks.clone();
                    caps.extend([Vision, LongContext, FunctionCalling]);
                    caps
                },
                context_length: 1_048_576,
                cost_per_1m_input_tokens: 0.075,
                cost_per_1m_output_tokens: 0.60,
                quality_tier: QualityTier::Great,
                supports_vision: true,
                supports_tools: true,
            },
        );
        models.insert(
            "openai/gpt-4o-mini".to_string(),
            ModelEntry {
                provider: "openai".to_string(),
                capabilities: {
                    let mut caps = text_tasks.clone();
                    caps.extend([Vision, FunctionCalling]);
                    caps
                },
                context_length: 128_000,
                cost_per_1m_input_tokens: 0.15,
                cost_per_1m_output_tokens: 0.60,
                quality_tier: QualityTier::Great,
                supports_vision: true,
                supports_tools: true,
            },
        );
        models.insert(
            "openai/gpt-4o".to_string(),
            ModelEntry {
                provider: "openai".to_string(),
                capabilities: {
                    let mut caps = text_tasks.clone();
                    caps.extend([Vision, FunctionCalling, LongContext]);
                    caps
                },
                context_length: 128_000,
                cost_per_1m_input_tokens: 2.50,
                cost_per_1m_output_tokens: 10.00,
                quality_tier: QualityTier::Excellent,
                supports_vision: true,
                supports_tools: true,
            },
        );
        models.insert(
            "anthropic/claude-sonnet-4-5".to_string(),
            ModelEntry {
                provider: "anthropic".to_string(),
                capabilities: {
                    let mut caps = text_tasks;
                    caps.extend([Vision, FunctionCalling, LongContext]);
                    caps
                },
                context_length: 200_000,
                cost_per_1m_input_tokens: 3.00,
                cost_per_1m_output_tokens: 15.00,
                quality_tier: QualityTier::Excellent,
                supports_vision: true,
                supports_tools: true,
            },
        );

        let mut task_routing = BTreeMap::new();
        task_routing.insert("simple_chat".to_string(), "ollama/llama3.2".to_string());
        task_routing.insert(
            "function_calling".to_string(),
            "deepseek/deepseek-chat".to_string(),
        );
        task_routing.insert(
            "long_context".to_string(),
            "gemini/gemini-2.5-flash".to_string(),
        );

        Self {
            models,
            task_routing,
        }
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Immutable view of the catalogue, published wholesale on reload
#[derive(Debug, Default)]
pub struct RegistrySnapshot {
    models: Vec<ModelInfo>,
    by_id: HashMap<String, usize>,
    task_defaults: HashMap<TaskCategory, String>,
}

impl RegistrySnapshot {
    /// Look up a model by id
    #[must_use]
    pub fn get_model(&self, id: &str) -> Option<&ModelInfo> {
        self.by_id.get(id).map(|&i| &self.models[i])
    }

    /// Whether a model id is known
    #[must_use]
    pub fn model_exists(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Whether any model belongs to the given provider
    #[must_use]
    pub fn provider_known(&self, provider: &str) -> bool {
        self.models.iter().any(|m| m.provider == provider)
    }

    /// All models capable of serving a category, in registry order
    #[must_use]
    pub fn models_for_task(&self, category: TaskCategory) -> Vec<&ModelInfo> {
        self.models
            .iter()
            .filter(|m| m.supports_task(category))
            .collect()
    }

    /// The configured default model id for a category, if any
    #[must_use]
    pub fn default_for_task(&self, category: TaskCategory) -> Option<&str> {
        self.task_defaults.get(&category).map(String::as_str)
    }

    /// All models in registry order
    #[must_use]
    pub fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    /// Whether the catalogue is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    fn build(config: &RegistryConfig) -> Self {
        let mut models: Vec<ModelInfo> = Vec::with_capacity(config.models.len());
        let mut by_id: HashMap<String, usize> = HashMap::with_capacity(config.models.len());

        for (id, entry) in &config.models {
            if id.trim().is_empty() || entry.provider.trim().is_empty() {
                warn!(id = %id, "skipping registry entry with empty id or provider");
                continue;
            }
            let info = ModelInfo {
                id: id.clone(),
                provider: entry.provider.clone(),
                capabilities: entry.capabilities.clone(),
                context_length: entry.context_length,
                cost_per_1m_input: entry.cost_per_1m_input_tokens,
                cost_per_1m_output: entry.cost_per_1m_output_tokens,
                quality_tier: entry.quality_tier,
                supports_vision: entry.supports_vision,
                supports_tools: entry.supports_tools,
            };
            // The document maps id -> entry, so a duplicate id collapses
            // to its last definition before it ever reaches us.
            by_id.insert(id.clone(), models.len());
            models.push(info);
        }

        let mut task_defaults = HashMap::new();
        for (label, model_id) in &config.task_routing {
            match TaskCategory::parse(label) {
                Some(category) => {
                    if !by_id.contains_key(model_id) {
                        warn!(category = %label, model = %model_id, "task default points at an unknown model");
                    }
                    task_defaults.insert(category, model_id.clone());
                }
                None => warn!(category = %label, "skipping task default for unknown category"),
            }
        }

        Self {
            models,
            by_id,
            task_defaults,
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Thread-safe registry holding the active snapshot
pub struct ModelRegistry {
    snapshot: RwLock<Arc<RegistrySnapshot>>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(&RegistryConfig::default())
    }
}

impl ModelRegistry {
    /// Build a registry from a configuration document
    #[must_use]
    pub fn new(config: &RegistryConfig) -> Self {
        let registry = Self {
            snapshot: RwLock::new(Arc::new(RegistrySnapshot::default())),
        };
        registry.load(config);
        registry
    }

    /// Create an empty registry (no models, no defaults)
    #[must_use]
    pub fn empty() -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(RegistrySnapshot::default())),
        }
    }

    /// Replace the active snapshot with one built from `config`.
    ///
    /// Idempotent; loading the same document twice yields the same
    /// catalogue. A reload that would empty a previously populated
    /// registry is rejected and the old snapshot stays active.
    pub fn load(&self, config: &RegistryConfig) -> usize {
        let next = RegistrySnapshot::build(config);
        let count = next.models.len();

        let Ok(mut guard) = self.snapshot.write() else {
            warn!("registry lock poisoned; reload skipped");
            return 0;
        };
        if next.is_empty() && !guard.is_empty() {
            warn!("reload produced an empty catalogue; keeping previous snapshot");
            return guard.models.len();
        }
        *guard = Arc::new(next);
        info!(models = count, "model registry loaded");
        count
    }

    /// The active snapshot, or `None` when the registry cannot be queried
    #[must_use]
    pub fn try_snapshot(&self) -> Option<Arc<RegistrySnapshot>> {
        self.snapshot.read().ok().map(|g| Arc::clone(&g))
    }

    /// Look up a model by id
    #[must_use]
    pub fn get_model(&self, id: &str) -> Option<ModelInfo> {
        self.try_snapshot()?.get_model(id).cloned()
    }

    /// Whether a model id is known
    #[must_use]
    pub fn model_exists(&self, id: &str) -> bool {
        self.try_snapshot()
            .is_some_and(|s| s.model_exists(id))
    }

    /// All models capable of serving a category
    #[must_use]
    pub fn models_for_task(&self, category: TaskCategory) -> Vec<ModelInfo> {
        self.try_snapshot()
            .map(|s| s.models_for_task(category).into_iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The configured default model id for a category
    #[must_use]
    pub fn default_for_task(&self, category: TaskCategory) -> Option<String> {
        self.try_snapshot()?
            .default_for_task(category)
            .map(String::from)
    }

    /// All models in registry order
    #[must_use]
    pub fn list_models(&self) -> Vec<ModelInfo> {
        self.try_snapshot()
            .map(|s| s.models().to_vec())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> RegistryConfig {
        RegistryConfig::from_toml_str(
            r#"
            [models."openai/gpt-4o"]
            provider = "openai"
            capabilities = ["coding", "general_chat", "vision"]
            context_length = 128000
            cost_per_1m_input_tokens = 2.5
            cost_per_1m_output_tokens = 10.0
            quality_tier = "excellent"
            supports_vision = true
            supports_tools = true

            [models."ollama/llama3.2"]
            provider = "ollama"
            capabilities = ["simple_chat", "general_chat"]
            quality_tier = "good"

            [task_routing]
            simple_chat = "ollama/llama3.2"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_load_and_lookup() {
        let registry = ModelRegistry::new(&sample_config());
        let model = registry.get_model("openai/gpt-4o").unwrap();
        assert_eq!(model.provider, "openai");
        assert_eq!(model.quality_tier, QualityTier::Excellent);
        assert!(model.supports_task(TaskCategory::Vision));
        assert!(registry.model_exists("ollama/llama3.2"));
        assert!(!registry.model_exists("openai/gpt-3"));
    }

    #[test]
    fn test_models_for_task() {
        let registry = ModelRegistry::new(&sample_config());
        let chat = registry.models_for_task(TaskCategory::GeneralChat);
        assert_eq!(chat.len(), 2);
        let vision = registry.models_for_task(TaskCategory::Vision);
        assert_eq!(vision.len(), 1);
        assert_eq!(vision[0].id, "openai/gpt-4o");
    }

    #[test]
    fn test_task_default() {
        let registry = ModelRegistry::new(&sample_config());
        assert_eq!(
            registry.default_for_task(TaskCategory::SimpleChat).as_deref(),
            Some("ollama/llama3.2")
        );
        assert!(registry.default_for_task(TaskCategory::Coding).is_none());
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let config = RegistryConfig::from_toml_str(
            r#"
            [models."openai/gpt-4o"]
            provider = "openai"

            [models."broken/model"]
            provider = ""
            "#,
        )
        .unwrap();
        let registry = ModelRegistry::new(&config);
        assert_eq!(registry.list_models().len(), 1);
        assert!(!registry.model_exists("broken/model"));
    }

    #[test]
    fn test_reload_is_idempotent() {
        let config = sample_config();
        let registry = ModelRegistry::new(&config);
        let before: Vec<String> = registry.list_models().iter().map(|m| m.id.clone()).collect();
        registry.load(&config);
        let after: Vec<String> = registry.list_models().iter().map(|m| m.id.clone()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_empty_reload_keeps_previous_snapshot() {
        let registry = ModelRegistry::new(&sample_config());
        let empty = RegistryConfig {
            models: BTreeMap::new(),
            task_routing: BTreeMap::new(),
        };
        registry.load(&empty);
        assert_eq!(registry.list_models().len(), 2);
    }

    #[test]
    fn test_snapshot_is_stable_across_reload() {
        let registry = ModelRegistry::new(&sample_config());
        let snapshot = registry.try_snapshot().unwrap();
        let mut bigger = sample_config();
        bigger.models.insert(
            "groq/llama-3.1-8b-instant".to_string(),
            ModelEntry {
                provider: "groq".to_string(),
                capabilities: vec![TaskCategory::GeneralChat],
                context_length: 131_072,
                cost_per_1m_input_tokens: 0.05,
                cost_per_1m_output_tokens: 0.08,
                quality_tier: QualityTier::Good,
                supports_vision: false,
                supports_tools: true,
            },
        );
        registry.load(&bigger);
        // The old snapshot still sees the catalogue it was taken from.
        assert_eq!(snapshot.models().len(), 2);
        assert_eq!(registry.list_models().len(), 3);
    }

    #[test]
    fn test_default_catalogue_routes_simple_chat_to_free_model() {
        let registry = ModelRegistry::default();
        let id = registry.default_for_task(TaskCategory::SimpleChat).unwrap();
        let model = registry.get_model(&id).unwrap();
        assert!(model.is_free());
    }

    #[test]
    fn test_unknown_task_routing_label_is_skipped() {
        let config = RegistryConfig::from_toml_str(
            r#"
            [models."openai/gpt-4o"]
            provider = "openai"

            [task_routing]
            nonsense = "openai/gpt-4o"
            "#,
        )
        .unwrap();
        let registry = ModelRegistry::new(&config);
        for category in TaskCategory::ALL {
            assert!(registry.default_for_task(category).is_none());
        }
    }
}
