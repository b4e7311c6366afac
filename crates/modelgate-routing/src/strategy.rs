//! Selection strategies
//!
//! Pure functions mapping (category, candidate models, constraints) to a
//! chosen model. The cost-optimized policy is: free beats paid; among
//! paid, don't sacrifice quality below "great" unless no "great" option
//! exists.

use crate::category::TaskCategory;
use crate::registry::{ModelInfo, QualityTier, RegistrySnapshot};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Per-request (or process-default) routing strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingStrategy {
    /// Prefer free models, then cheapest acceptable quality
    #[default]
    CostOptimized,
    /// Prefer the highest quality tier regardless of cost
    QualityFirst,
    /// Only route to zero-cost models when possible
    LocalOnly,
}

impl RoutingStrategy {
    /// Returns the header-value representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CostOptimized => "cost-optimized",
            Self::QualityFirst => "quality-first",
            Self::LocalOnly => "local-only",
        }
    }
}

impl fmt::Display for RoutingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoutingStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cost-optimized" | "cost_optimized" => Ok(Self::CostOptimized),
            "quality-first" | "quality_first" => Ok(Self::QualityFirst),
            "local-only" | "local_only" => Ok(Self::LocalOnly),
            _ => Err(()),
        }
    }
}

// ============================================================================
// Pure selectors
// ============================================================================

/// Cheapest model by input cost; first-seen wins on ties
#[must_use]
pub fn select_cheapest<'a>(candidates: &[&'a ModelInfo]) -> Option<&'a ModelInfo> {
    candidates.iter().copied().fold(None, |best, model| match best {
        Some(b) if model.cost_per_1m_input < b.cost_per_1m_input => Some(model),
        Some(b) => Some(b),
        None => Some(model),
    })
}

/// Highest quality tier; first-seen wins on ties
#[must_use]
pub fn select_best_quality<'a>(candidates: &[&'a ModelInfo]) -> Option<&'a ModelInfo> {
    candidates.iter().copied().fold(None, |best, model| match best {
        Some(b) if model.quality_tier > b.quality_tier => Some(model),
        Some(b) => Some(b),
        None => Some(model),
    })
}

/// Cost-optimized selection over a candidate set.
///
/// `max_cost` is a per-request ceiling in dollars; candidates above
/// `max_cost * 1000` per 1M input tokens are filtered out, unless the
/// filter would empty the set, in which case the cap is ignored.
#[must_use]
pub fn select_cost_optimized<'a>(
    candidates: &[&'a ModelInfo],
    max_cost: Option<f64>,
) -> Option<&'a ModelInfo> {
    if candidates.is_empty() {
        return None;
    }

    let filtered: Vec<&ModelInfo> = match max_cost {
        Some(cap) => {
            let capped: Vec<&ModelInfo> = candidates
                .iter()
                .copied()
                .filter(|m| m.cost_per_1m_input <= cap * 1000.0)
                .collect();
            if capped.is_empty() {
                candidates.to_vec()
            } else {
                capped
            }
        }
        None => candidates.to_vec(),
    };

    let free: Vec<&ModelInfo> = filtered.iter().copied().filter(|m| m.is_free()).collect();
    if !free.is_empty() {
        return select_best_quality(&free);
    }

    let great: Vec<&ModelInfo> = filtered
        .iter()
        .copied()
        .filter(|m| m.quality_tier >= QualityTier::Great)
        .collect();
    if !great.is_empty() {
        return select_cheapest(&great);
    }

    select_cheapest(&filtered)
}

// ============================================================================
// Category-level routing
// ============================================================================

/// Cost-optimized route for a category.
///
/// A configured per-category default is an explicit operator override and
/// beats the algorithm unconditionally.
#[must_use]
pub fn route_cost_optimized<'a>(
    category: TaskCategory,
    snapshot: &'a RegistrySnapshot,
    max_cost: Option<f64>,
) -> Option<&'a ModelInfo> {
    if let Some(model) = configured_default(category, snapshot) {
        return Some(model);
    }
    let candidates = snapshot.models_for_task(category);
    select_cost_optimized(&candidates, max_cost)
}

/// Quality-first route for a category
#[must_use]
pub fn route_quality_first<'a>(
    category: TaskCategory,
    snapshot: &'a RegistrySnapshot,
) -> Option<&'a ModelInfo> {
    if let Some(model) = configured_default(category, snapshot) {
        return Some(model);
    }
    let candidates = snapshot.models_for_task(category);
    select_best_quality(&candidates)
}

/// Local-only route for a category: best free capable model, falling back
/// to the cheapest capable model when nothing free supports the task.
#[must_use]
pub fn route_local_only<'a>(
    category: TaskCategory,
    snapshot: &'a RegistrySnapshot,
) -> Option<&'a ModelInfo> {
    if let Some(model) = configured_default(category, snapshot) {
        if model.is_free() {
            return Some(model);
        }
    }
    let candidates = snapshot.models_for_task(category);
    let free: Vec<&ModelInfo> = candidates.iter().copied().filter(|m| m.is_free()).collect();
    if !free.is_empty() {
        return select_best_quality(&free);
    }
    select_cheapest(&candidates)
}

fn configured_default<'a>(
    category: TaskCategory,
    snapshot: &'a RegistrySnapshot,
) -> Option<&'a ModelInfo> {
    snapshot
        .default_for_task(category)
        .and_then(|id| snapshot.get_model(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ModelEntry, ModelRegistry, RegistryConfig};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn model(id: &str, cost: f64, tier: QualityTier) -> ModelInfo {
        ModelInfo {
            id: id.to_string(),
            provider: id.split('/').next().unwrap_or_default().to_string(),
            capabilities: vec![TaskCategory::GeneralChat, TaskCategory::Coding],
            context_length: 128_000,
            cost_per_1m_input: cost,
            cost_per_1m_output: cost * 4.0,
            quality_tier: tier,
            supports_vision: false,
            supports_tools: false,
        }
    }

    fn entry(m: &ModelInfo) -> ModelEntry {
        ModelEntry {
            provider: m.provider.clone(),
            capabilities: m.capabilities.clone(),
            context_length: m.context_length,
            cost_per_1m_input_tokens: m.cost_per_1m_input,
            cost_per_1m_output_tokens: m.cost_per_1m_output,
            quality_tier: m.quality_tier,
            supports_vision: m.supports_vision,
            supports_tools: m.supports_tools,
        }
    }

    fn snapshot_of(models: &[ModelInfo], defaults: &[(&str, &str)]) -> Arc<RegistrySnapshot> {
        let config = RegistryConfig {
            models: models
                .iter()
                .map(|m| (m.id.clone(), entry(m)))
                .collect::<BTreeMap<_, _>>(),
            task_routing: defaults
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        ModelRegistry::new(&config).try_snapshot().unwrap()
    }

    #[test]
    fn test_select_cheapest_prefers_lower_cost() {
        let a = model("a/one", 2.0, QualityTier::Excellent);
        let b = model("b/two", 0.5, QualityTier::Good);
        let picked = select_cheapest(&[&a, &b]).unwrap();
        assert_eq!(picked.id, "b/two");
    }

    #[test]
    fn test_select_cheapest_tie_is_first_seen() {
        let a = model("a/one", 1.0, QualityTier::Good);
        let b = model("b/two", 1.0, QualityTier::Excellent);
        assert_eq!(select_cheapest(&[&a, &b]).unwrap().id, "a/one");
        assert_eq!(select_cheapest(&[&b, &a]).unwrap().id, "b/two");
    }

    #[test]
    fn test_select_cheapest_empty() {
        assert!(select_cheapest(&[]).is_none());
    }

    #[test]
    fn test_select_best_quality_tie_is_first_seen() {
        let a = model("a/one", 5.0, QualityTier::Excellent);
        let b = model("b/two", 0.1, QualityTier::Excellent);
        assert_eq!(select_best_quality(&[&a, &b]).unwrap().id, "a/one");
    }

    #[test]
    fn test_cost_optimized_free_beats_paid_regardless_of_tier() {
        let free = model("ollama/llama3.2", 0.0, QualityTier::Good);
        let paid = model("openai/gpt-4o", 2.5, QualityTier::Excellent);
        let picked = select_cost_optimized(&[&paid, &free], None).unwrap();
        assert_eq!(picked.id, "ollama/llama3.2");
    }

    #[test]
    fn test_cost_optimized_picks_best_free() {
        let free_good = model("a/free-good", 0.0, QualityTier::Good);
        let free_great = model("b/free-great", 0.0, QualityTier::Great);
        let picked = select_cost_optimized(&[&free_good, &free_great], None).unwrap();
        assert_eq!(picked.id, "b/free-great");
    }

    #[test]
    fn test_cost_optimized_quality_floor() {
        // Among paid models, the cheapest "great" wins over a cheaper "good".
        let cheap_good = model("a/cheap", 0.05, QualityTier::Good);
        let great = model("b/great", 0.14, QualityTier::Great);
        let excellent = model("c/excellent", 3.0, QualityTier::Excellent);
        let picked = select_cost_optimized(&[&cheap_good, &great, &excellent], None).unwrap();
        assert_eq!(picked.id, "b/great");
    }

    #[test]
    fn test_cost_optimized_falls_back_to_cheapest() {
        let a = model("a/one", 0.10, QualityTier::Good);
        let b = model("b/two", 0.05, QualityTier::Good);
        let picked = select_cost_optimized(&[&a, &b], None).unwrap();
        assert_eq!(picked.id, "b/two");
    }

    #[test]
    fn test_max_cost_filters_candidates() {
        let cheap = model("a/cheap", 0.5, QualityTier::Great);
        let pricey = model("b/pricey", 3.0, QualityTier::Excellent);
        // cap of $0.001/request => 1.0 per 1M input tokens
        let picked = select_cost_optimized(&[&pricey, &cheap], Some(0.001)).unwrap();
        assert_eq!(picked.id, "a/cheap");
    }

    #[test]
    fn test_max_cost_ignored_when_it_empties_the_set() {
        let a = model("a/one", 3.0, QualityTier::Great);
        let b = model("b/two", 5.0, QualityTier::Great);
        let picked = select_cost_optimized(&[&a, &b], Some(0.000_001)).unwrap();
        assert_eq!(picked.id, "a/one");
    }

    #[test]
    fn test_route_uses_configured_default_unconditionally() {
        let free = model("ollama/llama3.2", 0.0, QualityTier::Good);
        let pricey = model("openai/gpt-4o", 2.5, QualityTier::Excellent);
        let snapshot = snapshot_of(&[free, pricey], &[("coding", "openai/gpt-4o")]);
        // The operator override wins even though a free model exists.
        let picked = route_cost_optimized(TaskCategory::Coding, &snapshot, None).unwrap();
        assert_eq!(picked.id, "openai/gpt-4o");
    }

    #[test]
    fn test_route_quality_first() {
        let good = model("a/good", 0.0, QualityTier::Good);
        let excellent = model("b/excellent", 3.0, QualityTier::Excellent);
        let snapshot = snapshot_of(&[good, excellent], &[]);
        let picked = route_quality_first(TaskCategory::Coding, &snapshot).unwrap();
        assert_eq!(picked.id, "b/excellent");
    }

    #[test]
    fn test_route_local_only_prefers_free() {
        let free = model("ollama/llama3.2", 0.0, QualityTier::Good);
        let paid = model("openai/gpt-4o", 2.5, QualityTier::Excellent);
        let snapshot = snapshot_of(&[free, paid], &[]);
        let picked = route_local_only(TaskCategory::Coding, &snapshot).unwrap();
        assert_eq!(picked.id, "ollama/llama3.2");
    }

    #[test]
    fn test_route_local_only_falls_back_to_cheapest_paid() {
        let a = model("a/one", 0.5, QualityTier::Great);
        let b = model("b/two", 0.1, QualityTier::Good);
        let snapshot = snapshot_of(&[a, b], &[]);
        let picked = route_local_only(TaskCategory::Coding, &snapshot).unwrap();
        assert_eq!(picked.id, "b/two");
    }

    #[test]
    fn test_route_local_only_skips_paid_default() {
        let free = model("ollama/llama3.2", 0.0, QualityTier::Good);
        let paid = model("openai/gpt-4o", 2.5, QualityTier::Excellent);
        let snapshot = snapshot_of(&[free, paid], &[("coding", "openai/gpt-4o")]);
        let picked = route_local_only(TaskCategory::Coding, &snapshot).unwrap();
        assert_eq!(picked.id, "ollama/llama3.2");
    }

    #[test]
    fn test_no_capable_model_returns_none() {
        let a = model("a/one", 0.5, QualityTier::Great);
        let snapshot = snapshot_of(&[a], &[]);
        assert!(route_cost_optimized(TaskCategory::Vision, &snapshot, None).is_none());
    }

    #[test]
    fn test_strategy_header_parsing() {
        assert_eq!(
            "cost-optimized".parse::<RoutingStrategy>().unwrap(),
            RoutingStrategy::CostOptimized
        );
        assert_eq!(
            "Quality-First".parse::<RoutingStrategy>().unwrap(),
            RoutingStrategy::QualityFirst
        );
        assert_eq!(
            "local_only".parse::<RoutingStrategy>().unwrap(),
            RoutingStrategy::LocalOnly
        );
        assert!("premium".parse::<RoutingStrategy>().is_err());
    }
}
