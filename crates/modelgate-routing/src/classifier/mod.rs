//! Prompt classification
//!
//! Two tiers behind one seam: the deterministic [`RulesClassifier`] and the
//! network-backed [`LlmClassifier`], composed by [`HybridClassifier`] which
//! always resolves to a category.
//!
//! # Module Structure
//!
//! - `rules`: deterministic pattern matcher
//! - `llm`: fallback classifier backed by a small local model

mod llm;
mod rules;

pub use llm::{LlmClassifier, LlmClassifierConfig};
pub use rules::{RulesClassifier, DEFAULT_LONG_CONTEXT_THRESHOLD};

use crate::category::TaskCategory;
use crate::message::ChatMessage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// A single classification tier that may decline to answer
#[async_trait::async_trait]
pub trait ClassifierStage: Send + Sync {
    /// Classify a conversation, or return `None` when inconclusive
    async fn classify(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[serde_json::Value]>,
    ) -> Option<TaskCategory>;
}

#[async_trait::async_trait]
impl ClassifierStage for RulesClassifier {
    async fn classify(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[serde_json::Value]>,
    ) -> Option<TaskCategory> {
        RulesClassifier::classify(self, messages, tools)
    }
}

#[async_trait::async_trait]
impl ClassifierStage for LlmClassifier {
    async fn classify(
        &self,
        messages: &[ChatMessage],
        _tools: Option<&[serde_json::Value]>,
    ) -> Option<TaskCategory> {
        LlmClassifier::classify(self, messages).await
    }
}

/// A classifier that always resolves to a category
#[async_trait::async_trait]
pub trait Classifier: Send + Sync {
    /// Classify a conversation; never fails, never declines
    async fn classify(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[serde_json::Value]>,
    ) -> TaskCategory;
}

/// How the hybrid classifier combines its tiers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierMode {
    /// Rules only; default category on no match
    RulesOnly,
    /// LLM only; default category on failure
    LlmOnly,
    /// Rules first, then LLM, then default
    #[default]
    Hybrid,
}

/// Composes the rules and LLM tiers per the configured mode.
///
/// The cheap deterministic tier always runs before the network tier, so
/// the LLM is only consulted for genuinely ambiguous input.
pub struct HybridClassifier {
    rules: Arc<dyn ClassifierStage>,
    llm: Option<Arc<dyn ClassifierStage>>,
    mode: ClassifierMode,
}

impl HybridClassifier {
    /// Create a hybrid classifier from its tiers
    #[must_use]
    pub fn new(
        rules: Arc<dyn ClassifierStage>,
        llm: Option<Arc<dyn ClassifierStage>>,
        mode: ClassifierMode,
    ) -> Self {
        Self { rules, llm, mode }
    }

    /// Convenience constructor from concrete tiers
    #[must_use]
    pub fn from_parts(
        rules: RulesClassifier,
        llm: Option<LlmClassifier>,
        mode: ClassifierMode,
    ) -> Self {
        Self::new(
            Arc::new(rules),
            llm.map(|l| Arc::new(l) as Arc<dyn ClassifierStage>),
            mode,
        )
    }
}

#[async_trait::async_trait]
impl Classifier for HybridClassifier {
    async fn classify(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[serde_json::Value]>,
    ) -> TaskCategory {
        // LlmOnly without a configured LLM degrades to the rules tier.
        let mode = if self.mode == ClassifierMode::LlmOnly && self.llm.is_none() {
            ClassifierMode::RulesOnly
        } else {
            self.mode
        };

        let resolved = match mode {
            ClassifierMode::RulesOnly => self.rules.classify(messages, tools).await,
            ClassifierMode::LlmOnly => match &self.llm {
                Some(llm) => llm.classify(messages, tools).await,
                None => None,
            },
            ClassifierMode::Hybrid => {
                if let Some(category) = self.rules.classify(messages, tools).await {
                    Some(category)
                } else if let Some(llm) = &self.llm {
                    llm.classify(messages, tools).await
                } else {
                    None
                }
            }
        };

        match resolved {
            Some(category) => category,
            None => {
                debug!("no classifier tier matched; defaulting to general_chat");
                TaskCategory::GeneralChat
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Stage fake that counts calls and returns a fixed answer
    struct FixedStage {
        answer: Option<TaskCategory>,
        calls: AtomicUsize,
    }

    impl FixedStage {
        fn new(answer: Option<TaskCategory>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ClassifierStage for FixedStage {
        async fn classify(
            &self,
            _messages: &[ChatMessage],
            _tools: Option<&[serde_json::Value]>,
        ) -> Option<TaskCategory> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer
        }
    }

    fn messages() -> Vec<ChatMessage> {
        vec![ChatMessage::user("tell me about rome")]
    }

    #[tokio::test]
    async fn test_hybrid_skips_llm_when_rules_match() {
        let rules = FixedStage::new(Some(TaskCategory::Coding));
        let llm = FixedStage::new(Some(TaskCategory::Math));
        let classifier = HybridClassifier::new(
            rules.clone(),
            Some(llm.clone() as Arc<dyn ClassifierStage>),
            ClassifierMode::Hybrid,
        );

        let category = classifier.classify(&messages(), None).await;
        assert_eq!(category, TaskCategory::Coding);
        assert_eq!(rules.calls(), 1);
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_hybrid_falls_through_to_llm() {
        let rules = FixedStage::new(None);
        let llm = FixedStage::new(Some(TaskCategory::Translation));
        let classifier = HybridClassifier::new(
            rules.clone(),
            Some(llm.clone() as Arc<dyn ClassifierStage>),
            ClassifierMode::Hybrid,
        );

        let category = classifier.classify(&messages(), None).await;
        assert_eq!(category, TaskCategory::Translation);
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_hybrid_defaults_when_all_tiers_decline() {
        let classifier = HybridClassifier::new(
            FixedStage::new(None),
            Some(FixedStage::new(None) as Arc<dyn ClassifierStage>),
            ClassifierMode::Hybrid,
        );
        assert_eq!(
            classifier.classify(&messages(), None).await,
            TaskCategory::GeneralChat
        );
    }

    #[tokio::test]
    async fn test_rules_only_never_consults_llm() {
        let llm = FixedStage::new(Some(TaskCategory::Math));
        let classifier = HybridClassifier::new(
            FixedStage::new(None),
            Some(llm.clone() as Arc<dyn ClassifierStage>),
            ClassifierMode::RulesOnly,
        );
        assert_eq!(
            classifier.classify(&messages(), None).await,
            TaskCategory::GeneralChat
        );
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_llm_only_without_llm_uses_rules() {
        let rules = FixedStage::new(Some(TaskCategory::Summarization));
        let classifier =
            HybridClassifier::new(rules.clone(), None, ClassifierMode::LlmOnly);
        assert_eq!(
            classifier.classify(&messages(), None).await,
            TaskCategory::Summarization
        );
        assert_eq!(rules.calls(), 1);
    }
}
