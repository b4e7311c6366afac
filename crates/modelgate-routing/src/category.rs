//! Task categories for prompt classification
//!
//! A closed taxonomy of prompt intents. The classifier resolves every
//! request to exactly one category, which then drives model selection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The classified intent of a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    /// Short greetings and pleasantries
    SimpleChat,
    /// General conversation (default when nothing else matches)
    GeneralChat,
    /// Code generation, debugging, review
    Coding,
    /// Math and symbolic reasoning
    Math,
    /// Translation between languages
    Translation,
    /// Text summarization
    Summarization,
    /// Creative writing (stories, poems, lyrics)
    CreativeWriting,
    /// Requests containing image content
    Vision,
    /// Requests carrying tool/function declarations
    FunctionCalling,
    /// Requests whose total text exceeds the long-context threshold
    LongContext,
}

impl TaskCategory {
    /// All categories, in stable order
    pub const ALL: [TaskCategory; 10] = [
        Self::SimpleChat,
        Self::GeneralChat,
        Self::Coding,
        Self::Math,
        Self::Translation,
        Self::Summarization,
        Self::CreativeWriting,
        Self::Vision,
        Self::FunctionCalling,
        Self::LongContext,
    ];

    /// Returns the snake_case label
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SimpleChat => "simple_chat",
            Self::GeneralChat => "general_chat",
            Self::Coding => "coding",
            Self::Math => "math",
            Self::Translation => "translation",
            Self::Summarization => "summarization",
            Self::CreativeWriting => "creative_writing",
            Self::Vision => "vision",
            Self::FunctionCalling => "function_calling",
            Self::LongContext => "long_context",
        }
    }

    /// Parse a snake_case label back into a category
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == label)
    }

    /// Categories the LLM classifier is allowed to answer with.
    ///
    /// Vision, function calling, long context and simple chat are resolved
    /// upstream by deterministic rules, so the LLM never sees them.
    #[must_use]
    pub fn llm_choices() -> &'static [TaskCategory] {
        &[
            Self::GeneralChat,
            Self::Coding,
            Self::Math,
            Self::Translation,
            Self::Summarization,
            Self::CreativeWriting,
        ]
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
