//! LLM classifier
//!
//! Fallback classifier that asks a small local model (any OpenAI-compatible
//! endpoint, typically Ollama) to name a category when the rules are
//! inconclusive. Every failure mode degrades to `None`; this classifier
//! never surfaces an error to the caller.

use crate::category::TaskCategory;
use crate::error::{Error, Result};
use crate::message::{last_user_text, ChatMessage};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum characters of the user message included in the prompt
const PROMPT_TRUNCATE_CHARS: usize = 500;

/// Default local inference endpoint
const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default classification model
const DEFAULT_MODEL: &str = "llama3.2";

/// LLM classifier configuration
#[derive(Debug, Clone)]
pub struct LlmClassifierConfig {
    /// Base URL of an OpenAI-compatible endpoint
    pub base_url: String,
    /// Model used for classification
    pub model: String,
    /// Request timeout; on expiry the classifier returns no match
    pub timeout: Duration,
}

impl Default for LlmClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

impl LlmClassifierConfig {
    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<PromptMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct PromptMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Classifier backed by a small local model
pub struct LlmClassifier {
    client: Client,
    config: LlmClassifierConfig,
}

impl LlmClassifier {
    /// Create a new LLM classifier
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: LlmClassifierConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Classifier(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Ask the model to name a category for the last user message.
    ///
    /// Transport failures, timeouts, non-2xx statuses and unparseable
    /// replies all return `None` with a warning.
    pub async fn classify(&self, messages: &[ChatMessage]) -> Option<TaskCategory> {
        let text = last_user_text(messages)?;
        let truncated: String = text.chars().take(PROMPT_TRUNCATE_CHARS).collect();

        let choices: Vec<&str> = TaskCategory::llm_choices()
            .iter()
            .map(TaskCategory::as_str)
            .collect();
        let system = format!(
            "You are a prompt classifier. Reply with exactly one word: \
             the best matching category from this list: {}.",
            choices.join(", ")
        );
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                PromptMessage {
                    role: "system",
                    content: system,
                },
                PromptMessage {
                    role: "user",
                    content: format!("Classify this prompt: {truncated}"),
                },
            ],
            temperature: 0.0,
            max_tokens: 8,
            stream: false,
        };

        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let response = match self.client.post(&url).json(&request).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "LLM classifier request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            warn!(status = %response.status(), "LLM classifier returned an error status");
            return None;
        }
        let body: ChatResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "LLM classifier returned an unparseable body");
                return None;
            }
        };

        let answer = body
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .unwrap_or_default();
        match normalize_label(answer) {
            Some(category) => {
                debug!(category = %category, "LLM classifier resolved category");
                Some(category)
            }
            None => {
                warn!(answer = %answer, "LLM classifier gave an unknown category");
                None
            }
        }
    }
}

/// Normalize a single-word model reply against the allowed category names
fn normalize_label(answer: &str) -> Option<TaskCategory> {
    let label: String = answer
        .trim()
        .trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .to_lowercase();
    let category = TaskCategory::parse(&label)?;
    TaskCategory::llm_choices()
        .contains(&category)
        .then_some(category)
}
