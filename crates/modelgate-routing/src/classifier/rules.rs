//! Rules classifier
//!
//! Deterministic, sub-millisecond pattern matcher. Checks run in a fixed
//! order and the first match wins, so an earlier rule shadows later ones
//! even when several patterns would match.

use crate::category::TaskCategory;
use crate::message::{ChatMessage, Role};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref GREETING: Regex = Regex::new(
        r"(?i)^\s*(hi|hiya|hello|hey|yo|howdy|good\s+(morning|afternoon|evening)|how\s+are\s+you|what'?s\s+up|thanks|thank\s+you)\b"
    )
    .unwrap();
    static ref CODING: Regex = Regex::new(
        r"(?i)\b(code|coding|function|method|class|debug|compile|refactor|implement|algorithm|python|javascript|typescript|rust|golang|java|kotlin|sql|regex|script|unit\s*test|stack\s*trace|segfault|exception|bug\s+in)\b|```"
    )
    .unwrap();
    static ref MATH: Regex = Regex::new(
        r"(?i)\b(math|calculate|calculation|equation|integral|derivative|algebra|geometry|probability|theorem|prove|solve\s+for|square\s+root|factorial)\b|\d+\s*[-+*/^%]\s*\d+"
    )
    .unwrap();
    static ref TRANSLATION: Regex = Regex::new(
        r"(?i)\btranslat(e|ion|ing)\b|\bhow\s+do\s+you\s+say\b|\bin\s+(spanish|french|german|japanese|chinese|korean|italian|portuguese|russian|arabic|hindi)\b"
    )
    .unwrap();
    static ref SUMMARIZATION: Regex = Regex::new(
        r"(?i)\bsummar(y|ize|ise|ization|isation)\b|\btl;?dr\b|\bkey\s+points\b|\bcondense\b|\bmain\s+takeaways\b"
    )
    .unwrap();
    static ref CREATIVE: Regex = Regex::new(
        r"(?i)\bwrite\s+(a|an|me\s+a|me\s+an)\s+(story|short\s+story|poem|song|haiku|novel|screenplay|limerick)\b|\bcreative\s+writing\b|\bpoem\s+about\b|\bstory\s+about\b|\blyrics\b"
    )
    .unwrap();
}

/// Maximum length of a message still eligible for the greeting check
const SIMPLE_CHAT_MAX_CHARS: usize = 60;

/// Default long-context threshold in characters of visible text
pub const DEFAULT_LONG_CONTEXT_THRESHOLD: usize = 50_000;

/// Deterministic pattern classifier
#[derive(Debug, Clone)]
pub struct RulesClassifier {
    long_context_threshold: usize,
}

impl Default for RulesClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_LONG_CONTEXT_THRESHOLD)
    }
}

impl RulesClassifier {
    /// Create a classifier with a custom long-context threshold
    #[must_use]
    pub fn new(long_context_threshold: usize) -> Self {
        Self {
            long_context_threshold,
        }
    }

    /// Classify a conversation, returning `None` when no rule matches.
    ///
    /// Pure and synchronous; callers fall through to a secondary
    /// classifier or a default category on `None`.
    #[must_use]
    pub fn classify(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[serde_json::Value]>,
    ) -> Option<TaskCategory> {
        if tools.is_some_and(|t| !t.is_empty()) {
            return Some(TaskCategory::FunctionCalling);
        }

        if messages.iter().any(ChatMessage::has_image) {
            return Some(TaskCategory::Vision);
        }

        let total_chars: usize = messages.iter().map(|m| m.text().chars().count()).sum();
        if total_chars > self.long_context_threshold {
            return Some(TaskCategory::LongContext);
        }

        let last_user = messages.iter().rev().find(|m| m.role == Role::User)?;
        let text = last_user.text();
        let text = text.trim();

        if text.chars().count() < SIMPLE_CHAT_MAX_CHARS && GREETING.is_match(text) {
            return Some(TaskCategory::SimpleChat);
        }

        // Keyword rules in fixed order; the first match wins.
        let keyword_rules: [(&Regex, TaskCategory); 5] = [
            (&CODING, TaskCategory::Coding),
            (&MATH, TaskCategory::Math),
            (&TRANSLATION, TaskCategory::Translation),
            (&SUMMARIZATION, TaskCategory::Summarization),
            (&CREATIVE, TaskCategory::CreativeWriting),
        ];
        for (pattern, category) in keyword_rules {
            if pattern.is_match(text) {
                return Some(category);
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{ContentPart, MessageContent};

    fn user(text: &str) -> Vec<ChatMessage> {
        vec![ChatMessage::user(text)]
    }

    #[test]
    fn test_tools_win_over_everything() {
        let classifier = RulesClassifier::default();
        let messages = vec![ChatMessage {
            role: Role::User,
            content: MessageContent::Parts(vec![
                ContentPart::Text {
                    text: "write a poem about this image".into(),
                },
                ContentPart::ImageUrl {
                    image_url: serde_json::json!({"url": "https://example.com/a.png"}),
                },
            ]),
            name: None,
        }];
        let tools = vec![serde_json::json!({"type": "function"})];
        assert_eq!(
            classifier.classify(&messages, Some(&tools)),
            Some(TaskCategory::FunctionCalling)
        );
        // Without tools the image rule takes over.
        assert_eq!(
            classifier.classify(&messages, None),
            Some(TaskCategory::Vision)
        );
    }

    #[test]
    fn test_empty_tools_array_is_ignored() {
        let classifier = RulesClassifier::default();
        let tools: Vec<serde_json::Value> = vec![];
        assert_eq!(
            classifier.classify(&user("Hello!"), Some(&tools)),
            Some(TaskCategory::SimpleChat)
        );
    }

    #[test]
    fn test_long_context_threshold() {
        let classifier = RulesClassifier::new(100);
        let long = "x".repeat(101);
        assert_eq!(
            classifier.classify(&user(&long), None),
            Some(TaskCategory::LongContext)
        );
        let short = "x".repeat(100);
        assert_eq!(classifier.classify(&user(&short), None), None);
    }

    #[test]
    fn test_greeting_is_simple_chat() {
        let classifier = RulesClassifier::default();
        assert_eq!(
            classifier.classify(&user("Hello!"), None),
            Some(TaskCategory::SimpleChat)
        );
        assert_eq!(
            classifier.classify(&user("hey, how are you?"), None),
            Some(TaskCategory::SimpleChat)
        );
    }

    #[test]
    fn test_long_greeting_is_not_simple_chat() {
        let classifier = RulesClassifier::default();
        let text = format!("Hello! {}", "please help me with something. ".repeat(4));
        assert_ne!(
            classifier.classify(&user(&text), None),
            Some(TaskCategory::SimpleChat)
        );
    }

    #[test]
    fn test_coding_keywords() {
        let classifier = RulesClassifier::default();
        assert_eq!(
            classifier.classify(&user("Write a Python function to merge sort a list"), None),
            Some(TaskCategory::Coding)
        );
    }

    #[test]
    fn test_coding_shadows_creative() {
        // "Write a ... function" matches the coding rule before the
        // creative-writing rule is ever consulted.
        let classifier = RulesClassifier::default();
        assert_eq!(
            classifier.classify(&user("Write a story generator function in Rust"), None),
            Some(TaskCategory::Coding)
        );
    }

    #[test]
    fn test_math_keywords() {
        let classifier = RulesClassifier::default();
        assert_eq!(
            classifier.classify(&user("Solve for x: 3x + 4 = 19"), None),
            Some(TaskCategory::Math)
        );
        assert_eq!(
            classifier.classify(&user("what is 12 * 34"), None),
            Some(TaskCategory::Math)
        );
    }

    #[test]
    fn test_translation_keywords() {
        let classifier = RulesClassifier::default();
        assert_eq!(
            classifier.classify(&user("Can you put this sentence in French for me"), None),
            Some(TaskCategory::Translation)
        );
    }

    #[test]
    fn test_summarization_keywords() {
        let classifier = RulesClassifier::default();
        assert_eq!(
            classifier.classify(&user("Give me a tldr of this article please"), None),
            Some(TaskCategory::Summarization)
        );
    }

    #[test]
    fn test_creative_keywords() {
        let classifier = RulesClassifier::default();
        assert_eq!(
            classifier.classify(&user("Write a poem about the sea"), None),
            Some(TaskCategory::CreativeWriting)
        );
    }

    #[test]
    fn test_classifies_last_user_message_only() {
        let classifier = RulesClassifier::default();
        let messages = vec![
            ChatMessage::user("Write a Python function to merge sort a list"),
            ChatMessage::assistant("Here you go."),
            ChatMessage::user("Give me a tldr of our conversation"),
        ];
        assert_eq!(
            classifier.classify(&messages, None),
            Some(TaskCategory::Summarization)
        );
    }

    #[test]
    fn test_no_user_message_returns_none() {
        let classifier = RulesClassifier::default();
        let messages = vec![ChatMessage::system("be terse")];
        assert_eq!(classifier.classify(&messages, None), None);
    }

    #[test]
    fn test_ambiguous_text_returns_none() {
        let classifier = RulesClassifier::default();
        assert_eq!(
            classifier.classify(&user("Tell me about the history of Rome"), None),
            None
        );
    }
}
