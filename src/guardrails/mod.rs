//! Input and output guardrails.
//!
//! Two guards compose into a [`GuardrailManager`]: a safety guard (profanity
//! and inappropriate content) and a topical guard (real-estate relevance).
//! Safety always runs before topical. A blocked verdict is an expected
//! outcome with a user-facing message, never an error. Optional semantic
//! escalation through an LLM classifier fails open: when the classifier is
//! unreachable the request is allowed and the keyword verdict stands.

pub mod safety;
pub mod topical;

use crate::providers::TextGenerator;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use safety::{SafetyGuard, Severity};
pub use topical::TopicalGuard;

/// Which guard rejected the request.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BlockReason {
    Topical,
    Safety,
    ImageSafety,
}

/// What the input is destined for; image prompts get extra scrutiny.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestKind {
    #[default]
    Text,
    Image,
}

/// Outcome of one guardrail pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailVerdict {
    pub passed: bool,
    pub blocked_by: Option<BlockReason>,
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl GuardrailVerdict {
    pub fn pass() -> Self {
        Self {
            passed: true,
            blocked_by: None,
            message: None,
            details: serde_json::Map::new(),
        }
    }

    pub fn block(reason: BlockReason, message: impl Into<String>) -> Self {
        Self {
            passed: false,
            blocked_by: Some(reason),
            message: Some(message.into()),
            details: serde_json::Map::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Serialize) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.details.insert(key.to_string(), value);
        }
        self
    }
}

/// Construction-time switches, mirrored from the `[guardrails]` config table.
/// Every guard defaults to on; a partial table only overrides what it names.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GuardrailOptions {
    #[serde(default = "default_enabled")]
    pub enable_topical: bool,
    #[serde(default = "default_enabled")]
    pub enable_safety: bool,
    #[serde(default = "default_enabled")]
    pub strict_mode: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for GuardrailOptions {
    fn default() -> Self {
        Self {
            enable_topical: true,
            enable_safety: true,
            strict_mode: true,
        }
    }
}

/// Addressable guards for runtime enable/disable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum GuardKind {
    Topical,
    Safety,
}

/// Snapshot of guardrail wiring for status endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailStatus {
    pub topical_enabled: bool,
    pub safety_enabled: bool,
    pub classifier_available: bool,
    pub topical_active: bool,
    pub safety_active: bool,
}

/// Message used when generated output, rather than user input, fails safety.
const OUTPUT_BLOCKED_RESPONSE: &str =
    "Generated content contains inappropriate material and has been blocked.";

pub struct GuardrailManager {
    topical_enabled: bool,
    safety_enabled: bool,
    topical: Option<TopicalGuard>,
    safety: Option<SafetyGuard>,
    classifier: Option<Arc<dyn TextGenerator>>,
}

impl GuardrailManager {
    pub fn new(options: GuardrailOptions, classifier: Option<Arc<dyn TextGenerator>>) -> Self {
        let topical = options
            .enable_topical
            .then(|| TopicalGuard::new(classifier.clone()));
        let safety = options
            .enable_safety
            .then(|| SafetyGuard::new(classifier.clone(), options.strict_mode));

        tracing::info!(
            topical = options.enable_topical,
            safety = options.enable_safety,
            strict = options.strict_mode,
            "guardrails initialized"
        );

        Self {
            topical_enabled: options.enable_topical,
            safety_enabled: options.enable_safety,
            topical,
            safety,
            classifier,
        }
    }

    /// Validate user input. Safety runs first and short-circuits; the topical
    /// check can be skipped for content types with creative freedom.
    pub async fn validate_input(
        &self,
        user_input: &str,
        kind: RequestKind,
        skip_topical: bool,
    ) -> GuardrailVerdict {
        let mut verdict = GuardrailVerdict::pass();

        if self.safety_enabled
            && let Some(guard) = &self.safety
        {
            let sub = guard.validate(user_input, kind).await;
            verdict = verdict.with_detail("safety", &sub);

            if !sub.passed {
                tracing::info!(input = %truncate(user_input, 50), "input blocked by safety guardrail");
                verdict.passed = false;
                verdict.blocked_by = sub.blocked_by.or(Some(BlockReason::Safety));
                verdict.message = sub.message;
                return verdict;
            }
        }

        if !skip_topical
            && self.topical_enabled
            && let Some(guard) = &self.topical
        {
            let sub = guard.validate(user_input).await;
            verdict = verdict.with_detail("topical", &sub);

            if !sub.passed {
                tracing::info!(input = %truncate(user_input, 50), "input blocked by topical guardrail");
                verdict.passed = false;
                verdict.blocked_by = Some(BlockReason::Topical);
                verdict.message = sub.message;
                return verdict;
            }
        }

        verdict
    }

    /// Safety-only validation, used for content types like Instagram where
    /// creative topics are allowed but inappropriate content is not.
    pub async fn validate_safety_only(
        &self,
        user_input: &str,
        kind: RequestKind,
    ) -> GuardrailVerdict {
        self.validate_input(user_input, kind, true).await
    }

    /// Validate generated output. Topical relevance is an input concern, so
    /// only the safety guard runs here.
    pub async fn validate_output(&self, output: &str) -> GuardrailVerdict {
        let mut verdict = GuardrailVerdict::pass();

        if self.safety_enabled
            && let Some(guard) = &self.safety
        {
            let sub = guard.validate(output, RequestKind::Text).await;
            verdict = verdict.with_detail("safety", &sub);

            if !sub.passed {
                tracing::warn!("output blocked by safety guardrail");
                verdict.passed = false;
                verdict.blocked_by = Some(BlockReason::Safety);
                verdict.message = Some(OUTPUT_BLOCKED_RESPONSE.to_string());
                return verdict;
            }
        }

        verdict
    }

    /// Validate an image generation prompt: full input validation with the
    /// image-specific term list in effect.
    pub async fn validate_image_request(&self, prompt: &str) -> GuardrailVerdict {
        self.validate_input(prompt, RequestKind::Image, false).await
    }

    pub fn is_enabled(&self) -> bool {
        self.topical_enabled || self.safety_enabled
    }

    pub fn status(&self) -> GuardrailStatus {
        GuardrailStatus {
            topical_enabled: self.topical_enabled,
            safety_enabled: self.safety_enabled,
            classifier_available: self.classifier.is_some(),
            topical_active: self.topical.is_some(),
            safety_active: self.safety.is_some(),
        }
    }

    pub fn enable(&mut self, kind: GuardKind) {
        match kind {
            GuardKind::Topical => {
                self.topical_enabled = true;
                if self.topical.is_none() {
                    self.topical = Some(TopicalGuard::new(self.classifier.clone()));
                }
            }
            GuardKind::Safety => {
                self.safety_enabled = true;
                if self.safety.is_none() {
                    self.safety = Some(SafetyGuard::new(self.classifier.clone(), true));
                }
            }
        }
        tracing::info!(guard = %kind, "guardrail enabled");
    }

    pub fn disable(&mut self, kind: GuardKind) {
        match kind {
            GuardKind::Topical => self.topical_enabled = false,
            GuardKind::Safety => self.safety_enabled = false,
        }
        tracing::info!(guard = %kind, "guardrail disabled");
    }

    pub fn set_classifier(&mut self, classifier: Arc<dyn TextGenerator>) {
        self.classifier = Some(classifier.clone());
        if let Some(guard) = &mut self.topical {
            guard.set_classifier(classifier.clone());
        }
        if let Some(guard) = &mut self.safety {
            guard.set_classifier(classifier);
        }
    }

    pub fn topic_suggestions(&self) -> Vec<&'static str> {
        self.topical
            .as_ref()
            .map(|guard| guard.topic_suggestions())
            .unwrap_or_default()
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

/// Case-insensitive word-boundary union over a literal word list.
fn word_union(words: &[&str]) -> Regex {
    let escaped: Vec<String> = words.iter().map(|word| regex::escape(word)).collect();
    Regex::new(&format!(r"(?i)\b(?:{})\b", escaped.join("|"))).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::providers::{GenerationOutcome, GenerationRequest};
    use async_trait::async_trait;

    struct FixedClassifier(&'static str);

    #[async_trait]
    impl TextGenerator for FixedClassifier {
        async fn generate(&self, _request: GenerationRequest) -> Result<GenerationOutcome> {
            Ok(GenerationOutcome::text_only(self.0))
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn manager() -> GuardrailManager {
        GuardrailManager::new(GuardrailOptions::default(), None)
    }

    #[tokio::test]
    async fn safety_blocks_before_topical() {
        // Both guards would reject this; safety must win.
        let verdict = manager()
            .validate_input("write a fucking programming tutorial", RequestKind::Text, false)
            .await;
        assert!(!verdict.passed);
        assert_eq!(verdict.blocked_by, Some(BlockReason::Safety));
        assert!(verdict.details.contains_key("safety"));
        assert!(!verdict.details.contains_key("topical"));
    }

    #[tokio::test]
    async fn off_topic_input_is_blocked_as_topical() {
        let verdict = manager()
            .validate_input("Write a Python programming tutorial", RequestKind::Text, false)
            .await;
        assert!(!verdict.passed);
        assert_eq!(verdict.blocked_by, Some(BlockReason::Topical));
    }

    #[tokio::test]
    async fn skip_topical_allows_off_topic_input() {
        let verdict = manager()
            .validate_safety_only("Write a recipe blog about cooking", RequestKind::Text)
            .await;
        assert!(verdict.passed);
        assert!(!verdict.details.contains_key("topical"));
    }

    #[tokio::test]
    async fn image_terms_surface_as_image_safety() {
        let verdict = manager().validate_image_request("a violent scene with a gun").await;
        assert!(!verdict.passed);
        assert_eq!(verdict.blocked_by, Some(BlockReason::ImageSafety));
    }

    #[tokio::test]
    async fn output_blocks_use_the_output_message() {
        let verdict = manager().validate_output("this is bullshit content").await;
        assert!(!verdict.passed);
        assert_eq!(verdict.message.as_deref(), Some(OUTPUT_BLOCKED_RESPONSE));
    }

    #[tokio::test]
    async fn output_validation_ignores_topic() {
        let verdict = manager()
            .validate_output("a clean article about cooking recipes")
            .await;
        assert!(verdict.passed);
    }

    #[tokio::test]
    async fn disabled_guards_pass_everything() {
        let options = GuardrailOptions {
            enable_topical: false,
            enable_safety: false,
            strict_mode: false,
        };
        let manager = GuardrailManager::new(options, None);
        let verdict = manager
            .validate_input("fucking bitcoin recipes", RequestKind::Text, false)
            .await;
        assert!(verdict.passed);
        assert!(!manager.is_enabled());
    }

    #[tokio::test]
    async fn disable_then_enable_round_trips() {
        let mut manager = manager();
        manager.disable(GuardKind::Safety);
        let verdict = manager
            .validate_input("fucking staging tips", RequestKind::Text, false)
            .await;
        assert!(verdict.passed);

        manager.enable(GuardKind::Safety);
        let verdict = manager
            .validate_input("fucking staging tips", RequestKind::Text, false)
            .await;
        assert!(!verdict.passed);
    }

    #[tokio::test]
    async fn classifier_escalation_can_reject_ambiguous_input() {
        use std::sync::Arc;
        let classifier: Arc<dyn TextGenerator> = Arc::new(FixedClassifier("OFF_TOPIC"));
        let manager = GuardrailManager::new(
            GuardrailOptions {
                strict_mode: false,
                ..GuardrailOptions::default()
            },
            Some(classifier),
        );
        // No keyword signal either way, so the classifier decides.
        let verdict = manager
            .validate_input("hello there friend", RequestKind::Text, false)
            .await;
        assert!(!verdict.passed);
        assert_eq!(verdict.blocked_by, Some(BlockReason::Topical));
    }

    #[test]
    fn status_reflects_wiring() {
        let status = manager().status();
        assert!(status.topical_enabled);
        assert!(status.safety_enabled);
        assert!(!status.classifier_available);
        assert!(status.topical_active);
        assert!(status.safety_active);
    }

    #[test]
    fn block_reason_serializes_snake_case() {
        let json = serde_json::to_string(&BlockReason::ImageSafety).unwrap();
        assert_eq!(json, "\"image_safety\"");
        assert_eq!(BlockReason::ImageSafety.to_string(), "image_safety");
    }
}
