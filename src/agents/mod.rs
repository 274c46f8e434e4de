//! Content-generation agents, one routine per content type.
//!
//! Each agent builds a templated prompt from the request and shared
//! [`AgentContext`], calls the text collaborator (with bounded retries for
//! empty or truncated output), and post-processes the result into its final
//! shape. Agents surface failures as errors; the pipeline decides what is
//! fatal.

mod blog;
mod image;
mod instagram;
mod linkedin;
mod postprocess;
mod query;
mod research;
mod strategist;

pub use blog::BlogWriter;
pub use image::{ImageAgent, StylePreset};
pub use instagram::InstagramWriter;
pub use linkedin::LinkedinWriter;
pub use query::QueryHandler;
pub use research::{DEFAULT_RESULT_COUNT, ResearchAgent, ResearchFindings, SourceRef};
pub use strategist::ContentStrategist;

use crate::error::{AgentError, Result};
use crate::providers::{GenerationOutcome, GenerationRequest, TextGenerator};
use serde::{Deserialize, Serialize};

/// Request context shared across agents. All fields are optional; each agent
/// reads the ones it understands and applies its own defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentContext {
    pub topic: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub tone: Option<String>,
    pub target_audience: Option<String>,
    pub word_count: Option<u32>,
    /// LinkedIn post format, e.g. "insight" or "story".
    pub post_type: Option<String>,
    /// Visual style preset name for image generation.
    pub style: Option<String>,
    pub aspect_ratio: Option<String>,
    pub negative_prompt: Option<String>,
    /// Blog header image toggle; unset means enabled.
    pub include_image: Option<bool>,
    /// LinkedIn hashtag toggle; unset means enabled.
    pub include_hashtags: Option<bool>,
    pub business_type: Option<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    pub timeframe: Option<String>,
    pub property_type: Option<String>,
    pub location: Option<String>,
    pub price: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    pub image_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub research: Option<ResearchFindings>,
}

impl AgentContext {
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = Some(tone.into());
        self
    }

    pub fn with_research(mut self, research: ResearchFindings) -> Self {
        self.research = Some(research);
        self
    }

    /// Overlay this context on top of `base`: fields set here win, unset
    /// fields fall back to the base. Empty lists count as unset.
    pub fn merge_over(self, base: Self) -> Self {
        Self {
            topic: self.topic.or(base.topic),
            keywords: if self.keywords.is_empty() {
                base.keywords
            } else {
                self.keywords
            },
            tone: self.tone.or(base.tone),
            target_audience: self.target_audience.or(base.target_audience),
            word_count: self.word_count.or(base.word_count),
            post_type: self.post_type.or(base.post_type),
            style: self.style.or(base.style),
            aspect_ratio: self.aspect_ratio.or(base.aspect_ratio),
            negative_prompt: self.negative_prompt.or(base.negative_prompt),
            include_image: self.include_image.or(base.include_image),
            include_hashtags: self.include_hashtags.or(base.include_hashtags),
            business_type: self.business_type.or(base.business_type),
            goals: if self.goals.is_empty() {
                base.goals
            } else {
                self.goals
            },
            timeframe: self.timeframe.or(base.timeframe),
            property_type: self.property_type.or(base.property_type),
            location: self.location.or(base.location),
            price: self.price.or(base.price),
            features: if self.features.is_empty() {
                base.features
            } else {
                self.features
            },
            image_description: self.image_description.or(base.image_description),
            research: self.research.or(base.research),
        }
    }

    /// Compact "Topic: ... / Keywords: ..." block for prompt inclusion.
    /// Empty string when nothing is set.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if let Some(topic) = &self.topic {
            parts.push(format!("Topic: {topic}"));
        }
        if !self.keywords.is_empty() {
            let keywords: Vec<&str> = self.keywords.iter().take(5).map(String::as_str).collect();
            parts.push(format!("Keywords: {}", keywords.join(", ")));
        }
        if let Some(tone) = &self.tone {
            parts.push(format!("Tone: {tone}"));
        }
        if let Some(audience) = &self.target_audience {
            parts.push(format!("Target Audience: {audience}"));
        }
        if let Some(research) = &self.research {
            if !research.summary.is_empty() {
                parts.push(format!(
                    "Research Summary: {}",
                    truncate_chars(&research.summary, 500)
                ));
            } else if !research.key_findings.is_empty() {
                let points: Vec<&str> = research
                    .key_findings
                    .iter()
                    .take(3)
                    .map(String::as_str)
                    .collect();
                parts.push(format!("Key Points: {}", points.join(", ")));
            }
        }

        parts.join("\n")
    }
}

/// Bounded retry for empty or truncated generations. One policy object
/// instead of per-agent literals.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Extra attempts after the first call.
    pub max_retries: u32,
    /// Responses shorter than this many characters count as failed.
    pub min_chars: usize,
    /// Pause between attempts. Zero retries immediately.
    pub backoff: std::time::Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            min_chars: 50,
            backoff: std::time::Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    fn validate(&self, outcome: &GenerationOutcome) -> std::result::Result<(), String> {
        if outcome.is_empty() {
            return Err("Empty response".to_string());
        }
        if outcome.content.len() < self.min_chars {
            return Err(format!("Response too short (min {} chars)", self.min_chars));
        }
        Ok(())
    }
}

/// Call the generator, retrying while the response errors out or fails
/// validation. The last failure is surfaced, never swallowed.
pub(crate) async fn generate_with_retry(
    generator: &dyn TextGenerator,
    agent: &str,
    request: GenerationRequest,
    policy: RetryPolicy,
) -> Result<GenerationOutcome> {
    let attempts = policy.max_retries + 1;
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match generator.generate(request.clone()).await {
            Ok(outcome) => match policy.validate(&outcome) {
                Ok(()) => return Ok(outcome),
                Err(reason) => last_error = reason,
            },
            Err(e) => last_error = e.to_string(),
        }

        if attempt < attempts {
            tracing::warn!(agent, attempt, error = %last_error, "retrying generation");
            if !policy.backoff.is_zero() {
                tokio::time::sleep(policy.backoff).await;
            }
        }
    }

    Err(AgentError::RetriesExhausted {
        agent: agent.to_string(),
        attempts,
        message: last_error,
    }
    .into())
}

/// Truncate to at most `max_chars` characters, on a char boundary.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyGenerator {
        calls: AtomicU32,
        succeed_on: u32,
    }

    #[async_trait]
    impl TextGenerator for FlakyGenerator {
        async fn generate(&self, _request: GenerationRequest) -> Result<GenerationOutcome> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call >= self.succeed_on {
                Ok(GenerationOutcome::text_only(
                    "a response comfortably longer than the fifty character floor",
                ))
            } else {
                Ok(GenerationOutcome::text_only("too short"))
            }
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    #[tokio::test]
    async fn retry_recovers_from_short_responses() {
        let generator = FlakyGenerator {
            calls: AtomicU32::new(0),
            succeed_on: 3,
        };
        let outcome = generate_with_retry(
            &generator,
            "test_agent",
            GenerationRequest::new("prompt"),
            RetryPolicy::default(),
        )
        .await
        .unwrap();
        assert!(outcome.content.len() > 50);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_surfaces_last_error_after_exhaustion() {
        let generator = FlakyGenerator {
            calls: AtomicU32::new(0),
            succeed_on: 10,
        };
        let err = generate_with_retry(
            &generator,
            "test_agent",
            GenerationRequest::new("prompt"),
            RetryPolicy::default(),
        )
        .await
        .unwrap_err();
        assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
        let text = err.to_string();
        assert!(text.contains("test_agent"), "got: {text}");
        assert!(text.contains("3 attempts"), "got: {text}");
        assert!(text.contains("Response too short"), "got: {text}");
    }

    #[tokio::test]
    async fn empty_response_is_a_distinct_failure() {
        struct Silent;

        #[async_trait]
        impl TextGenerator for Silent {
            async fn generate(&self, _request: GenerationRequest) -> Result<GenerationOutcome> {
                Ok(GenerationOutcome::text_only("   "))
            }

            fn name(&self) -> &str {
                "silent"
            }
        }

        let err = generate_with_retry(
            &Silent,
            "test_agent",
            GenerationRequest::new("prompt"),
            RetryPolicy::default(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Empty response"));
    }

    #[test]
    fn context_summary_lists_known_fields() {
        let context = AgentContext {
            topic: Some("home staging".into()),
            keywords: vec![
                "staging".into(),
                "curb appeal".into(),
                "declutter".into(),
                "lighting".into(),
                "paint".into(),
                "never shown".into(),
            ],
            tone: Some("professional".into()),
            target_audience: Some("sellers".into()),
            ..Default::default()
        };
        let summary = context.summary();
        assert!(summary.contains("Topic: home staging"));
        assert!(summary.contains("Keywords: staging, curb appeal, declutter, lighting, paint"));
        assert!(!summary.contains("never shown"));
        assert!(summary.contains("Tone: professional"));
        assert!(summary.contains("Target Audience: sellers"));
    }

    #[test]
    fn context_summary_prefers_research_summary_over_key_points() {
        let mut context = AgentContext::default().with_research(ResearchFindings {
            summary: "markets are shifting".into(),
            key_findings: vec!["finding one".into()],
            ..Default::default()
        });
        assert!(context.summary().contains("Research Summary: markets are shifting"));
        assert!(!context.summary().contains("Key Points"));

        context.research.as_mut().unwrap().summary.clear();
        assert!(context.summary().contains("Key Points: finding one"));
    }

    #[test]
    fn empty_context_summary_is_empty() {
        assert_eq!(AgentContext::default().summary(), "");
    }

    #[test]
    fn merge_over_prefers_request_fields_and_falls_back_per_field() {
        let stored = AgentContext {
            topic: Some("stored topic".into()),
            tone: Some("casual".into()),
            keywords: vec!["stored".into()],
            include_image: Some(false),
            ..Default::default()
        };
        let request = AgentContext {
            topic: Some("request topic".into()),
            target_audience: Some("buyers".into()),
            ..Default::default()
        };

        let merged = request.merge_over(stored);
        assert_eq!(merged.topic.as_deref(), Some("request topic"));
        assert_eq!(merged.tone.as_deref(), Some("casual"));
        assert_eq!(merged.target_audience.as_deref(), Some("buyers"));
        assert_eq!(merged.keywords, vec!["stored".to_string()]);
        assert_eq!(merged.include_image, Some(false));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 100), "short");
    }
}
