//! Intent routing: classify a free-text request into a content type.
//!
//! Classification is a fixed-priority rule engine: pattern match, then
//! keyword scoring, then conversation-history inference, then the `general`
//! default. It is deterministic for identical inputs, performs no I/O, and
//! never fails: anything unclassifiable degrades to `General`.

mod rules;

pub use rules::RouterRules;

use serde::{Deserialize, Serialize};

/// The closed set of content types a request can be routed to.
///
/// Declaration order is a contract: keyword-scoring ties resolve to the first
/// type in this order reaching the maximum score, and pattern groups are
/// tried in this order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ContentType {
    Research,
    Blog,
    Linkedin,
    Instagram,
    Image,
    Strategy,
    General,
}

impl ContentType {
    /// Name of the generation routine bound to this type, used in response
    /// metadata and logs.
    pub fn agent_name(self) -> &'static str {
        match self {
            Self::Research => "research_agent",
            Self::Blog => "blog_writer_agent",
            Self::Linkedin => "linkedin_writer_agent",
            Self::Instagram => "instagram_writer_agent",
            Self::Image => "image_generator_agent",
            Self::Strategy => "content_strategist_agent",
            Self::General => "query_handler_agent",
        }
    }
}

/// Outcome of one routing call. Produced fresh per request, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub content_type: ContentType,
    /// In `[0, 1]`. Pattern matches are 0.9, keyword scores cap at 0.8,
    /// history inference is 0.6, the default is 0.5.
    pub confidence: f64,
    pub reasoning: String,
    /// True when the chosen type benefits from a research pass and the
    /// request does not already ask for research itself.
    pub requires_research: bool,
    /// Suggested next content types, from the static follow-up table.
    pub follow_up_types: Vec<ContentType>,
}

/// Rule-driven intent classifier.
pub struct IntentRouter {
    rules: RouterRules,
}

impl IntentRouter {
    pub fn new(rules: RouterRules) -> Self {
        Self { rules }
    }

    pub fn with_defaults() -> crate::error::Result<Self> {
        Ok(Self::new(RouterRules::defaults()?))
    }

    /// Classify `user_input`, optionally consulting recent conversation
    /// history (message contents, oldest first).
    ///
    /// Priority: pattern match (0.9) → keyword score → history inference
    /// (0.6) → `General` default (0.5). Infallible by contract.
    pub fn route(&self, user_input: &str, history: &[String]) -> RoutingDecision {
        let text = user_input.to_lowercase();
        let text = text.trim();

        if let Some(content_type) = self.match_patterns(text) {
            return self.decision(content_type, 0.9, "Matched intent pattern".into(), text);
        }

        if let Some((content_type, score)) = self.score_keywords(text) {
            let confidence = f64::min(0.8, 0.3 + f64::from(score) * 0.1);
            return self.decision(
                content_type,
                confidence,
                format!("Matched {score} keywords"),
                text,
            );
        }

        if let Some(content_type) = self.infer_from_history(history) {
            return self.decision(
                content_type,
                0.6,
                "Inferred from conversation context".into(),
                text,
            );
        }

        self.decision(
            ContentType::General,
            0.5,
            "No specific intent detected, defaulting to general assistance".into(),
            text,
        )
    }

    fn match_patterns(&self, text: &str) -> Option<ContentType> {
        for (content_type, patterns) in self.rules.patterns() {
            if patterns.iter().any(|p| p.is_match(text)) {
                return Some(*content_type);
            }
        }
        None
    }

    /// Count distinct keywords present per type; highest count wins. Ties
    /// resolve to the earlier type in declaration order (strict `>` while
    /// scanning an ordered table).
    fn score_keywords(&self, text: &str) -> Option<(ContentType, u32)> {
        let mut best: Option<(ContentType, u32)> = None;
        for (content_type, keywords) in self.rules.keywords() {
            let score = keywords.iter().filter(|k| text.contains(*k)).count();
            let score = u32::try_from(score).unwrap_or(u32::MAX);
            if score > 0 && best.is_none_or(|(_, s)| score > s) {
                best = Some((*content_type, score));
            }
        }
        best
    }

    /// Scan the last 3 history turns, most recent first, for any type whose
    /// top-5 keywords appear.
    fn infer_from_history(&self, history: &[String]) -> Option<ContentType> {
        let start = history.len().saturating_sub(3);
        for content in history[start..].iter().rev() {
            let content = content.to_lowercase();
            for (content_type, _) in self.rules.keywords() {
                let top = self.rules.top_keywords(*content_type, 5);
                if top.iter().any(|k| content.contains(k)) {
                    return Some(*content_type);
                }
            }
        }
        None
    }

    fn decision(
        &self,
        content_type: ContentType,
        confidence: f64,
        reasoning: String,
        lowered_input: &str,
    ) -> RoutingDecision {
        let research_types = [
            ContentType::Blog,
            ContentType::Linkedin,
            ContentType::Strategy,
        ];
        let requires_research =
            research_types.contains(&content_type) && !lowered_input.contains("research");

        RoutingDecision {
            content_type,
            confidence,
            reasoning,
            requires_research,
            follow_up_types: RouterRules::follow_ups(content_type),
        }
    }
}
