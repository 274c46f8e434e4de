//! Real-estate relevance guard.
//!
//! Keyword matching decides most cases: real-estate keywords count for the
//! request, off-topic indicators against it. One real-estate keyword is
//! enough to stay on topic. When neither list matches, the request is allowed
//! at low confidence, and an optional LLM classifier gets the final word.

use super::{word_union, BlockReason, GuardrailVerdict};
use crate::providers::{GenerationRequest, TextGenerator};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};

const REAL_ESTATE_KEYWORDS: &[&str] = &[
    // Property types
    "property", "properties", "house", "houses", "home", "homes",
    "apartment", "apartments", "condo", "condominium", "condos",
    "townhouse", "townhome", "villa", "mansion", "estate",
    "duplex", "triplex", "multi-family", "single-family",
    "commercial property", "residential", "industrial",
    "retail space", "office space", "warehouse",
    "land", "lot", "acreage", "plot",
    // Transactions
    "buy", "buying", "purchase", "purchasing",
    "sell", "selling", "sale", "for sale",
    "rent", "renting", "rental", "lease", "leasing",
    "invest", "investing", "investment",
    "mortgage", "financing", "loan", "down payment",
    "closing", "escrow", "title",
    // Professionals
    "realtor", "real estate agent", "broker", "property manager",
    "landlord", "tenant", "buyer", "seller",
    "appraiser", "inspector", "home inspector",
    // Concepts
    "real estate", "realty", "housing market",
    "property value", "home value", "appraisal",
    "listing", "mls", "open house",
    "square feet", "sq ft", "sqft", "bedroom", "bathroom",
    "kitchen", "living room", "garage", "backyard",
    "neighborhood", "location", "zoning",
    "hoa", "homeowners association",
    "property tax", "capital gains",
    "appreciation", "depreciation",
    "equity", "refinance", "refinancing",
    "foreclosure", "short sale",
    "first-time buyer", "home buyer",
    "curb appeal", "staging", "renovation",
    "fixer-upper", "move-in ready",
    // Marketing
    "property marketing", "real estate marketing",
    "listing description", "property description",
    "real estate blog", "property blog",
    "real estate content", "property content",
    "real estate social media", "property social",
    "real estate linkedin", "realtor linkedin",
    "property listing", "home listing",
];

const OFF_TOPIC_INDICATORS: &[&str] = &[
    // Technology
    "programming", "coding", "software development",
    "machine learning", "artificial intelligence",
    "cryptocurrency", "bitcoin", "blockchain",
    "video games", "gaming",
    // Entertainment
    "movies", "music", "celebrities", "sports",
    "recipes", "cooking", "food blog",
    // Politics
    "politics", "election", "political party",
    "government policy",
    // Health
    "medical advice", "health tips", "diet",
    "exercise routine", "fitness",
    // Other industries
    "fashion", "beauty", "makeup",
    "travel destinations", "vacation",
    "automotive", "cars", "vehicles",
];

pub const OFF_TOPIC_RESPONSE: &str = "Sorry! I cannot help you with that topic. My expertise is \
     in Real Estate. I can help you with property listings, real estate marketing, home \
     buying/selling content, property descriptions, and real estate social media posts.";

const TOPIC_SUGGESTIONS: &[&str] = &[
    "Write a property listing description for a 3-bedroom house",
    "Create a LinkedIn post about home buying tips",
    "Research current real estate market trends",
    "Generate a blog post about first-time home buyers",
    "Create marketing content for a luxury condo",
    "Write about mortgage rates and financing options",
    "Create social media content for a real estate agent",
    "Generate an image for a property listing",
];

static REAL_ESTATE_RE: LazyLock<Regex> = LazyLock::new(|| word_union(REAL_ESTATE_KEYWORDS));
static OFF_TOPIC_RE: LazyLock<Regex> = LazyLock::new(|| word_union(OFF_TOPIC_INDICATORS));

/// Outcome of the keyword relevance check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicCheck {
    pub is_on_topic: bool,
    pub confidence: f64,
    pub reason: String,
    pub matched_keywords: Vec<String>,
    pub off_topic_matches: Vec<String>,
}

impl TopicCheck {
    fn semantic(is_on_topic: bool, confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            is_on_topic,
            confidence,
            reason: reason.into(),
            matched_keywords: Vec::new(),
            off_topic_matches: Vec::new(),
        }
    }
}

pub struct TopicalGuard {
    classifier: Option<Arc<dyn TextGenerator>>,
}

impl TopicalGuard {
    pub fn new(classifier: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { classifier }
    }

    pub fn set_classifier(&mut self, classifier: Arc<dyn TextGenerator>) {
        self.classifier = Some(classifier);
    }

    /// Keyword-only relevance check. Unique matches on each list are counted;
    /// a single real-estate keyword keeps the request on topic regardless of
    /// how many off-topic indicators appear alongside it.
    pub fn check_topic(&self, user_input: &str) -> TopicCheck {
        let lowered = user_input.to_lowercase();

        let matched: BTreeSet<String> = REAL_ESTATE_RE
            .find_iter(&lowered)
            .map(|hit| hit.as_str().to_string())
            .collect();
        let off_topic: BTreeSet<String> = OFF_TOPIC_RE
            .find_iter(&lowered)
            .map(|hit| hit.as_str().to_string())
            .collect();

        let real_estate_score = matched.len();
        let off_topic_score = off_topic.len();
        let total = real_estate_score + off_topic_score;

        let (is_on_topic, confidence, reason) = if total == 0 {
            (
                true,
                0.5,
                "No clear topic indicators found, allowing by default".to_string(),
            )
        } else {
            let confidence = real_estate_score as f64 / total as f64;
            let is_on_topic = real_estate_score > off_topic_score || real_estate_score >= 1;
            let reason = if is_on_topic {
                format!("Found {real_estate_score} real estate keyword(s)")
            } else {
                format!(
                    "Found {off_topic_score} off-topic indicator(s) vs \
                     {real_estate_score} real estate keyword(s)"
                )
            };
            (is_on_topic, confidence, reason)
        };

        TopicCheck {
            is_on_topic,
            confidence,
            reason,
            matched_keywords: matched.into_iter().collect(),
            off_topic_matches: off_topic.into_iter().collect(),
        }
    }

    /// LLM relevance check for keyword-ambiguous input. Transport failure
    /// allows the request through with the reason recorded.
    pub async fn semantic_topic_check(&self, user_input: &str) -> TopicCheck {
        let Some(classifier) = &self.classifier else {
            return TopicCheck::semantic(true, 0.5, "No classifier available for semantic analysis");
        };

        let prompt = format!(
            "Analyze if the following user request is related to Real Estate.\n\n\
             Real Estate topics include:\n\
             - Property buying, selling, renting, or investing\n\
             - Real estate marketing and content creation\n\
             - Property descriptions and listings\n\
             - Home improvement for selling\n\
             - Real estate market analysis\n\
             - Mortgage and financing\n\
             - Property management\n\
             - Real estate social media and blog content\n\n\
             User Request: \"{user_input}\"\n\n\
             Respond with ONLY one of these:\n\
             - \"ON_TOPIC\" if the request is related to real estate\n\
             - \"OFF_TOPIC\" if the request is NOT related to real estate\n\n\
             Response:"
        );

        let request = GenerationRequest::new(prompt)
            .with_temperature(0.1)
            .with_max_tokens(20);

        match classifier.generate(request).await {
            Ok(outcome) => {
                let result = outcome.content.trim().to_uppercase();
                let is_on_topic = result.contains("ON_TOPIC");
                TopicCheck::semantic(is_on_topic, 0.85, "Semantic analysis determined topic relevance")
            }
            Err(e) => {
                tracing::error!(error = %e, "semantic topic check failed");
                TopicCheck::semantic(true, 0.5, format!("Semantic analysis failed: {e}"))
            }
        }
    }

    pub async fn validate(&self, user_input: &str) -> GuardrailVerdict {
        let mut check = self.check_topic(user_input);

        if check.confidence < 0.6 && self.classifier.is_some() {
            check = self.semantic_topic_check(user_input).await;
        }

        let mut verdict = if check.is_on_topic {
            GuardrailVerdict::pass()
        } else {
            tracing::info!(
                input = %super::truncate(user_input, 100),
                reason = %check.reason,
                "blocked off-topic request"
            );
            GuardrailVerdict::block(BlockReason::Topical, OFF_TOPIC_RESPONSE)
        };

        if let Ok(serde_json::Value::Object(map)) = serde_json::to_value(&check) {
            verdict.details = map;
        }
        verdict
    }

    pub fn topic_suggestions(&self) -> Vec<&'static str> {
        TOPIC_SUGGESTIONS.to_vec()
    }
}
