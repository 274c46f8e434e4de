//! Profanity and inappropriate-content guard.
//!
//! Detection is keyword-first: word-boundary matching over a profanity list,
//! leetspeak patterns for obfuscated spellings, and a category list for
//! inappropriate subject matter. Legitimate words that contain profanity
//! substrings ("classic", "assassinate", "mississippi") are masked out before
//! matching so they never trip the obfuscation patterns. In strict mode an
//! optional LLM classifier double-checks keyword-clean input.

use super::{word_union, BlockReason, GuardrailVerdict, RequestKind};
use crate::providers::{GenerationRequest, TextGenerator};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};

const PROFANITY_WORDS: &[&str] = &[
    "fuck", "fucking", "fucked", "fucker", "fck",
    "shit", "shitty", "bullshit",
    // "ass" itself is omitted: too many false positives (class, glass, pass).
    "asshole", "arse",
    "bitch", "bitchy",
    "bastard",
    "dickhead",
    "piss", "pissed off",
    "whore", "slut",
    "cunt",
    "racist", "racism",
    "sexist", "sexism",
    "homophobic", "homophobia",
    "nazi", "fascist",
    "murder", "terrorist", "terrorism",
    "gun violence",
    "self-harm",
];

/// Legitimate words that contain profanity substrings. These are removed
/// from the text before any matching so the leetspeak patterns cannot fire
/// on them.
const SAFE_WORDS: &[&str] = &[
    "class", "classes", "classic", "classical", "classify", "classification",
    "glass", "glasses", "glassware", "fiberglass",
    "grass", "grassy", "grassland",
    "pass", "passed", "passing", "passage", "passenger", "passport",
    "mass", "massive", "massage",
    "bass", "bassist",
    "brass", "brassy",
    "assess", "assessment", "assessor",
    "assist", "assistant", "assistance",
    "associate", "associated", "association",
    "assume", "assumed", "assumption",
    "assure", "assured", "assurance",
    "asset", "assets",
    "assign", "assigned", "assignment",
    "assemble", "assembled", "assembly",
    "assert", "assertion", "assertive",
    "assassin", "assassinate", "assassination", "assassinated",
    "cassette", "casserole",
    "embassy", "embarrass", "embarrassed", "embarrassing",
    "harass", "harassment",
    "compass", "compassion", "compassionate",
    "trespass", "trespassing",
    "surpass", "surpassed",
    "bypass", "bypassed",
    "overpass", "underpass",
    "sassafras", "sassy",
    "hello", "shell", "shells", "shellfish", "seashell",
    "dwell", "dwelling", "farewell",
    "michelle", "rochelle", "campbell",
    "hellenistic", "hellenic",
    "amsterdam", "goddamn",
    "dickens", "predict", "prediction", "verdict",
    "peacock", "hancock", "cockpit", "cocktail",
    "mississippi",
    "scrap", "scrape", "scraps",
];

const INAPPROPRIATE_TERMS: &[&str] = &[
    "pornography", "porn", "xxx",
    "nude", "nudity", "naked",
    "sexually explicit", "erotic",
    "gore", "gory", "gruesome",
    "torture", "torturing",
    "cocaine", "heroin", "meth",
    "fraud", "scam", "phishing",
    "hacking", "malware",
    "hate speech", "hateful",
    "derogatory",
];

/// Stricter list applied to image generation prompts.
const IMAGE_TERMS: &[&str] = &[
    "nude", "naked", "explicit",
    "gore", "gory", "bloody",
    "violent", "violence",
    "weapon", "gun", "knife",
    "drug", "drugs",
    "offensive", "inappropriate",
    "adult", "xxx", "porn",
    "disturbing", "graphic",
];

/// Raw-substring terms that force high severity regardless of match count.
const HIGH_SEVERITY_TERMS: &[&str] = &["porn", "nude", "gore", "terrorist", "suicide", "self-harm"];

const LEETSPEAK_PATTERNS: &[(&str, &str)] = &[
    (r"f[u*@0]ck", "fuck"),
    (r"sh[i*1]t", "shit"),
    (r"b[i*1]tch", "bitch"),
    (r"a[s$]s", "ass"),
    (r"d[i*1]ck", "dick"),
    (r"c[u*]nt", "cunt"),
];

pub const BLOCKED_RESPONSE: &str = "I cannot help create content with profanity, offensive \
     language, or inappropriate material. Please rephrase your request using professional and \
     appropriate language.";

pub const BLOCKED_IMAGE_RESPONSE: &str = "I cannot generate images containing inappropriate, \
     offensive, violent, or explicit content. Please describe a professional and appropriate \
     image for your real estate needs.";

static PROFANITY_RE: LazyLock<Regex> = LazyLock::new(|| word_union(PROFANITY_WORDS));
static SAFE_WORD_RE: LazyLock<Regex> = LazyLock::new(|| word_union(SAFE_WORDS));
static INAPPROPRIATE_RE: LazyLock<Regex> = LazyLock::new(|| word_union(INAPPROPRIATE_TERMS));
static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| word_union(IMAGE_TERMS));
static LEETSPEAK_RES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    LEETSPEAK_PATTERNS
        .iter()
        .map(|(pattern, word)| (Regex::new(&format!("(?i){pattern}")).unwrap(), *word))
        .collect()
});

/// How much offending material a check found.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfanityReport {
    pub has_profanity: bool,
    pub words: Vec<String>,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InappropriateReport {
    pub has_inappropriate: bool,
    pub categories: Vec<String>,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePromptReport {
    pub is_safe: bool,
    pub issues: Vec<String>,
    pub profanity: ProfanityReport,
    pub image_terms: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticReport {
    pub is_safe: bool,
    pub confidence: f64,
    pub reason: String,
}

pub struct SafetyGuard {
    classifier: Option<Arc<dyn TextGenerator>>,
    strict_mode: bool,
}

impl SafetyGuard {
    pub fn new(classifier: Option<Arc<dyn TextGenerator>>, strict_mode: bool) -> Self {
        Self {
            classifier,
            strict_mode,
        }
    }

    pub fn set_classifier(&mut self, classifier: Arc<dyn TextGenerator>) {
        self.classifier = Some(classifier);
    }

    fn mask_safe_words(text: &str) -> Cow<'_, str> {
        SAFE_WORD_RE.replace_all(text, " ")
    }

    pub fn check_profanity(&self, text: &str) -> ProfanityReport {
        let lowered = text.to_lowercase();
        let masked = Self::mask_safe_words(&lowered);

        let mut found: BTreeSet<String> = PROFANITY_RE
            .find_iter(&masked)
            .map(|hit| hit.as_str().to_string())
            .collect();

        for (pattern, word) in LEETSPEAK_RES.iter() {
            if pattern.is_match(&masked) {
                found.insert((*word).to_string());
            }
        }

        let severity = match found.len() {
            0 => Severity::None,
            1 => Severity::Low,
            2..=3 => Severity::Medium,
            _ => Severity::High,
        };

        ProfanityReport {
            has_profanity: !found.is_empty(),
            words: found.into_iter().collect(),
            severity,
        }
    }

    pub fn check_inappropriate(&self, text: &str) -> InappropriateReport {
        let lowered = text.to_lowercase();

        let found: BTreeSet<String> = INAPPROPRIATE_RE
            .find_iter(&lowered)
            .map(|hit| hit.as_str().to_string())
            .collect();

        let has_high_severity = HIGH_SEVERITY_TERMS.iter().any(|term| lowered.contains(term));
        let severity = if found.is_empty() {
            Severity::None
        } else if has_high_severity {
            Severity::High
        } else if found.len() <= 2 {
            Severity::Medium
        } else {
            Severity::High
        };

        InappropriateReport {
            has_inappropriate: !found.is_empty(),
            categories: found.into_iter().collect(),
            severity,
        }
    }

    pub fn check_image_prompt(&self, prompt: &str) -> ImagePromptReport {
        let lowered = prompt.to_lowercase();

        let image_terms: BTreeSet<String> = IMAGE_RE
            .find_iter(&lowered)
            .map(|hit| hit.as_str().to_string())
            .collect();

        let profanity = self.check_profanity(prompt);

        let issues: BTreeSet<String> = image_terms
            .iter()
            .chain(profanity.words.iter())
            .cloned()
            .collect();

        ImagePromptReport {
            is_safe: issues.is_empty(),
            issues: issues.into_iter().collect(),
            profanity,
            image_terms: image_terms.into_iter().collect(),
        }
    }

    /// LLM double-check for keyword-clean input. Transport failure allows
    /// the text through with the reason recorded.
    pub async fn semantic_check(&self, text: &str) -> SemanticReport {
        let Some(classifier) = &self.classifier else {
            return SemanticReport {
                is_safe: true,
                confidence: 0.5,
                reason: "No classifier available for semantic analysis".to_string(),
            };
        };

        let prompt = format!(
            "Analyze the following text for safety issues.\n\n\
             Check for:\n\
             1. Profanity or offensive language (even if disguised or misspelled)\n\
             2. Hate speech or discrimination\n\
             3. Violence or threats\n\
             4. Adult/explicit content\n\
             5. Illegal activities\n\
             6. Harmful or dangerous content\n\n\
             Text to analyze: \"{text}\"\n\n\
             Respond with ONLY one of these:\n\
             - \"SAFE\" if the text is appropriate and professional\n\
             - \"UNSAFE\" if the text contains any of the above issues\n\n\
             Response:"
        );

        let request = GenerationRequest::new(prompt)
            .with_temperature(0.1)
            .with_max_tokens(20);

        match classifier.generate(request).await {
            Ok(outcome) => {
                let result = outcome.content.trim().to_uppercase();
                let is_safe = result.contains("SAFE") && !result.contains("UNSAFE");
                SemanticReport {
                    is_safe,
                    confidence: 0.9,
                    reason: "Semantic analysis completed".to_string(),
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "semantic safety check failed");
                SemanticReport {
                    is_safe: true,
                    confidence: 0.5,
                    reason: format!("Semantic analysis failed: {e}"),
                }
            }
        }
    }

    pub async fn validate_text(&self, text: &str) -> GuardrailVerdict {
        let profanity = self.check_profanity(text);
        let inappropriate = self.check_inappropriate(text);

        let mut has_issues = profanity.has_profanity || inappropriate.has_inappropriate;

        if !has_issues && self.strict_mode && self.classifier.is_some() {
            let semantic = self.semantic_check(text).await;
            if !semantic.is_safe {
                has_issues = true;
            }
        }

        if has_issues {
            tracing::warn!(
                profanity = ?profanity.words,
                inappropriate = ?inappropriate.categories,
                "blocked unsafe content"
            );
            return GuardrailVerdict::block(BlockReason::Safety, BLOCKED_RESPONSE)
                .with_detail("profanity", &profanity)
                .with_detail("inappropriate", &inappropriate);
        }

        GuardrailVerdict::pass()
            .with_detail("profanity", &profanity)
            .with_detail("inappropriate", &inappropriate)
    }

    pub async fn validate_image_prompt(&self, prompt: &str) -> GuardrailVerdict {
        let report = self.check_image_prompt(prompt);
        let mut is_safe = report.is_safe;

        if is_safe && self.strict_mode && self.classifier.is_some() {
            let semantic = self.semantic_check(prompt).await;
            if !semantic.is_safe {
                is_safe = false;
            }
        }

        if !is_safe {
            tracing::warn!(issues = ?report.issues, "blocked unsafe image prompt");
            return GuardrailVerdict::block(BlockReason::ImageSafety, BLOCKED_IMAGE_RESPONSE)
                .with_detail("image", &report);
        }

        GuardrailVerdict::pass().with_detail("image", &report)
    }

    pub async fn validate(&self, content: &str, kind: RequestKind) -> GuardrailVerdict {
        match kind {
            RequestKind::Image => self.validate_image_prompt(content).await,
            RequestKind::Text => self.validate_text(content).await,
        }
    }

    /// Replace detected profanity with asterisks, keeping the first and last
    /// character of words longer than two characters.
    pub fn sanitize_text(&self, text: &str) -> String {
        PROFANITY_RE
            .replace_all(text, |caps: &regex::Captures<'_>| {
                let word = &caps[0];
                let len = word.chars().count();
                if len <= 2 {
                    "*".repeat(len)
                } else {
                    let mut chars = word.chars();
                    let first = chars.next().unwrap_or('*');
                    let last = word.chars().last().unwrap_or('*');
                    format!("{first}{}{last}", "*".repeat(len - 2))
                }
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::providers::GenerationOutcome;
    use async_trait::async_trait;

    fn guard() -> SafetyGuard {
        SafetyGuard::new(None, true)
    }

    #[test]
    fn direct_profanity_is_detected() {
        let report = guard().check_profanity("this is fucking unacceptable");
        assert!(report.has_profanity);
        assert_eq!(report.words, vec!["fucking"]);
        assert_eq!(report.severity, Severity::Low);
    }

    #[test]
    fn leetspeak_variants_are_detected() {
        let report = guard().check_profanity("what the f*ck is this sh1t");
        assert!(report.has_profanity);
        assert!(report.words.contains(&"fuck".to_string()));
        assert!(report.words.contains(&"shit".to_string()));
        assert_eq!(report.severity, Severity::Medium);
    }

    #[test]
    fn safe_words_never_trip_the_guard() {
        for input in [
            "a classic home with glass walls and a grassy backyard",
            "assassinate is a word that must pass",
            "first-class assistance for passing your assessment",
            "mississippi cocktail party at the embassy",
        ] {
            let report = guard().check_profanity(input);
            assert!(!report.has_profanity, "false positive on: {input}");
            assert_eq!(report.severity, Severity::None);
        }
    }

    #[test]
    fn many_matches_escalate_to_high() {
        let report = guard().check_profanity("fuck shit bitch cunt");
        assert_eq!(report.severity, Severity::High);
    }

    #[test]
    fn inappropriate_categories_are_reported() {
        let report = guard().check_inappropriate("a scam and fraud operation");
        assert!(report.has_inappropriate);
        assert_eq!(report.categories, vec!["fraud", "scam"]);
        assert_eq!(report.severity, Severity::Medium);
    }

    #[test]
    fn high_severity_terms_force_high() {
        let report = guard().check_inappropriate("gore in this scene");
        assert_eq!(report.severity, Severity::High);
    }

    #[test]
    fn clean_text_reports_none() {
        let report = guard().check_inappropriate("a lovely three bedroom home");
        assert!(!report.has_inappropriate);
        assert_eq!(report.severity, Severity::None);
    }

    #[test]
    fn image_prompts_use_the_stricter_list() {
        let report = guard().check_image_prompt("a gun on a table");
        assert!(!report.is_safe);
        assert!(report.issues.contains(&"gun".to_string()));

        let report = guard().check_image_prompt("a modern kitchen with an island");
        assert!(report.is_safe);
    }

    #[test]
    fn sanitize_masks_word_interiors() {
        let guard = guard();
        assert_eq!(guard.sanitize_text("fuck this"), "f**k this");
        assert_eq!(guard.sanitize_text("clean text"), "clean text");
    }

    #[tokio::test]
    async fn validate_text_blocks_with_canned_message() {
        let verdict = guard().validate_text("write a fucking listing").await;
        assert!(!verdict.passed);
        assert_eq!(verdict.blocked_by, Some(BlockReason::Safety));
        assert_eq!(verdict.message.as_deref(), Some(BLOCKED_RESPONSE));
        assert!(verdict.details.contains_key("profanity"));
    }

    #[tokio::test]
    async fn validate_image_prompt_blocks_with_image_message() {
        let verdict = guard().validate_image_prompt("nude figure on a couch").await;
        assert!(!verdict.passed);
        assert_eq!(verdict.blocked_by, Some(BlockReason::ImageSafety));
        assert_eq!(verdict.message.as_deref(), Some(BLOCKED_IMAGE_RESPONSE));
    }

    struct Failing;

    #[async_trait]
    impl TextGenerator for Failing {
        async fn generate(&self, _request: GenerationRequest) -> Result<GenerationOutcome> {
            Err(crate::error::ProviderError::Empty {
                provider: "test".to_string(),
            }
            .into())
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct Unsafe;

    #[async_trait]
    impl TextGenerator for Unsafe {
        async fn generate(&self, _request: GenerationRequest) -> Result<GenerationOutcome> {
            Ok(GenerationOutcome::text_only("UNSAFE"))
        }

        fn name(&self) -> &str {
            "unsafe"
        }
    }

    #[tokio::test]
    async fn strict_mode_classifier_can_block_clean_text() {
        let guard = SafetyGuard::new(Some(Arc::new(Unsafe)), true);
        let verdict = guard.validate_text("a perfectly clean sentence").await;
        assert!(!verdict.passed);
    }

    #[tokio::test]
    async fn classifier_failure_fails_open() {
        let guard = SafetyGuard::new(Some(Arc::new(Failing)), true);
        let verdict = guard.validate_text("a perfectly clean sentence").await;
        assert!(verdict.passed);
    }

    #[tokio::test]
    async fn semantic_check_without_classifier_allows() {
        let report = guard().semantic_check("anything").await;
        assert!(report.is_safe);
        assert!((report.confidence - 0.5).abs() < f64::EPSILON);
    }
}
