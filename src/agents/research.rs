//! Web research: search, LLM synthesis, and markdown report assembly.

use super::{truncate_chars, AgentContext};
use crate::error::Result;
use crate::prompt::PromptLibrary;
use crate::providers::{GenerationRequest, SearchProvider, SearchResult, TextGenerator};
use crate::router::ContentType;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How many search results are fetched and analyzed by default.
pub const DEFAULT_RESULT_COUNT: u32 = 10;

/// Leading phrases stripped from free-text research requests.
const TOPIC_PREFIXES: &[&str] = &[
    "research",
    "find information about",
    "look up",
    "search for",
    "tell me about",
    "what is",
    "who is",
    "learn about",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub title: String,
    pub url: String,
}

/// Structured output of one research pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchFindings {
    pub topic: String,
    #[serde(default)]
    pub search_results: Vec<SearchResult>,
    #[serde(default)]
    pub key_findings: Vec<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
    #[serde(default)]
    pub related_topics: Vec<String>,
}

impl ResearchFindings {
    /// Render as a markdown research report.
    pub fn to_markdown(&self) -> String {
        let mut parts = Vec::new();

        parts.push(format!("# Research Report: {}\n", self.topic));

        if !self.summary.is_empty() {
            parts.push("## Executive Summary\n".to_string());
            parts.push(format!("{}\n", self.summary));
        }

        if !self.key_findings.is_empty() {
            parts.push("## Key Findings\n".to_string());
            for finding in &self.key_findings {
                parts.push(format!("- {finding}"));
            }
            parts.push(String::new());
        }

        if !self.sources.is_empty() {
            parts.push("## Sources\n".to_string());
            for (i, source) in self.sources.iter().take(10).enumerate() {
                if source.url.is_empty() {
                    parts.push(format!("{}. {}", i + 1, source.title));
                } else {
                    parts.push(format!("{}. [{}]({})", i + 1, source.title, source.url));
                }
            }
            parts.push(String::new());
        }

        if !self.related_topics.is_empty() {
            parts.push("## Related Topics to Explore\n".to_string());
            for topic in &self.related_topics {
                parts.push(format!("- {topic}"));
            }
            parts.push(String::new());
        }

        parts.join("\n")
    }
}

/// Buckets produced by the section-heading parser. Supporting data and
/// perspectives are parsed so their bullets never bleed into other sections,
/// though only three buckets survive into [`ResearchFindings`].
#[derive(Debug, Default)]
struct ParsedAnalysis {
    summary: String,
    key_findings: Vec<String>,
    supporting_data: Vec<String>,
    perspectives: Vec<String>,
    related_topics: Vec<String>,
}

pub struct ResearchAgent {
    generator: Arc<dyn TextGenerator>,
    search: Arc<dyn SearchProvider>,
    prompts: PromptLibrary,
}

impl ResearchAgent {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        search: Arc<dyn SearchProvider>,
        prompts: PromptLibrary,
    ) -> Self {
        Self {
            generator,
            search,
            prompts,
        }
    }

    /// Full research pass rendered as a markdown report. This is the
    /// generation routine for the `research` content type.
    pub async fn generate(&self, user_input: &str, context: &AgentContext) -> Result<String> {
        let topic = extract_topic(user_input, context);
        let findings = self.research(&topic, DEFAULT_RESULT_COUNT).await?;
        Ok(findings.to_markdown())
    }

    /// Search, then synthesize one analysis call into structured findings.
    /// Search failures degrade (empty results trigger the LLM fallback); a
    /// failing synthesis call is the one hard error here.
    pub async fn research(&self, topic: &str, num_results: u32) -> Result<ResearchFindings> {
        let mut search_results = self.search.search(topic, num_results).await;

        if search_results.is_empty() {
            tracing::warn!(topic, "search returned nothing, falling back to LLM research");
            search_results = self.llm_based_research(topic).await;
        }

        let sources = extract_sources(&search_results);
        let analysis = self.analyze(topic, &search_results).await?;

        tracing::info!(
            topic,
            results = search_results.len(),
            findings = analysis.key_findings.len(),
            "research completed"
        );

        Ok(ResearchFindings {
            topic: topic.to_string(),
            search_results,
            key_findings: analysis.key_findings,
            summary: analysis.summary,
            sources,
            related_topics: analysis.related_topics,
        })
    }

    /// Ask the model directly when no search results are available. Errors
    /// degrade to an empty list.
    async fn llm_based_research(&self, topic: &str) -> Vec<SearchResult> {
        let prompt = format!(
            "As a research expert, provide comprehensive information about: \"{topic}\"\n\
             \n\
             Include:\n\
             1. Key facts and information\n\
             2. Recent developments or trends\n\
             3. Important statistics or data points\n\
             4. Different perspectives or viewpoints\n\
             5. Relevant context and background\n\
             \n\
             Format your response as a detailed research brief."
        );

        match self
            .generator
            .generate(self.request(prompt, None, None))
            .await
        {
            Ok(outcome) => vec![SearchResult {
                title: format!("Research on: {topic}"),
                url: String::new(),
                snippet: truncate_chars(&outcome.content, 500),
            }],
            Err(e) => {
                tracing::warn!(error = %e, "LLM research fallback failed");
                Vec::new()
            }
        }
    }

    async fn analyze(&self, topic: &str, results: &[SearchResult]) -> Result<ParsedAnalysis> {
        let content = prepare_for_analysis(results);

        let prompt = format!(
            "Analyze the following research content about \"{topic}\":\n\
             \n\
             {content}\n\
             \n\
             Provide a comprehensive analysis including:\n\
             \n\
             1. EXECUTIVE SUMMARY (2-3 sentences)\n\
             2. KEY FINDINGS (5-7 bullet points of the most important insights)\n\
             3. SUPPORTING DATA (relevant statistics, facts, or figures)\n\
             4. DIFFERENT PERSPECTIVES (if any conflicting viewpoints exist)\n\
             5. RELATED TOPICS (3-5 related areas worth exploring)\n\
             \n\
             Be thorough but concise. Focus on actionable insights."
        );

        let outcome = self
            .generator
            .generate(self.request(prompt, None, Some(3000)))
            .await?;

        Ok(parse_analysis(&outcome.content))
    }

    fn request(
        &self,
        prompt: String,
        temperature: Option<f64>,
        max_tokens: Option<u32>,
    ) -> GenerationRequest {
        let mut request = GenerationRequest::new(prompt);
        if let Ok(system) = self.prompts.system_prompt(ContentType::Research, "professional") {
            request = request.with_system(system);
        }
        if let Some(t) = temperature {
            request = request.with_temperature(t);
        }
        if let Some(m) = max_tokens {
            request = request.with_max_tokens(m);
        }
        request
    }
}

/// Pull the research topic out of the request: an explicit context topic
/// wins, otherwise strip one leading request phrase.
fn extract_topic(user_input: &str, context: &AgentContext) -> String {
    if let Some(topic) = &context.topic
        && !topic.is_empty()
    {
        return topic.clone();
    }

    let mut topic = user_input.to_lowercase().trim().to_string();
    for prefix in TOPIC_PREFIXES {
        if let Some(rest) = topic.strip_prefix(prefix) {
            topic = rest.trim().to_string();
            break;
        }
    }

    if topic.is_empty() {
        user_input.to_string()
    } else {
        topic
    }
}

fn prepare_for_analysis(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No search results available.".to_string();
    }

    let parts: Vec<String> = results
        .iter()
        .take(10)
        .enumerate()
        .map(|(i, result)| {
            let reference = if result.url.is_empty() {
                "AI Analysis"
            } else {
                result.url.as_str()
            };
            format!(
                "\nSource {}: {}\n{}\nReference: {}\n---",
                i + 1,
                result.title,
                truncate_chars(&result.snippet, 500),
                reference
            )
        })
        .collect();

    parts.join("\n")
}

fn extract_sources(results: &[SearchResult]) -> Vec<SourceRef> {
    results
        .iter()
        .filter(|r| !r.url.is_empty() || !r.title.is_empty())
        .map(|r| SourceRef {
            title: if r.title.is_empty() {
                "Untitled".to_string()
            } else {
                r.title.clone()
            },
            url: r.url.clone(),
        })
        .collect()
}

/// Section-heading parser over the free-text analysis. When no recognizable
/// section appears at all, the raw text becomes the summary so nothing is
/// silently dropped.
fn parse_analysis(text: &str) -> ParsedAnalysis {
    let mut parsed = ParsedAnalysis::default();
    let mut current: Option<Section> = None;

    #[derive(Clone, Copy, PartialEq)]
    enum Section {
        Summary,
        KeyFindings,
        SupportingData,
        Perspectives,
        RelatedTopics,
    }

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let lower = line.to_lowercase();

        if lower.contains("executive summary") || lower.contains("summary") {
            current = Some(Section::Summary);
        } else if lower.contains("key findings") || lower.contains("key insights") {
            current = Some(Section::KeyFindings);
        } else if lower.contains("supporting data") || lower.contains("statistics") {
            current = Some(Section::SupportingData);
        } else if lower.contains("perspectives") || lower.contains("viewpoints") {
            current = Some(Section::Perspectives);
        } else if lower.contains("related topics") {
            current = Some(Section::RelatedTopics);
        } else if let Some(section) = current {
            let is_bullet = line.starts_with(['-', '•', '*', '·'])
                || line.chars().next().is_some_and(|c| c.is_ascii_digit());

            if is_bullet {
                let clean = line
                    .trim_start_matches(|c: char| "-•*·0123456789. ".contains(c))
                    .to_string();
                if !clean.is_empty() {
                    match section {
                        Section::Summary => {
                            parsed.summary.push_str(&clean);
                            parsed.summary.push(' ');
                        }
                        Section::KeyFindings => parsed.key_findings.push(clean),
                        Section::SupportingData => parsed.supporting_data.push(clean),
                        Section::Perspectives => parsed.perspectives.push(clean),
                        Section::RelatedTopics => parsed.related_topics.push(clean),
                    }
                }
            } else if section == Section::Summary {
                parsed.summary.push_str(line);
                parsed.summary.push(' ');
            }
        }
    }

    parsed.summary = parsed.summary.trim().to_string();

    if parsed.summary.is_empty()
        && parsed.key_findings.is_empty()
        && parsed.related_topics.is_empty()
    {
        parsed.summary = text.trim().to_string();
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::providers::GenerationOutcome;
    use async_trait::async_trait;

    struct FixedSearch(Vec<SearchResult>);

    #[async_trait]
    impl SearchProvider for FixedSearch {
        async fn search(&self, _query: &str, _num_results: u32) -> Vec<SearchResult> {
            self.0.clone()
        }

        fn name(&self) -> &str {
            "fixed-search"
        }
    }

    struct FixedText(&'static str);

    #[async_trait]
    impl TextGenerator for FixedText {
        async fn generate(&self, _request: GenerationRequest) -> Result<GenerationOutcome> {
            Ok(GenerationOutcome::text_only(self.0))
        }

        fn name(&self) -> &str {
            "fixed-text"
        }
    }

    struct FailingText;

    #[async_trait]
    impl TextGenerator for FailingText {
        async fn generate(&self, _request: GenerationRequest) -> Result<GenerationOutcome> {
            Err(crate::error::ProviderError::Empty {
                provider: "test".to_string(),
            }
            .into())
        }

        fn name(&self) -> &str {
            "failing-text"
        }
    }

    const ANALYSIS: &str = "\
1. EXECUTIVE SUMMARY
The market is cooling while inventory grows.

2. KEY FINDINGS
- Prices fell 2% year over year
- Inventory rose in most metros

3. SUPPORTING DATA
- 4.1 months of supply

5. RELATED TOPICS
- Mortgage rates
- First-time buyer programs";

    fn result(title: &str, url: &str) -> SearchResult {
        SearchResult {
            title: title.to_string(),
            url: url.to_string(),
            snippet: format!("snippet for {title}"),
        }
    }

    fn agent(text: impl TextGenerator + 'static, results: Vec<SearchResult>) -> ResearchAgent {
        ResearchAgent::new(
            Arc::new(text),
            Arc::new(FixedSearch(results)),
            PromptLibrary::new().unwrap(),
        )
    }

    #[tokio::test]
    async fn research_parses_analysis_sections() {
        let agent = agent(
            FixedText(ANALYSIS),
            vec![result("Housing report", "https://example.com/report")],
        );
        let findings = agent.research("housing market", 10).await.unwrap();

        assert_eq!(
            findings.summary,
            "The market is cooling while inventory grows."
        );
        assert_eq!(
            findings.key_findings,
            vec!["Prices fell 2% year over year", "Inventory rose in most metros"]
        );
        assert_eq!(
            findings.related_topics,
            vec!["Mortgage rates", "First-time buyer programs"]
        );
        assert_eq!(findings.sources.len(), 1);
        assert_eq!(findings.sources[0].url, "https://example.com/report");
    }

    #[tokio::test]
    async fn empty_search_falls_back_to_llm_research() {
        let agent = agent(FixedText(ANALYSIS), Vec::new());
        let findings = agent.research("niche topic", 10).await.unwrap();

        assert_eq!(findings.search_results.len(), 1);
        assert_eq!(findings.search_results[0].title, "Research on: niche topic");
        assert!(findings.search_results[0].url.is_empty());
    }

    #[tokio::test]
    async fn failing_synthesis_surfaces_an_error() {
        let agent = agent(FailingText, vec![result("t", "https://u")]);
        assert!(agent.research("topic", 10).await.is_err());
    }

    #[tokio::test]
    async fn generate_renders_a_markdown_report() {
        let agent = agent(
            FixedText(ANALYSIS),
            vec![result("Housing report", "https://example.com/report")],
        );
        let report = agent
            .generate("research housing market", &AgentContext::default())
            .await
            .unwrap();

        assert!(report.starts_with("# Research Report: housing market\n"));
        assert!(report.contains("## Executive Summary"));
        assert!(report.contains("- Prices fell 2% year over year"));
        assert!(report.contains("1. [Housing report](https://example.com/report)"));
        assert!(report.contains("## Related Topics to Explore"));
    }

    #[test]
    fn topic_extraction_strips_one_leading_phrase() {
        let ctx = AgentContext::default();
        assert_eq!(
            extract_topic("Tell me about mortgage rates", &ctx),
            "mortgage rates"
        );
        assert_eq!(
            extract_topic("research research methods", &ctx),
            "research methods"
        );
        assert_eq!(extract_topic("open houses", &ctx), "open houses");
    }

    #[test]
    fn explicit_context_topic_wins() {
        let ctx = AgentContext::default().with_topic("curb appeal");
        assert_eq!(extract_topic("tell me about anything", &ctx), "curb appeal");
    }

    #[test]
    fn unparseable_analysis_keeps_raw_text_as_summary() {
        let parsed = parse_analysis("just some freeform prose without headings");
        assert_eq!(parsed.summary, "just some freeform prose without headings");
        assert!(parsed.key_findings.is_empty());
    }

    #[test]
    fn analysis_content_lists_numbered_sources() {
        let formatted = prepare_for_analysis(&[result("First", "https://a"), result("Second", "")]);
        assert!(formatted.contains("Source 1: First"));
        assert!(formatted.contains("Reference: https://a"));
        assert!(formatted.contains("Source 2: Second"));
        assert!(formatted.contains("Reference: AI Analysis"));
    }

    #[test]
    fn empty_results_have_a_placeholder() {
        assert_eq!(prepare_for_analysis(&[]), "No search results available.");
    }

    #[test]
    fn untitled_sources_get_a_placeholder_title() {
        let sources = extract_sources(&[result("", "https://only-url")]);
        assert_eq!(sources[0].title, "Untitled");
    }
}
