//! Content strategy planning: full strategy documents plus topic ideation.

use super::{generate_with_retry, AgentContext, RetryPolicy};
use crate::error::Result;
use crate::prompt::PromptLibrary;
use crate::providers::{GenerationRequest, TextGenerator};
use crate::router::ContentType;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub struct ContentStrategist {
    generator: Arc<dyn TextGenerator>,
    prompts: PromptLibrary,
    policy: RetryPolicy,
}

/// One suggested topic parsed out of an ideation response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicIdea {
    pub title: String,
    pub audience: String,
    pub angle: String,
    pub keywords: String,
    pub format: String,
}

impl ContentStrategist {
    pub fn new(generator: Arc<dyn TextGenerator>, prompts: PromptLibrary) -> Self {
        Self {
            generator,
            prompts,
            policy: RetryPolicy::default(),
        }
    }

    pub async fn generate(&self, user_input: &str, context: &AgentContext) -> Result<String> {
        let tone = context.tone.as_deref().unwrap_or("professional");
        let prompt = build_prompt(user_input, context);

        let mut request = GenerationRequest::new(prompt);
        if let Ok(system) = self.prompts.system_prompt(ContentType::Strategy, tone) {
            request = request.with_system(system);
        }

        let outcome = generate_with_retry(
            self.generator.as_ref(),
            ContentType::Strategy.agent_name(),
            request,
            self.policy,
        )
        .await?;

        Ok(outcome.content)
    }

    /// Suggest topics for a niche. Fails soft: on model error, a single
    /// placeholder idea comes back instead.
    pub async fn suggest_topics(
        &self,
        niche: &str,
        num_topics: usize,
        content_type: Option<ContentType>,
    ) -> Vec<TopicIdea> {
        let qualifier = content_type
            .map(|ct| format!("for {ct} content"))
            .unwrap_or_default();

        let prompt = format!(
            "Suggest {num_topics} content topics {qualifier} in the {niche} niche.\n\
             \n\
             For each topic provide:\n\
             1. Topic title\n\
             2. Target audience\n\
             3. Content angle/hook\n\
             4. Potential keywords\n\
             5. Content format recommendation\n\
             \n\
             Focus on:\n\
             - Topics with search potential\n\
             - Evergreen and trending topics mix\n\
             - Different funnel stages (awareness, consideration, decision)\n\
             - Unique angles that stand out\n\
             \n\
             Format each topic clearly."
        );

        let mut request = GenerationRequest::new(prompt).with_temperature(0.8);
        if let Ok(system) = self.prompts.system_prompt(ContentType::Strategy, "professional") {
            request = request.with_system(system);
        }

        match self.generator.generate(request).await {
            Ok(outcome) => parse_topic_suggestions(&outcome.content, num_topics),
            Err(e) => {
                tracing::warn!(error = %e, "topic suggestion failed, returning placeholder");
                vec![TopicIdea {
                    title: format!("Content about {niche}"),
                    ..Default::default()
                }]
            }
        }
    }
}

fn build_prompt(user_input: &str, context: &AgentContext) -> String {
    let business_type = context
        .business_type
        .as_deref()
        .filter(|b| !b.is_empty())
        .unwrap_or("Not specified");
    let target_audience = context
        .target_audience
        .as_deref()
        .filter(|a| !a.is_empty())
        .unwrap_or("General professional audience");
    let timeframe = context.timeframe.as_deref().unwrap_or("monthly");

    let mut parts = vec![format!(
        "Create a comprehensive content strategy for: \"{user_input}\"\n\
         \n\
         Planning Parameters:\n\
         - Business Type: {business_type}\n\
         - Target Audience: {target_audience}\n\
         - Timeframe: {timeframe}"
    )];

    if !context.goals.is_empty() {
        let goals = context
            .goals
            .iter()
            .map(|goal| format!("- {goal}"))
            .collect::<Vec<_>>()
            .join("\n");
        parts.push(format!("\nBusiness Goals:\n{goals}"));
    }

    if let Some(research) = &context.research {
        parts.push(format!(
            "\nMarket Research Insights:\n{}",
            format_research(research)
        ));
    }

    parts.push(
        "\nRequired Strategy Components:\n\
         \n\
         ## 1. Executive Summary\n\
         Brief overview of the strategy and expected outcomes\n\
         \n\
         ## 2. Audience Analysis\n\
         - Target audience segments\n\
         - Pain points and needs\n\
         - Content preferences\n\
         - Engagement patterns\n\
         \n\
         ## 3. Content Pillars\n\
         - 3-5 main content themes/topics\n\
         - Rationale for each pillar\n\
         - Example topics under each pillar\n\
         \n\
         ## 4. Content Mix\n\
         - Content types and formats\n\
         - Distribution across channels\n\
         - Frequency recommendations\n\
         \n\
         ## 5. Channel Strategy\n\
         - Primary and secondary channels\n\
         - Channel-specific tactics\n\
         - Cross-promotion approach\n\
         \n\
         ## 6. Content Calendar Framework\n\
         - Weekly/monthly content rhythm\n\
         - Key dates and opportunities\n\
         - Content batching suggestions\n\
         \n\
         ## 7. Success Metrics\n\
         - KPIs to track\n\
         - Measurement approach\n\
         - Optimization triggers\n\
         \n\
         ## 8. Implementation Roadmap\n\
         - Quick wins (Week 1-2)\n\
         - Short-term actions (Month 1)\n\
         - Long-term initiatives\n\
         \n\
         Provide actionable, specific recommendations throughout."
            .to_string(),
    );

    parts.join("\n")
}

fn format_research(research: &super::ResearchFindings) -> String {
    let mut parts = Vec::new();
    if !research.summary.is_empty() {
        parts.push(super::truncate_chars(&research.summary, 400));
    }
    for finding in research.key_findings.iter().take(4) {
        parts.push(format!("• {finding}"));
    }
    if parts.is_empty() {
        "No research data available.".to_string()
    } else {
        parts.join("\n")
    }
}

fn parse_topic_suggestions(response: &str, num_topics: usize) -> Vec<TopicIdea> {
    const MARKERS: [&str; 11] = [
        "topic", "1.", "2.", "3.", "4.", "5.", "6.", "7.", "8.", "9.", "10.",
    ];
    const NUMBERING: [char; 14] = [
        '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', '.', '-', ')', ' ',
    ];

    let mut topics = Vec::new();
    let mut current = TopicIdea::default();

    for line in response.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let lower = line.to_lowercase();

        let starts_new_topic =
            MARKERS.iter().any(|marker| lower.contains(marker)) && line.contains(':');
        if starts_new_topic && !current.title.is_empty() {
            topics.push(std::mem::take(&mut current));
        }

        let value = line
            .split_once(':')
            .map(|(_, rest)| rest.trim().to_string());
        if lower.contains("title:") || lower.contains("topic:") {
            if let Some(value) = value {
                current.title = value;
            }
        } else if lower.contains("audience:") {
            if let Some(value) = value {
                current.audience = value;
            }
        } else if lower.contains("angle:") || lower.contains("hook:") {
            if let Some(value) = value {
                current.angle = value;
            }
        } else if lower.contains("keyword") {
            if let Some(value) = value {
                current.keywords = value;
            }
        } else if lower.contains("format:") {
            if let Some(value) = value {
                current.format = value;
            }
        } else if current.title.is_empty()
            && line.chars().next().is_some_and(|c| c.is_ascii_digit())
        {
            let title = line.trim_start_matches(NUMBERING);
            if !title.is_empty() {
                current.title = title.to_string();
            }
        }
    }
    if !current.title.is_empty() {
        topics.push(current);
    }

    if topics.is_empty() {
        return vec![TopicIdea {
            title: response.lines().next().unwrap_or_default().to_string(),
            ..Default::default()
        }];
    }
    topics.truncate(num_topics);
    topics
}
