//! LinkedIn post generation. Output is plain text (no markdown), capped at
//! the platform's 3000-character limit, with hashtags guaranteed present.

use super::postprocess;
use super::{generate_with_retry, AgentContext, RetryPolicy};
use crate::error::Result;
use crate::prompt::PromptLibrary;
use crate::providers::{GenerationRequest, TextGenerator};
use crate::router::ContentType;
use std::sync::Arc;

const MAX_POST_CHARS: usize = 3000;

const COMMON_HASHTAGS: [&str; 10] = [
    "#Leadership",
    "#Innovation",
    "#Business",
    "#Career",
    "#Success",
    "#Entrepreneurship",
    "#Marketing",
    "#Technology",
    "#Growth",
    "#Learning",
];

pub struct LinkedinWriter {
    generator: Arc<dyn TextGenerator>,
    prompts: PromptLibrary,
    policy: RetryPolicy,
}

impl LinkedinWriter {
    pub fn new(generator: Arc<dyn TextGenerator>, prompts: PromptLibrary) -> Self {
        Self {
            generator,
            prompts,
            policy: RetryPolicy::default(),
        }
    }

    pub async fn generate(&self, user_input: &str, context: &AgentContext) -> Result<String> {
        let topic = context.topic.as_deref().unwrap_or(user_input);
        let tone = context
            .tone
            .as_deref()
            .unwrap_or("professional yet personable");
        let target_audience = context.target_audience.as_deref().unwrap_or("professionals");
        let post_type = context.post_type.as_deref().unwrap_or("insight");

        let prompt = build_prompt(topic, context, tone, target_audience, post_type);
        let mut request = GenerationRequest::new(prompt)
            .with_temperature(0.8)
            .with_max_tokens(2000);
        if let Ok(system) = self.prompts.system_prompt(ContentType::Linkedin, tone) {
            request = request.with_system(system);
        }

        let outcome = generate_with_retry(
            self.generator.as_ref(),
            ContentType::Linkedin.agent_name(),
            request,
            self.policy,
        )
        .await?;

        Ok(post_process(
            &outcome.content,
            context.include_hashtags.unwrap_or(true),
        ))
    }
}

fn post_type_instruction(post_type: &str) -> &'static str {
    match post_type {
        "story" => "Tell a compelling personal or professional story",
        "tips" => "Provide actionable tips or advice",
        "opinion" => "Share a thought-provoking opinion or perspective",
        "announcement" => "Make an engaging announcement",
        "question" => "Pose a thought-provoking question to spark discussion",
        "celebration" => "Celebrate an achievement or milestone",
        _ => "Share a valuable industry insight or observation",
    }
}

fn build_prompt(
    topic: &str,
    context: &AgentContext,
    tone: &str,
    target_audience: &str,
    post_type: &str,
) -> String {
    let mut parts = vec![format!(
        "Create an engaging LinkedIn post about: \"{topic}\"\n\
         \n\
         Post Type: {instruction}\n\
         Tone: {tone}\n\
         Target Audience: {target_audience}",
        instruction = post_type_instruction(post_type),
    )];

    if let Some(research) = &context.research {
        let research_text = format_research(research);
        if !research_text.is_empty() {
            parts.push(format!(
                "\nBackground Information:\n\
                 {research_text}\n\
                 \n\
                 Use relevant facts or insights from this research to strengthen your post."
            ));
        }
    }

    parts.push(
        "\nLinkedIn Post Requirements:\n\
         \n\
         1. **Hook** (First 2 lines - CRITICAL):\n   \
            - Must grab attention immediately\n   \
            - Create curiosity or emotional connection\n   \
            - Make readers want to click \"see more\"\n\
         \n\
         2. **Body**:\n   \
            - Use short paragraphs (1-2 sentences each)\n   \
            - Add line breaks between paragraphs for readability\n   \
            - Include specific examples, numbers, or stories\n   \
            - Keep total length between 150-250 words\n\
         \n\
         3. **Call-to-Action**:\n   \
            - End with a question or invitation to engage\n   \
            - Encourage comments, shares, or saves\n\
         \n\
         4. **Hashtags**:\n   \
            - Include 3-5 relevant hashtags at the end\n   \
            - Mix popular and niche hashtags\n   \
            - Use hashtags relevant to the topic and industry\n\
         \n\
         Formatting:\n\
         - Use emojis sparingly (1-3 max) if appropriate\n\
         - No bullet points in the main content (use line breaks instead)\n\
         - Make it feel authentic and personal\n\
         - Avoid corporate jargon"
            .to_string(),
    );

    parts.join("\n")
}

fn format_research(research: &super::ResearchFindings) -> String {
    let mut parts = Vec::new();
    if !research.summary.is_empty() {
        parts.push(super::truncate_chars(&research.summary, 300));
    }
    for finding in research.key_findings.iter().take(3) {
        parts.push(format!("• {finding}"));
    }
    parts.join("\n")
}

fn post_process(content: &str, include_hashtags: bool) -> String {
    let mut content = postprocess::strip_social_markdown(content);

    if content.chars().count() > MAX_POST_CHARS {
        content = postprocess::truncate_at_boundary(&content, MAX_POST_CHARS);
    }

    if include_hashtags && !content.contains('#') {
        let tags = COMMON_HASHTAGS[..4].join(" ");
        content.push_str(&format!("\n\n{tags}"));
    }

    content
}
