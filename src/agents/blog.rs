//! Long-form SEO blog generation with optional header-image embedding.

use super::image::{ImageAgent, StylePreset};
use super::postprocess;
use super::{generate_with_retry, AgentContext, RetryPolicy};
use crate::error::Result;
use crate::prompt::PromptLibrary;
use crate::providers::{AspectRatio, GenerationRequest, TextGenerator};
use crate::router::ContentType;
use std::sync::Arc;

const DEFAULT_WORD_COUNT: u32 = 1500;

pub struct BlogWriter {
    generator: Arc<dyn TextGenerator>,
    image: ImageAgent,
    prompts: PromptLibrary,
    policy: RetryPolicy,
}

impl BlogWriter {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        image: ImageAgent,
        prompts: PromptLibrary,
    ) -> Self {
        Self {
            generator,
            image,
            prompts,
            policy: RetryPolicy::default(),
        }
    }

    /// Produce a full blog post. Text generation failures are fatal after
    /// retries; the header image is best-effort and never fails the post.
    pub async fn generate(&self, user_input: &str, context: &AgentContext) -> Result<String> {
        let topic = context.topic.as_deref().unwrap_or(user_input);
        let tone = context.tone.as_deref().unwrap_or("professional");
        let target_audience = context
            .target_audience
            .as_deref()
            .unwrap_or("general audience");
        let word_count = context.word_count.unwrap_or(DEFAULT_WORD_COUNT);

        let prompt = build_prompt(topic, context, tone, target_audience, word_count);
        let mut request = GenerationRequest::new(prompt);
        if let Ok(system) = self.prompts.system_prompt(ContentType::Blog, tone) {
            request = request.with_system(system);
        }

        let outcome = generate_with_retry(
            self.generator.as_ref(),
            ContentType::Blog.agent_name(),
            request,
            self.policy,
        )
        .await?;

        let mut content = post_process(&outcome.content, &context.keywords);

        if context.include_image.unwrap_or(true) {
            let style = StylePreset::parse_lossy(context.style.as_deref().unwrap_or_default());
            if let Some(with_image) = self.attach_header_image(&content, topic, style).await {
                content = with_image;
            }
        }

        Ok(content)
    }

    /// Write a search-result meta description for an existing post. Falls
    /// back to a generic line when the model call fails.
    pub async fn meta_description(
        &self,
        title: &str,
        content_summary: &str,
        keywords: &[String],
    ) -> String {
        let keyword_list = keywords
            .iter()
            .take(3)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");

        let prompt = format!(
            "Write an SEO meta description for this blog post:\n\
             \n\
             Title: {title}\n\
             Summary: {content_summary}\n\
             Keywords to include: {keyword_list}\n\
             \n\
             Requirements:\n\
             - Exactly 150-160 characters\n\
             - Include primary keyword naturally\n\
             - Compelling and click-worthy\n\
             - Accurately represents the content\n\
             - Include a subtle call-to-action\n\
             \n\
             Provide only the meta description, no explanation."
        );

        let mut request = GenerationRequest::new(prompt)
            .with_temperature(0.6)
            .with_max_tokens(100);
        if let Ok(system) = self.prompts.system_prompt(ContentType::Blog, "professional") {
            request = request.with_system(system);
        }

        match self.generator.generate(request).await {
            Ok(outcome) => {
                let description = outcome.content.trim().trim_matches('"').to_string();
                if description.chars().count() > 160 {
                    format!("{}...", super::truncate_chars(&description, 157))
                } else {
                    description
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "meta description generation failed, using fallback");
                format!(
                    "Learn about {}. Discover key insights and actionable tips.",
                    super::truncate_chars(title, 100)
                )
            }
        }
    }

    /// Generate a wide header image and splice it in below the title.
    /// Returns `None` when no embeddable image came back.
    async fn attach_header_image(
        &self,
        content: &str,
        topic: &str,
        style: StylePreset,
    ) -> Option<String> {
        let title = postprocess::extract_title(content).unwrap_or_else(|| topic.to_string());
        let summary = postprocess::extract_summary(content).unwrap_or_default();

        let header_prompt = self.image.blog_header_prompt(&title, &summary).await;
        let rendered = match self
            .image
            .render(&header_prompt, style, AspectRatio::Wide, None, false)
            .await
        {
            Ok(rendered) => rendered,
            Err(e) => {
                tracing::warn!(error = %e, "header image failed, keeping text-only post");
                return None;
            }
        };

        // A degraded render returns explanatory markdown, not image data.
        if !rendered.starts_with("data:image") {
            tracing::debug!("no image data returned, keeping text-only post");
            return None;
        }

        Some(insert_image_section(content, &rendered))
    }
}

fn build_prompt(
    topic: &str,
    context: &AgentContext,
    tone: &str,
    target_audience: &str,
    word_count: u32,
) -> String {
    let mut parts = vec![format!(
        "Write a comprehensive, SEO-optimized blog post about: \"{topic}\"\n\
         \n\
         Target Specifications:\n\
         - Word Count: Approximately {word_count} words\n\
         - Tone: {tone}\n\
         - Target Audience: {target_audience}"
    )];

    if let Some(primary) = context.keywords.first() {
        let secondary = context
            .keywords
            .iter()
            .skip(1)
            .take(10)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!(
            "\nTarget Keywords to Include:\n\
             Primary: {primary}\n\
             Secondary: {secondary}\n\
             \n\
             Incorporate these keywords naturally throughout the content."
        ));
    }

    if let Some(research) = &context.research {
        parts.push(format!(
            "\nResearch Context:\n\
             {}\n\
             \n\
             Use this research to support your points with facts and data.",
            format_research(research)
        ));
    }

    parts.push(
        "\nRequired Blog Structure:\n\
         1. **Title**: Compelling, keyword-rich title (H1)\n\
         2. **Meta Description**: 150-160 character summary for search results\n\
         3. **Introduction**: Hook the reader, introduce the topic, preview what they'll learn\n\
         4. **Main Content**: \n   \
            - Use H2 headings for main sections\n   \
            - Use H3 headings for subsections\n   \
            - Include bullet points or numbered lists where appropriate\n   \
            - Add relevant examples or statistics\n\
         5. **Conclusion**: Summarize key points, include call-to-action\n\
         6. **FAQ Section** (optional): 3-5 common questions about the topic\n\
         \n\
         Formatting Guidelines:\n\
         - Use markdown formatting\n\
         - Keep paragraphs to 2-4 sentences\n\
         - Include transition sentences between sections\n\
         - Bold important terms and concepts\n\
         - Use engaging subheadings that include keywords"
            .to_string(),
    );

    parts.join("\n")
}

fn format_research(research: &super::ResearchFindings) -> String {
    let mut parts = Vec::new();
    if !research.summary.is_empty() {
        parts.push(format!(
            "Summary: {}",
            super::truncate_chars(&research.summary, 500)
        ));
    }
    if !research.key_findings.is_empty() {
        parts.push("Key Facts:".to_string());
        for finding in research.key_findings.iter().take(5) {
            parts.push(format!("- {finding}"));
        }
    }
    if parts.is_empty() {
        "No research data available.".to_string()
    } else {
        parts.join("\n")
    }
}

fn post_process(content: &str, keywords: &[String]) -> String {
    let mut content = postprocess::fix_markdown(content);
    let analysis = postprocess::analyze_keyword_usage(&content, keywords);
    if !analysis.is_empty() {
        content.push_str(&format!("\n\n---\n*SEO Analysis: {analysis}*"));
    }
    content
}

/// Splice the image section in after the title block (H1 plus an optional
/// meta-description line), before the body proper starts.
fn insert_image_section(content: &str, image_uri: &str) -> String {
    let section = format!(
        "\n---\n\n## 📸 Featured Image\n\n![Featured Image]({image_uri})\n\n---\n"
    );

    let lines: Vec<&str> = content.split('\n').collect();
    let mut insert_idx = 0;
    for (i, line) in lines.iter().enumerate() {
        if line.starts_with("# ") {
            insert_idx = i + 1;
        } else if line.to_lowercase().contains("meta description") {
            insert_idx = i + 2;
        } else if line.starts_with("## ") && insert_idx > 0 {
            break;
        } else if line.len() > 100 && insert_idx > 0 {
            insert_idx = i + 1;
            break;
        }
    }

    if insert_idx > 0 && insert_idx < lines.len() {
        let mut out: Vec<&str> = lines.clone();
        out.insert(insert_idx, &section);
        out.join("\n")
    } else {
        content.replacen("\n\n", &section, 1)
    }
}
