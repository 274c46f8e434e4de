//! General assistance for requests no specialist agent claims. This path
//! never fails a conversation: generation errors come back as an apology
//! message the user can retry from.

use super::{AgentContext, RetryPolicy, generate_with_retry, truncate_chars};
use crate::prompt::PromptLibrary;
use crate::providers::{GenerationRequest, TextGenerator};
use crate::router::ContentType;
use crate::session::{Message, Role};
use std::sync::Arc;

const HELP: &str = "\
# REACH - Your AI Content Assistant

I can help you create various types of marketing content:

## 📚 Deep Research
Get comprehensive research on any topic with sources and key insights.
Example: \"Research the latest trends in sustainable fashion\"

## 📝 SEO Blog Posts
Create search-optimized articles with proper structure and keywords.
Example: \"Write a blog post about remote work productivity tips\"

## 💼 LinkedIn Posts
Generate engaging professional content for LinkedIn.
Example: \"Create a LinkedIn post about our new product launch\"

## 🎨 Image Generation
Create custom visuals and graphics for your content.
Example: \"Generate an image for a blog about AI in healthcare\"

## 📊 Content Strategy
Develop content plans and marketing strategies.
Example: \"Create a content strategy for a B2B SaaS company\"

---

**Tips for best results:**
- Be specific about your topic and goals
- Mention your target audience
- Specify any tone or style preferences
- Include relevant keywords if you have them

How can I help you today?";

pub struct QueryHandler {
    generator: Arc<dyn TextGenerator>,
    prompts: PromptLibrary,
    policy: RetryPolicy,
}

impl QueryHandler {
    pub fn new(generator: Arc<dyn TextGenerator>, prompts: PromptLibrary) -> Self {
        Self {
            generator,
            prompts,
            policy: RetryPolicy::default(),
        }
    }

    pub async fn generate(
        &self,
        user_input: &str,
        history: &[Message],
        context: &AgentContext,
    ) -> String {
        let prompt = build_prompt(user_input, history, context);
        let mut request = GenerationRequest::new(prompt)
            .with_temperature(0.7)
            .with_max_tokens(2048);
        if let Ok(system) = self.prompts.system_prompt(ContentType::General, "professional") {
            request = request.with_system(system);
        }

        match generate_with_retry(
            self.generator.as_ref(),
            ContentType::General.agent_name(),
            request,
            self.policy,
        )
        .await
        {
            Ok(outcome) => outcome.content,
            Err(error) => {
                tracing::warn!(%error, "query generation failed, replying with apology");
                format!("I apologize, but I encountered an issue: {error}. Please try again.")
            }
        }
    }

    /// Capability overview for the chat surface.
    pub fn help_text() -> &'static str {
        HELP
    }
}

fn build_prompt(user_input: &str, history: &[Message], context: &AgentContext) -> String {
    let mut parts = Vec::new();

    let history_text = format_history(history, 5);
    if !history_text.is_empty() {
        parts.push(format!("Previous conversation:\n{history_text}\n"));
    }

    let context_summary = context.summary();
    if !context_summary.is_empty() {
        parts.push(format!("Context:\n{context_summary}\n"));
    }

    parts.push(format!("User request: {user_input}"));
    parts.push(
        "\nProvide a helpful response. If the user wants to create content, \
         guide them toward the appropriate content type and ask any clarifying \
         questions needed to produce the best results."
            .to_string(),
    );

    parts.join("\n")
}

/// Last `max_turns` exchanges as "Role: content" lines, long turns clipped.
fn format_history(history: &[Message], max_turns: usize) -> String {
    let start = history.len().saturating_sub(max_turns * 2);
    history[start..]
        .iter()
        .map(|message| {
            let role = match message.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            format!("{role}: {}", truncate_chars(&message.content, 500))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProviderError, Result};
    use crate::providers::GenerationOutcome;
    use async_trait::async_trait;

    struct Canned {
        reply: Option<&'static str>,
    }

    #[async_trait]
    impl TextGenerator for Canned {
        async fn generate(&self, _request: GenerationRequest) -> Result<GenerationOutcome> {
            match self.reply {
                Some(text) => Ok(GenerationOutcome::text_only(text)),
                None => Err(ProviderError::Empty {
                    provider: "stub".into(),
                }
                .into()),
            }
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    fn handler(reply: Option<&'static str>) -> QueryHandler {
        QueryHandler::new(
            Arc::new(Canned { reply }),
            PromptLibrary::new().unwrap(),
        )
    }

    #[tokio::test]
    async fn returns_generated_reply() {
        let handler = handler(Some(
            "Happy to help with that. What audience are you writing for?",
        ));
        let reply = handler
            .generate("what should I post about?", &[], &AgentContext::default())
            .await;
        assert!(reply.starts_with("Happy to help"));
    }

    #[tokio::test]
    async fn provider_failure_becomes_an_apology() {
        let handler = handler(None);
        let reply = handler
            .generate("hello", &[], &AgentContext::default())
            .await;
        assert!(reply.starts_with("I apologize, but I encountered an issue:"));
        assert!(reply.ends_with("Please try again."));
    }

    #[test]
    fn prompt_includes_history_and_context() {
        let history = vec![
            Message::new(Role::User, "tell me about staging"),
            Message::new(Role::Assistant, "Staging helps homes sell faster."),
        ];
        let context = AgentContext::default().with_topic("home staging");

        let prompt = build_prompt("give me more detail", &history, &context);
        assert!(prompt.contains("Previous conversation:\nUser: tell me about staging"));
        assert!(prompt.contains("Assistant: Staging helps homes sell faster."));
        assert!(prompt.contains("Context:\nTopic: home staging"));
        assert!(prompt.contains("User request: give me more detail"));
        assert!(prompt.contains("Provide a helpful response."));
    }

    #[test]
    fn prompt_omits_empty_sections() {
        let prompt = build_prompt("hi", &[], &AgentContext::default());
        assert!(!prompt.contains("Previous conversation:"));
        assert!(!prompt.contains("Context:"));
        assert!(prompt.starts_with("User request: hi"));
    }

    #[test]
    fn history_keeps_only_recent_turns() {
        let history: Vec<Message> = (0..12)
            .map(|i| Message::new(Role::User, format!("turn {i}")))
            .collect();
        let formatted = format_history(&history, 5);
        assert!(!formatted.contains("turn 1\n"));
        assert!(formatted.starts_with("User: turn 2"));
        assert!(formatted.ends_with("User: turn 11"));
    }

    #[test]
    fn help_covers_every_capability() {
        let help = QueryHandler::help_text();
        for section in [
            "Deep Research",
            "SEO Blog Posts",
            "LinkedIn Posts",
            "Image Generation",
            "Content Strategy",
        ] {
            assert!(help.contains(section), "missing {section}");
        }
    }
}
