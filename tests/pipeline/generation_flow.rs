//! End-to-end generation runs through `ContentPipeline::process`, exercising
//! research reuse across a session and the retry policy from the outside.

use std::sync::PoisonError;

use super::fakes::{self, CountingText, LONG_REPLY, SHORT_REPLY, ScriptedText};
use reach::agents::AgentContext;
use reach::pipeline::ContentRequest;
use reach::router::ContentType;

#[tokio::test]
async fn research_findings_carry_across_requests_in_a_session() {
    let text = CountingText::new(LONG_REPLY);
    let (pipeline, sessions) = fakes::pipeline(text.clone());

    let first = ContentRequest::new("Write a blog post about home staging tips")
        .with_session("s1")
        .with_context(AgentContext {
            include_image: Some(false),
            ..AgentContext::default()
        });
    let response = pipeline.process(first).await;

    assert!(response.success, "error: {:?}", response.error);
    assert!(response.metadata.research_performed);
    // Synthesis plus the blog call.
    assert_eq!(text.calls(), 2);
    assert!(sessions.context("s1").unwrap().research.is_some());

    let second = ContentRequest::new("now a linkedin post on the same topic")
        .with_session("s1")
        .with_content_type(ContentType::Linkedin);
    let response = pipeline.process(second).await;

    assert!(response.success, "error: {:?}", response.error);
    assert_eq!(text.calls(), 3);
    // No research ran this time, but the stored findings still reach the
    // writer prompt and the quality bonus.
    assert!(!response.metadata.research_performed);
    let score = response.quality_score.unwrap();
    assert!((score - 0.8).abs() < 1e-9, "score: {score}");
    assert_eq!(
        response.suggestions,
        vec!["Consider creating a supporting image for the post".to_string()]
    );

    let prompts = text
        .seen_prompts
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    assert!(
        prompts[2].contains("Background Information:"),
        "linkedin prompt missed the research block: {}",
        prompts[2]
    );
}

#[tokio::test]
async fn short_responses_are_retried_to_success() {
    let text = ScriptedText::new(vec![
        Ok(SHORT_REPLY.to_string()),
        Ok(SHORT_REPLY.to_string()),
        Ok(LONG_REPLY.to_string()),
    ]);
    let (pipeline, _sessions) = fakes::pipeline(text.clone());

    let response = pipeline
        .process(
            ContentRequest::new("home staging advice for sellers")
                .with_session("s1")
                .with_content_type(ContentType::Linkedin),
        )
        .await;

    assert!(response.success, "error: {:?}", response.error);
    assert_eq!(text.calls(), 3);
    assert_eq!(response.content, LONG_REPLY);
    let score = response.quality_score.unwrap();
    assert!((score - 0.7).abs() < 1e-9, "score: {score}");
}

#[tokio::test]
async fn exhausted_retries_surface_the_agent_error() {
    let text = ScriptedText::new(vec![
        Ok(SHORT_REPLY.to_string()),
        Ok(SHORT_REPLY.to_string()),
        Ok(SHORT_REPLY.to_string()),
    ]);
    let (pipeline, _sessions) = fakes::pipeline(text.clone());

    let response = pipeline
        .process(
            ContentRequest::new("home staging advice for sellers")
                .with_session("s1")
                .with_content_type(ContentType::Linkedin),
        )
        .await;

    assert!(!response.success);
    assert_eq!(text.calls(), 3);
    assert!(response.content.is_empty());
    assert!(response.blocked_by.is_none());
    let error = response.error.unwrap();
    assert!(error.contains("linkedin_writer_agent"), "got: {error}");
    assert!(error.contains("3 attempts"), "got: {error}");
    assert!(error.contains("Response too short"), "got: {error}");
}

#[tokio::test]
async fn provider_failures_count_against_the_same_retry_budget() {
    let text = ScriptedText::new(vec![
        Err(reach::error::ProviderError::Empty {
            provider: "scripted".to_string(),
        }
        .into()),
        Ok(LONG_REPLY.to_string()),
    ]);
    let (pipeline, _sessions) = fakes::pipeline(text.clone());

    let response = pipeline
        .process(
            ContentRequest::new("home staging advice for sellers")
                .with_content_type(ContentType::Linkedin),
        )
        .await;

    assert!(response.success, "error: {:?}", response.error);
    assert_eq!(text.calls(), 2);
    assert_eq!(response.content, LONG_REPLY);
}
