//! Guardrail behavior observed through the public pipeline surface: blocked
//! requests, classifier outages, and the explicit-instagram topical bypass.

use std::sync::Arc;

use super::fakes::{self, CountingText, FailingText, LONG_REPLY};
use reach::guardrails::{BlockReason, GuardrailManager, GuardrailOptions};
use reach::pipeline::ContentRequest;
use reach::providers::TextGenerator;
use reach::router::ContentType;
use reach::session::Role;

#[tokio::test]
async fn leetspeak_obfuscation_is_blocked_before_generation() {
    let text = CountingText::new(LONG_REPLY);
    let (pipeline, sessions) = fakes::pipeline(text.clone());

    let response = pipeline
        .process(ContentRequest::new("write a f*ck1ng listing for this house").with_session("s1"))
        .await;

    assert!(!response.success);
    assert_eq!(response.blocked_by, Some(BlockReason::Safety));
    assert!(
        response
            .content
            .contains("professional and appropriate language"),
        "got: {}",
        response.content
    );
    assert_eq!(text.calls(), 0);

    // The canned reply still lands in the conversation.
    let latest = sessions.history("s1", Some(1));
    assert_eq!(latest[0].role, Role::Assistant);
    assert_eq!(latest[0].content, response.content);
}

#[tokio::test]
async fn a_broken_classifier_fails_open() {
    let classifier = FailingText::new();
    let guardrails = GuardrailManager::new(
        GuardrailOptions::default(),
        Some(classifier.clone() as Arc<dyn TextGenerator>),
    );
    let text = CountingText::new(LONG_REPLY);
    let (pipeline, _sessions) = fakes::pipeline_with_guardrails(text.clone(), guardrails);

    // No keyword signal either way, so both guards escalate to the classifier
    // and both shrug off its failure.
    let response = pipeline
        .process(ContentRequest::new("tell me something interesting").with_session("s1"))
        .await;

    assert!(response.success, "error: {:?}", response.error);
    assert_eq!(response.content_type, ContentType::General);
    assert!(response.metadata.guardrails_applied);
    assert_eq!(classifier.calls(), 2);
    assert_eq!(text.calls(), 1);
}

#[tokio::test]
async fn explicit_instagram_requests_skip_the_topic_check() {
    let text = CountingText::new(LONG_REPLY);
    let (pipeline, _sessions) = fakes::pipeline(text.clone());
    let input = "caption this cozy gaming den reveal";

    let routed = pipeline
        .process(ContentRequest::new(input).with_session("a"))
        .await;
    assert!(!routed.success);
    assert_eq!(routed.blocked_by, Some(BlockReason::Topical));
    assert!(routed.content.contains("Real Estate"), "got: {}", routed.content);

    let explicit = pipeline
        .process(
            ContentRequest::new(input)
                .with_session("b")
                .with_content_type(ContentType::Instagram),
        )
        .await;
    assert!(explicit.success, "error: {:?}", explicit.error);
    assert_eq!(explicit.content_type, ContentType::Instagram);
    assert!(explicit.blocked_by.is_none());
    // The stub image provider returns nothing, so the post ships caption-only.
    assert!(explicit.content.contains("### 📝 Caption"));
    assert!(
        explicit
            .content
            .contains("*Note: Image generation was not available for this request.*")
    );
}
