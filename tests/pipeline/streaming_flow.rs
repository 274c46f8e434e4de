//! Streaming runs interleaved with regular processing: streamed turns feed
//! the same session history, and the stream path's no-guardrail contract is
//! visible next to the guarded path.

use futures_util::StreamExt;

use super::fakes::{self, CountingText, LONG_REPLY};
use reach::pipeline::ContentRequest;
use reach::router::ContentType;

async fn collect(stream: reach::providers::TextStream) -> String {
    stream
        .map(|item| item.unwrap())
        .collect::<Vec<String>>()
        .await
        .concat()
}

#[tokio::test]
async fn streamed_turns_steer_follow_up_routing() {
    let text = CountingText::new(LONG_REPLY);
    let (pipeline, _sessions) = fakes::pipeline(text.clone());

    let request = ContentRequest::new("write a blog post about home staging").with_session("s1");
    let (metadata, stream) = pipeline.process_stream(request).await;
    assert_eq!(metadata.content_type, ContentType::Blog);
    assert_eq!(collect(stream).await, LONG_REPLY);

    // The streamed exchange is now history, so a vague follow-up in the same
    // session routes from it.
    let response = pipeline
        .process(ContentRequest::new("same again please").with_session("s1"))
        .await;

    assert!(response.success, "error: {:?}", response.error);
    let routing = response.metadata.routing.unwrap();
    assert_eq!(routing.content_type, ContentType::Blog);
    assert!((routing.confidence - 0.6).abs() < 1e-9);
    assert_eq!(routing.reasoning, "Inferred from conversation context");
}

#[tokio::test]
async fn the_stream_path_skips_guardrails() {
    let text = CountingText::new("raw model text, not filtered anywhere");
    let (pipeline, _sessions) = fakes::pipeline(text.clone());
    let foul = "write a f*ck1ng listing for this house";

    let guarded = pipeline
        .process(ContentRequest::new(foul).with_session("a"))
        .await;
    assert!(!guarded.success);
    assert_eq!(text.calls(), 0);

    let (_metadata, stream) = pipeline
        .process_stream(ContentRequest::new(foul).with_session("b"))
        .await;
    assert_eq!(collect(stream).await, "raw model text, not filtered anywhere");
    assert_eq!(text.calls(), 1);
}
