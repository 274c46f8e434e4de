//! Gemini wire-format checks against a local mock server.

use futures_util::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reach::providers::{GeminiClient, GenerationRequest, TextGenerator};

fn client(server: &MockServer) -> GeminiClient {
    GeminiClient::new(Some("test-key"), "gemini-1.5-pro").with_base_url(server.uri())
}

#[tokio::test]
async fn generate_posts_the_wire_format() {
    let server = MockServer::start().await;

    let expected_body = json!({
        "contents": [{"role": "user", "parts": [{"text": "Write one staging tip"}]}],
        "system_instruction": {"parts": [{"text": "You are a real estate copywriter."}]},
        "generationConfig": {"temperature": 0.4, "maxOutputTokens": 256},
    });
    let response_body = json!({
        "candidates": [
            {"content": {"parts": [{"text": "Clear the counters before every showing."}]}}
        ],
        "modelVersion": "gemini-1.5-pro-002",
        "usageMetadata": {"promptTokenCount": 12, "totalTokenCount": 42},
    });

    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-pro:generateContent"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(expected_body))
        .respond_with(ResponseTemplate::new(200).set_body_json(response_body))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client(&server)
        .with_defaults(0.4, 256)
        .generate(
            GenerationRequest::new("Write one staging tip")
                .with_system("You are a real estate copywriter."),
        )
        .await
        .unwrap();

    assert_eq!(outcome.content, "Clear the counters before every showing.");
    assert_eq!(outcome.model.as_deref(), Some("gemini-1.5-pro-002"));
    assert_eq!(outcome.tokens_used, Some(42));
    server.verify().await;
}

#[tokio::test]
async fn api_failure_carries_the_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-pro:generateContent"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .generate(GenerationRequest::new("anything"))
        .await
        .unwrap_err();

    let text = err.to_string();
    assert!(text.contains("429"), "got: {text}");
    assert!(text.contains("quota exceeded"), "got: {text}");
}

#[tokio::test]
async fn error_payload_in_an_ok_body_is_refused() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-pro:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"code": 400, "message": "API key not valid"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .generate(GenerationRequest::new("anything"))
        .await
        .unwrap_err();

    let text = err.to_string();
    assert!(text.contains("API key not valid"), "got: {text}");
    assert!(text.contains("200"), "got: {text}");
}

#[tokio::test]
async fn blocked_candidates_are_an_empty_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-pro:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"finishReason": "SAFETY"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .generate(GenerationRequest::new("anything"))
        .await
        .unwrap_err();

    assert!(
        err.to_string().contains("no usable content"),
        "got: {err}"
    );
}

#[tokio::test]
async fn streaming_parses_sse_data_lines() {
    let server = MockServer::start().await;

    let body = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Staged \"}]}}]}\n\n\
                data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"homes sell.\"}]}}]}\n\n";

    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-pro:streamGenerateContent"))
        .and(query_param("key", "test-key"))
        .and(query_param("alt", "sse"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let stream = client(&server)
        .generate_stream("stream a staging tip", None)
        .await
        .unwrap();
    let chunks: Vec<String> = stream.map(|item| item.unwrap()).collect().await;

    assert_eq!(chunks, vec!["Staged ".to_string(), "homes sell.".to_string()]);
}
