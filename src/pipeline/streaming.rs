//! Token streaming: route, pick a per-type system prompt, and pass raw model
//! output through.
//!
//! This path runs no guardrail, research, or quality stage. Streamed text
//! reaches the caller unfiltered, which makes it a different contract from
//! [`ContentPipeline::process`]; callers that need filtering must use the
//! non-streaming path. The transcript and session content are updated only
//! after the stream finishes cleanly.

use super::{ContentPipeline, ContentRequest, HISTORY_LIMIT};
use crate::prompt;
use crate::providers::TextStream;
use crate::router::ContentType;
use crate::session::Role;
use async_stream::stream;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};

/// Routing outcome returned alongside the stream so callers can label the
/// output before the first chunk arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamMetadata {
    pub content_type: ContentType,
    pub confidence: f64,
    pub session_id: String,
}

impl ContentPipeline {
    /// Stream a generation for `request`. Never returns an error: a failed
    /// stream start or an interrupted stream degrades to chunks carrying a
    /// human-readable error message.
    pub async fn process_stream(&self, request: ContentRequest) -> (StreamMetadata, TextStream) {
        let state = self.sessions.get_or_create(request.session_id.as_deref());
        let session_id = state.session_id;

        self.sessions
            .append_message(&session_id, Role::User, &request.user_input);

        let decision = {
            let mut transcript = self
                .sessions
                .get(&session_id)
                .map(|state| state.messages)
                .unwrap_or_default();
            if transcript.len() > HISTORY_LIMIT {
                transcript = transcript.split_off(transcript.len() - HISTORY_LIMIT);
            }
            self.route_stage(&request, &transcript)
        };

        let metadata = StreamMetadata {
            content_type: decision.content_type,
            confidence: decision.confidence,
            session_id: session_id.clone(),
        };

        tracing::info!(
            session_id = %session_id,
            content_type = %decision.content_type,
            "starting stream"
        );

        let system = prompt::streaming_system_prompt(decision.content_type);
        let upstream = match self
            .text
            .generate_stream(&request.user_input, Some(system))
            .await
        {
            Ok(upstream) => upstream,
            Err(e) => {
                tracing::error!(error = %e, "stream failed to start");
                let message = format!("Error generating content: {e}");
                let fallback: TextStream =
                    Box::pin(futures_util::stream::once(async move { Ok(message) }));
                return (metadata, fallback);
            }
        };

        let sessions = self.sessions.clone();
        let content_type = decision.content_type;
        let out = stream! {
            let mut upstream = upstream;
            let mut full = String::new();
            let mut interrupted = false;

            while let Some(item) = upstream.next().await {
                match item {
                    Ok(chunk) => {
                        full.push_str(&chunk);
                        yield Ok(chunk);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "stream interrupted");
                        interrupted = true;
                        yield Ok(format!("Error generating content: {e}"));
                        break;
                    }
                }
            }

            // Partial output is never stored; only a clean, non-empty stream
            // joins the session.
            if !interrupted && !full.is_empty() {
                sessions.store_content(&session_id, content_type, &full);
                sessions.append_message(&session_id, Role::Assistant, &full);
            }
        };

        (metadata, Box::pin(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProviderError, Result};
    use crate::guardrails::{GuardrailManager, GuardrailOptions};
    use crate::providers::{
        AspectRatio, GenerationOutcome, GenerationRequest, ImageBatch, ImageGenerator,
        ProviderSet, SearchProvider, SearchResult, TextGenerator,
    };
    use crate::session::SessionStore;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct ChunkedText {
        chunks: Vec<&'static str>,
        fail_after: Option<usize>,
        fail_to_start: bool,
    }

    #[async_trait]
    impl TextGenerator for ChunkedText {
        async fn generate(&self, _request: GenerationRequest) -> Result<GenerationOutcome> {
            Ok(GenerationOutcome::text_only(self.chunks.concat()))
        }

        async fn generate_stream(
            &self,
            _prompt: &str,
            _system_prompt: Option<&str>,
        ) -> Result<TextStream> {
            if self.fail_to_start {
                return Err(ProviderError::Empty {
                    provider: "stub".to_string(),
                }
                .into());
            }
            let cutoff = self.fail_after.unwrap_or(self.chunks.len());
            let mut items: Vec<Result<String>> = self.chunks[..cutoff]
                .iter()
                .map(|chunk| Ok((*chunk).to_string()))
                .collect();
            if self.fail_after.is_some() {
                items.push(Err(ProviderError::Empty {
                    provider: "stub".to_string(),
                }
                .into()));
            }
            Ok(Box::pin(futures_util::stream::iter(items)))
        }

        fn name(&self) -> &str {
            "chunked"
        }
    }

    struct NoImage;

    #[async_trait]
    impl ImageGenerator for NoImage {
        async fn generate_image(
            &self,
            _prompt: &str,
            _aspect_ratio: AspectRatio,
            _negative_prompt: Option<&str>,
        ) -> Result<ImageBatch> {
            Ok(ImageBatch::default())
        }

        fn name(&self) -> &str {
            "no-image"
        }
    }

    struct NoSearch;

    #[async_trait]
    impl SearchProvider for NoSearch {
        async fn search(&self, _query: &str, _num_results: u32) -> Vec<SearchResult> {
            Vec::new()
        }

        fn name(&self) -> &str {
            "no-search"
        }
    }

    fn pipeline(text: ChunkedText) -> (ContentPipeline, Arc<SessionStore>) {
        let sessions = Arc::new(SessionStore::new());
        let providers = ProviderSet::custom(Arc::new(text), Arc::new(NoImage), Arc::new(NoSearch));
        let guardrails = GuardrailManager::new(GuardrailOptions::default(), None);
        let pipeline = ContentPipeline::new(providers, guardrails, sessions.clone()).unwrap();
        (pipeline, sessions)
    }

    async fn collect(stream: TextStream) -> Vec<String> {
        stream
            .map(|item| item.unwrap())
            .collect::<Vec<String>>()
            .await
    }

    #[tokio::test]
    async fn clean_stream_is_stored_after_completion() {
        let (pipeline, sessions) = pipeline(ChunkedText {
            chunks: vec!["Staging sells ", "homes faster."],
            fail_after: None,
            fail_to_start: false,
        });

        let request =
            ContentRequest::new("write a blog post about home staging").with_session("s1");
        let (metadata, stream) = pipeline.process_stream(request).await;

        assert_eq!(metadata.content_type, ContentType::Blog);
        assert_eq!(metadata.session_id, "s1");

        let chunks = collect(stream).await;
        assert_eq!(chunks, vec!["Staging sells ", "homes faster."]);

        assert_eq!(
            sessions.latest_content("s1", ContentType::Blog).as_deref(),
            Some("Staging sells homes faster.")
        );
        let recent = sessions.history("s1", Some(1));
        assert_eq!(recent[0].role, Role::Assistant);
        assert_eq!(recent[0].content, "Staging sells homes faster.");
    }

    #[tokio::test]
    async fn profanity_streams_through_unfiltered() {
        // No guardrail stage runs on this path; rough language is the
        // caller's problem by contract.
        let (pipeline, sessions) = pipeline(ChunkedText {
            chunks: vec!["raw model text"],
            fail_after: None,
            fail_to_start: false,
        });

        let request =
            ContentRequest::new("write a fucking blog post about staging").with_session("s1");
        let (_metadata, stream) = pipeline.process_stream(request).await;

        let chunks = collect(stream).await;
        assert_eq!(chunks, vec!["raw model text"]);
        assert!(sessions.latest_content("s1", ContentType::Blog).is_some());
    }

    #[tokio::test]
    async fn interrupted_stream_is_not_stored() {
        let (pipeline, sessions) = pipeline(ChunkedText {
            chunks: vec!["partial "],
            fail_after: Some(1),
            fail_to_start: false,
        });

        let request = ContentRequest::new("write a blog post about staging").with_session("s1");
        let (_metadata, stream) = pipeline.process_stream(request).await;

        let chunks = collect(stream).await;
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "partial ");
        assert!(chunks[1].starts_with("Error generating content:"));

        assert!(sessions.latest_content("s1", ContentType::Blog).is_none());
        // Only the user message made it into the transcript.
        let recent = sessions.history("s1", Some(1));
        assert_eq!(recent[0].role, Role::User);
    }

    #[tokio::test]
    async fn failed_start_yields_a_single_error_chunk() {
        let (pipeline, _sessions) = pipeline(ChunkedText {
            chunks: vec![],
            fail_after: None,
            fail_to_start: true,
        });

        let request = ContentRequest::new("write a blog post about staging");
        let (metadata, stream) = pipeline.process_stream(request).await;
        assert_eq!(metadata.content_type, ContentType::Blog);

        let chunks = collect(stream).await;
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].starts_with("Error generating content:"));
    }

    #[tokio::test]
    async fn explicit_type_wins_over_routing() {
        let (pipeline, _sessions) = pipeline(ChunkedText {
            chunks: vec!["caption text"],
            fail_after: None,
            fail_to_start: false,
        });

        let request = ContentRequest::new("write a blog post about staging")
            .with_content_type(ContentType::Instagram);
        let (metadata, stream) = pipeline.process_stream(request).await;

        assert_eq!(metadata.content_type, ContentType::Instagram);
        assert_eq!(metadata.confidence, 1.0);
        collect(stream).await;
    }
}
