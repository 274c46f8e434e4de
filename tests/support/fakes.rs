#![allow(dead_code)]

//! Shared provider fakes for the integration suites.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use reach::error::{ProviderError, Result};
use reach::guardrails::{GuardrailManager, GuardrailOptions};
use reach::pipeline::ContentPipeline;
use reach::providers::{
    AspectRatio, GenerationOutcome, GenerationRequest, ImageBatch, ImageGenerator, ProviderSet,
    SearchProvider, SearchResult, TextGenerator,
};
use reach::session::SessionStore;

/// Sized for the 200 to 500 character quality band, and already carrying a
/// hashtag so the linkedin writer appends nothing to it.
pub const LONG_REPLY: &str = "Staging works because buyers shop with their eyes first. Clear \
     the counters and swap heavy drapes for sheers so the entry can breathe. Homes presented \
     this way photograph wider and collect stronger offers in their first weekend than their \
     unstaged neighbors manage. #HomeStaging";

/// Under the 50 character retry floor.
pub const SHORT_REPLY: &str = "Too short to ship.";

/// Always answers with the same reply, counting calls and recording prompts.
pub struct CountingText {
    reply: &'static str,
    calls: AtomicUsize,
    pub seen_prompts: Mutex<Vec<String>>,
}

impl CountingText {
    pub fn new(reply: &'static str) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            seen_prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for CountingText {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.prompt);
        Ok(GenerationOutcome::text_only(self.reply))
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Answers generate calls from a fixed script, in order. An exhausted script
/// is a test bug and errors loudly.
pub struct ScriptedText {
    responses: Mutex<Vec<Result<String>>>,
    calls: AtomicUsize,
}

impl ScriptedText {
    pub fn new(responses: Vec<Result<String>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedText {
    async fn generate(&self, _request: GenerationRequest) -> Result<GenerationOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if responses.is_empty() {
            return Err(ProviderError::Empty {
                provider: "scripted".to_string(),
            }
            .into());
        }
        responses.remove(0).map(GenerationOutcome::text_only)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Errors on every call; stands in for an unreachable model.
pub struct FailingText {
    calls: AtomicUsize,
}

impl FailingText {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for FailingText {
    async fn generate(&self, _request: GenerationRequest) -> Result<GenerationOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ProviderError::Http {
            provider: "failing".to_string(),
            message: "connection refused".to_string(),
        }
        .into())
    }

    fn name(&self) -> &str {
        "failing"
    }
}

pub struct NoImage;

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

/// One canned market result per query, so research never needs the LLM
/// fallback and call counts stay exact.
pub struct StubSearch;

#[async_trait]
impl SearchProvider for StubSearch {
    async fn search(&self, query: &str, _num_results: u32) -> Vec<SearchResult> {
        vec![SearchResult {
            title: format!("Result for {query}"),
            url: "https://example.com/market".to_string(),
            snippet: "Staged homes sell 30% faster on average.".to_string(),
        }]
    }

    fn name(&self) -> &str {
        "stub-search"
    }
}

pub fn providers(text: Arc<dyn TextGenerator>) -> ProviderSet {
    ProviderSet::custom(text, Arc::new(NoImage), Arc::new(StubSearch))
}

/// Pipeline with default guardrails and no classifier.
pub fn pipeline(text: Arc<dyn TextGenerator>) -> (ContentPipeline, Arc<SessionStore>) {
    pipeline_with_guardrails(text, GuardrailManager::new(GuardrailOptions::default(), None))
}

pub fn pipeline_with_guardrails(
    text: Arc<dyn TextGenerator>,
    guardrails: GuardrailManager,
) -> (ContentPipeline, Arc<SessionStore>) {
    let sessions = Arc::new(SessionStore::new());
    let pipeline = ContentPipeline::new(providers(text), guardrails, sessions.clone()).unwrap();
    (pipeline, sessions)
}
