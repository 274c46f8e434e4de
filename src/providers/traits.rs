use crate::error::Result;
use async_trait::async_trait;
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// One request against the text-generation collaborator.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn with_system(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// What came back from one text-generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutcome {
    pub content: String,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
}

impl GenerationOutcome {
    /// Construct a response with only text content.
    pub fn text_only(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: None,
            tokens_used: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_usage(mut self, tokens_used: u32) -> Self {
        self.tokens_used = Some(tokens_used);
        self
    }

    /// True when the content is empty or whitespace.
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Lazy, finite sequence of text fragments from a streaming generation call.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send + 'static>>;

/// Text-generation collaborator. Implementations own their HTTP details;
/// callers see only this contract.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutcome>;

    /// Stream text fragments. The default falls back to a single chunk from
    /// `generate`, so non-streaming backends still satisfy the contract.
    async fn generate_stream(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<TextStream> {
        let mut request = GenerationRequest::new(prompt);
        if let Some(system) = system_prompt {
            request = request.with_system(system);
        }
        let outcome = self.generate(request).await?;
        let stream = futures_util::stream::once(async move { Ok(outcome.content) });
        Ok(Box::pin(stream))
    }

    fn name(&self) -> &str;
}

/// The closed set of aspect ratios the image collaborator accepts.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    #[strum(serialize = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    #[strum(serialize = "16:9")]
    Wide,
    #[serde(rename = "9:16")]
    #[strum(serialize = "9:16")]
    Tall,
    #[serde(rename = "4:3")]
    #[strum(serialize = "4:3")]
    Landscape,
    #[serde(rename = "3:4")]
    #[strum(serialize = "3:4")]
    Portrait,
}

/// One generated image, kept base64-encoded as delivered by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub base64: String,
    pub mime_type: String,
}

impl GeneratedImage {
    /// Render as a `data:` URI suitable for markdown embedding.
    pub fn as_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageBatch {
    pub images: Vec<GeneratedImage>,
    pub model: Option<String>,
}

/// Image-generation collaborator.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
        negative_prompt: Option<&str>,
    ) -> Result<ImageBatch>;

    fn name(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Web-search collaborator. Fail-soft by contract: implementations return an
/// empty list on upstream failure rather than an error.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, num_results: u32) -> Vec<SearchResult>;

    fn name(&self) -> &str;
}
