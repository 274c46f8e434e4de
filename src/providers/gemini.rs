//! Google Gemini text generation over the REST `generateContent` API.
//!
//! Key resolution order: explicit key from config, then `GEMINI_API_KEY`,
//! then `GOOGLE_API_KEY`.

use crate::error::{ProviderError, Result};
use crate::providers::gemini_types as wire;
use crate::providers::http_client::generation_client;
use crate::providers::scrub::{api_error, sanitize_api_error};
use crate::providers::sse::{SseBuffer, data_lines};
use crate::providers::traits::{GenerationOutcome, GenerationRequest, TextGenerator, TextStream};
use async_trait::async_trait;
use futures_util::StreamExt;
use regex::Regex;
use reqwest::Client;
use std::sync::LazyLock;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Gemini rejects very large request payloads.
const MAX_INPUT_CHARS: usize = 200_000;

/// Embedded base64 images blow up token counts; strip them before sending.
static DATA_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"data:image/[a-zA-Z0-9.+-]+;base64,[A-Za-z0-9+/=]+").unwrap()
});

pub struct GeminiClient {
    api_key: Option<String>,
    model: String,
    temperature: f64,
    max_tokens: u32,
    base_url: String,
    client: Client,
}

impl GeminiClient {
    pub fn new(api_key: Option<&str>, model: impl Into<String>) -> Self {
        let resolved = api_key
            .map(String::from)
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok());

        Self {
            api_key: resolved,
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            base_url: API_BASE.to_string(),
            client: generation_client(),
        }
    }

    pub fn with_defaults(mut self, temperature: f64, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Point the client at a different endpoint, e.g. a regional proxy.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn require_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| {
                ProviderError::MissingKey {
                    provider: "gemini".to_string(),
                }
                .into()
            })
    }

    fn model_path(model: &str) -> String {
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        }
    }

    /// Strip embedded data URIs and cap the prompt length.
    fn sanitize_input(text: &str) -> String {
        let cleaned = DATA_URI.replace_all(text, "[image omitted]");

        if cleaned.chars().count() <= MAX_INPUT_CHARS {
            return cleaned.into_owned();
        }

        tracing::warn!(
            chars = cleaned.chars().count(),
            cap = MAX_INPUT_CHARS,
            "prompt too large, truncating"
        );
        cleaned.chars().take(MAX_INPUT_CHARS).collect()
    }

    fn build_request(&self, request: &GenerationRequest) -> wire::GenerateContentRequest {
        let system_instruction = request.system_prompt.as_deref().map(|system| wire::Content {
            role: None,
            parts: vec![wire::Part {
                text: Self::sanitize_input(system),
            }],
        });

        wire::GenerateContentRequest {
            contents: vec![wire::Content {
                role: Some("user".to_string()),
                parts: vec![wire::Part {
                    text: Self::sanitize_input(&request.prompt),
                }],
            }],
            system_instruction,
            generation_config: wire::GenerationConfig {
                temperature: request.temperature.unwrap_or(self.temperature),
                max_output_tokens: request.max_tokens.unwrap_or(self.max_tokens),
            },
        }
    }

    async fn post_json(
        &self,
        url: String,
        request: &wire::GenerateContentRequest,
    ) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::Http {
                provider: "gemini".to_string(),
                message: sanitize_api_error(&e.to_string()),
            })?;

        if !response.status().is_success() {
            return Err(api_error("gemini", response).await.into());
        }

        Ok(response)
    }

    fn extract_text(response: &wire::GenerateContentResponse) -> String {
        let mut out = String::new();
        let parts = response
            .candidates
            .as_ref()
            .and_then(|candidates| candidates.first())
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| content.parts.as_slice())
            .unwrap_or_default();

        for part in parts {
            if let Some(text) = &part.text {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(text);
            }
        }
        out
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutcome> {
        let api_key = self.require_key()?;
        let body = self.build_request(&request);
        let url = format!(
            "{}/{}:generateContent?key={api_key}",
            self.base_url,
            Self::model_path(&self.model)
        );

        let response = self.post_json(url, &body).await?;
        let result: wire::GenerateContentResponse =
            response.json().await.map_err(|e| ProviderError::Decode {
                provider: "gemini".to_string(),
                message: e.to_string(),
            })?;

        if let Some(err) = &result.error {
            return Err(ProviderError::Api {
                provider: "gemini".to_string(),
                status: 200,
                message: sanitize_api_error(&err.message),
            }
            .into());
        }

        let text = Self::extract_text(&result);
        if text.trim().is_empty() {
            return Err(ProviderError::Empty {
                provider: "gemini".to_string(),
            }
            .into());
        }

        let mut outcome = GenerationOutcome::text_only(text)
            .with_model(result.model_version.unwrap_or_else(|| self.model.clone()));
        if let Some(total) = result.usage_metadata.and_then(|usage| usage.total_token_count) {
            outcome = outcome.with_usage(total);
        }
        Ok(outcome)
    }

    async fn generate_stream(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<TextStream> {
        let api_key = self.require_key()?;
        let mut request = GenerationRequest::new(prompt);
        if let Some(system) = system_prompt {
            request = request.with_system(system);
        }
        let body = self.build_request(&request);
        let url = format!(
            "{}/{}:streamGenerateContent?key={api_key}&alt=sse",
            self.base_url,
            Self::model_path(&self.model)
        );

        let response = self.post_json(url, &body).await?;
        let mut byte_stream = response.bytes_stream();

        let stream = async_stream::try_stream! {
            let mut sse_buffer = SseBuffer::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = chunk_result
                    .map_err(|e| ProviderError::Streaming(e.to_string()))?;
                sse_buffer.push_chunk(&chunk);

                while let Some(event_block) = sse_buffer.next_event_block() {
                    for data in data_lines(&event_block) {
                        let Ok(parsed) =
                            serde_json::from_str::<wire::GenerateContentResponse>(data)
                        else {
                            continue;
                        };

                        if let Some(err) = &parsed.error {
                            Err(ProviderError::Streaming(sanitize_api_error(&err.message)))?;
                        }

                        let delta = Self::extract_text(&parsed);
                        if !delta.is_empty() {
                            yield delta;
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
