//! Google Imagen image generation over the REST `predict` API.

use crate::error::{ProviderError, Result};
use crate::providers::http_client::generation_client;
use crate::providers::scrub::api_error;
use crate::providers::traits::{AspectRatio, GeneratedImage, ImageBatch, ImageGenerator};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const MAX_SAMPLES: u32 = 4;

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<Instance>,
    parameters: Parameters,
}

#[derive(Debug, Serialize)]
struct Instance {
    prompt: String,
}

#[derive(Debug, Serialize)]
struct Parameters {
    #[serde(rename = "sampleCount")]
    sample_count: u32,
    #[serde(rename = "aspectRatio")]
    aspect_ratio: String,
    #[serde(rename = "personGeneration")]
    person_generation: &'static str,
    #[serde(rename = "safetySetting")]
    safety_setting: &'static str,
    #[serde(rename = "negativePrompt", skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predictions: Option<Vec<Prediction>>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(rename = "bytesBase64Encoded")]
    bytes_base64_encoded: Option<String>,
    #[serde(rename = "mimeType")]
    mime_type: Option<String>,
}

pub struct ImagenClient {
    api_key: Option<String>,
    model: String,
    sample_count: u32,
    base_url: String,
    client: Client,
}

impl ImagenClient {
    pub fn new(api_key: Option<&str>, model: impl Into<String>) -> Self {
        let resolved = api_key
            .map(String::from)
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .or_else(|| std::env::var("GEMINI_API_KEY").ok());

        Self {
            api_key: resolved,
            model: model.into(),
            sample_count: 1,
            base_url: API_BASE.to_string(),
            client: generation_client(),
        }
    }

    pub fn with_sample_count(mut self, count: u32) -> Self {
        self.sample_count = count.clamp(1, MAX_SAMPLES);
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
        self.api_key.as_deref().ok_or_else(|| {
            ProviderError::MissingKey {
                provider: "imagen".to_string(),
            }
            .into()
        })
    }

    fn build_request(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
        negative_prompt: Option<&str>,
    ) -> PredictRequest {
        PredictRequest {
            instances: vec![Instance {
                prompt: prompt.to_string(),
            }],
            parameters: Parameters {
                sample_count: self.sample_count,
                aspect_ratio: aspect_ratio.to_string(),
                person_generation: "allow_adult",
                safety_setting: "block_low_and_above",
                negative_prompt: negative_prompt.map(String::from),
            },
        }
    }

    fn collect_images(response: PredictResponse) -> Vec<GeneratedImage> {
        response
            .predictions
            .unwrap_or_default()
            .into_iter()
            .filter_map(|prediction| {
                let base64 = prediction.bytes_base64_encoded?;
                Some(GeneratedImage {
                    base64,
                    mime_type: prediction
                        .mime_type
                        .unwrap_or_else(|| "image/png".to_string()),
                })
            })
            .collect()
    }
}

#[async_trait]
impl ImageGenerator for ImagenClient {
    async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
        negative_prompt: Option<&str>,
    ) -> Result<ImageBatch> {
        let api_key = self.require_key()?;
        let body = self.build_request(prompt, aspect_ratio, negative_prompt);
        let url = format!(
            "{}/models/{}:predict?key={api_key}",
            self.base_url, self.model
        );

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Http {
                provider: "imagen".to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(api_error("imagen", response).await.into());
        }

        let parsed: PredictResponse = response.json().await.map_err(|e| ProviderError::Decode {
            provider: "imagen".to_string(),
            message: e.to_string(),
        })?;

        let images = Self::collect_images(parsed);
        if images.is_empty() {
            return Err(ProviderError::Empty {
                provider: "imagen".to_string(),
            }
            .into());
        }

        tracing::debug!(count = images.len(), model = %self.model, "generated images");
        Ok(ImageBatch {
            images,
            model: Some(self.model.clone()),
        })
    }

    fn name(&self) -> &str {
        "imagen"
    }
}
