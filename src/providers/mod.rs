//! External collaborators: Gemini text generation, Imagen image generation,
//! and SerpApi web search, behind the traits in [`traits`].

pub mod gemini;
mod gemini_types;
pub mod http_client;
pub mod imagen;
pub mod scrub;
pub mod serp;
mod sse;
pub mod traits;

use crate::config::Config;
use std::sync::Arc;

pub use gemini::GeminiClient;
pub use imagen::ImagenClient;
pub use scrub::{api_error, sanitize_api_error, scrub_secret_patterns};
pub use serp::SerpClient;
pub use traits::{
    AspectRatio, GeneratedImage, GenerationOutcome, GenerationRequest, ImageBatch, ImageGenerator,
    SearchProvider, SearchResult, TextGenerator, TextStream,
};

/// The full set of collaborators the pipeline runs against.
#[derive(Clone)]
pub struct ProviderSet {
    pub text: Arc<dyn TextGenerator>,
    pub image: Arc<dyn ImageGenerator>,
    pub search: Arc<dyn SearchProvider>,
}

impl ProviderSet {
    pub fn from_config(config: &Config) -> Self {
        let text = GeminiClient::new(config.gemini_api_key.as_deref(), &config.model)
            .with_defaults(config.temperature, config.max_tokens);
        let image = ImagenClient::new(config.gemini_api_key.as_deref(), &config.image_model);
        let search = SerpClient::new(config.serp_api_key.as_deref());

        Self {
            text: Arc::new(text),
            image: Arc::new(image),
            search: Arc::new(search),
        }
    }

    pub fn custom(
        text: Arc<dyn TextGenerator>,
        image: Arc<dyn ImageGenerator>,
        search: Arc<dyn SearchProvider>,
    ) -> Self {
        Self {
            text,
            image,
            search,
        }
    }
}
