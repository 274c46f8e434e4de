//! Image generation: style presets, prompt optimization, and the degraded
//! no-key path that hands the optimized prompt back to the user.

use super::AgentContext;
use crate::error::{ProviderError, ReachError, Result};
use crate::prompt::PromptLibrary;
use crate::providers::{
    AspectRatio, GenerationRequest, ImageBatch, ImageGenerator, TextGenerator,
};
use crate::router::ContentType;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Named visual styles whose descriptor phrases get appended to prompts.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StylePreset {
    #[default]
    Professional,
    Creative,
    Minimalist,
    Bold,
    Warm,
    Tech,
    Natural,
    Luxury,
}

impl StylePreset {
    pub fn descriptors(self) -> &'static str {
        match self {
            Self::Professional => "clean, modern, professional, corporate style, high quality",
            Self::Creative => "artistic, creative, vibrant colors, unique perspective",
            Self::Minimalist => "minimalist, simple, clean lines, white space, elegant",
            Self::Bold => "bold, impactful, high contrast, attention-grabbing",
            Self::Warm => "warm tones, inviting, friendly, approachable",
            Self::Tech => "futuristic, digital, technology-focused, sleek",
            Self::Natural => "natural, organic, earthy tones, authentic",
            Self::Luxury => "luxurious, premium, sophisticated, elegant",
        }
    }

    /// Unknown style names fall back to `Professional`.
    pub fn parse_lossy(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }
}

pub struct ImageAgent {
    image: Arc<dyn ImageGenerator>,
    text: Arc<dyn TextGenerator>,
    prompts: PromptLibrary,
}

impl ImageAgent {
    pub fn new(
        image: Arc<dyn ImageGenerator>,
        text: Arc<dyn TextGenerator>,
        prompts: PromptLibrary,
    ) -> Self {
        Self {
            image,
            text,
            prompts,
        }
    }

    /// Generation routine for the `image` content type. Resolves style and
    /// aspect ratio from context (unknown values degrade to defaults) and
    /// optimizes the prompt before rendering.
    pub async fn generate(&self, user_input: &str, context: &AgentContext) -> Result<String> {
        let style = StylePreset::parse_lossy(context.style.as_deref().unwrap_or_default());
        let aspect_ratio = context
            .aspect_ratio
            .as_deref()
            .and_then(|ratio| ratio.parse().ok())
            .unwrap_or(AspectRatio::Square);

        self.render(
            user_input,
            style,
            aspect_ratio,
            context.negative_prompt.as_deref(),
            true,
        )
        .await
    }

    /// Render one image and return it as a `data:` URI. Missing API key and
    /// empty upstream responses degrade to explanatory markdown; transport
    /// and API errors surface as errors.
    pub async fn render(
        &self,
        prompt: &str,
        style: StylePreset,
        aspect_ratio: AspectRatio,
        negative_prompt: Option<&str>,
        optimize: bool,
    ) -> Result<String> {
        let final_prompt = if optimize {
            self.optimize_prompt(prompt, style).await
        } else {
            prompt.to_string()
        };

        match self
            .image
            .generate_image(&final_prompt, aspect_ratio, negative_prompt)
            .await
        {
            Ok(batch) => Ok(Self::first_image_uri(batch, &final_prompt)),
            Err(ReachError::Provider(ProviderError::MissingKey { .. })) => {
                tracing::warn!("image client not configured, returning prompt only");
                Ok(unconfigured_message(
                    &final_prompt,
                    aspect_ratio,
                    negative_prompt,
                ))
            }
            Err(ReachError::Provider(ProviderError::Empty { .. })) => Ok(format!(
                "Image generated but no image data returned.\n\n**Prompt:** {final_prompt}"
            )),
            Err(e) => Err(e),
        }
    }

    fn first_image_uri(batch: ImageBatch, prompt: &str) -> String {
        match batch.images.first() {
            Some(image) => image.as_data_uri(),
            None => format!(
                "Image generated but no image data returned.\n\n**Prompt:** {prompt}"
            ),
        }
    }

    /// Expand a short request into a detailed prompt via the text model.
    /// Fails soft: on error the input is enriched with the style descriptors
    /// instead.
    pub async fn optimize_prompt(&self, user_input: &str, style: StylePreset) -> String {
        let style_description = style.descriptors();

        let prompt = format!(
            "Transform this image request into an optimized Google Imagen prompt:\n\
             \n\
             User Request: \"{user_input}\"\n\
             Desired Style: {style_description}\n\
             \n\
             Create a detailed prompt that includes:\n\
             1. Main subject and composition\n\
             2. Visual style and artistic direction\n\
             3. Lighting and color palette\n\
             4. Background and environment\n\
             5. Mood and atmosphere\n\
             6. Technical specifications (if relevant)\n\
             \n\
             Important Guidelines:\n\
             - Be specific and descriptive\n\
             - Avoid text in images (AI image generators struggle with text)\n\
             - Focus on visual elements that convey the message\n\
             - Keep the prompt clear and detailed for best results\n\
             - Make it appropriate for professional/marketing use\n\
             \n\
             Provide ONLY the optimized prompt, no explanation."
        );

        match self.text.generate(self.request(prompt, 0.6, 500)).await {
            Ok(outcome) => outcome.content.trim().to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "prompt optimization failed, using raw input");
                format!("{user_input}, {style_description}, high quality, detailed")
            }
        }
    }

    /// Wide-format header prompt for a blog post. Fails soft to a generic
    /// header description.
    pub async fn blog_header_prompt(&self, title: &str, summary: &str) -> String {
        let prompt = format!(
            "Create a Google Imagen prompt for a blog header image:\n\
             \n\
             Blog Title: {title}\n\
             Summary: {summary}\n\
             \n\
             Requirements:\n\
             - Wide landscape format (16:9 aspect ratio)\n\
             - Professional and polished\n\
             - Visually represents the topic\n\
             - Works well with text overlay\n\
             - Clean composition with space for title\n\
             - No text in the image itself\n\
             \n\
             The image should be:\n\
             - Eye-catching but not distracting\n\
             - Relevant to the content\n\
             - Appropriate for professional audiences\n\
             - High quality and detailed\n\
             \n\
             Provide ONLY the optimized prompt."
        );

        match self.text.generate(self.request(prompt, 0.6, 400)).await {
            Ok(outcome) => outcome.content.trim().to_string(),
            Err(_) => format!(
                "Professional blog header image representing {title}, wide landscape, \
                 clean composition, high quality"
            ),
        }
    }

    fn request(&self, prompt: String, temperature: f64, max_tokens: u32) -> GenerationRequest {
        let mut request = GenerationRequest::new(prompt)
            .with_temperature(temperature)
            .with_max_tokens(max_tokens);
        if let Ok(system) = self.prompts.system_prompt(ContentType::Image, "professional") {
            request = request.with_system(system);
        }
        request
    }
}

fn unconfigured_message(
    prompt: &str,
    aspect_ratio: AspectRatio,
    negative_prompt: Option<&str>,
) -> String {
    format!(
        "**Image Generation Request**\n\
         \n\
         **Optimized Prompt:**\n\
         {prompt}\n\
         \n\
         **Settings:**\n\
         - Aspect Ratio: {aspect_ratio}\n\
         - Negative Prompt: {negative}\n\
         \n\
         *Note: Image generation client not configured. Use this prompt with Google Imagen \
         to generate the image.*",
        negative = negative_prompt.unwrap_or("None"),
    )
}
