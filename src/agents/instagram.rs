//! Instagram caption generation. Captions are capped at 150 words and always
//! carry a hashtag block, synthesized locally when the model omits one.

use super::AgentContext;
use crate::error::{AgentError, Result};
use crate::prompt::PromptLibrary;
use crate::providers::{GenerationRequest, TextGenerator};
use crate::router::ContentType;
use std::collections::BTreeSet;
use std::sync::Arc;

const MAX_CAPTION_WORDS: usize = 150;

const GENERAL: [&str; 8] = [
    "#realestate",
    "#realtor",
    "#property",
    "#home",
    "#house",
    "#realtorlife",
    "#realestateagent",
    "#homesweethome",
];
const BUYING: [&str; 6] = [
    "#homebuyer",
    "#firsttimehomebuyer",
    "#househunting",
    "#dreamhome",
    "#newhome",
    "#homeownership",
];
const SELLING: [&str; 6] = [
    "#forsale",
    "#homeforsale",
    "#justlisted",
    "#newlisting",
    "#openhouse",
    "#sellingahome",
];
const LUXURY: [&str; 6] = [
    "#luxuryrealestate",
    "#luxuryhomes",
    "#luxuryliving",
    "#milliondollarlisting",
    "#luxuryproperty",
    "#mansions",
];
const INVESTMENT: [&str; 6] = [
    "#realestateinvesting",
    "#investmentproperty",
    "#passiveincome",
    "#propertyinvestment",
    "#rentalincome",
    "#realestateinvestor",
];
const LOCATION: [&str; 5] = [
    "#localrealestate",
    "#neighborhood",
    "#community",
    "#cityliving",
    "#suburbanlife",
];
const INTERIOR: [&str; 6] = [
    "#interiordesign",
    "#homedecor",
    "#homedesign",
    "#modernhome",
    "#homestaging",
    "#interiors",
];
const EXTERIOR: [&str; 6] = [
    "#curbappeal",
    "#landscaping",
    "#outdoorliving",
    "#backyard",
    "#frontyard",
    "#exteriordesign",
];

const ALL_CATEGORIES: [&[&str]; 8] = [
    &GENERAL,
    &BUYING,
    &SELLING,
    &LUXURY,
    &INVESTMENT,
    &LOCATION,
    &INTERIOR,
    &EXTERIOR,
];

pub struct InstagramWriter {
    generator: Arc<dyn TextGenerator>,
    prompts: PromptLibrary,
}

impl InstagramWriter {
    pub fn new(generator: Arc<dyn TextGenerator>, prompts: PromptLibrary) -> Self {
        Self { generator, prompts }
    }

    /// Produce a caption plus hashtag block. A single generation attempt;
    /// model failure is fatal. Degenerate outputs (empty, hashtags without
    /// caption) fall back to a templated caption.
    pub async fn generate(&self, user_input: &str, context: &AgentContext) -> Result<String> {
        let prompt = build_prompt(user_input, context);
        let tone = context.tone.as_deref().unwrap_or("professional");

        let mut request = GenerationRequest::new(prompt);
        if let Ok(system) = self.prompts.system_prompt(ContentType::Instagram, tone) {
            request = request.with_system(system);
        }

        let outcome = self.generator.generate(request).await.map_err(|e| {
            AgentError::Generation {
                agent: ContentType::Instagram.agent_name().to_string(),
                message: e.to_string(),
            }
        })?;

        let mut content = outcome.content.trim().to_string();
        if content.is_empty() {
            content = fallback_caption(context);
        } else if is_hashtags_only(&content) {
            content = format!("{}\n\n{content}", fallback_caption(context));
        }

        if !content.contains('#') {
            let hashtags = generate_hashtags(user_input, context.location.as_deref());
            content = format!("{content}\n\n{hashtags}");
        }

        Ok(enforce_word_limit(&content, MAX_CAPTION_WORDS))
    }
}

fn build_prompt(user_input: &str, context: &AgentContext) -> String {
    let optional = |label: &str, value: Option<&str>| {
        value
            .filter(|v| !v.is_empty())
            .map(|v| format!("**{label}:** {v}"))
            .unwrap_or_default()
    };

    let image_line = optional("Image Description", context.image_description.as_deref());
    let property_line = optional("Property Type", context.property_type.as_deref());
    let location_line = optional("Location", context.location.as_deref());
    let price_line = optional("Price", context.price.as_deref());
    let features_line = if context.features.is_empty() {
        String::new()
    } else {
        format!("**Key Features:** {}", context.features.join(", "))
    };
    let style_line = format!(
        "**Style:** {}",
        context.style.as_deref().unwrap_or("Professional")
    );

    format!(
        "Create a SHORT, engaging Instagram caption for the following real estate content:\n\
         \n\
         **Content Description:** {user_input}\n\
         \n\
         {image_line}\n\
         {property_line}\n\
         {location_line}\n\
         {price_line}\n\
         {features_line}\n\
         {style_line}\n\
         \n\
         **STRICT REQUIREMENTS:**\n\
         1. Caption text MUST be 150 words or LESS (excluding hashtags)\n\
         2. Start with an attention-grabbing hook (use 1-2 emojis)\n\
         3. Include 2-3 sentences highlighting key benefits\n\
         4. End with a clear call-to-action\n\
         5. MUST include 20-30 relevant hashtags at the end\n\
         \n\
         **FORMAT:**\n\
         [Caption text - max 150 words]\n\
         \n\
         [Blank line]\n\
         \n\
         [20-30 hashtags separated by spaces]\n\
         \n\
         Keep it concise and punchy - Instagram users prefer shorter captions!"
    )
}

/// True when every non-blank line is a hashtag line.
fn is_hashtags_only(content: &str) -> bool {
    let mut lines = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .peekable();
    if lines.peek().is_none() {
        return false;
    }
    lines.all(|line| line.starts_with('#'))
}

fn fallback_caption(context: &AgentContext) -> String {
    let property_type = context.property_type.as_deref().unwrap_or("property");
    let mut parts = vec![format!("✨ New {} alert!", property_type.to_lowercase())];
    if let Some(location) = context.location.as_deref().filter(|l| !l.is_empty()) {
        parts.push(format!("📍 {location}"));
    }
    if let Some(price) = context.price.as_deref().filter(|p| !p.is_empty()) {
        parts.push(format!("💰 {price}"));
    }
    parts.push("DM for details or to schedule a tour. 🏡".to_string());
    parts.join("\n")
}

/// Pick 20-25 hashtags driven by keywords in the request, topped up from the
/// category lists in declaration order and emitted sorted.
fn generate_hashtags(prompt: &str, location: Option<&str>) -> String {
    let text = prompt.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|word| text.contains(word));

    let mut tags: BTreeSet<String> = GENERAL[..5].iter().map(|t| t.to_string()).collect();

    if mentions(&["buy", "buyer", "purchase", "dream home"]) {
        tags.extend(BUYING[..4].iter().map(|t| t.to_string()));
    }
    if mentions(&["sell", "listing", "for sale", "open house"]) {
        tags.extend(SELLING[..4].iter().map(|t| t.to_string()));
    }
    if mentions(&["luxury", "million", "estate", "mansion", "premium"]) {
        tags.extend(LUXURY[..4].iter().map(|t| t.to_string()));
    }
    if mentions(&["invest", "rental", "income", "roi"]) {
        tags.extend(INVESTMENT[..4].iter().map(|t| t.to_string()));
    }
    if mentions(&["interior", "kitchen", "bathroom", "bedroom", "living"]) {
        tags.extend(INTERIOR[..4].iter().map(|t| t.to_string()));
    }
    if mentions(&["exterior", "yard", "garden", "pool", "outdoor"]) {
        tags.extend(EXTERIOR[..4].iter().map(|t| t.to_string()));
    }

    if let Some(location) = location
        && !location.is_empty()
    {
        tags.insert(format!("#{}", location.replace(' ', "").replace(',', "")));
    }

    if tags.len() < 20 {
        'fill: for category in ALL_CATEGORIES {
            for tag in category {
                if tags.insert(tag.to_string()) && tags.len() >= 25 {
                    break 'fill;
                }
            }
        }
    }

    tags.iter()
        .take(25)
        .cloned()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cap the caption at `max_words`, leaving the hashtag block untouched. A
/// paragraph with more than five '#' characters counts as the hashtag block.
fn enforce_word_limit(response: &str, max_words: usize) -> String {
    let mut hashtag_section = String::new();
    let mut caption_parts: Vec<&str> = Vec::new();

    for part in response.split("\n\n") {
        if part.matches('#').count() > 5 {
            hashtag_section = part.to_string();
        } else {
            caption_parts.push(part);
        }
    }

    let mut caption = caption_parts.join("\n\n").trim().to_string();
    let words: Vec<&str> = caption.split_whitespace().collect();

    if words.len() > max_words {
        let mut truncated = words[..max_words].join(" ");
        if !truncated.ends_with(['.', '!', '?']) {
            truncated = format!("{}...", truncated.trim_end_matches([',', ';', ':', '-']));
        }
        tracing::info!(from = words.len(), to = max_words, "caption truncated");
        caption = truncated;
    }

    if hashtag_section.is_empty() {
        hashtag_section = generate_hashtags(&caption, None);
    }

    format!("{caption}\n\n{hashtag_section}")
}
