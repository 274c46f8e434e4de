//! The request pipeline: guardrail, route, research, generate, score.
//!
//! One plain sequential async function per request. Stage order is fixed and
//! every early exit is explicit: a blocked guardrail verdict or a failed
//! generation ends the run, a failed research pass does not. Failures are
//! folded into the returned [`ContentResponse`] so callers always get a
//! response, never an `Err`.

mod streaming;

pub use streaming::StreamMetadata;

use crate::agents::{
    AgentContext, BlogWriter, ContentStrategist, DEFAULT_RESULT_COUNT, ImageAgent,
    InstagramWriter, LinkedinWriter, QueryHandler, ResearchAgent, ResearchFindings, StylePreset,
};
use crate::error::Result;
use crate::guardrails::{
    BlockReason, GuardrailManager, GuardrailStatus, GuardrailVerdict, RequestKind,
};
use crate::prompt::PromptLibrary;
use crate::providers::{AspectRatio, ProviderSet, TextGenerator};
use crate::router::{ContentType, IntentRouter, RoutingDecision};
use crate::session::{Message, Role, SessionStore};
use crate::storage::ContentStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Messages of conversation history consulted for routing and general chat.
const HISTORY_LIMIT: usize = 10;

/// Substrings that mark a request as an image request for guardrail purposes.
const IMAGE_WORDS: &[&str] = &["image", "picture", "photo", "generate image"];

/// One request into the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentRequest {
    pub user_input: String,
    #[serde(default)]
    pub session_id: Option<String>,
    /// Skip routing and force this content type.
    #[serde(default)]
    pub content_type: Option<ContentType>,
    #[serde(default)]
    pub context: AgentContext,
}

impl ContentRequest {
    pub fn new(user_input: impl Into<String>) -> Self {
        Self {
            user_input: user_input.into(),
            ..Self::default()
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    pub fn with_context(mut self, context: AgentContext) -> Self {
        self.context = context;
        self
    }
}

/// Routing fields surfaced in response metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingSummary {
    pub content_type: ContentType,
    pub confidence: f64,
    pub reasoning: String,
}

/// Quality heuristic outcome. Advisory only; never blocks or alters content.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QualitySummary {
    pub score: f64,
    pub passed: bool,
    pub content_length: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub routing: Option<RoutingSummary>,
    pub research_performed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub research_error: Option<String>,
    pub agent_used: Option<String>,
    pub quality: Option<QualitySummary>,
    pub guardrails_applied: bool,
}

/// What one pipeline run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentResponse {
    pub success: bool,
    pub content_type: ContentType,
    pub content: String,
    pub session_id: String,
    pub quality_score: Option<f64>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub follow_up_types: Vec<ContentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<BlockReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metadata: ResponseMetadata,
}

/// Stage labels for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
enum PipelineStage {
    Guardrail,
    Route,
    Research,
    Generate,
    QualityScore,
}

/// Outcome of the generate stage: content, or a block raised by the
/// image-prompt recheck inside it.
enum Generated {
    Content(String),
    Blocked(GuardrailVerdict),
}

/// The fixed generation pipeline and everything it dispatches to.
pub struct ContentPipeline {
    router: IntentRouter,
    guardrails: GuardrailManager,
    research: ResearchAgent,
    blog: BlogWriter,
    linkedin: LinkedinWriter,
    instagram: InstagramWriter,
    image: ImageAgent,
    strategist: ContentStrategist,
    query: QueryHandler,
    sessions: Arc<SessionStore>,
    store: Option<Arc<ContentStore>>,
    text: Arc<dyn TextGenerator>,
}

impl ContentPipeline {
    pub fn new(
        providers: ProviderSet,
        guardrails: GuardrailManager,
        sessions: Arc<SessionStore>,
    ) -> Result<Self> {
        let prompts = PromptLibrary::new()?;
        let ProviderSet {
            text,
            image,
            search,
        } = providers;

        let image_agent = ImageAgent::new(image.clone(), text.clone(), prompts.clone());
        let blog_image = ImageAgent::new(image, text.clone(), prompts.clone());

        Ok(Self {
            router: IntentRouter::with_defaults()?,
            guardrails,
            research: ResearchAgent::new(text.clone(), search, prompts.clone()),
            blog: BlogWriter::new(text.clone(), blog_image, prompts.clone()),
            linkedin: LinkedinWriter::new(text.clone(), prompts.clone()),
            instagram: InstagramWriter::new(text.clone(), prompts.clone()),
            image: image_agent,
            strategist: ContentStrategist::new(text.clone(), prompts.clone()),
            query: QueryHandler::new(text.clone(), prompts),
            sessions,
            store: None,
            text,
        })
    }

    /// Attach a durable content store. Saves are best-effort; a failing store
    /// never fails a request.
    pub fn with_store(mut self, store: Arc<ContentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn guardrail_status(&self) -> GuardrailStatus {
        self.guardrails.status()
    }

    pub fn topic_suggestions(&self) -> Vec<&'static str> {
        self.guardrails.topic_suggestions()
    }

    /// Handle to the shared session store, for callers that manage session
    /// lifecycle outside the pipeline.
    pub fn sessions(&self) -> Arc<SessionStore> {
        Arc::clone(&self.sessions)
    }

    /// Handle to the attached content store, if any.
    pub fn content_store(&self) -> Option<Arc<ContentStore>> {
        self.store.clone()
    }

    /// Run one request through the full pipeline.
    pub async fn process(&self, request: ContentRequest) -> ContentResponse {
        let state = self.sessions.get_or_create(request.session_id.as_deref());
        let session_id = state.session_id;
        let stored_context = state.context;

        tracing::info!(
            session_id = %session_id,
            input_chars = request.user_input.chars().count(),
            "processing request"
        );

        self.sessions
            .append_message(&session_id, Role::User, &request.user_input);

        // Chronological transcript, current message included.
        let mut transcript = self
            .sessions
            .get(&session_id)
            .map(|state| state.messages)
            .unwrap_or_default();
        if transcript.len() > HISTORY_LIMIT {
            transcript = transcript.split_off(transcript.len() - HISTORY_LIMIT);
        }

        let mut metadata = ResponseMetadata {
            guardrails_applied: self.guardrails.is_enabled(),
            ..ResponseMetadata::default()
        };

        let kind = detect_request_kind(&request.user_input);
        // Instagram captions are creative copy; the topical keyword lists
        // reject too much of it, so explicit instagram requests run the
        // safety guard only.
        let skip_topical = request.content_type == Some(ContentType::Instagram);

        let verdict = self
            .guardrails
            .validate_input(&request.user_input, kind, skip_topical)
            .await;
        if !verdict.passed {
            tracing::info!(
                stage = %PipelineStage::Guardrail,
                session_id = %session_id,
                blocked_by = ?verdict.blocked_by,
                "request blocked"
            );
            return self.blocked_response(&session_id, verdict, None, metadata);
        }

        let decision = self.route_stage(&request, &transcript);
        tracing::info!(
            stage = %PipelineStage::Route,
            session_id = %session_id,
            content_type = %decision.content_type,
            confidence = decision.confidence,
            "routed"
        );
        metadata.routing = Some(RoutingSummary {
            content_type: decision.content_type,
            confidence: decision.confidence,
            reasoning: decision.reasoning.clone(),
        });

        // Request fields override whatever the session accumulated.
        let mut working = request.context.merge_over(stored_context);

        if decision.requires_research {
            let topic = working
                .topic
                .clone()
                .unwrap_or_else(|| request.user_input.clone());
            tracing::info!(
                stage = %PipelineStage::Research,
                session_id = %session_id,
                topic = %topic,
                "researching"
            );
            match self.research.research(&topic, DEFAULT_RESULT_COUNT).await {
                Ok(findings) => {
                    metadata.research_performed = true;
                    working.research = Some(findings);
                }
                Err(e) => {
                    tracing::warn!(
                        stage = %PipelineStage::Research,
                        session_id = %session_id,
                        error = %e,
                        "research failed, generating without it"
                    );
                    metadata.research_error = Some(e.to_string());
                }
            }
        }

        metadata.agent_used = Some(decision.content_type.agent_name().to_string());

        let content = match self
            .generate_stage(
                decision.content_type,
                &request.user_input,
                &mut working,
                &transcript,
            )
            .await
        {
            Ok(Generated::Content(content)) => content,
            Ok(Generated::Blocked(check)) => {
                tracing::info!(
                    stage = %PipelineStage::Generate,
                    session_id = %session_id,
                    blocked_by = ?check.blocked_by,
                    "image prompt blocked"
                );
                return self.blocked_response(&session_id, check, Some(&decision), metadata);
            }
            Err(e) => {
                tracing::error!(
                    stage = %PipelineStage::Generate,
                    session_id = %session_id,
                    content_type = %decision.content_type,
                    error = %e,
                    "generation failed"
                );
                let message = format!("An error occurred: {e}");
                self.sessions
                    .append_message(&session_id, Role::Assistant, &message);
                return ContentResponse {
                    success: false,
                    content_type: decision.content_type,
                    content: String::new(),
                    session_id,
                    quality_score: None,
                    suggestions: Vec::new(),
                    follow_up_types: decision.follow_up_types,
                    blocked_by: None,
                    error: Some(e.to_string()),
                    metadata,
                };
            }
        };

        let research_informed = working.research.is_some();
        let quality = score_quality(&content, research_informed);
        tracing::info!(
            stage = %PipelineStage::QualityScore,
            session_id = %session_id,
            score = quality.score,
            passed = quality.passed,
            "scored"
        );
        metadata.quality = Some(quality);

        let suggestions = build_suggestions(&quality, research_informed, decision.content_type);

        self.sessions
            .append_message(&session_id, Role::Assistant, &content);
        self.sessions
            .store_content(&session_id, decision.content_type, &content);
        if research_informed {
            // Research findings persist on the session so follow-up requests
            // can reuse them; per-request overrides do not.
            let mut session_context = self.sessions.context(&session_id).unwrap_or_default();
            session_context.research = working.research;
            self.sessions.update_context(&session_id, session_context);
        }

        self.save_to_store(
            &session_id,
            decision.content_type,
            &content,
            &request.user_input,
            &metadata,
        )
        .await;

        ContentResponse {
            success: true,
            content_type: decision.content_type,
            content,
            session_id,
            quality_score: Some(quality.score),
            suggestions,
            follow_up_types: decision.follow_up_types,
            blocked_by: None,
            error: None,
            metadata,
        }
    }

    /// An explicit content type bypasses the router entirely: no research,
    /// no follow-up suggestions.
    fn route_stage(&self, request: &ContentRequest, transcript: &[Message]) -> RoutingDecision {
        if let Some(content_type) = request.content_type {
            return RoutingDecision {
                content_type,
                confidence: 1.0,
                reasoning: "Explicit content type specified".to_string(),
                requires_research: false,
                follow_up_types: Vec::new(),
            };
        }

        let history: Vec<String> = transcript
            .iter()
            .map(|message| message.content.clone())
            .collect();
        self.router.route(&request.user_input, &history)
    }

    async fn generate_stage(
        &self,
        content_type: ContentType,
        user_input: &str,
        working: &mut AgentContext,
        transcript: &[Message],
    ) -> Result<Generated> {
        let content = match content_type {
            ContentType::Research => {
                let report = self.research.generate(user_input, working).await?;
                // The report doubles as research context for scoring and
                // follow-up requests.
                working.research = Some(ResearchFindings {
                    summary: report.clone(),
                    ..ResearchFindings::default()
                });
                report
            }
            ContentType::Blog => {
                if working.include_image.unwrap_or(true) {
                    let check = self.guardrails.validate_image_request(user_input).await;
                    if !check.passed {
                        tracing::warn!(
                            blocked_by = ?check.blocked_by,
                            "header image prompt blocked, writing the post without one"
                        );
                        working.include_image = Some(false);
                    }
                }
                self.blog.generate(user_input, working).await?
            }
            ContentType::Linkedin => self.linkedin.generate(user_input, working).await?,
            ContentType::Instagram => {
                let image_uri = self.instagram_image(user_input).await;
                let caption = self.instagram.generate(user_input, working).await?;
                assemble_instagram_post(image_uri.as_deref(), &caption)
            }
            ContentType::Image => {
                // Routed image requests may arrive without image words in
                // them, so the input-stage check ran in text mode. Recheck
                // with the image term list before rendering.
                let check = self.guardrails.validate_image_request(user_input).await;
                if !check.passed {
                    return Ok(Generated::Blocked(check));
                }
                self.image.generate(user_input, working).await?
            }
            ContentType::Strategy => self.strategist.generate(user_input, working).await?,
            ContentType::General => {
                // The prompt carries the current message separately.
                let history = transcript
                    .split_last()
                    .map(|(_, rest)| rest)
                    .unwrap_or_default();
                self.query.generate(user_input, history, working).await
            }
        };

        Ok(Generated::Content(content))
    }

    /// Best-effort square image for an instagram post. Blocked or failed
    /// renders degrade to a caption-only post.
    async fn instagram_image(&self, user_input: &str) -> Option<String> {
        let check = self.guardrails.validate_image_request(user_input).await;
        if !check.passed {
            tracing::warn!(
                blocked_by = ?check.blocked_by,
                "instagram image prompt blocked, posting caption only"
            );
            return None;
        }

        let prompt =
            format!("Generate a photorealistic real estate image for Instagram: {user_input}");
        match self
            .image
            .render(
                &prompt,
                StylePreset::Professional,
                AspectRatio::Square,
                None,
                true,
            )
            .await
        {
            Ok(uri) if uri.starts_with("data:image") => Some(uri),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "instagram image render failed, posting caption only");
                None
            }
        }
    }

    /// A blocked verdict is an outcome, not an error: the canned message
    /// becomes the response content and joins the transcript, but nothing is
    /// persisted to the content store.
    fn blocked_response(
        &self,
        session_id: &str,
        verdict: GuardrailVerdict,
        decision: Option<&RoutingDecision>,
        metadata: ResponseMetadata,
    ) -> ContentResponse {
        let message = verdict
            .message
            .unwrap_or_else(|| "Request blocked by content guardrails.".to_string());
        self.sessions
            .append_message(session_id, Role::Assistant, &message);

        ContentResponse {
            success: false,
            content_type: decision
                .map(|d| d.content_type)
                .unwrap_or(ContentType::General),
            content: message,
            session_id: session_id.to_string(),
            quality_score: None,
            suggestions: Vec::new(),
            follow_up_types: Vec::new(),
            blocked_by: verdict.blocked_by,
            error: None,
            metadata,
        }
    }

    async fn save_to_store(
        &self,
        session_id: &str,
        content_type: ContentType,
        content: &str,
        prompt: &str,
        metadata: &ResponseMetadata,
    ) {
        let Some(store) = &self.store else {
            return;
        };
        let metadata_json = serde_json::to_value(metadata).ok();
        if let Err(e) = store
            .save(
                session_id,
                content_type,
                content,
                Some(prompt),
                metadata_json.as_ref(),
            )
            .await
        {
            tracing::warn!(error = %e, "failed to persist generated content");
        }
    }
}

/// Image requests get the stricter image-safety pass at the input stage.
fn detect_request_kind(user_input: &str) -> RequestKind {
    let lowered = user_input.to_lowercase();
    if IMAGE_WORDS.iter().any(|word| lowered.contains(word)) {
        RequestKind::Image
    } else {
        RequestKind::Text
    }
}

/// Length-banded quality heuristic. Content of 50 characters or fewer scores
/// zero; a research pass adds a small bonus.
fn score_quality(content: &str, research_informed: bool) -> QualitySummary {
    let content_length = content.chars().count();
    let mut score: f64 = 0.0;
    if content_length > 50 {
        score += 0.5;
    }
    if content_length > 200 {
        score += 0.2;
    }
    if content_length > 500 {
        score += 0.2;
    }
    if research_informed {
        score += 0.1;
    }
    let score = score.min(1.0);

    QualitySummary {
        score,
        passed: score >= 0.5,
        content_length,
    }
}

fn build_suggestions(
    quality: &QualitySummary,
    research_informed: bool,
    content_type: ContentType,
) -> Vec<String> {
    let mut suggestions = Vec::new();

    if quality.score > 0.0 && quality.score < 0.8 {
        suggestions.push("Consider adding more detail to improve content depth".to_string());
    }
    if !research_informed {
        suggestions
            .push("Adding research could improve content accuracy and credibility".to_string());
    }
    match content_type {
        ContentType::Blog => {
            suggestions.push("Consider adding relevant images to enhance the blog".to_string());
        }
        ContentType::Linkedin => {
            suggestions.push("Consider creating a supporting image for the post".to_string());
        }
        _ => {}
    }

    suggestions
}

fn assemble_instagram_post(image_uri: Option<&str>, caption: &str) -> String {
    match image_uri {
        Some(uri) => format!(
            "## 📸 Instagram Post\n\n### 🖼️ Generated Image\n\n![Instagram Image]({uri})\n\n### 📝 Caption\n\n{caption}\n"
        ),
        None => format!(
            "## 📸 Instagram Post\n\n### 📝 Caption\n\n{caption}\n\n*Note: Image generation was not available for this request.*\n"
        ),
    }
}
