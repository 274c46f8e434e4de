use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::pipeline::{ContentRequest, ContentResponse};
use crate::router::ContentType;
use crate::storage::ContentRecord;

/// Metadata event opening every SSE stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamHeader {
    pub content_type: ContentType,
    pub confidence: f64,
    pub session_id: String,
    /// Always false: the streaming path runs no guardrail stage.
    pub guardrails_applied: bool,
    pub model: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateParams {
    /// Rewrite the input with the fixed quick-action prefix for the
    /// requested content type.
    #[serde(default)]
    pub quick_action: bool,
}

#[derive(Debug, Deserialize)]
pub struct RecentParams {
    #[serde(rename = "type")]
    pub content_type: Option<ContentType>,
    pub limit: Option<i64>,
    pub session: Option<String>,
}

pub async fn handle_health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "guardrails": state.pipeline.guardrail_status(),
        "active_sessions": state.pipeline.sessions().count(),
    }))
}

pub async fn handle_generate(
    State(state): State<AppState>,
    Query(params): Query<GenerateParams>,
    Json(mut request): Json<ContentRequest>,
) -> Json<ContentResponse> {
    if params.quick_action {
        apply_quick_action(&state, &mut request);
    }
    Json(state.pipeline.process(request).await)
}

pub async fn handle_stream(
    State(state): State<AppState>,
    Query(params): Query<GenerateParams>,
    Json(mut request): Json<ContentRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static> {
    if params.quick_action {
        apply_quick_action(&state, &mut request);
    }

    let model = state.config.model.clone();
    let (metadata, mut chunks) = state.pipeline.process_stream(request).await;

    let stream = async_stream::stream! {
        let header = StreamHeader {
            content_type: metadata.content_type,
            confidence: metadata.confidence,
            session_id: metadata.session_id,
            guardrails_applied: false,
            model,
        };
        if let Ok(event) = Event::default().event("metadata").json_data(&header) {
            yield Ok(event);
        }

        while let Some(item) = chunks.next().await {
            let text = match item {
                Ok(text) => text,
                Err(error) => error.to_string(),
            };
            let payload = serde_json::json!({ "text": text });
            if let Ok(event) = Event::default().event("chunk").json_data(&payload) {
                yield Ok(event);
            }
        }

        yield Ok(Event::default().event("done").data(""));
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    )
}

pub async fn handle_recent(
    State(state): State<AppState>,
    Query(params): Query<RecentParams>,
) -> Result<Json<Vec<ContentRecord>>, (StatusCode, String)> {
    let Some(store) = state.pipeline.content_store() else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "content store not configured".to_string(),
        ));
    };

    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let records = store
        .recent(params.content_type, limit, params.session.as_deref())
        .await
        .map_err(|error| {
            tracing::error!(%error, "recent content query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "content store query failed".to_string(),
            )
        })?;

    Ok(Json(records))
}

fn apply_quick_action(state: &AppState, request: &mut ContentRequest) {
    let Some(content_type) = request.content_type else {
        return;
    };
    match state.prompts.quick_action(content_type, &request.user_input) {
        Ok(rewritten) => request.user_input = rewritten,
        Err(error) => {
            tracing::warn!(%error, "quick action rewrite failed, using raw input");
        }
    }
}
