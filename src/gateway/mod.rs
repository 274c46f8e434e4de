//! Axum-based HTTP gateway for the content pipeline.
//!
//! Endpoints:
//! - `POST /api/generate` -- run the full pipeline, JSON in/out
//! - `POST /api/stream`   -- SSE: one `metadata` event, then `chunk` events
//! - `GET  /api/content/recent` -- recently stored generations
//! - `GET  /health`
//!
//! Bodies are size-limited and non-streaming requests time out. The streaming
//! endpoint reports `guardrails_applied: false` in its metadata event; that
//! path runs no guardrail stage.

mod handlers;
mod server;

pub use handlers::StreamHeader;
pub use server::{run_gateway, run_gateway_with_listener};

use std::sync::Arc;

use crate::config::Config;
use crate::pipeline::ContentPipeline;
use crate::prompt::PromptLibrary;

/// Maximum request body size (64KB) -- prevents memory exhaustion
pub const MAX_BODY_SIZE: usize = 65_536;
/// Request timeout; generation can legitimately take a while
pub const REQUEST_TIMEOUT_SECS: u64 = 120;
/// How often idle sessions are swept
pub const SWEEP_INTERVAL_SECS: u64 = 300;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ContentPipeline>,
    pub config: Arc<Config>,
    pub prompts: Arc<PromptLibrary>,
}
