use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use super::handlers::{handle_generate, handle_health, handle_recent, handle_stream};
use super::{AppState, MAX_BODY_SIZE, REQUEST_TIMEOUT_SECS, SWEEP_INTERVAL_SECS};
use crate::config::Config;
use crate::pipeline::ContentPipeline;
use crate::prompt::PromptLibrary;

/// Run the HTTP gateway.
pub async fn run_gateway(
    host: &str,
    port: u16,
    pipeline: Arc<ContentPipeline>,
    config: Arc<Config>,
) -> Result<()> {
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .context("parse gateway bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("bind gateway socket")?;

    run_gateway_with_listener(host, listener, pipeline, config).await
}

/// Run the HTTP gateway from a pre-bound listener.
pub async fn run_gateway_with_listener(
    host: &str,
    listener: tokio::net::TcpListener,
    pipeline: Arc<ContentPipeline>,
    config: Arc<Config>,
) -> Result<()> {
    let actual_port = listener
        .local_addr()
        .context("get gateway listener local address")?
        .port();

    let prompts = Arc::new(PromptLibrary::new()?);
    let state = AppState {
        pipeline: Arc::clone(&pipeline),
        config: Arc::clone(&config),
        prompts,
    };

    let sweeper = spawn_session_sweeper(&pipeline, config.session_timeout_minutes);

    print_gateway_banner(&format!("{host}:{actual_port}"));

    let app = build_app(state, &config.cors_origins);
    let served = axum::serve(listener, app).await.context("serve HTTP gateway");

    sweeper.abort();
    served
}

/// Drop sessions idle beyond the configured timeout. In-memory transcripts
/// are the only thing lost; the content store keeps its records.
fn spawn_session_sweeper(
    pipeline: &Arc<ContentPipeline>,
    timeout_minutes: u64,
) -> tokio::task::JoinHandle<()> {
    let sessions = pipeline.sessions();
    let max_age = chrono::Duration::minutes(i64::try_from(timeout_minutes).unwrap_or(i64::MAX));

    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(SWEEP_INTERVAL_SECS));
        loop {
            tick.tick().await;
            let removed = sessions.cleanup_older_than(max_age);
            if removed > 0 {
                tracing::info!(removed, "swept idle sessions");
            }
        }
    })
}

fn print_gateway_banner(display_addr: &str) {
    println!("Gateway listening on {display_addr}");
    println!("  POST /api/generate");
    println!("  POST /api/stream -> SSE");
    println!("  GET  /api/content/recent");
    println!("  GET  /health");
}

fn build_app(state: AppState, cors_origins: &[String]) -> Router {
    let mut app = Router::new()
        .route("/health", get(handle_health))
        .route("/api/generate", post(handle_generate))
        .route("/api/stream", post(handle_stream))
        .route("/api/content/recent", get(handle_recent))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ));

    if !cors_origins.is_empty() {
        let origins: Vec<_> = cors_origins.iter().filter_map(|o| o.parse().ok()).collect();
        app = app.layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
                .allow_headers([axum::http::header::CONTENT_TYPE]),
        );
    }

    app
}
