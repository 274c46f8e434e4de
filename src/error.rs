use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for REACH.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains.
///
/// A blocked guardrail verdict is deliberately NOT an error: it is an expected
/// pipeline outcome carrying a canned user-facing message. Only infrastructure
/// failures travel through this hierarchy.
#[derive(Debug, Error)]
pub enum ReachError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Router / classification ─────────────────────────────────────────
    #[error("router: {0}")]
    Router(#[from] RouterError),

    // ── Provider (text / image / search) ────────────────────────────────
    #[error("provider: {0}")]
    Provider(#[from] ProviderError),

    // ── Agents / generation ─────────────────────────────────────────────
    #[error("agent: {0}")]
    Agent(#[from] AgentError),

    // ── Durable content storage ─────────────────────────────────────────
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    // ── Session state ───────────────────────────────────────────────────
    #[error("session: {0}")]
    Session(#[from] SessionError),

    // ── Prompt / Template ───────────────────────────────────────────────
    #[error("prompt: {0}")]
    Prompt(#[from] PromptError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// sqlx errors only ever originate in the content store.
impl From<sqlx::Error> for ReachError {
    fn from(error: sqlx::Error) -> Self {
        Self::Storage(StorageError::Sqlx(error))
    }
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Router errors ──────────────────────────────────────────────────────────

/// Rule-table construction failures. `route()` itself is infallible: any
/// classification problem degrades to the `general` default instead of
/// propagating.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("invalid pattern for {content_type}: {pattern}: {message}")]
    InvalidPattern {
        content_type: String,
        pattern: String,
        message: String,
    },

    #[error("rule table has no keyword entries")]
    EmptyRules,
}

// ─── Provider errors ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} API error (status {status}): {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("{provider} request failed: {message}")]
    Http { provider: String, message: String },

    #[error("no API key configured for {provider}")]
    MissingKey { provider: String },

    #[error("{provider} returned no usable content")]
    Empty { provider: String },

    #[error("{provider} response decode failed: {message}")]
    Decode { provider: String, message: String },

    #[error("unsupported aspect ratio: {ratio}")]
    InvalidAspectRatio { ratio: String },

    #[error("streaming error: {0}")]
    Streaming(String),
}

// ─── Agent errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("{agent} generation failed: {message}")]
    Generation { agent: String, message: String },

    #[error("{agent} gave up after {attempts} attempts: {message}")]
    RetriesExhausted {
        agent: String,
        attempts: u32,
        message: String,
    },

    #[error("no agent registered for content type {content_type}")]
    NoAgent { content_type: String },
}

// ─── Storage errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to open content store: {0}")]
    Open(String),

    #[error("sqlx: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("metadata encode failed: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("unknown content type in store: {0}")]
    UnknownContentType(String),
}

// ─── Session errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(String),

    #[error("import failed: {0}")]
    Import(String),
}

// ─── Prompt / Template errors ───────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("template render failed: {0}")]
    Render(String),

    #[error("template not found: {0}")]
    NotFound(String),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, ReachError>;
