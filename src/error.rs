//! Error types for the prediction dispatcher engine.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main error type for the prediction orchestration engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The student profile could not be resolved for the given identity.
    #[error("student not found: {0}")]
    NotFound(String),

    /// The expander produced zero inputs, or a structural invariant failed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Upstream returned HTTP 422 with a field-level validation body.
    #[error("validation error: {0}")]
    Validation(String),

    /// Timeout, connection failure, or a non-422 non-2xx HTTP status.
    #[error("transport error: {0}")]
    Transport(String),

    /// Response parsed but failed per-element shape validation.
    #[error("response shape error: {0}")]
    ResponseShape(String),

    /// The invocation was cancelled before it completed.
    #[error("cancelled")]
    Cancelled,

    /// JSON (de)serialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raw reqwest transport failure, wrapped before classification.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration errors.
    #[error("configuration error: {0}")]
    Config(String),

    /// Generic error with added context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        source: Box<EngineError>,
    },

    /// Catch-all for errors that don't fit the taxonomy above.
    #[error("{0}")]
    Other(String),
}

impl EngineError {
    /// Attach context to an error, preserving the original variant.
    pub fn context(self, context: impl Into<String>) -> Self {
        EngineError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        EngineError::Config(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        EngineError::InvalidInput(msg.into())
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        EngineError::NotFound(id.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        EngineError::Transport(msg.into())
    }

    pub fn response_shape(msg: impl Into<String>) -> Self {
        EngineError::ResponseShape(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        EngineError::Other(msg.into())
    }

    /// True for errors the retry cascade (Stage 2 / Stage 3) should recover from.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Transport(_) | EngineError::Http(_))
    }
}

/// Extension trait for adding context to `Result`s, mirroring the engine's
/// error-context convention at stage boundaries.
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(context))
    }
}
