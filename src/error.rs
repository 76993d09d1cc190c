use std::path::PathBuf;
use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `pipeline-pilot`.
///
/// Every component boundary (stores, trigger client, probes, scheduler)
/// returns one of these. The dispatcher renders them into a reply, so none of
/// them ever reaches the process boundary. Binary wiring keeps using
/// `anyhow::Result` for context chains and folds into [`PilotError::Other`].
#[derive(Debug, Error)]
pub enum PilotError {
    // ── Configuration ───────────────────────────────────────────────────
    #[error("not configured: {0}")]
    ConfigurationMissing(String),

    // ── Input validation ────────────────────────────────────────────────
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    // ── Outbound HTTP ───────────────────────────────────────────────────
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    // ── Document persistence ────────────────────────────────────────────
    #[error("persistence: {0}")]
    Persistence(#[from] PersistenceError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Closed classification of [`PilotError`] used by callers that only need
/// to decide how to report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ConfigurationMissing,
    ValidationFailed,
    TransportFailure,
    PersistenceFailure,
    Other,
}

impl PilotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigurationMissing(_) => ErrorKind::ConfigurationMissing,
            Self::Validation(_) => ErrorKind::ValidationFailed,
            Self::Transport(_) => ErrorKind::TransportFailure,
            Self::Persistence(_) => ErrorKind::PersistenceFailure,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    pub fn not_configured(what: impl Into<String>) -> Self {
        Self::ConfigurationMissing(what.into())
    }
}

// ─── Validation errors ───────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("interval must be between {min} and {max} minutes, got {minutes}")]
    IntervalOutOfRange { minutes: i64, min: u32, max: u32 },

    #[error("invalid url '{0}': an http(s) url with a host is required")]
    InvalidUrl(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

// ─── Transport errors ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{target}: request timed out")]
    Timeout { target: String },

    #[error("{target}: http {status}: {body}")]
    Status {
        target: String,
        status: u16,
        body: String,
    },

    #[error("{target}: {message}")]
    Connection { target: String, message: String },
}

impl TransportError {
    /// Classify a `reqwest` failure for `target`. The request URL is dropped
    /// from the message since query strings may carry API keys.
    pub fn from_reqwest(target: impl Into<String>, err: reqwest::Error) -> Self {
        let target = target.into();
        if err.is_timeout() {
            Self::Timeout { target }
        } else {
            Self::Connection {
                target,
                message: err.without_url().to_string(),
            }
        }
    }
}

// ─── Persistence errors ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize document for {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, PilotError>;
