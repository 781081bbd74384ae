//! Engine error taxonomy
//!
//! Invariant violations (`SequenceExhausted`, `InsufficientDistractors`,
//! `EmptySequence`) abort the session. Catalog and progress failures are
//! recoverable and never touch simulation state.

/// Errors surfaced by the engine and its collaborators
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("signal sequence for '{line}' is already complete")]
    SequenceExhausted { line: String },

    #[error("not enough distractors: {available} available, {requested} requested")]
    InsufficientDistractors { available: usize, requested: usize },

    #[error("line '{line}' has no signals to play")]
    EmptySequence { line: String },

    #[error("unknown line '{0}'")]
    UnknownLine(String),

    #[error("signal catalog unavailable for '{line}': {reason}")]
    CatalogUnavailable { line: String, reason: String },

    #[error("signal catalog has not been provided yet")]
    CatalogNotReady,

    #[error("failed to store progress for '{user}' on '{line}': {reason}")]
    ProgressWriteFailed {
        user: String,
        line: String,
        reason: String,
    },

    #[error("cannot write '{key}': {reason}")]
    Storage { key: String, reason: String },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
