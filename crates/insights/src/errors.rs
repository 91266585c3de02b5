//! Error types for prediction ingestion and view configuration

use thiserror::Error;

/// Errors raised while ingesting classifier payloads or loading configuration.
///
/// Unrecognized class labels and empty batches are not errors: the former
/// resolve to fallback display metadata, the latter is `BatchState::Empty`.
#[derive(Error, Debug)]
pub enum InsightError {
    /// Required field missing, of the wrong type, or out of range
    #[error("Malformed response: `{field}` {reason}")]
    MalformedResponse { field: String, reason: String },

    /// Payload is not valid JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid view configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl InsightError {
    pub(crate) fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        InsightError::MalformedResponse {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for insight operations
pub type Result<T> = std::result::Result<T, InsightError>;
