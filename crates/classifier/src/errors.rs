//! Classifier client error types

use bundlelens_insights::InsightError;
use thiserror::Error;

/// Classifier client errors
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// Token missing, expired or rejected; the caller should clear its session
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Model not loaded: {0}")]
    ServiceUnavailable(String),

    #[error("{detail}")]
    Rejected { status: u16, detail: String },

    #[error("Only .csv files are accepted: {0}")]
    UnsupportedUpload(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Prediction failed: {0}")]
    Ingestion(#[from] InsightError),
}

impl From<reqwest::Error> for ClassifierError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClassifierError::Timeout
        } else {
            ClassifierError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClassifierError {
    fn from(err: serde_json::Error) -> Self {
        ClassifierError::Ingestion(InsightError::Serialization(err))
    }
}

/// Result type for classifier operations
pub type Result<T> = std::result::Result<T, ClassifierError>;
