use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, Serialize, Deserialize)]
pub enum AppError {
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("{0}")]
    UnsupportedFormat(String),
    #[error("{0}")]
    NothingToSubmit(String),
    #[error("{0}")]
    Submission(#[from] SubmissionError),
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("Security error: {0}")]
    SecurityError(String),
    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

/// Failure of the batch submission step. These are batch-level, unlike row
/// rejections which are collected per row and never raised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum SubmissionError {
    #[error("Missing bearer token")]
    MissingToken,
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("{message}")]
    Rejected {
        status: u16,
        message: String,
        details: Vec<String>,
    },
    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, AppError>;
