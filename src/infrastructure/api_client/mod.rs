pub mod http;

use crate::domain::error::SubmissionError;
use crate::domain::import::StudentRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use http::HttpStudentApi;

/// Bearer token for the backend, passed explicitly to each call
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    /// `None` for blank tokens
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    /// Parse an `Authorization: Bearer <token>` header value
    pub fn from_bearer_header(value: &str) -> Option<Self> {
        let value = value.trim();
        let token = value
            .strip_prefix("Bearer ")
            .or_else(|| value.strip_prefix("bearer "))?;
        Self::new(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub submitted: usize,
    pub status: u16,
}

#[async_trait]
pub trait StudentApi: Send + Sync {
    /// Create the given students in one batch.
    async fn submit_students(
        &self,
        token: &AuthToken,
        students: &[StudentRecord],
    ) -> Result<SubmissionReceipt, SubmissionError>;
}
