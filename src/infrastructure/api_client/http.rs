use super::{AuthToken, StudentApi, SubmissionReceipt};
use crate::domain::api_config::ApiConfig;
use crate::domain::error::{AppError, SubmissionError};
use crate::domain::import::StudentRecord;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

const DEFAULT_REJECTION_MESSAGE: &str = "Error processing students";

/// Body the backend sends with a 400
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    details: Option<serde_json::Value>,
}

pub struct HttpStudentApi {
    client: reqwest::Client,
    config: ApiConfig,
}

impl HttpStudentApi {
    pub fn new(config: ApiConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn transport_error(&self, err: reqwest::Error) -> SubmissionError {
        if err.is_timeout() {
            SubmissionError::Timeout(self.config.timeout_secs)
        } else {
            SubmissionError::Transport(err.to_string())
        }
    }
}

/// Unpack a 400: `details` is a `;`-separated list of per-row messages.
pub fn parse_bad_request(status: u16, body: &str) -> SubmissionError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => {
            let details = match parsed.details {
                Some(serde_json::Value::String(details)) => split_details(&details),
                _ => Vec::new(),
            };
            SubmissionError::Rejected {
                status,
                message: parsed
                    .error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_REJECTION_MESSAGE.to_string()),
                details,
            }
        }
        Err(_) => SubmissionError::Rejected {
            status,
            message: format!("API error: {}", body),
            details: Vec::new(),
        },
    }
}

fn split_details(details: &str) -> Vec<String> {
    details
        .split(';')
        .map(str::trim)
        .filter(|msg| !msg.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl StudentApi for HttpStudentApi {
    async fn submit_students(
        &self,
        token: &AuthToken,
        students: &[StudentRecord],
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let url = self.config.students_url();
        tracing::info!(url = %url, count = students.len(), "submitting student batch");

        let response = self
            .client
            .post(&url)
            .bearer_auth(token.as_str())
            .json(students)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(SubmissionReceipt {
                submitted: students.len(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;
        tracing::warn!(status = status.as_u16(), body = %body, "student batch refused");

        if status == StatusCode::BAD_REQUEST {
            return Err(parse_bad_request(status.as_u16(), &body));
        }
        Err(SubmissionError::Status {
            status: status.as_u16(),
            body,
        })
    }
}
