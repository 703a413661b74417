// ============================================================
// STUDENT IMPORT USE CASE
// ============================================================
// Orchestrate reading an uploaded sheet, previewing it,
// validating rows and submitting the accepted ones

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::row_validator::{RowValidator, ValidationContext};
use crate::domain::error::{AppError, Result, SubmissionError};
use crate::domain::import::{
    ColumnMapping, ImportField, ImportRow, ImportSheet, RowRejection, SheetFormat,
    StudentRecord, ValidatedBatch, ValidationConfig,
};
use crate::infrastructure::api_client::{AuthToken, StudentApi, SubmissionReceipt};
use crate::infrastructure::spreadsheet::{CsvReader, WorkbookReader};

pub const UNSUPPORTED_FORMAT_MESSAGE: &str = "Unsupported file format. Use CSV or XLSX.";
pub const NO_DATA_MESSAGE: &str = "No data to submit";
pub const NO_VALID_ROWS_MESSAGE: &str = "No valid rows to submit";

/// First rows of an upload, shown before anything is submitted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreview {
    pub format: SheetFormat,
    pub headers: Vec<String>,
    pub rows: Vec<ImportRow>,
    pub total_rows: usize,
    pub hidden_rows: usize,
    /// Student fields with no matching column in the headers
    pub missing_columns: Vec<ImportField>,
}

/// What happened to the accepted subset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SubmissionOutcome {
    Submitted { receipt: SubmissionReceipt },
    /// Nothing was accepted, so no request was made
    Skipped,
    Failed { error: SubmissionError },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub batch_id: String,
    pub class_id: String,
    pub total_rows: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub rejections: Vec<RowRejection>,
    pub submission: SubmissionOutcome,
    /// User-facing notices, in the order they should be shown
    pub messages: Vec<String>,
}

impl ImportReport {
    pub fn is_success(&self) -> bool {
        matches!(self.submission, SubmissionOutcome::Submitted { .. })
    }

    /// Receipt of a submitted batch, or the batch-level failure
    pub fn receipt(&self) -> Result<&SubmissionReceipt> {
        match &self.submission {
            SubmissionOutcome::Submitted { receipt } => Ok(receipt),
            SubmissionOutcome::Skipped => {
                Err(AppError::NothingToSubmit(NO_VALID_ROWS_MESSAGE.to_string()))
            }
            SubmissionOutcome::Failed { error } => Err(AppError::Submission(error.clone())),
        }
    }
}

pub struct StudentImportUseCase {
    api: Arc<dyn StudentApi>,
    validation: ValidationConfig,
    preview_rows: usize,
}

impl StudentImportUseCase {
    pub fn new(api: Arc<dyn StudentApi>, validation: ValidationConfig, preview_rows: usize) -> Self {
        Self {
            api,
            validation,
            preview_rows,
        }
    }

    /// Read an upload, picking the reader from the file name
    pub fn load(&self, file_name: &str, bytes: Vec<u8>) -> Result<ImportSheet> {
        let format = SheetFormat::from_file_name(file_name)
            .ok_or_else(|| AppError::UnsupportedFormat(UNSUPPORTED_FORMAT_MESSAGE.to_string()))?;

        let sheet = match format {
            SheetFormat::Csv => CsvReader::new().read_bytes(&bytes)?,
            SheetFormat::Xlsx => WorkbookReader::new().read_bytes(bytes)?,
        };

        tracing::info!(
            file = file_name,
            format = %format,
            rows = sheet.len(),
            "file processed"
        );
        Ok(sheet)
    }

    pub fn preview(&self, sheet: &ImportSheet) -> ImportPreview {
        let rows: Vec<ImportRow> = sheet.rows.iter().take(self.preview_rows).cloned().collect();
        let missing_columns =
            ColumnMapping::resolve(sheet.headers.iter().map(String::as_str)).missing_fields();

        ImportPreview {
            format: sheet.format,
            headers: sheet.headers.clone(),
            hidden_rows: sheet.len().saturating_sub(rows.len()),
            total_rows: sheet.len(),
            rows,
            missing_columns,
        }
    }

    pub fn validate(&self, sheet: &ImportSheet, class_id: &str) -> ValidatedBatch {
        self.validator(None).validate_sheet(sheet, class_id)
    }

    /// Validate against a fixed "today"
    pub fn validate_at(
        &self,
        sheet: &ImportSheet,
        class_id: &str,
        today: NaiveDate,
    ) -> ValidatedBatch {
        self.validator(Some(today)).validate_sheet(sheet, class_id)
    }

    pub async fn import(
        &self,
        sheet: &ImportSheet,
        class_id: &str,
        token: Option<AuthToken>,
    ) -> Result<ImportReport> {
        self.import_with(self.validator(None), sheet, class_id, token)
            .await
    }

    pub async fn import_at(
        &self,
        sheet: &ImportSheet,
        class_id: &str,
        token: Option<AuthToken>,
        today: NaiveDate,
    ) -> Result<ImportReport> {
        self.import_with(self.validator(Some(today)), sheet, class_id, token)
            .await
    }

    fn validator(&self, today: Option<NaiveDate>) -> RowValidator {
        let context = ValidationContext::new(self.validation.clone());
        let context = match today {
            Some(today) => context.with_today(today),
            None => context,
        };
        RowValidator::new(context)
    }

    async fn import_with(
        &self,
        validator: RowValidator,
        sheet: &ImportSheet,
        class_id: &str,
        token: Option<AuthToken>,
    ) -> Result<ImportReport> {
        let class_id = class_id.trim();
        if class_id.is_empty() {
            return Err(AppError::ValidationError("Class id is required".to_string()));
        }
        if sheet.is_empty() {
            return Err(AppError::NothingToSubmit(NO_DATA_MESSAGE.to_string()));
        }

        let batch_id = Uuid::new_v4().to_string();
        let batch = validator.validate_sheet(sheet, class_id);
        let rejections = batch.rejections();
        let accepted = batch.accepted();

        let mut messages: Vec<String> = Vec::new();
        for rejection in &rejections {
            tracing::warn!(batch_id = %batch_id, line = rejection.line, reason = %rejection.reason, "row rejected");
            messages.push(rejection.message());
        }

        let submission = if accepted.is_empty() {
            messages.push(NO_VALID_ROWS_MESSAGE.to_string());
            SubmissionOutcome::Skipped
        } else {
            if !rejections.is_empty() {
                messages.push(format!("{} row(s) with errors", rejections.len()));
            }
            self.submit(&batch_id, token, &accepted, &mut messages).await
        };

        tracing::info!(
            batch_id = %batch_id,
            class_id = class_id,
            rows = batch.len(),
            accepted = accepted.len(),
            rejected = rejections.len(),
            "student import finished"
        );

        Ok(ImportReport {
            batch_id,
            class_id: class_id.to_string(),
            total_rows: batch.len(),
            accepted: accepted.len(),
            rejected: rejections.len(),
            rejections,
            submission,
            messages,
        })
    }

    async fn submit(
        &self,
        batch_id: &str,
        token: Option<AuthToken>,
        accepted: &[StudentRecord],
        messages: &mut Vec<String>,
    ) -> SubmissionOutcome {
        let Some(token) = token else {
            messages.push(SubmissionError::MissingToken.to_string());
            return SubmissionOutcome::Failed {
                error: SubmissionError::MissingToken,
            };
        };

        match self.api.submit_students(&token, accepted).await {
            Ok(receipt) => {
                messages.push(format!(
                    "{} student(s) imported successfully",
                    receipt.submitted
                ));
                SubmissionOutcome::Submitted { receipt }
            }
            Err(error) => {
                tracing::error!(batch_id = batch_id, error = %error, "student batch submission failed");
                if let SubmissionError::Rejected { details, .. } = &error {
                    messages.extend(details.iter().cloned());
                }
                messages.push(error.to_string());
                SubmissionOutcome::Failed { error }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const CSV: &str = "nome,email,telefone,data nascimento\n\
                       Ana Silva,ana@x.com,11987654321,15/03/1999\n\
                       ,b@x.com,11987654321,01/01/2000\n\
                       Caio,caio@x.com,123,01/01/2000\n\
                       Dora,dora@x.com,(21) 3333-4444,45000\n";

    /// Records what it was asked to submit
    struct FakeApi {
        calls: Mutex<Vec<Vec<StudentRecord>>>,
        reply: std::result::Result<(), SubmissionError>,
    }

    impl FakeApi {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                reply: Ok(()),
            })
        }

        fn failing(error: SubmissionError) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                reply: Err(error),
            })
        }

        fn calls(&self) -> Vec<Vec<StudentRecord>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StudentApi for FakeApi {
        async fn submit_students(
            &self,
            _token: &AuthToken,
            students: &[StudentRecord],
        ) -> std::result::Result<SubmissionReceipt, SubmissionError> {
            self.calls.lock().unwrap().push(students.to_vec());
            self.reply.clone().map(|_| SubmissionReceipt {
                submitted: students.len(),
                status: 201,
            })
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn use_case(api: Arc<FakeApi>) -> StudentImportUseCase {
        StudentImportUseCase::new(api, ValidationConfig::default(), 2)
    }

    fn token() -> Option<AuthToken> {
        AuthToken::new("secret")
    }

    #[test]
    fn test_load_dispatches_on_extension() {
        let uc = use_case(FakeApi::ok());
        let sheet = uc.load("alunos.csv", CSV.as_bytes().to_vec()).unwrap();
        assert_eq!(sheet.format, SheetFormat::Csv);
        assert_eq!(sheet.len(), 4);

        let err = uc.load("alunos.pdf", Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), UNSUPPORTED_FORMAT_MESSAGE);

        assert!(matches!(
            uc.load("alunos.xlsx", b"garbage".to_vec()),
            Err(AppError::ParseError(_))
        ));
    }

    #[test]
    fn test_preview_limits_rows() {
        let uc = use_case(FakeApi::ok());
        let sheet = uc.load("alunos.csv", CSV.as_bytes().to_vec()).unwrap();
        let preview = uc.preview(&sheet);

        assert_eq!(preview.rows.len(), 2);
        assert_eq!(preview.total_rows, 4);
        assert_eq!(preview.hidden_rows, 2);
        assert!(preview.missing_columns.is_empty());

        let sheet = ImportSheet::new(SheetFormat::Csv, vec!["nome".to_string()], Vec::new());
        let preview = uc.preview(&sheet);
        assert_eq!(preview.hidden_rows, 0);
        assert_eq!(preview.missing_columns.len(), 3);
    }

    #[tokio::test]
    async fn test_import_submits_accepted_subset() {
        let api = FakeApi::ok();
        let uc = use_case(api.clone());
        let sheet = uc.load("alunos.csv", CSV.as_bytes().to_vec()).unwrap();

        let report = uc.import_at(&sheet, "turma-1", token(), today()).await.unwrap();

        assert!(report.is_success());
        assert_eq!(report.receipt().unwrap().submitted, 2);
        assert_eq!(report.total_rows, 4);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.rejected, 2);
        assert_eq!(
            report.messages,
            vec![
                "Row 3: Name is required".to_string(),
                "Row 4: Phone must have 10 or 11 digits".to_string(),
                "2 row(s) with errors".to_string(),
                "2 student(s) imported successfully".to_string(),
            ]
        );

        let calls = api.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][1].phone, "2133334444");
        assert_eq!(calls[0][1].birth_date, "2023-03-15");
        assert!(calls[0].iter().all(|r| r.class_id == "turma-1"));
    }

    #[tokio::test]
    async fn test_nothing_valid_never_calls_api() {
        let api = FakeApi::ok();
        let uc = use_case(api.clone());
        let csv = "nome,email,telefone,data nascimento\n,a@x.com,11987654321,01/01/2000\n";
        let sheet = uc.load("a.csv", csv.as_bytes().to_vec()).unwrap();

        let report = uc.import_at(&sheet, "turma-1", token(), today()).await.unwrap();
        assert_eq!(report.submission, SubmissionOutcome::Skipped);
        assert_eq!(report.messages.last().unwrap(), NO_VALID_ROWS_MESSAGE);
        assert!(matches!(report.receipt(), Err(AppError::NothingToSubmit(_))));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_sheet_and_missing_class() {
        let uc = use_case(FakeApi::ok());
        let empty = ImportSheet::new(SheetFormat::Csv, vec!["nome".to_string()], Vec::new());
        assert!(matches!(
            uc.import(&empty, "turma-1", token()).await,
            Err(AppError::NothingToSubmit(_))
        ));

        let sheet = uc.load("alunos.csv", CSV.as_bytes().to_vec()).unwrap();
        assert!(matches!(
            uc.import(&sheet, "  ", token()).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_token_fails_before_network() {
        let api = FakeApi::ok();
        let uc = use_case(api.clone());
        let sheet = uc.load("alunos.csv", CSV.as_bytes().to_vec()).unwrap();

        let report = uc.import_at(&sheet, "turma-1", None, today()).await.unwrap();
        assert_eq!(
            report.submission,
            SubmissionOutcome::Failed {
                error: SubmissionError::MissingToken
            }
        );
        assert!(api.calls().is_empty());
        assert!(matches!(
            report.receipt(),
            Err(AppError::Submission(SubmissionError::MissingToken))
        ));
    }

    #[tokio::test]
    async fn test_backend_rejection_details_become_messages() {
        let api = FakeApi::failing(SubmissionError::Rejected {
            status: 400,
            message: "Error creating students".to_string(),
            details: vec!["Email ana@x.com already registered".to_string()],
        });
        let uc = use_case(api);
        let sheet = uc.load("alunos.csv", CSV.as_bytes().to_vec()).unwrap();

        let report = uc.import_at(&sheet, "turma-1", token(), today()).await.unwrap();
        assert!(!report.is_success());
        let tail: Vec<&str> = report.messages.iter().rev().take(2).map(String::as_str).collect();
        assert_eq!(
            tail,
            vec!["Error creating students", "Email ana@x.com already registered"]
        );
        // row rejections are still reported alongside the batch failure
        assert_eq!(report.rejections.len(), 2);
    }
}
