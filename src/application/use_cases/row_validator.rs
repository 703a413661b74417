// ============================================================
// ROW VALIDATOR
// ============================================================
// Turn raw spreadsheet rows into normalized student records or
// row-indexed rejections. Pure and synchronous: no row failure
// stops the batch, and every row yields exactly one outcome.
//
// Rules run in a fixed order and stop at the first failure:
//   1. presence (name, email, phone, birth date)
//   2. email (spaces, length, shape)
//   3. phone (10 or 11 digits)
//   4. birth date (shape, then [min, today])

use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use super::birth_date::{self, DateBoundsError, DateParseError};
use crate::domain::import::{
    ColumnMapping, ImportField, ImportRow, ImportSheet, RejectionKind, RowRejection,
    StudentRecord, ValidatedBatch, ValidationConfig, ValidationOutcome,
};

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Everything a validation pass depends on besides the rows themselves
#[derive(Debug, Clone)]
pub struct ValidationContext {
    pub config: ValidationConfig,
    /// Upper bound for birth dates, inclusive
    pub today: NaiveDate,
}

impl ValidationContext {
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            config,
            today: Local::now().date_naive(),
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

/// A failed rule, before it is tied to a row
#[derive(Debug, Clone, PartialEq, Eq)]
struct RuleViolation {
    kind: RejectionKind,
    field: ImportField,
    reason: String,
}

impl RuleViolation {
    fn new(kind: RejectionKind, field: ImportField, reason: impl Into<String>) -> Self {
        Self {
            kind,
            field,
            reason: reason.into(),
        }
    }
}

/// Field values as read from a row, before any checks
struct RawStudent<'a> {
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    birth_date: &'a str,
}

impl<'a> RawStudent<'a> {
    fn value(&self, field: ImportField) -> &'a str {
        match field {
            ImportField::Name => self.name,
            ImportField::Email => self.email,
            ImportField::Phone => self.phone,
            ImportField::BirthDate => self.birth_date,
        }
    }
}

/// How the birth date column should be read
#[derive(Clone, Copy)]
enum DateInput {
    /// Serial number, M/D/YY or D/M/YYYY
    Spreadsheet,
    /// Already normalized YYYY-MM-DD
    Iso,
}

pub struct RowValidator {
    context: ValidationContext,
}

impl RowValidator {
    pub fn new(context: ValidationContext) -> Self {
        Self { context }
    }

    /// Validate a parsed sheet, resolving columns from its header row
    pub fn validate_sheet(&self, sheet: &ImportSheet, class_id: &str) -> ValidatedBatch {
        let mapping = ColumnMapping::resolve(sheet.headers.iter().map(String::as_str));
        self.validate_with_mapping(&sheet.rows, &mapping, class_id)
    }

    /// Validate in-memory rows, resolving columns from the headers they carry
    pub fn validate_rows(&self, rows: &[ImportRow], class_id: &str) -> ValidatedBatch {
        let mapping = ColumnMapping::from_rows(rows);
        self.validate_with_mapping(rows, &mapping, class_id)
    }

    pub fn validate_with_mapping(
        &self,
        rows: &[ImportRow],
        mapping: &ColumnMapping,
        class_id: &str,
    ) -> ValidatedBatch {
        let outcomes: Vec<ValidationOutcome> = rows
            .iter()
            .enumerate()
            .map(|(index, row)| self.validate_row(index, row, mapping, class_id))
            .collect();

        let batch = ValidatedBatch { outcomes };
        tracing::debug!(
            rows = batch.len(),
            accepted = batch.accepted_count(),
            rejected = batch.rejected_count(),
            "validated import rows"
        );
        batch
    }

    pub fn validate_row(
        &self,
        index: usize,
        row: &ImportRow,
        mapping: &ColumnMapping,
        class_id: &str,
    ) -> ValidationOutcome {
        let raw = RawStudent {
            name: mapping.value(row, ImportField::Name),
            email: mapping.value(row, ImportField::Email),
            phone: mapping.value(row, ImportField::Phone),
            birth_date: mapping.value(row, ImportField::BirthDate),
        };
        self.outcome(index, self.check(&raw, DateInput::Spreadsheet, class_id))
    }

    /// Run an already-normalized record through the same rules.
    ///
    /// The birth date is read as ISO since that is what normalization
    /// produced; an accepted record comes back unchanged.
    pub fn revalidate(&self, index: usize, record: &StudentRecord) -> ValidationOutcome {
        let raw = RawStudent {
            name: &record.name,
            email: &record.email,
            phone: &record.phone,
            birth_date: &record.birth_date,
        };
        self.outcome(index, self.check(&raw, DateInput::Iso, &record.class_id))
    }

    fn outcome(
        &self,
        index: usize,
        result: Result<StudentRecord, RuleViolation>,
    ) -> ValidationOutcome {
        match result {
            Ok(record) => ValidationOutcome::Accepted(record),
            Err(violation) => ValidationOutcome::Rejected(RowRejection {
                row_index: index,
                line: index + self.context.config.first_data_line,
                kind: violation.kind,
                field: Some(violation.field),
                reason: violation.reason,
            }),
        }
    }

    fn check(
        &self,
        raw: &RawStudent<'_>,
        date_input: DateInput,
        class_id: &str,
    ) -> Result<StudentRecord, RuleViolation> {
        for field in ImportField::ALL {
            if raw.value(field).trim().is_empty() {
                return Err(RuleViolation::new(
                    RejectionKind::MissingField,
                    field,
                    format!("{} is required", field.label()),
                ));
            }
        }

        let email = raw.email.trim();
        self.check_email(email)?;

        let phone = digits_only(raw.phone);
        self.check_phone(&phone)?;

        let birth_date = self.check_birth_date(raw.birth_date, date_input)?;

        Ok(StudentRecord {
            name: raw.name.trim().to_string(),
            email: email.to_string(),
            phone,
            birth_date: birth_date::to_iso(birth_date),
            class_id: class_id.to_string(),
        })
    }

    fn check_email(&self, email: &str) -> Result<(), RuleViolation> {
        let invalid = |reason: String| -> Result<(), RuleViolation> {
            Err(RuleViolation::new(
                RejectionKind::InvalidEmail,
                ImportField::Email,
                reason,
            ))
        };

        if email.chars().any(char::is_whitespace) {
            return invalid("Email must not contain spaces".to_string());
        }
        let max = self.context.config.email_max_length;
        if email.chars().count() > max {
            return invalid(format!("Email must be at most {} characters", max));
        }
        if !EMAIL_PATTERN.is_match(email) {
            return invalid("Email is invalid".to_string());
        }
        Ok(())
    }

    fn check_phone(&self, digits: &str) -> Result<(), RuleViolation> {
        let min = self.context.config.phone_min_digits;
        let max = self.context.config.phone_max_digits;
        let count = digits.len();
        if (min..=max).contains(&count) {
            return Ok(());
        }

        let expected = if min == max {
            format!("{}", min)
        } else if max == min + 1 {
            format!("{} or {}", min, max)
        } else {
            format!("between {} and {}", min, max)
        };
        Err(RuleViolation::new(
            RejectionKind::InvalidPhone,
            ImportField::Phone,
            format!("Phone must have {} digits", expected),
        ))
    }

    fn check_birth_date(
        &self,
        raw: &str,
        date_input: DateInput,
    ) -> Result<NaiveDate, RuleViolation> {
        let value = raw.trim();
        let parsed = match date_input {
            DateInput::Spreadsheet => birth_date::parse_birth_date(value),
            DateInput::Iso => birth_date::parse_iso(value),
        };

        let date = parsed.map_err(|e| {
            let reason = match e {
                DateParseError::Unrecognized => {
                    format!("Birth date format not recognized: {}", value)
                }
                DateParseError::InvalidDate => format!("Birth date is not a valid date: {}", value),
            };
            RuleViolation::new(RejectionKind::UnparseableDate, ImportField::BirthDate, reason)
        })?;

        let min = self.context.config.min_birth_date;
        birth_date::check_bounds(date, min, self.context.today).map_err(|e| {
            let reason = match e {
                DateBoundsError::TooOld => {
                    format!("Birth date cannot be before {}", birth_date::to_iso(min))
                }
                DateBoundsError::InFuture => "Birth date cannot be in the future".to_string(),
            };
            RuleViolation::new(RejectionKind::DateOutOfRange, ImportField::BirthDate, reason)
        })?;

        Ok(date)
    }
}

impl Default for RowValidator {
    fn default() -> Self {
        Self::new(ValidationContext::default())
    }
}

fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}
