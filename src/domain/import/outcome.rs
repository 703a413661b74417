// ============================================================
// VALIDATION OUTCOMES
// ============================================================
// One outcome per input row: accepted record or rejection

use serde::{Deserialize, Serialize};

use super::{ImportField, StudentRecord};

/// Class of a row rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RejectionKind {
    MissingField,
    InvalidEmail,
    InvalidPhone,
    UnparseableDate,
    DateOutOfRange,
}

/// Why a row was not accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowRejection {
    /// 0-based position in the input rows
    pub row_index: usize,
    /// Spreadsheet line, counting the header as line 1
    pub line: usize,
    pub kind: RejectionKind,
    /// Offending field, when the rule is about one field
    pub field: Option<ImportField>,
    pub reason: String,
}

impl RowRejection {
    /// `Row <line>: <reason>`
    pub fn message(&self) -> String {
        format!("Row {}: {}", self.line, self.reason)
    }
}

impl std::fmt::Display for RowRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Row {}: {}", self.line, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "camelCase")]
pub enum ValidationOutcome {
    Accepted(StudentRecord),
    Rejected(RowRejection),
}

impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted(_))
    }

    pub fn accepted(&self) -> Option<&StudentRecord> {
        match self {
            ValidationOutcome::Accepted(record) => Some(record),
            ValidationOutcome::Rejected(_) => None,
        }
    }

    pub fn rejected(&self) -> Option<&RowRejection> {
        match self {
            ValidationOutcome::Accepted(_) => None,
            ValidationOutcome::Rejected(rejection) => Some(rejection),
        }
    }
}

/// Outcomes of one batch, in input order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedBatch {
    pub outcomes: Vec<ValidationOutcome>,
}

impl ValidatedBatch {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn accepted(&self) -> Vec<StudentRecord> {
        self.outcomes
            .iter()
            .filter_map(ValidationOutcome::accepted)
            .cloned()
            .collect()
    }

    pub fn rejections(&self) -> Vec<RowRejection> {
        self.outcomes
            .iter()
            .filter_map(ValidationOutcome::rejected)
            .cloned()
            .collect()
    }

    pub fn accepted_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_accepted()).count()
    }

    pub fn rejected_count(&self) -> usize {
        self.len() - self.accepted_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_message() {
        let rejection = RowRejection {
            row_index: 0,
            line: 2,
            kind: RejectionKind::MissingField,
            field: Some(ImportField::Name),
            reason: "Name is required".to_string(),
        };
        assert_eq!(rejection.message(), "Row 2: Name is required");
        assert_eq!(rejection.to_string(), rejection.message());
    }
}
