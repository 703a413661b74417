// ============================================================
// IMPORT DOMAIN LAYER
// ============================================================
// Core types and value objects for student spreadsheet imports
// No I/O, no async

mod import_config;
mod import_row;
mod outcome;
mod student_record;

pub use import_config::ValidationConfig;
pub use import_row::{ColumnMapping, ImportField, ImportRow, ImportSheet, SheetFormat};
pub use outcome::{RejectionKind, RowRejection, ValidatedBatch, ValidationOutcome};
pub use student_record::StudentRecord;
