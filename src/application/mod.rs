pub mod use_cases;

pub use use_cases::student_import::{
    ImportPreview, ImportReport, StudentImportUseCase, SubmissionOutcome,
};
