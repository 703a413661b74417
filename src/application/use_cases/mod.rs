pub mod birth_date;
pub mod row_validator;
pub mod student_import;
