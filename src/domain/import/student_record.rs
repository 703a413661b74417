use serde::{Deserialize, Serialize};

/// Normalized student ready for the batch endpoint.
///
/// Serialized as `{ name, email, phone, birthDate, classId }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub name: String,
    pub email: String,
    /// Digits only
    pub phone: String,
    /// ISO `YYYY-MM-DD`
    pub birth_date: String,
    pub class_id: String,
}
