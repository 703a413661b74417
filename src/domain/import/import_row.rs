// ============================================================
// IMPORT ROW TYPES
// ============================================================
// Raw rows as produced by the spreadsheet readers, and the
// header alias table used to find the student fields in them

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A single spreadsheet row: column header -> raw cell text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImportRow {
    values: HashMap<String, String>,
}

impl ImportRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and in-memory rows
    pub fn with(mut self, header: &str, value: &str) -> Self {
        self.insert(header, value);
        self
    }

    pub fn insert(&mut self, header: &str, value: &str) {
        self.values.insert(header.to_string(), value.to_string());
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.values.get(header).map(String::as_str)
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn is_blank(&self) -> bool {
        self.values.values().all(|v| v.trim().is_empty())
    }
}

/// Source format of a parsed sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetFormat {
    Csv,
    Xlsx,
}

impl SheetFormat {
    /// Pick the reader from the uploaded file name
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let lower = file_name.trim().to_lowercase();
        if lower.ends_with(".csv") {
            Some(SheetFormat::Csv)
        } else if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
            Some(SheetFormat::Xlsx)
        } else {
            None
        }
    }
}

impl std::fmt::Display for SheetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetFormat::Csv => write!(f, "CSV"),
            SheetFormat::Xlsx => write!(f, "XLSX"),
        }
    }
}

/// One parsed file: ordered headers plus rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSheet {
    pub format: SheetFormat,
    pub headers: Vec<String>,
    pub rows: Vec<ImportRow>,
}

impl ImportSheet {
    pub fn new(format: SheetFormat, headers: Vec<String>, rows: Vec<ImportRow>) -> Self {
        Self { format, headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The logical student fields read from a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImportField {
    Name,
    Email,
    Phone,
    BirthDate,
}

impl ImportField {
    /// Presence is checked in this order
    pub const ALL: [ImportField; 4] = [
        ImportField::Name,
        ImportField::Email,
        ImportField::Phone,
        ImportField::BirthDate,
    ];

    /// Accepted headers, first present wins
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            ImportField::Name => &["nome", "Nome", "name", "Name"],
            ImportField::Email => &["email", "Email", "e-mail", "E-mail"],
            ImportField::Phone => &["telefone", "Telefone", "phone", "Phone"],
            ImportField::BirthDate => &[
                "data nascimento",
                "Data nascimento",
                "birth date",
                "Birth date",
                "birthDate",
            ],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ImportField::Name => "Name",
            ImportField::Email => "Email",
            ImportField::Phone => "Phone",
            ImportField::BirthDate => "Birth date",
        }
    }
}

impl std::fmt::Display for ImportField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Header resolved for each logical field, computed once per batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
}

impl ColumnMapping {
    /// Resolve the alias table against the headers a sheet actually has
    pub fn resolve<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let present: BTreeSet<&str> = headers.into_iter().collect();
        let pick = |field: ImportField| {
            field
                .aliases()
                .iter()
                .find(|alias| present.contains(**alias))
                .map(|alias| alias.to_string())
        };

        Self {
            name: pick(ImportField::Name),
            email: pick(ImportField::Email),
            phone: pick(ImportField::Phone),
            birth_date: pick(ImportField::BirthDate),
        }
    }

    /// Resolve from the union of headers seen across rows
    pub fn from_rows(rows: &[ImportRow]) -> Self {
        Self::resolve(rows.iter().flat_map(|row| row.headers()))
    }

    pub fn header(&self, field: ImportField) -> Option<&str> {
        match field {
            ImportField::Name => self.name.as_deref(),
            ImportField::Email => self.email.as_deref(),
            ImportField::Phone => self.phone.as_deref(),
            ImportField::BirthDate => self.birth_date.as_deref(),
        }
    }

    /// Raw value of a field in a row, empty when the column is absent
    pub fn value<'r>(&self, row: &'r ImportRow, field: ImportField) -> &'r str {
        self.header(field)
            .and_then(|header| row.get(header))
            .unwrap_or("")
    }

    /// Fields none of whose aliases appear in the headers
    pub fn missing_fields(&self) -> Vec<ImportField> {
        ImportField::ALL
            .into_iter()
            .filter(|field| self.header(*field).is_none())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_first_alias() {
        let mapping = ColumnMapping::resolve(["Nome", "nome", "Email", "Telefone", "Data nascimento"]);
        assert_eq!(mapping.name.as_deref(), Some("nome"));
        assert_eq!(mapping.email.as_deref(), Some("Email"));
        assert_eq!(mapping.phone.as_deref(), Some("Telefone"));
        assert_eq!(mapping.birth_date.as_deref(), Some("Data nascimento"));
        assert!(mapping.missing_fields().is_empty());
    }

    #[test]
    fn test_english_headers_resolve() {
        let mapping = ColumnMapping::resolve(["name", "email", "phone", "birth date"]);
        assert_eq!(mapping.name.as_deref(), Some("name"));
        assert_eq!(mapping.birth_date.as_deref(), Some("birth date"));
    }

    #[test]
    fn test_absent_column_reads_empty() {
        let mapping = ColumnMapping::resolve(["nome"]);
        let row = ImportRow::new().with("nome", "Ana");
        assert_eq!(mapping.value(&row, ImportField::Name), "Ana");
        assert_eq!(mapping.value(&row, ImportField::Email), "");
        assert_eq!(
            mapping.missing_fields(),
            vec![ImportField::Email, ImportField::Phone, ImportField::BirthDate]
        );
    }

    #[test]
    fn test_format_from_file_name() {
        assert_eq!(SheetFormat::from_file_name("alunos.CSV"), Some(SheetFormat::Csv));
        assert_eq!(SheetFormat::from_file_name("turma.xlsx"), Some(SheetFormat::Xlsx));
        assert_eq!(SheetFormat::from_file_name("turma.xls"), Some(SheetFormat::Xlsx));
        assert_eq!(SheetFormat::from_file_name("turma.pdf"), None);
    }
}
