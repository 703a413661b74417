// ============================================================
// CSV READER
// ============================================================
// Parse uploaded CSV files into import rows, with encoding
// fallback and delimiter detection

use csv::{ReaderBuilder, StringRecord, Trim};

use super::{drop_trailing_blank_rows, row_from_cells};
use crate::domain::error::AppError;
use crate::domain::import::{ImportRow, ImportSheet, SheetFormat};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// CSV reader for student rosters. Headers and values are trimmed and
/// the delimiter is detected from the content.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvReader;

impl CsvReader {
    pub fn new() -> Self {
        Self
    }

    /// Decode and parse raw upload bytes
    pub fn read_bytes(&self, bytes: &[u8]) -> Result<ImportSheet, AppError> {
        let content = Self::decode(bytes);
        self.parse_content(&content)
    }

    /// Parse CSV content from string
    pub fn parse_content(&self, content: &str) -> Result<ImportSheet, AppError> {
        let delimiter = Self::detect_delimiter(content);

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(Trim::All)
            .flexible(true) // Allow rows with different lengths
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
            .clone();

        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(AppError::ParseError("CSV file has no header row".to_string()));
        }

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AppError::ParseError(format!("Failed to parse CSV row {}: {}", index + 1, e))
            })?;
            rows.push(Self::parse_row(&headers, &record));
        }
        drop_trailing_blank_rows(&mut rows);

        tracing::debug!(
            rows = rows.len(),
            delimiter = %(delimiter as char),
            "parsed CSV upload"
        );

        Ok(ImportSheet::new(
            SheetFormat::Csv,
            headers.iter().map(str::to_string).collect(),
            rows,
        ))
    }

    /// UTF-8 (BOM stripped) when valid, Windows-1252 otherwise
    pub fn decode(bytes: &[u8]) -> String {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        match std::str::from_utf8(bytes) {
            Ok(content) => content.to_string(),
            Err(_) => {
                let (content, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
                content.into_owned()
            }
        }
    }

    fn parse_row(headers: &StringRecord, record: &StringRecord) -> ImportRow {
        row_from_cells(
            headers
                .iter()
                .enumerate()
                .map(|(idx, header)| (header, record.get(idx).unwrap_or(""))),
        )
    }

    /// Detect delimiter from content (comma, semicolon, tab, pipe)
    pub fn detect_delimiter(content: &str) -> u8 {
        let candidates = [b',', b';', b'\t', b'|'];
        let sample_lines: Vec<_> = content.lines().take(10).collect();

        let mut best_delimiter = b',';
        let mut best_score = 0.0f32;

        if sample_lines.is_empty() {
            return best_delimiter;
        }

        for &delimiter in &candidates {
            let field_counts: Vec<usize> = sample_lines
                .iter()
                .map(|line| line.bytes().filter(|&b| b == delimiter).count())
                .collect();

            // Score by consistency (low standard deviation) and frequency
            let avg = field_counts.iter().sum::<usize>() as f32 / field_counts.len() as f32;
            let variance = field_counts
                .iter()
                .map(|&x| (x as f32 - avg).powi(2))
                .sum::<f32>()
                / field_counts.len() as f32;

            let score = avg / (1.0 + variance.sqrt());

            if score > best_score {
                best_score = score;
                best_delimiter = delimiter;
            }
        }

        best_delimiter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_csv() {
        let content = "nome,email,telefone,data nascimento\n\
                       Ana Silva,ana@x.com,11987654321,15/03/1999\n\
                       Bruno,bruno@x.com,1133334444,01/02/2001";
        let sheet = CsvReader::new().parse_content(content).unwrap();

        assert_eq!(sheet.format, SheetFormat::Csv);
        assert_eq!(sheet.headers, vec!["nome", "email", "telefone", "data nascimento"]);
        assert_eq!(sheet.len(), 2);
        assert_eq!(sheet.rows[0].get("nome"), Some("Ana Silva"));
        assert_eq!(sheet.rows[1].get("data nascimento"), Some("01/02/2001"));
    }

    #[test]
    fn test_semicolon_export() {
        let content = "Nome;Email;Telefone;Data nascimento\nCarla; carla@x.com ;21998765432;07/08/2010\n";
        let sheet = CsvReader::new().parse_content(content).unwrap();

        assert_eq!(sheet.len(), 1);
        assert_eq!(sheet.rows[0].get("Email"), Some("carla@x.com"));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(CsvReader::detect_delimiter("a,b,c\nd,e,f"), b',');
        assert_eq!(CsvReader::detect_delimiter("a;b;c\nd;e;f"), b';');
        assert_eq!(CsvReader::detect_delimiter("a\tb\tc\nd\te\tf"), b'\t');
        assert_eq!(CsvReader::detect_delimiter(""), b',');
    }

    #[test]
    fn test_ragged_rows_read_empty() {
        let content = "nome,email,telefone\nAna,ana@x.com";
        let sheet = CsvReader::new().parse_content(content).unwrap();
        assert_eq!(sheet.rows[0].get("telefone"), Some(""));
    }

    #[test]
    fn test_trailing_blank_rows_dropped() {
        let content = "nome,email\nAna,ana@x.com\n,\n,\n";
        let sheet = CsvReader::new().parse_content(content).unwrap();
        assert_eq!(sheet.len(), 1);
    }

    #[test]
    fn test_latin1_fallback_and_bom() {
        // "Conceição" encoded as Windows-1252
        let mut latin1 = b"nome,email\nConcei".to_vec();
        latin1.extend_from_slice(&[0xE7, 0xE3]);
        latin1.extend_from_slice(b"o,c@x.com\n");
        let sheet = CsvReader::new().read_bytes(&latin1).unwrap();
        assert_eq!(sheet.rows[0].get("nome"), Some("Conceição"));

        let mut with_bom = UTF8_BOM.to_vec();
        with_bom.extend_from_slice("nome,email\nJoão,j@x.com\n".as_bytes());
        let sheet = CsvReader::new().read_bytes(&with_bom).unwrap();
        assert_eq!(sheet.headers[0], "nome");
        assert_eq!(sheet.rows[0].get("nome"), Some("João"));
    }

    #[test]
    fn test_duplicate_header_keeps_first_column() {
        let content = "nome,email,telefone,email
Ana,ana@x.com,11987654321,old@x.com
";
        let sheet = CsvReader::new().parse_content(content).unwrap();
        assert_eq!(sheet.rows[0].get("email"), Some("ana@x.com"));
    }

    #[test]
    fn test_empty_file_is_parse_error() {
        assert!(CsvReader::new().parse_content("").is_err());
    }
}
