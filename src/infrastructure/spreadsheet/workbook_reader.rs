// ============================================================
// WORKBOOK READER
// ============================================================
// Read the first worksheet of an XLSX/XLS upload into import rows

use calamine::{open_workbook_auto_from_rs, Data, DataType, Range, Reader};
use chrono::NaiveDate;
use std::io::Cursor;

use super::{drop_trailing_blank_rows, row_from_cells};
use crate::domain::error::AppError;
use crate::domain::import::{ImportRow, ImportSheet, SheetFormat};

#[derive(Debug, Default, Clone, Copy)]
pub struct WorkbookReader;

impl WorkbookReader {
    pub fn new() -> Self {
        Self
    }

    /// Read an in-memory upload; XLSX and legacy XLS are both detected
    pub fn read_bytes(&self, bytes: Vec<u8>) -> Result<ImportSheet, AppError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| AppError::ParseError(format!("Failed to open Excel file: {}", e)))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| AppError::ParseError("No worksheet found".to_string()))?
            .map_err(|e| AppError::ParseError(format!("Failed to read Excel range: {}", e)))?;
        Ok(Self::sheet_from_range(&range))
    }

    /// First row is the header; every later row is kept so line numbers
    /// match what the user sees in the spreadsheet.
    pub fn sheet_from_range(range: &Range<Data>) -> ImportSheet {
        let mut grid = range.rows();

        let headers: Vec<String> = grid
            .next()
            .map(|row| row.iter().map(|cell| Self::cell_text(cell).trim().to_string()).collect())
            .unwrap_or_default();

        let mut rows: Vec<ImportRow> = grid
            .map(|row| {
                let values: Vec<String> = (0..headers.len())
                    .map(|idx| {
                        let value = row.get(idx).map(Self::cell_text).unwrap_or_default();
                        value.trim().to_string()
                    })
                    .collect();
                row_from_cells(
                    headers
                        .iter()
                        .map(String::as_str)
                        .zip(values.iter().map(String::as_str)),
                )
            })
            .collect();
        drop_trailing_blank_rows(&mut rows);

        tracing::debug!(rows = rows.len(), "parsed workbook upload");
        ImportSheet::new(SheetFormat::Xlsx, headers, rows)
    }

    /// Render a cell the way the validator expects to read it.
    ///
    /// Date cells become their 1900-system serial number, whichever date
    /// system the workbook uses. Integral numbers lose the trailing `.0`
    /// so phone columns stored as numbers keep their digits.
    pub fn cell_text(cell: &Data) -> String {
        match cell {
            Data::Empty => String::new(),
            Data::String(s) => s.clone(),
            Data::Int(i) => i.to_string(),
            Data::Float(f) => format_number(*f),
            Data::Bool(b) => b.to_string(),
            Data::DateTime(dt) if dt.is_duration() => format_number(dt.as_f64()),
            Data::DateTime(dt) => dt
                .as_datetime()
                .and_then(|value| serial_number(value.date()))
                .unwrap_or_else(|| format_number(dt.as_f64())),
            // ISO text that is not a plain date is left for the validator to reject
            Data::DateTimeIso(s) => cell
                .as_date()
                .and_then(serial_number)
                .unwrap_or_else(|| s.clone()),
            Data::DurationIso(s) => s.clone(),
            Data::Error(_) => String::new(),
        }
    }
}

fn serial_number(date: NaiveDate) -> Option<String> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    Some((date - epoch).num_days().to_string())
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
