// ============================================================
// SPREADSHEET INFRASTRUCTURE LAYER
// ============================================================
// CSV and workbook readers producing import sheets

mod csv_reader;
mod workbook_reader;

pub use csv_reader::CsvReader;
pub use workbook_reader::WorkbookReader;

use crate::domain::import::ImportRow;

/// Pair header cells with values. Unnamed columns are skipped and a
/// repeated header keeps its first column, like the alias lookup.
pub(crate) fn row_from_cells<'a, I>(cells: I) -> ImportRow
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut row = ImportRow::new();
    for (header, value) in cells {
        if !header.is_empty() && row.get(header).is_none() {
            row.insert(header, value);
        }
    }
    row
}

/// Editors often leave blank lines at the end of a sheet; blank rows in
/// the middle are kept so line numbers stay aligned.
pub(crate) fn drop_trailing_blank_rows(rows: &mut Vec<ImportRow>) {
    while rows.last().is_some_and(ImportRow::is_blank) {
        rows.pop();
    }
}
