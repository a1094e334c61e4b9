//! Blank ledger workbook with the configured header row

use super::columns::ColumnMap;
use crate::error::{LedgerError, LedgerResult};
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;

/// Create an empty ledger with one sheet and a bold header row.
///
/// Header labels come from the column map (configured headers, else the
/// standard account form labels). The header goes on the configured header
/// row, or row 1.
pub fn create_ledger_template(path: &Path, sheet: &str, columns: &ColumnMap) -> LedgerResult<()> {
    if path.exists() {
        return Err(LedgerError::LedgerWrite {
            path: path.to_path_buf(),
            reason: "file already exists".to_string(),
        });
    }

    let save_error = |e: rust_xlsxwriter::XlsxError| LedgerError::LedgerWrite {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet).map_err(save_error)?;

    let header_format = Format::new().set_bold();
    let header_row = columns.header_row().unwrap_or(1) - 1;

    for (field, column) in columns.fields_by_column() {
        let col = (column - 1) as u16;
        worksheet
            .write_string_with_format(header_row, col, columns.header_label(field), &header_format)
            .map_err(save_error)?;
        worksheet.set_column_width(col, 14).map_err(save_error)?;
    }

    workbook.save(path).map_err(save_error)?;
    Ok(())
}
