//! Read-only view of the ledger workbook

use crate::error::{LedgerError, LedgerResult};
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A contract number found in the ledger and how many rows it has
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedContract {
    pub contract_no: String,
    pub rows: usize,
}

/// Reads recorded contracts from a ledger sheet without modifying it
pub struct LedgerReader {
    path: PathBuf,
}

impl LedgerReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Names of all worksheets in the ledger
    pub fn sheet_names(&self) -> LedgerResult<Vec<String>> {
        Ok(self.open()?.sheet_names().to_vec())
    }

    /// Contract numbers in `column` (1-based), in first-seen order.
    ///
    /// Rows up to and including `header_row` are skipped, as are empty cells.
    pub fn recorded_contracts(
        &self,
        sheet: &str,
        column: u32,
        header_row: Option<u32>,
    ) -> LedgerResult<Vec<RecordedContract>> {
        let range = self.sheet_range(sheet)?;
        let mut contracts: Vec<RecordedContract> = Vec::new();

        for value in column_values(&range, column, header_row.unwrap_or(0)) {
            match contracts.iter_mut().find(|c| c.contract_no == value) {
                Some(existing) => existing.rows += 1,
                None => contracts.push(RecordedContract {
                    contract_no: value,
                    rows: 1,
                }),
            }
        }

        Ok(contracts)
    }

    /// Number of rows that carry a value in `column` (1-based), after `header_row`
    pub fn count_rows(&self, sheet: &str, column: u32, header_row: Option<u32>) -> LedgerResult<usize> {
        let range = self.sheet_range(sheet)?;
        Ok(column_values(&range, column, header_row.unwrap_or(0)).count())
    }

    fn open(&self) -> LedgerResult<Xlsx<std::io::BufReader<std::fs::File>>> {
        if !self.path.is_file() {
            return Err(LedgerError::LedgerNotFound(self.path.clone()));
        }
        open_workbook(&self.path).map_err(|e: calamine::XlsxError| LedgerError::LedgerUnreadable {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    fn sheet_range(&self, sheet: &str) -> LedgerResult<Range<Data>> {
        let mut workbook = self.open()?;
        let available = workbook.sheet_names().to_vec();
        if !available.iter().any(|name| name == sheet) {
            return Err(LedgerError::SheetNotFound {
                sheet: sheet.to_string(),
                available,
            });
        }
        workbook
            .worksheet_range(sheet)
            .map_err(|e| LedgerError::LedgerUnreadable {
                path: self.path.clone(),
                reason: e.to_string(),
            })
    }
}

/// Non-empty cell texts of a 1-based column below `skip_rows` rows
fn column_values(range: &Range<Data>, column: u32, skip_rows: u32) -> impl Iterator<Item = String> + '_ {
    let (first, last) = match (range.start(), range.end()) {
        (Some(start), Some(end)) => (start.0.max(skip_rows), end.0),
        _ => (1, 0),
    };
    let col = column.saturating_sub(1);
    (first..=last).filter_map(move |row| match range.get_value((row, col)) {
        None | Some(Data::Empty) => None,
        Some(cell) => {
            let text = cell.to_string();
            (!text.is_empty()).then_some(text)
        }
    })
}
