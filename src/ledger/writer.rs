//! Append contract orders to the ledger workbook in place
//!
//! The workbook is opened, checked for the contract number, appended to and
//! saved once per contract. Formatting, formulas and other sheets of the
//! account form are kept as they are.

use super::columns::{column_number_to_letter, ColumnMap, LedgerField};
use crate::config::DestinationConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::types::{AppendOutcome, CellValue, ContractIdentity, LedgerRow, OrderRecord};
use chrono::{Local, NaiveDate};
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use umya_spreadsheet::{Spreadsheet, Worksheet};

/// Parse an amount written in a contract table.
///
/// Accepts thousands separators (`,` `，`) between groups of three digits
/// and a leading currency sign (`¥` `￥` `$`). `row` is the 1-based order
/// row, used in the error.
pub fn parse_amount(field: &'static str, value: &str, row: usize) -> LedgerResult<f64> {
    let invalid = || LedgerError::InvalidNumericField {
        field,
        value: value.to_string(),
        row,
    };

    let trimmed = value.trim();
    let unsigned = trimmed.trim_start_matches(['¥', '￥', '$']).trim_start();
    let cleaned = strip_group_separators(unsigned).ok_or_else(invalid)?;
    if cleaned.is_empty() {
        return Err(invalid());
    }

    match cleaned.parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(number),
        _ => Err(invalid()),
    }
}

/// Remove thousands separators, or `None` if they do not sit between
/// groups of three digits in the integer part
fn strip_group_separators(value: &str) -> Option<String> {
    let is_separator = |c: char| c == ',' || c == '，';
    if !value.contains(is_separator) {
        return Some(value.to_string());
    }

    let (integer, fraction) = value.split_at(value.find('.').unwrap_or(value.len()));
    if fraction.contains(is_separator) {
        return None;
    }

    let digits = integer.strip_prefix(['-', '+']).unwrap_or(integer);
    let all_digits = |group: &str| group.chars().all(|c| c.is_ascii_digit());
    let mut groups = digits.split(is_separator);
    let leading = groups.next()?;
    if leading.is_empty() || leading.len() > 3 || !all_digits(leading) {
        return None;
    }
    if !groups.all(|group| group.len() == 3 && all_digits(group)) {
        return None;
    }

    Some(value.chars().filter(|c| !is_separator(*c)).collect())
}

/// Build the ledger rows for a contract.
///
/// All amounts are checked before any row is returned, so a bad value in
/// one order leaves the whole contract out of the ledger.
pub fn build_rows(
    identity: &ContractIdentity,
    orders: &[OrderRecord],
    columns: &ColumnMap,
    date_stamp: &str,
) -> LedgerResult<Vec<LedgerRow>> {
    orders
        .iter()
        .enumerate()
        .map(|(index, order)| {
            let row_number = index + 1;
            let quantity = parse_amount("quantity", &order.quantity, row_number)?;
            let unit_price = parse_amount("unit_price", &order.unit_price, row_number)?;
            let total_price = parse_amount("total_price", &order.total_price, row_number)?;

            let mut row = LedgerRow::new();
            for field in LedgerField::ALL {
                let Some(column) = columns.column(field) else {
                    continue;
                };
                let value = match field {
                    LedgerField::Date => CellValue::Text(date_stamp.to_string()),
                    LedgerField::ContractNo => CellValue::Text(identity.contract_no.clone()),
                    LedgerField::Customer => CellValue::Text(identity.customer.clone()),
                    LedgerField::Description => CellValue::Text(order.description()),
                    LedgerField::Grade => CellValue::Text(order.grade.clone()),
                    LedgerField::Quantity => CellValue::Number(quantity),
                    LedgerField::Unit => CellValue::Text(order.unit.clone()),
                    LedgerField::UnitPrice => CellValue::Number(unit_price),
                    LedgerField::TotalPrice => CellValue::Number(total_price),
                };
                row.set(column, value);
            }
            Ok(row)
        })
        .collect()
}

/// Appends contracts to one sheet of the ledger workbook
#[derive(Debug, Clone)]
pub struct LedgerWriter {
    path: PathBuf,
    sheet: String,
    columns: ColumnMap,
    date_format: String,
    today: NaiveDate,
    dry_run: bool,
}

impl LedgerWriter {
    pub fn new(destination: &DestinationConfig) -> Self {
        Self {
            path: destination.ledger.clone(),
            sheet: destination.sheet.clone(),
            columns: destination.columns.clone(),
            date_format: destination.date_format.clone(),
            today: Local::now().date_naive(),
            dry_run: false,
        }
    }

    /// Stamp rows with a fixed date instead of today
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.today = date;
        self
    }

    /// Run every check and build the rows, but never save
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    /// Append one contract's orders unless its number is already recorded
    pub fn append(
        &self,
        identity: &ContractIdentity,
        orders: &[OrderRecord],
    ) -> LedgerResult<AppendOutcome> {
        let mut book = self.open()?;
        let sheet_names: Vec<String> = book
            .get_sheet_collection()
            .iter()
            .map(|ws| ws.get_name().to_string())
            .collect();
        debug!(
            "Ledger \"{}\" has sheets: {}",
            self.path.display(),
            sheet_names.join(", ")
        );

        let sheet = book
            .get_sheet_by_name_mut(&self.sheet)
            .ok_or_else(|| LedgerError::SheetNotFound {
                sheet: self.sheet.clone(),
                available: sheet_names.clone(),
            })?;

        self.validate_headers(sheet)?;

        if contains_contract(sheet, self.columns.lookup_column(), &identity.contract_no) {
            info!(
                "Contract \"{}\" is already recorded in sheet \"{}\", skipping",
                identity.contract_no, self.sheet
            );
            return Ok(AppendOutcome::AlreadyRecorded);
        }

        let date_stamp = self.today.format(&self.date_format).to_string();
        let rows = build_rows(identity, orders, &self.columns, &date_stamp)?;
        if rows.is_empty() {
            warn!(
                "Contract \"{}\" has no order rows, ledger left unchanged",
                identity.contract_no
            );
            return Ok(AppendOutcome::Appended { rows: 0 });
        }

        let first_row = sheet.get_highest_row() + 1;
        info!(
            "Appending {} rows for contract \"{}\" to sheet \"{}\" at row {}",
            rows.len(),
            identity.contract_no,
            self.sheet,
            first_row
        );
        write_rows(sheet, first_row, &rows);

        if self.dry_run {
            info!("Dry run: ledger \"{}\" not saved", self.path.display());
        } else {
            self.save(&book)?;
            info!(
                "Saved ledger \"{}\" (sheet \"{}\" now ends at row {})",
                self.path.display(),
                self.sheet,
                first_row + rows.len() as u32 - 1
            );
        }

        Ok(AppendOutcome::Appended { rows: rows.len() })
    }

    fn open(&self) -> LedgerResult<Spreadsheet> {
        if !self.path.is_file() {
            return Err(LedgerError::LedgerNotFound(self.path.clone()));
        }
        umya_spreadsheet::reader::xlsx::read(&self.path).map_err(|e| {
            LedgerError::LedgerUnreadable {
                path: self.path.clone(),
                reason: e.to_string(),
            }
        })
    }

    /// Compare configured header labels against the sheet's header row
    fn validate_headers(&self, sheet: &Worksheet) -> LedgerResult<()> {
        let Some(header_row) = self.columns.header_row() else {
            return Ok(());
        };
        for (field, column, expected) in self.columns.expected_headers() {
            let found = sheet.get_value((column, header_row));
            if found.trim() != expected {
                return Err(LedgerError::ColumnMismatch {
                    field: field.key().to_string(),
                    column: format!("{}{}", column_number_to_letter(column), header_row),
                    expected: expected.to_string(),
                    found: found.trim().to_string(),
                });
            }
        }
        Ok(())
    }

    fn save(&self, book: &Spreadsheet) -> LedgerResult<()> {
        // Excel holds an exclusive handle on open workbooks
        if let Err(e) = OpenOptions::new().write(true).open(&self.path) {
            return Err(save_error(&self.path, e));
        }

        umya_spreadsheet::writer::xlsx::write(book, &self.path).map_err(|e| {
            LedgerError::LedgerWrite {
                path: self.path.clone(),
                reason: e.to_string(),
            }
        })
    }
}

/// Classify a failed write-mode open of the ledger
fn save_error(path: &Path, e: std::io::Error) -> LedgerError {
    if e.kind() == ErrorKind::PermissionDenied || is_sharing_violation(&e) {
        warn!("Ledger \"{}\" is locked: {}", path.display(), e);
        return LedgerError::LedgerLocked(path.to_path_buf());
    }
    e.into()
}

/// Windows reports a file opened elsewhere as ERROR_SHARING_VIOLATION (32)
/// or ERROR_LOCK_VIOLATION (33)
fn is_sharing_violation(e: &std::io::Error) -> bool {
    cfg!(windows) && matches!(e.raw_os_error(), Some(32) | Some(33))
}

/// Exact match of `contract_no` anywhere in the lookup column
fn contains_contract(sheet: &Worksheet, column: u32, contract_no: &str) -> bool {
    (1..=sheet.get_highest_row()).any(|row| sheet.get_value((column, row)) == contract_no)
}

fn write_rows(sheet: &mut Worksheet, first_row: u32, rows: &[LedgerRow]) {
    for (offset, row) in rows.iter().enumerate() {
        let row_number = first_row + offset as u32;
        for (column, value) in &row.cells {
            let cell = sheet.get_cell_mut((*column, row_number));
            match value {
                CellValue::Text(text) => {
                    cell.set_value_string(text.clone());
                }
                CellValue::Number(number) => {
                    cell.set_value_number(*number);
                }
            }
        }
    }
}
