//! Order table extraction from contract documents

use super::convert::{is_legacy_document, ConvertedDocument, DocumentConverter};
use super::docx::{read_tables, DocxTable};
use super::filename::parse_contract_filename;
use crate::error::{LedgerError, LedgerResult};
use crate::types::{ContractDocument, OrderRecord};
use std::path::Path;
use tracing::{debug, info};

/// Cell positions of the order fields within a table row
pub const SUBJECT_CELL: usize = 0;
pub const GRADE_CELL: usize = 1;
pub const SPEC_CELL: usize = 2;
pub const UNIT_CELL: usize = 3;
pub const QUANTITY_CELL: usize = 4;
pub const UNIT_PRICE_CELL: usize = 5;
pub const TOTAL_PRICE_CELL: usize = 6;

/// Number of cells every data row must have
pub const ORDER_CELLS: usize = 7;

/// Where the data rows sit inside the order table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLayout {
    /// Zero-based index of the order table among the document's tables
    pub table_index: usize,
    /// Leading header rows to skip
    pub header_rows: usize,
    /// Whether the last row is a totals row to skip
    pub summary_row: bool,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            table_index: 0,
            header_rows: 1,
            summary_row: true,
        }
    }
}

impl TableLayout {
    /// Row indexes holding order data in a table of `row_count` rows
    pub fn data_rows(&self, row_count: usize) -> std::ops::Range<usize> {
        let end = if self.summary_row {
            row_count.saturating_sub(1)
        } else {
            row_count
        };
        let start = self.header_rows.min(end);
        start..end
    }
}

/// Reads contract identity and order rows from .doc/.docx files
pub struct ContractReader<'a> {
    converter: &'a dyn DocumentConverter,
    layout: TableLayout,
}

impl<'a> ContractReader<'a> {
    pub fn new(converter: &'a dyn DocumentConverter, layout: TableLayout) -> Self {
        Self { converter, layout }
    }

    /// Read a contract file.
    ///
    /// Legacy `.doc` files are converted to a sibling `.docx` first; the
    /// converted file is removed again whether or not extraction succeeds.
    /// A `.docx` source is read in place and left alone.
    pub fn read(&self, path: &Path) -> LedgerResult<ContractDocument> {
        let identity = parse_contract_filename(path)?;

        let tables = if is_legacy_document(path) {
            let converted = ConvertedDocument::new(self.converter.convert(path)?);
            info!("Reading contract data from \"{}\"", converted.path().display());
            read_tables(converted.path())?
        } else {
            info!("Reading contract data from \"{}\"", path.display());
            read_tables(path)?
        };

        let table = tables
            .get(self.layout.table_index)
            .ok_or_else(|| LedgerError::TableNotFound {
                path: path.to_path_buf(),
                index: self.layout.table_index,
                available: tables.len(),
            })?;

        let orders = extract_orders(table, &self.layout, path)?;
        debug!(
            "Table {} of \"{}\": {} rows, {} orders",
            self.layout.table_index,
            path.display(),
            table.row_count(),
            orders.len()
        );

        Ok(ContractDocument { identity, orders })
    }
}

/// Turn the data rows of an order table into records
pub fn extract_orders(
    table: &DocxTable,
    layout: &TableLayout,
    path: &Path,
) -> LedgerResult<Vec<OrderRecord>> {
    layout
        .data_rows(table.row_count())
        .map(|row| {
            let text = |column: usize| -> LedgerResult<String> {
                table
                    .cell(row, column)
                    .map(|s| s.trim().to_string())
                    .ok_or_else(|| LedgerError::MalformedTable {
                        path: path.to_path_buf(),
                        row,
                        cells: table.rows()[row].len(),
                        expected: ORDER_CELLS,
                    })
            };

            Ok(OrderRecord {
                subject: text(SUBJECT_CELL)?,
                grade: text(GRADE_CELL)?,
                spec: text(SPEC_CELL)?,
                quantity: text(QUANTITY_CELL)?,
                unit: text(UNIT_CELL)?,
                unit_price: text(UNIT_PRICE_CELL)?,
                total_price: text(TOTAL_PRICE_CELL)?,
            })
        })
        .collect()
}
