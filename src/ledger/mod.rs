//! The ledger workbook ("account form")
//!
//! - `writer`: in-place append with duplicate detection (umya-spreadsheet)
//! - `reader`: read-only inspection of recorded contracts (calamine)
//! - `template`: blank ledger creation (rust_xlsxwriter)

mod columns;
mod reader;
mod template;
mod writer;

pub use columns::{column_letter_to_number, column_number_to_letter, ColumnMap, LedgerField};
pub use reader::{LedgerReader, RecordedContract};
pub use template::create_ledger_template;
pub use writer::{build_rows, parse_amount, LedgerWriter};
