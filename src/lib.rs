//! Contract Ledger - merge contract order tables into an Excel ledger
//!
//! Scans a directory of Word contracts (`.doc` / `.docx`), reads the order
//! table of each one and appends the orders to a sheet of the ledger workbook
//! ("account form"), skipping contracts that are already recorded.
//!
//! # Features
//!
//! - Contract identity from the filename: `<contract_no>（<customer>）.docx`
//! - Legacy `.doc` files converted through an external office tool
//! - Configurable ledger column layout with header validation
//! - Idempotent append: a contract number is never recorded twice
//! - Dry runs and JSON batch reports
//!
//! # Example
//!
//! ```no_run
//! use contract_ledger::batch::BatchRunner;
//! use contract_ledger::config::Config;
//! use std::path::Path;
//!
//! let config = Config::load(Path::new("contract-ledger.yaml"))?;
//! let converter = config.source.converter();
//! let report = BatchRunner::new(&config, converter.as_ref()).run()?;
//!
//! println!("Appended: {}", report.appended());
//! println!("Failed:   {}", report.failed());
//! # Ok::<(), contract_ledger::LedgerError>(())
//! ```

pub mod batch;
pub mod cli;
pub mod config;
pub mod contract;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{LedgerError, LedgerResult};
pub use types::{AppendOutcome, ContractDocument, ContractIdentity, OrderRecord};
