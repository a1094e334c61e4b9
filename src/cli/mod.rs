//! CLI command handlers

pub mod commands;

pub use commands::{extract, init_ledger, run, scan, status};
