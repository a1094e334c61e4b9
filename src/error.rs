use std::path::PathBuf;
use thiserror::Error;

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed contract filename '{name}': {reason}")]
    MalformedFilename { name: String, reason: String },

    #[error("Failed to convert '{}' to .docx: {reason}", path.display())]
    Conversion { path: PathBuf, reason: String },

    #[error("Unreadable document '{}': {reason}", path.display())]
    DocumentUnreadable { path: PathBuf, reason: String },

    #[error("Table {index} not found in '{}' ({available} tables present)", path.display())]
    TableNotFound {
        path: PathBuf,
        index: usize,
        available: usize,
    },

    #[error("Malformed table in '{}': row {row} has {cells} cells, expected at least {expected}", path.display())]
    MalformedTable {
        path: PathBuf,
        row: usize,
        cells: usize,
        expected: usize,
    },

    #[error("Ledger file '{}' does not exist", .0.display())]
    LedgerNotFound(PathBuf),

    #[error("Ledger file '{}' could not be read: {reason}", path.display())]
    LedgerUnreadable { path: PathBuf, reason: String },

    #[error("Sheet '{sheet}' not found in ledger (available: {})", available.join(", "))]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },

    #[error("Column {column} header is '{found}', expected '{expected}' for field '{field}'")]
    ColumnMismatch {
        field: String,
        column: String,
        expected: String,
        found: String,
    },

    #[error("Invalid numeric value '{value}' in field '{field}' (order row {row})")]
    InvalidNumericField {
        field: &'static str,
        value: String,
        row: usize,
    },

    #[error("Ledger file '{}' is locked by another process; close it and run again", .0.display())]
    LedgerLocked(PathBuf),

    #[error("Failed to save ledger '{}': {reason}", path.display())]
    LedgerWrite { path: PathBuf, reason: String },

    #[error("Missing configuration: {0}")]
    ConfigMissing(String),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
}

impl LedgerError {
    /// Short, stable name of the error kind, used in logs and JSON reports
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::Io(_) => "Io",
            LedgerError::Yaml(_) => "Yaml",
            LedgerError::Json(_) => "Json",
            LedgerError::MalformedFilename { .. } => "MalformedFilename",
            LedgerError::Conversion { .. } => "ConversionError",
            LedgerError::DocumentUnreadable { .. } => "DocumentUnreadable",
            LedgerError::TableNotFound { .. } => "TableNotFound",
            LedgerError::MalformedTable { .. } => "MalformedTable",
            LedgerError::LedgerNotFound(_) => "LedgerNotFound",
            LedgerError::LedgerUnreadable { .. } => "LedgerUnreadable",
            LedgerError::SheetNotFound { .. } => "SheetNotFound",
            LedgerError::ColumnMismatch { .. } => "ColumnMismatch",
            LedgerError::InvalidNumericField { .. } => "InvalidNumericField",
            LedgerError::LedgerLocked(_) => "LedgerLocked",
            LedgerError::LedgerWrite { .. } => "LedgerWrite",
            LedgerError::ConfigMissing(_) => "ConfigMissing",
            LedgerError::ConfigInvalid(_) => "ConfigInvalid",
        }
    }
}
