//! Run configuration (YAML)
//!
//! ```yaml
//! general:
//!   log_file: contract-ledger.log
//!   log_level: info            # debug | info | warning | error
//! source:
//!   directory: contracts
//!   prefix: dp
//! destination:
//!   ledger: A1账目.xlsx
//!   sheet: 订单2020
//! ```
//!
//! Relative paths are resolved against the directory holding the config file.

use crate::contract::{DisabledConverter, DocumentConverter, OfficeConverter, TableLayout};
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::ColumnMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

/// Config file looked up when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "contract-ledger.yaml";

/// Log verbosity as written in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

/// Tool used to turn .doc files into .docx
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConverterKind {
    #[default]
    Soffice,
    Textutil,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneralConfig {
    pub log_file: PathBuf,
    pub log_level: LogLevel,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("contract-ledger.log"),
            log_level: LogLevel::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// Directory holding the contract documents
    pub directory: PathBuf,
    /// File name prefix marking contract files
    pub prefix: String,
    pub table_index: usize,
    pub header_rows: usize,
    /// Whether the last table row is a totals row
    pub summary_row: bool,
    pub converter: ConverterKind,
    /// Path to the converter program when not on PATH
    pub converter_program: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            prefix: "dp".to_string(),
            table_index: 0,
            header_rows: 1,
            summary_row: true,
            converter: ConverterKind::Soffice,
            converter_program: None,
        }
    }
}

impl SourceConfig {
    pub fn table_layout(&self) -> TableLayout {
        TableLayout {
            table_index: self.table_index,
            header_rows: self.header_rows,
            summary_row: self.summary_row,
        }
    }

    /// Build the configured legacy-format converter
    pub fn converter(&self) -> Box<dyn DocumentConverter> {
        match self.converter {
            ConverterKind::Soffice => Box::new(OfficeConverter::soffice(
                self.converter_program
                    .clone()
                    .unwrap_or_else(|| PathBuf::from("soffice")),
            )),
            ConverterKind::Textutil => {
                let converter = OfficeConverter::textutil();
                Box::new(match &self.converter_program {
                    Some(program) => converter.with_program(program.clone()),
                    None => converter,
                })
            }
            ConverterKind::Disabled => Box::new(DisabledConverter),
        }
    }
}

/// Destination section as written; required keys are checked in [`Config::from_raw`]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawDestination {
    ledger: Option<PathBuf>,
    sheet: Option<String>,
    date_format: Option<String>,
    header_row: Option<u32>,
    columns: BTreeMap<String, String>,
    headers: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    general: GeneralConfig,
    #[serde(default)]
    source: SourceConfig,
    destination: Option<RawDestination>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DestinationConfig {
    /// Ledger workbook (.xlsx)
    pub ledger: PathBuf,
    pub sheet: String,
    /// chrono format of the date stamp
    pub date_format: String,
    pub columns: ColumnMap,
}

/// Validated configuration with resolved paths
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub general: GeneralConfig,
    pub source: SourceConfig,
    pub destination: DestinationConfig,
}

impl Config {
    /// Load and validate a config file
    pub fn load(path: &Path) -> LedgerResult<Self> {
        if !path.is_file() {
            return Err(LedgerError::ConfigMissing(format!(
                "config file '{}' not found",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_yaml(&content, base)
    }

    /// Parse config text, resolving relative paths against `base`
    pub fn from_yaml(content: &str, base: &Path) -> LedgerResult<Self> {
        let raw: RawConfig = serde_yaml::from_str(content)?;
        Self::from_raw(raw, base)
    }

    fn from_raw(raw: RawConfig, base: &Path) -> LedgerResult<Self> {
        let destination = raw
            .destination
            .ok_or_else(|| LedgerError::ConfigMissing("section 'destination'".to_string()))?;

        let ledger = destination
            .ledger
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| LedgerError::ConfigMissing("destination.ledger".to_string()))?;
        let sheet = destination
            .sheet
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| LedgerError::ConfigMissing("destination.sheet".to_string()))?;

        let columns = ColumnMap::from_config(
            &destination.columns,
            &destination.headers,
            destination.header_row,
        )?;

        let date_format = destination
            .date_format
            .unwrap_or_else(|| "%Y-%m-%d".to_string());
        validate_date_format(&date_format)?;

        let mut general = raw.general;
        general.log_file = resolve(base, &general.log_file);
        let mut source = raw.source;
        source.directory = resolve(base, &source.directory);

        Ok(Config {
            general,
            source,
            destination: DestinationConfig {
                ledger: resolve(base, &ledger),
                sheet,
                date_format,
                columns,
            },
        })
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() || base.as_os_str().is_empty() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn validate_date_format(format: &str) -> LedgerResult<()> {
    use chrono::format::{Item, StrftimeItems};

    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(LedgerError::ConfigInvalid(format!(
            "destination.date_format '{}' is not a valid strftime format",
            format
        )));
    }
    Ok(())
}
