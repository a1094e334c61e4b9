//! Batch run over a directory of contract files

use crate::config::Config;
use crate::contract::{
    has_extension, ContractReader, DocumentConverter, LEGACY_EXTENSION, MODERN_EXTENSION,
};
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::LedgerWriter;
use crate::types::{AppendOutcome, ContractIdentity};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Owner files Office leaves next to documents that are open
const OFFICE_OWNER_PREFIX: &str = "~$";

/// Contract files directly inside `directory`.
///
/// A candidate is a regular file with a `.doc` or `.docx` extension whose
/// name starts with `prefix`. Files come back in directory listing order.
pub fn scan_directory(directory: &Path, prefix: &str) -> LedgerResult<Vec<PathBuf>> {
    info!("Getting contract files in \"{}\"...", directory.display());

    let mut contracts = Vec::new();
    for entry in fs::read_dir(directory)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with(OFFICE_OWNER_PREFIX) || !name.starts_with(prefix) {
            continue;
        }
        if has_extension(&path, LEGACY_EXTENSION) || has_extension(&path, MODERN_EXTENSION) {
            info!("{}", name);
            contracts.push(path);
        }
    }

    info!("Found {} files.", contracts.len());
    Ok(contracts)
}

/// What happened to one contract file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Appended { rows: usize },
    AlreadyRecorded,
    Failed { kind: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract: Option<ContractIdentity>,
    #[serde(flatten)]
    pub status: FileStatus,
}

/// Per-file outcomes of a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub dry_run: bool,
    pub files: Vec<FileOutcome>,
}

impl BatchReport {
    /// Contracts whose rows were appended
    pub fn appended(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Appended { .. }))
    }

    pub fn already_recorded(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::AlreadyRecorded))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Failed { .. }))
    }

    /// Ledger rows appended across all contracts
    pub fn rows_appended(&self) -> usize {
        self.files
            .iter()
            .map(|f| match f.status {
                FileStatus::Appended { rows } => rows,
                _ => 0,
            })
            .sum()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    fn count(&self, pred: impl Fn(&FileStatus) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.status)).count()
    }
}

/// Drives each contract file through extraction and ledger append
pub struct BatchRunner<'a> {
    config: &'a Config,
    reader: ContractReader<'a>,
    writer: LedgerWriter,
}

impl<'a> BatchRunner<'a> {
    pub fn new(config: &'a Config, converter: &'a dyn DocumentConverter) -> Self {
        Self {
            config,
            reader: ContractReader::new(converter, config.source.table_layout()),
            writer: LedgerWriter::new(&config.destination),
        }
    }

    /// Replace the ledger writer (fixed date, dry run)
    pub fn with_writer(mut self, writer: LedgerWriter) -> Self {
        self.writer = writer;
        self
    }

    /// Scan the source directory and process every contract file.
    ///
    /// Only a failing directory scan is returned as an error; per-file
    /// failures are logged and recorded in the report.
    pub fn run(&self) -> LedgerResult<BatchReport> {
        let contracts = scan_directory(&self.config.source.directory, &self.config.source.prefix)?;
        Ok(self.run_files(&contracts))
    }

    /// Process the given files in order
    pub fn run_files(&self, contracts: &[PathBuf]) -> BatchReport {
        let mut report = BatchReport {
            dry_run: self.writer.is_dry_run(),
            files: Vec::with_capacity(contracts.len()),
        };

        if contracts.is_empty() {
            error!(
                "No contract files found in \"{}\"; check the source directory and prefix",
                self.config.source.directory.display()
            );
            return report;
        }

        let total = contracts.len();
        for (i, path) in contracts.iter().enumerate() {
            let mut contract = None;
            let status = match self.process(i + 1, total, path, &mut contract) {
                Ok(AppendOutcome::Appended { rows }) => FileStatus::Appended { rows },
                Ok(AppendOutcome::AlreadyRecorded) => FileStatus::AlreadyRecorded,
                Err(e) => {
                    error!("{}/{}: \"{}\" skipped: {}", i + 1, total, path.display(), e);
                    FileStatus::Failed {
                        kind: e.kind().to_string(),
                        message: e.to_string(),
                    }
                }
            };
            report.files.push(FileOutcome {
                path: path.clone(),
                contract,
                status,
            });
        }

        info!(
            "Batch finished: {} appended ({} rows), {} already recorded, {} failed",
            report.appended(),
            report.rows_appended(),
            report.already_recorded(),
            report.failed()
        );
        report
    }

    fn process(
        &self,
        index: usize,
        total: usize,
        path: &Path,
        contract: &mut Option<ContractIdentity>,
    ) -> Result<AppendOutcome, LedgerError> {
        let document = self.reader.read(path)?;
        info!(
            "{}/{}: contract no: {}, customer: {}",
            index, total, document.identity.contract_no, document.identity.customer
        );
        for order in &document.orders {
            info!(
                "order: {}, quantity: {}, unit: {}, unit price: {}, total: {}",
                order.description(),
                order.quantity,
                order.unit,
                order.unit_price,
                order.total_price
            );
        }
        *contract = Some(document.identity.clone());

        self.writer.append(&document.identity, &document.orders)
    }
}
