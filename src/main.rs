use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use contract_ledger::cli;
use contract_ledger::config::{Config, DEFAULT_CONFIG_FILE};
use contract_ledger::logging;
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit status of `run --strict` when any contract failed
const EXIT_FILES_FAILED: u8 = 2;

#[derive(Parser)]
#[command(name = "contract-ledger")]
#[command(about = "Record order tables from Word contracts into the Excel ledger")]
#[command(long_about = "Contract Ledger - Word contracts to Excel account form

Reads the order table of every contract in a directory and appends the orders
to a sheet of the ledger workbook. Contracts already in the ledger are skipped,
so a run can be repeated safely.

CONTRACT FILES:
  <contract_no>（<customer>）.docx   e.g. dp20061（大浦机械）.docx
  Legacy .doc files are converted with LibreOffice (soffice) or textutil.

COMMANDS:
  run          - Record all new contracts into the ledger
  scan         - List the contract files a run would pick up
  extract      - Show the orders read from one contract
  status       - List contracts already recorded in the ledger
  init-ledger  - Create an empty ledger with the configured columns

EXAMPLES:
  contract-ledger run                      # Uses ./contract-ledger.yaml
  contract-ledger -c office.yaml run --dry-run
  contract-ledger extract \"dp001（Acme）.docx\"
  contract-ledger run --json --strict      # Exit 2 if any contract failed")]
#[command(version)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "CONTRACT_LEDGER_CONFIG",
        default_value = DEFAULT_CONFIG_FILE
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Record all new contracts into the ledger.

Scans source.directory for files starting with source.prefix and ending in
.doc or .docx. For each one the contract number and customer come from the
filename and the orders from the order table. Rows are appended after the
last used row of destination.sheet, one contract at a time.

SKIPPED CONTRACTS:
  A contract whose number is already in the contract-number column is left
  alone. A contract with a non-numeric quantity or amount is not recorded at
  all; fix the document and run again.

A contract that fails is logged and the batch moves on. The exit status is 0
unless --strict is given and at least one contract failed (exit 2).

Use --dry-run to check everything without saving the ledger.")]
    /// Record all new contracts into the ledger
    Run {
        /// Run every check but do not save the ledger
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Exit with status 2 if any contract failed
        #[arg(long)]
        strict: bool,

        /// Print the batch report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the contract files a run would pick up
    Scan,

    #[command(long_about = "Show the orders read from one contract.

Nothing is written to the ledger. Useful to check a new contract template:
the contract number and customer from the filename, then every data row of
the order table with its quantity and amounts as written in the document.")]
    /// Show the orders read from one contract
    Extract {
        /// Contract file (.doc or .docx)
        file: PathBuf,

        /// Print the contract as JSON
        #[arg(long)]
        json: bool,
    },

    /// List contracts already recorded in the ledger
    Status {
        /// Print the recorded contracts as JSON
        #[arg(long)]
        json: bool,
    },

    #[command(long_about = "Create an empty ledger with the configured columns.

Writes a new workbook with one sheet named after destination.sheet and a bold
header row using destination.headers (or the standard account form labels).
An existing file is never overwritten.

EXAMPLE:
  contract-ledger init-ledger ledger.xlsx")]
    /// Create an empty ledger with the configured columns
    InitLedger {
        /// Output Excel file path (.xlsx)
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "❌ Error:".bold().red(), e);
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = Config::load(&cli.config)
        .with_context(|| format!("loading configuration '{}'", cli.config.display()))?;
    let dispatch = logging::build_dispatch(&config.general).with_context(|| {
        format!(
            "opening log file '{}'",
            config.general.log_file.display()
        )
    })?;

    tracing::dispatcher::with_default(&dispatch, || dispatch_command(cli.command, &config))
}

fn dispatch_command(command: Commands, config: &Config) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Run {
            dry_run,
            strict,
            json,
        } => {
            let report = cli::run(config, dry_run, json)?;
            if strict && report.has_failures() {
                return Ok(ExitCode::from(EXIT_FILES_FAILED));
            }
        }

        Commands::Scan => cli::scan(config)?,

        Commands::Extract { file, json } => cli::extract(config, &file, json)?,

        Commands::Status { json } => cli::status(config, json)?,

        Commands::InitLedger { output } => cli::init_ledger(config, &output)?,
    }

    Ok(ExitCode::SUCCESS)
}
