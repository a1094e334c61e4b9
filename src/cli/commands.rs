use crate::batch::{scan_directory, BatchReport, BatchRunner, FileStatus};
use crate::config::Config;
use crate::contract::{parse_contract_filename, ContractReader};
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{
    column_number_to_letter, create_ledger_template, parse_amount, LedgerReader, LedgerWriter,
};
use crate::types::ContractDocument;
use colored::Colorize;
use std::path::Path;

/// Format a number for display, removing unnecessary decimal places
fn format_number(n: f64) -> String {
    // Amounts in contracts carry at most cents; 6 places hides f64 noise
    let rounded = (n * 1e6).round() / 1e6;
    format!("{:.6}", rounded)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Sum of the total-price column, if every value parses
fn contract_total(document: &ContractDocument) -> Option<f64> {
    document
        .orders
        .iter()
        .enumerate()
        .map(|(i, order)| parse_amount("total_price", &order.total_price, i + 1).ok())
        .sum()
}

/// Execute the run command
pub fn run(config: &Config, dry_run: bool, json: bool) -> LedgerResult<BatchReport> {
    if !json {
        println!("{}", "📒 Contract Ledger - Recording contracts".bold().green());
        println!("   Source: {}", config.source.directory.display());
        println!(
            "   Ledger: {} [{}]\n",
            config.destination.ledger.display(),
            config.destination.sheet.bright_blue()
        );
        if dry_run {
            println!(
                "{}",
                "📋 DRY RUN MODE - The ledger will not be saved\n".yellow()
            );
        }
    }

    let converter = config.source.converter();
    let writer = LedgerWriter::new(&config.destination).with_dry_run(dry_run);
    let runner = BatchRunner::new(config, converter.as_ref()).with_writer(writer);
    let report = runner.run()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(report)
}

fn print_report(report: &BatchReport) {
    if report.files.is_empty() {
        println!(
            "{}",
            "⚠️  No contract files found - check source.directory and source.prefix".yellow()
        );
        return;
    }

    for outcome in &report.files {
        let name = outcome
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| outcome.path.display().to_string());
        match &outcome.status {
            FileStatus::Appended { rows } => {
                println!("   ✅ {} ({} rows)", name.bright_blue(), rows);
            }
            FileStatus::AlreadyRecorded => {
                println!("   ⏭️  {} {}", name.bright_blue(), "already recorded".dimmed());
            }
            FileStatus::Failed { kind, message } => {
                println!("   ❌ {} [{}]", name.bright_blue(), kind.red());
                println!("      {}", message.red());
            }
        }
    }

    println!();
    let verb = if report.dry_run { "Would append" } else { "Appended" };
    println!(
        "{}",
        format!(
            "{} {} contracts ({} rows), {} already recorded, {} failed",
            verb,
            report.appended(),
            report.rows_appended(),
            report.already_recorded(),
            report.failed()
        )
        .bold()
    );

    if report.has_failures() {
        println!(
            "{}",
            "💡 Failed files were skipped; see the log file for details".yellow()
        );
    }
}

/// Execute the scan command - list candidate contract files
pub fn scan(config: &Config) -> LedgerResult<()> {
    println!("{}", "🔍 Contract Ledger - Scan".bold().green());
    println!("   Directory: {}", config.source.directory.display());
    println!("   Prefix:    {}\n", config.source.prefix);

    let contracts = scan_directory(&config.source.directory, &config.source.prefix)?;
    if contracts.is_empty() {
        println!("{}", "⚠️  No contract files found".yellow());
        return Ok(());
    }

    for path in &contracts {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match parse_contract_filename(path) {
            Ok(identity) => println!(
                "   📄 {}  {} / {}",
                name.bright_blue(),
                identity.contract_no.bold(),
                identity.customer
            ),
            Err(e) => println!("   ⚠️  {}  {}", name.bright_blue(), e.to_string().yellow()),
        }
    }

    println!("\n   Found {} files", contracts.len());
    Ok(())
}

/// Execute the extract command - show what one contract would contribute
pub fn extract(config: &Config, file: &Path, json: bool) -> LedgerResult<()> {
    let converter = config.source.converter();
    let reader = ContractReader::new(converter.as_ref(), config.source.table_layout());
    let document = reader.read(file)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    println!("{}", "📄 Contract Ledger - Extract".bold().green());
    println!("   File: {}\n", file.display());
    println!(
        "   Contract no: {}",
        document.identity.contract_no.bright_blue().bold()
    );
    println!("   Customer:    {}\n", document.identity.customer);

    if document.orders.is_empty() {
        println!("{}", "⚠️  The order table has no data rows".yellow());
        return Ok(());
    }

    println!("{}", "📋 Orders:".bold().cyan());
    for (i, order) in document.orders.iter().enumerate() {
        println!("   {}. {}", i + 1, order.description().bold());
        if !order.grade.is_empty() {
            println!("      Grade:      {}", order.grade);
        }
        println!("      Quantity:   {} {}", order.quantity, order.unit);
        println!("      Unit price: {}", order.unit_price);
        println!("      Total:      {}", order.total_price);
    }

    match contract_total(&document) {
        Some(total) => println!("\n   Contract total: {}", format_number(total).bold().green()),
        None => println!(
            "\n{}",
            "⚠️  Some amounts are not numeric; this contract would be rejected".yellow()
        ),
    }

    Ok(())
}

/// Execute the status command - list contracts already in the ledger
pub fn status(config: &Config, json: bool) -> LedgerResult<()> {
    let destination = &config.destination;
    let column = destination.columns.lookup_column();
    // Without header validation the ledger still carries its labels in row 1
    let header_row = destination.columns.header_row().unwrap_or(1);
    let reader = LedgerReader::new(&destination.ledger);
    let recorded = reader.recorded_contracts(&destination.sheet, column, Some(header_row))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recorded)?);
        return Ok(());
    }

    println!("{}", "📒 Contract Ledger - Status".bold().green());
    println!("   Ledger: {}", destination.ledger.display());
    println!(
        "   Sheet:  {} (contract numbers in column {})\n",
        destination.sheet.bright_blue(),
        column_number_to_letter(column)
    );

    if recorded.is_empty() {
        println!("{}", "⚠️  No contracts recorded yet".yellow());
        return Ok(());
    }

    for contract in &recorded {
        println!(
            "   {}  {} rows",
            contract.contract_no.bright_blue(),
            contract.rows
        );
    }
    let rows: usize = recorded.iter().map(|c| c.rows).sum();
    println!(
        "\n   {} contracts, {} rows",
        recorded.len().to_string().bold(),
        rows
    );

    Ok(())
}

/// Execute the init-ledger command
pub fn init_ledger(config: &Config, output: &Path) -> LedgerResult<()> {
    println!("{}", "📒 Contract Ledger - New ledger".bold().green());
    println!("   Output: {}", output.display());
    println!("   Sheet:  {}\n", config.destination.sheet.bright_blue());

    if output.exists() {
        println!(
            "{}",
            format!("❌ '{}' already exists", output.display()).bold().red()
        );
        return Err(LedgerError::LedgerWrite {
            path: output.to_path_buf(),
            reason: "file already exists".to_string(),
        });
    }

    let columns = &config.destination.columns;
    create_ledger_template(output, &config.destination.sheet, columns)?;

    for (field, column) in columns.fields_by_column() {
        println!(
            "   {}  {} ({})",
            column_number_to_letter(column).bold(),
            columns.header_label(field),
            field.key().dimmed()
        );
    }
    println!("\n{}", "✅ Ledger created".bold().green());

    Ok(())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
