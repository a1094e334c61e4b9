use super::*;
use crate::types::{ContractIdentity, OrderRecord};
use tempfile::TempDir;

fn config_for(dir: &Path) -> Config {
    let yaml = "\
general:
  log_file: run.log
source:
  converter: disabled
destination:
  ledger: ledger.xlsx
  sheet: 订单2020
";
    Config::from_yaml(yaml, dir).unwrap()
}

fn document(totals: &[&str]) -> ContractDocument {
    ContractDocument {
        identity: ContractIdentity::new("dp001", "Acme"),
        orders: totals
            .iter()
            .map(|total| OrderRecord {
                total_price: total.to_string(),
                ..OrderRecord::default()
            })
            .collect(),
    }
}

// =========================================================================
// format_number Tests
// =========================================================================

#[test]
fn test_format_number_integer() {
    assert_eq!(format_number(100.0), "100");
    assert_eq!(format_number(0.0), "0");
    assert_eq!(format_number(-50.0), "-50");
}

#[test]
fn test_format_number_decimal() {
    assert_eq!(format_number(1234.5), "1234.5");
    assert_eq!(format_number(0.25), "0.25");
}

#[test]
fn test_format_number_hides_float_noise() {
    assert_eq!(format_number(0.1 + 0.2), "0.3");
    assert_eq!(format_number(1.0000001), "1");
}

// =========================================================================
// contract_total Tests
// =========================================================================

#[test]
fn test_contract_total_sums_amounts() {
    assert_eq!(contract_total(&document(&["100", "1,200.50"])), Some(1300.5));
}

#[test]
fn test_contract_total_empty_is_zero() {
    assert_eq!(contract_total(&document(&[])), Some(0.0));
}

#[test]
fn test_contract_total_none_when_not_numeric() {
    assert_eq!(contract_total(&document(&["100", "n/a"])), None);
}

// =========================================================================
// Command Tests
// =========================================================================

#[test]
fn test_init_ledger_then_status() {
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path());

    init_ledger(&config, &config.destination.ledger).unwrap();
    assert!(config.destination.ledger.is_file());

    status(&config, false).unwrap();
    status(&config, true).unwrap();
}

#[test]
fn test_init_ledger_refuses_existing_file() {
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path());
    std::fs::write(&config.destination.ledger, b"keep").unwrap();

    let err = init_ledger(&config, &config.destination.ledger).unwrap_err();
    assert!(matches!(err, LedgerError::LedgerWrite { .. }));
    assert_eq!(std::fs::read(&config.destination.ledger).unwrap(), b"keep");
}

#[test]
fn test_status_without_ledger() {
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path());

    let err = status(&config, false).unwrap_err();
    assert!(matches!(err, LedgerError::LedgerNotFound(_)));
}

#[test]
fn test_run_with_no_contracts_reports_nothing() {
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path());
    std::fs::write(dir.path().join("notes.txt"), b"not a contract").unwrap();

    let report = run(&config, true, false).unwrap();
    assert!(report.dry_run);
    assert!(report.files.is_empty());
    assert!(!report.has_failures());
}

#[test]
fn test_scan_empty_directory() {
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path());
    scan(&config).unwrap();
}

#[test]
fn test_extract_legacy_with_disabled_converter() {
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path());
    let file = dir.path().join("dp001（Acme）.doc");
    std::fs::write(&file, b"legacy").unwrap();

    let err = extract(&config, &file, false).unwrap_err();
    assert!(matches!(err, LedgerError::Conversion { .. }));
}
