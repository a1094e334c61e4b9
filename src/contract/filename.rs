//! Contract identity from file names of the form `<contract_no>（<customer>）.<ext>`

use crate::error::{LedgerError, LedgerResult};
use crate::types::ContractIdentity;
use regex::Regex;
use std::path::Path;

/// Full-width parentheses around a non-empty customer name
const CUSTOMER_PATTERN: &str = r"（([^（）]+)）";

/// Parse contract number and customer name out of a contract file path.
///
/// The directory and extension are ignored. The name must contain exactly one
/// `（…）` segment: its interior is the customer, and the rest of the name with
/// that segment removed is the contract number.
///
/// # Example
/// ```
/// use contract_ledger::contract::parse_contract_filename;
/// use std::path::Path;
///
/// let id = parse_contract_filename(Path::new("contracts/dp2020-015（大浦机械）.doc"))?;
/// assert_eq!(id.contract_no, "dp2020-015");
/// assert_eq!(id.customer, "大浦机械");
/// # Ok::<(), contract_ledger::LedgerError>(())
/// ```
pub fn parse_contract_filename(path: &Path) -> LedgerResult<ContractIdentity> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| LedgerError::MalformedFilename {
            name: path.display().to_string(),
            reason: "file name is missing or not valid UTF-8".to_string(),
        })?;

    parse_contract_stem(stem)
}

/// Parse an already extension-less file name
pub fn parse_contract_stem(stem: &str) -> LedgerResult<ContractIdentity> {
    let malformed = |reason: &str| LedgerError::MalformedFilename {
        name: stem.to_string(),
        reason: reason.to_string(),
    };

    let pattern = Regex::new(CUSTOMER_PATTERN)
        .map_err(|e| LedgerError::ConfigInvalid(format!("Regex error: {}", e)))?;
    let mut segments = pattern.captures_iter(stem);
    let first = segments
        .next()
        .ok_or_else(|| malformed("no （customer） segment"))?;
    if segments.next().is_some() {
        return Err(malformed("more than one （customer） segment"));
    }

    let whole = first.get(0).map(|m| m.range()).unwrap_or_default();
    let customer = first
        .get(1)
        .map(|m| m.as_str().trim())
        .unwrap_or_default();
    if customer.is_empty() {
        return Err(malformed("customer name is empty"));
    }

    let contract_no = format!("{}{}", &stem[..whole.start], &stem[whole.end..]);
    let contract_no = contract_no.trim();
    if contract_no.is_empty() {
        return Err(malformed("contract number is empty"));
    }

    Ok(ContractIdentity::new(contract_no, customer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_name() {
        let id = parse_contract_filename(Path::new("001（Acme）.doc")).unwrap();
        assert_eq!(id.contract_no, "001");
        assert_eq!(id.customer, "Acme");
    }

    #[test]
    fn test_parse_ignores_directory_and_extension() {
        let id = parse_contract_filename(Path::new("/data/in/dp-88（上海某某）.docx")).unwrap();
        assert_eq!(id, ContractIdentity::new("dp-88", "上海某某"));
    }

    #[test]
    fn test_segment_in_middle_is_removed() {
        let id = parse_contract_stem("dp12（Acme）rev2").unwrap();
        assert_eq!(id.contract_no, "dp12rev2");
        assert_eq!(id.customer, "Acme");
    }

    #[test]
    fn test_ascii_parentheses_are_not_delimiters() {
        let err = parse_contract_stem("dp12(Acme)").unwrap_err();
        assert!(matches!(err, LedgerError::MalformedFilename { .. }));
    }

    #[test]
    fn test_missing_segment_fails() {
        let err = parse_contract_filename(Path::new("dp12.doc")).unwrap_err();
        assert!(err.to_string().contains("no （customer） segment"));
    }

    #[test]
    fn test_two_segments_fail() {
        let err = parse_contract_stem("dp12（Acme）（Other）").unwrap_err();
        assert!(err.to_string().contains("more than one"));
    }

    #[test]
    fn test_empty_parts_fail() {
        assert!(parse_contract_stem("（Acme）").is_err());
        assert!(parse_contract_stem("dp12（ ）").is_err());
        assert!(parse_contract_stem("dp12（）").is_err());
    }
}
