use serde::Serialize;

//==============================================================================
// Contract documents
//==============================================================================

/// Contract number and customer, taken from the contract file name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractIdentity {
    pub contract_no: String,
    pub customer: String,
}

impl ContractIdentity {
    pub fn new(contract_no: impl Into<String>, customer: impl Into<String>) -> Self {
        Self {
            contract_no: contract_no.into(),
            customer: customer.into(),
        }
    }
}

/// One data row of a contract's order table, as trimmed cell text
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct OrderRecord {
    /// 标的名称
    pub subject: String,
    /// 牌号
    pub grade: String,
    /// 规格型号
    pub spec: String,
    pub quantity: String,
    pub unit: String,
    pub unit_price: String,
    pub total_price: String,
}

impl OrderRecord {
    /// Order description as written to the ledger: subject followed by spec
    pub fn description(&self) -> String {
        format!("{}{}", self.subject, self.spec)
    }
}

/// Everything read from a single contract document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractDocument {
    pub identity: ContractIdentity,
    pub orders: Vec<OrderRecord>,
}

//==============================================================================
// Ledger rows
//==============================================================================

/// Value written into a ledger cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

/// A row ready to be appended: (1-based column number, value) pairs
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LedgerRow {
    pub cells: Vec<(u32, CellValue)>,
}

impl LedgerRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: u32, value: CellValue) {
        self.cells.push((column, value));
    }

    /// Value stored at a given column, if any
    pub fn get(&self, column: u32) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(col, _)| *col == column)
            .map(|(_, value)| value)
    }
}

/// Result of appending a contract to the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AppendOutcome {
    /// Rows were appended (or would have been, in dry-run mode)
    Appended { rows: usize },
    /// The contract number is already present in the lookup column
    AlreadyRecorded,
}
