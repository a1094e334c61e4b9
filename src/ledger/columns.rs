//! Named ledger fields and the worksheet columns they are written to

use crate::error::{LedgerError, LedgerResult};
use std::collections::BTreeMap;
use std::fmt;

/// Largest column Excel supports (XFD)
const MAX_COLUMN: u32 = 16_384;

/// A field of a ledger row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LedgerField {
    Date,
    ContractNo,
    Customer,
    Description,
    Grade,
    Quantity,
    Unit,
    UnitPrice,
    TotalPrice,
}

impl LedgerField {
    pub const ALL: [LedgerField; 9] = [
        LedgerField::Date,
        LedgerField::ContractNo,
        LedgerField::Customer,
        LedgerField::Description,
        LedgerField::Grade,
        LedgerField::Quantity,
        LedgerField::Unit,
        LedgerField::UnitPrice,
        LedgerField::TotalPrice,
    ];

    /// Key used in the `columns:` / `headers:` config maps
    pub fn key(self) -> &'static str {
        match self {
            LedgerField::Date => "date",
            LedgerField::ContractNo => "contract_no",
            LedgerField::Customer => "customer",
            LedgerField::Description => "description",
            LedgerField::Grade => "grade",
            LedgerField::Quantity => "quantity",
            LedgerField::Unit => "unit",
            LedgerField::UnitPrice => "unit_price",
            LedgerField::TotalPrice => "total_price",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    /// Header label used when creating a ledger template
    pub fn default_header(self) -> &'static str {
        match self {
            LedgerField::Date => "日期",
            LedgerField::ContractNo => "订单号",
            LedgerField::Customer => "客户名称",
            LedgerField::Description => "订单内容",
            LedgerField::Grade => "牌号",
            LedgerField::Quantity => "开票数量",
            LedgerField::Unit => "单位",
            LedgerField::UnitPrice => "单价",
            LedgerField::TotalPrice => "结算金额",
        }
    }

    /// Column in the standard account form, `None` if not written by default
    fn default_column(self) -> Option<&'static str> {
        match self {
            LedgerField::Date => Some("B"),
            LedgerField::ContractNo => Some("C"),
            LedgerField::Customer => Some("D"),
            LedgerField::Description => Some("E"),
            LedgerField::Grade => None,
            LedgerField::Quantity => Some("J"),
            LedgerField::Unit => Some("K"),
            LedgerField::UnitPrice => Some("L"),
            LedgerField::TotalPrice => Some("M"),
        }
    }

    /// Fields that may be left out of the ledger
    pub fn is_optional(self) -> bool {
        matches!(self, LedgerField::Grade)
    }
}

impl fmt::Display for LedgerField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Convert a column letter to its 1-based number
///
/// Examples:
/// - A → 1
/// - Z → 26
/// - AA → 27
pub fn column_letter_to_number(letters: &str) -> Option<u32> {
    let letters = letters.trim();
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let mut number: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        number = number * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }
    (number <= MAX_COLUMN).then_some(number)
}

/// Convert a 1-based column number to its letter
///
/// Examples:
/// - 1 → A
/// - 26 → Z
/// - 27 → AA
pub fn column_number_to_letter(number: u32) -> String {
    let mut result = String::new();
    let mut idx = number.saturating_sub(1);

    loop {
        let remainder = idx % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }

    result
}

/// Which worksheet column each ledger field goes to, plus optional header checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    columns: BTreeMap<LedgerField, u32>,
    headers: BTreeMap<LedgerField, String>,
    header_row: Option<u32>,
}

impl Default for ColumnMap {
    fn default() -> Self {
        let columns = LedgerField::ALL
            .into_iter()
            .filter_map(|field| {
                field
                    .default_column()
                    .and_then(column_letter_to_number)
                    .map(|column| (field, column))
            })
            .collect();
        Self {
            columns,
            headers: BTreeMap::new(),
            header_row: None,
        }
    }
}

impl ColumnMap {
    /// Build from the `columns:` and `headers:` config maps.
    ///
    /// `columns` overrides the default layout per field; `none` drops an
    /// optional field. When `headers` is given without `header_row`, the
    /// header row is row 1.
    pub fn from_config(
        columns: &BTreeMap<String, String>,
        headers: &BTreeMap<String, String>,
        header_row: Option<u32>,
    ) -> LedgerResult<Self> {
        let mut map = ColumnMap::default();

        for (key, letter) in columns {
            let field = parse_field(key)?;
            if letter.trim().eq_ignore_ascii_case("none") {
                if !field.is_optional() {
                    return Err(LedgerError::ConfigInvalid(format!(
                        "destination.columns.{}: field is required",
                        key
                    )));
                }
                map.columns.remove(&field);
                continue;
            }
            let column = column_letter_to_number(letter).ok_or_else(|| {
                LedgerError::ConfigInvalid(format!(
                    "destination.columns.{}: '{}' is not a column letter",
                    key, letter
                ))
            })?;
            map.columns.insert(field, column);
        }

        let mut seen: BTreeMap<u32, LedgerField> = BTreeMap::new();
        for (field, column) in &map.columns {
            if let Some(other) = seen.insert(*column, *field) {
                return Err(LedgerError::ConfigInvalid(format!(
                    "destination.columns: '{}' and '{}' both map to column {}",
                    other,
                    field,
                    column_number_to_letter(*column)
                )));
            }
        }

        for (key, label) in headers {
            let field = parse_field(key)?;
            if !map.columns.contains_key(&field) {
                return Err(LedgerError::ConfigInvalid(format!(
                    "destination.headers.{}: field is not mapped to a column",
                    key
                )));
            }
            map.headers.insert(field, label.trim().to_string());
        }

        if header_row == Some(0) {
            return Err(LedgerError::ConfigInvalid(
                "destination.header_row starts at 1".to_string(),
            ));
        }
        map.header_row = match header_row {
            Some(row) => Some(row),
            None if !map.headers.is_empty() => Some(1),
            None => None,
        };

        Ok(map)
    }

    /// 1-based column of a field, `None` if the field is not written
    pub fn column(&self, field: LedgerField) -> Option<u32> {
        self.columns.get(&field).copied()
    }

    /// Column of the contract number, used for duplicate detection
    pub fn lookup_column(&self) -> u32 {
        // Required fields cannot be removed, so this is always present
        self.column(LedgerField::ContractNo).unwrap_or(3)
    }

    pub fn header_row(&self) -> Option<u32> {
        self.header_row
    }

    /// Header labels to validate, in field order
    pub fn expected_headers(&self) -> impl Iterator<Item = (LedgerField, u32, &str)> + '_ {
        self.headers.iter().filter_map(move |(field, label)| {
            self.column(*field)
                .map(|column| (*field, column, label.as_str()))
        })
    }

    /// Label written into a new template for a field
    pub fn header_label(&self, field: LedgerField) -> &str {
        self.headers
            .get(&field)
            .map(String::as_str)
            .unwrap_or_else(|| field.default_header())
    }

    /// Mapped fields ordered by column
    pub fn fields_by_column(&self) -> Vec<(LedgerField, u32)> {
        let mut fields: Vec<_> = self.columns.iter().map(|(f, c)| (*f, *c)).collect();
        fields.sort_by_key(|(_, column)| *column);
        fields
    }
}

fn parse_field(key: &str) -> LedgerResult<LedgerField> {
    LedgerField::from_key(key).ok_or_else(|| {
        LedgerError::ConfigInvalid(format!(
            "unknown ledger field '{}' (expected one of: {})",
            key,
            LedgerField::ALL
                .iter()
                .map(|f| f.key())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    })
}
