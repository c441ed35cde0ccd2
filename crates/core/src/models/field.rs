use serde::Serialize;
use std::fmt;

/// A trade attribute that is compared between an email-inferred record and
/// the trade it points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeField {
    CounterpartyName,
    ProductType,
    ValueDate,
    Buyer,
    Seller,
    Currency1,
    QuantityCurrency1,
    ForwardPrice,
    Currency2,
    QuantityCurrency2,
    MaturityDate,
    FixingReference,
    SettlementType,
    SettlementCurrency,
    PaymentDate,
    CounterpartyPaymentMethod,
    BankPaymentMethod,
}

/// Fields compared when deriving an email row's status, in comparison order.
pub const STATUS_COMPARE_FIELDS: [TradeField; 17] = [
    TradeField::CounterpartyName,
    TradeField::ProductType,
    TradeField::ValueDate,
    TradeField::Buyer,
    TradeField::Seller,
    TradeField::Currency1,
    TradeField::QuantityCurrency1,
    TradeField::ForwardPrice,
    TradeField::Currency2,
    TradeField::QuantityCurrency2,
    TradeField::MaturityDate,
    TradeField::FixingReference,
    TradeField::SettlementType,
    TradeField::SettlementCurrency,
    TradeField::PaymentDate,
    TradeField::CounterpartyPaymentMethod,
    TradeField::BankPaymentMethod,
];

/// Fields compared when flagging a matched-trade row as different from its
/// email. Narrower than [`STATUS_COMPARE_FIELDS`]: party names, product
/// type and value date are not part of it.
pub const ROW_HIGHLIGHT_FIELDS: [TradeField; 12] = [
    TradeField::Currency1,
    TradeField::QuantityCurrency1,
    TradeField::ForwardPrice,
    TradeField::Currency2,
    TradeField::QuantityCurrency2,
    TradeField::MaturityDate,
    TradeField::FixingReference,
    TradeField::SettlementType,
    TradeField::SettlementCurrency,
    TradeField::PaymentDate,
    TradeField::CounterpartyPaymentMethod,
    TradeField::BankPaymentMethod,
];

impl TradeField {
    /// Column id as it appears in the JSON files and in grid filter models.
    pub fn column_id(&self) -> &'static str {
        match self {
            TradeField::CounterpartyName => "CounterpartyName",
            TradeField::ProductType => "ProductType",
            TradeField::ValueDate => "ValueDate",
            TradeField::Buyer => "Buyer",
            TradeField::Seller => "Seller",
            TradeField::Currency1 => "Currency1",
            TradeField::QuantityCurrency1 => "QuantityCurrency1",
            TradeField::ForwardPrice => "ForwardPrice",
            TradeField::Currency2 => "Currency2",
            TradeField::QuantityCurrency2 => "QuantityCurrency2",
            TradeField::MaturityDate => "MaturityDate",
            TradeField::FixingReference => "FixingReference",
            TradeField::SettlementType => "SettlementType",
            TradeField::SettlementCurrency => "SettlementCurrency",
            TradeField::PaymentDate => "PaymentDate",
            TradeField::CounterpartyPaymentMethod => "CounterpartyPaymentMethod",
            TradeField::BankPaymentMethod => "BankPaymentMethod",
        }
    }

    pub fn from_column_id(column_id: &str) -> Option<Self> {
        STATUS_COMPARE_FIELDS
            .iter()
            .copied()
            .find(|f| f.column_id() == column_id)
    }

    /// Whether the field holds a monetary amount or a rate.
    pub fn is_amount(&self) -> bool {
        matches!(
            self,
            TradeField::QuantityCurrency1 | TradeField::ForwardPrice | TradeField::QuantityCurrency2
        )
    }

    /// Whether the field holds a date in `dd-mm-yyyy` form.
    pub fn is_date(&self) -> bool {
        matches!(
            self,
            TradeField::ValueDate | TradeField::MaturityDate | TradeField::PaymentDate
        )
    }
}

impl fmt::Display for TradeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_id())
    }
}

/// A cell exactly as the JSON files carry it.
///
/// The JSON kind is part of the value: `1000000` and `"1,000,000"` are
/// different cells, and so are `123` and `"123"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl CellValue {
    pub fn as_field_value(&self) -> FieldValue<'_> {
        match self {
            CellValue::Number(n) => FieldValue::Number(*n),
            CellValue::Text(s) => FieldValue::Text(s),
            CellValue::Bool(b) => FieldValue::Bool(*b),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_field_value().fmt(f)
    }
}

/// A borrowed cell value.
///
/// Equality is strict: values of different kinds never compare equal, a
/// missing value never equals a present one, and a missing amount never
/// equals zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Missing,
    Text(&'a str),
    Number(f64),
    Bool(bool),
}

impl<'a> FieldValue<'a> {
    pub fn text(value: Option<&'a str>) -> Self {
        value.map_or(FieldValue::Missing, FieldValue::Text)
    }

    pub fn cell(value: Option<&'a CellValue>) -> Self {
        value.map_or(FieldValue::Missing, CellValue::as_field_value)
    }

    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Missing => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Number(_) | FieldValue::Bool(_) => false,
        }
    }

    /// Numeric reading used for display and number filters.
    /// Text is parsed leniently (`"1,250.50"` → `1250.5`).
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n).filter(|n| n.is_finite()),
            FieldValue::Text(s) => s
                .trim()
                .replace(',', "")
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite()),
            FieldValue::Missing | FieldValue::Bool(_) => None,
        }
    }
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Missing => Ok(()),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
        }
    }
}
