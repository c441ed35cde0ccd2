use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

use super::field::{CellValue, FieldValue, TradeField};
use super::grid::GridRow;

/// Identifier of a trade in the trading system.
///
/// The source files carry trade numbers as JSON numbers, but text ids are
/// accepted too. Equality is strict: `Number(100)` and `Text("100")` are
/// different ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum TradeId {
    Number(i64),
    Text(String),
}

impl TradeId {
    /// `0` and the empty string are what the backend writes when no trade
    /// could be inferred from an email.
    pub fn is_unset(&self) -> bool {
        match self {
            TradeId::Number(n) => *n == 0,
            TradeId::Text(s) => s.trim().is_empty(),
        }
    }

    /// Placeholder for a row whose id cell is missing or unreadable.
    pub fn unset() -> Self {
        TradeId::Text(String::new())
    }

    /// Read an id cell. Integral numbers (`100`, `100.0`) become
    /// [`TradeId::Number`], other numbers keep their textual form, and
    /// non-scalar cells yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Some(TradeId::Number(i));
                }
                match n.as_f64() {
                    Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                        Some(TradeId::Number(f as i64))
                    }
                    _ => Some(TradeId::Text(n.to_string())),
                }
            }
            Value::String(s) => Some(TradeId::Text(s.clone())),
            _ => None,
        }
    }

    pub(crate) fn as_field_value(&self) -> FieldValue<'_> {
        match self {
            TradeId::Number(n) => FieldValue::Number(*n as f64),
            TradeId::Text(s) => FieldValue::Text(s),
        }
    }
}

impl<'de> Deserialize<'de> for TradeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        TradeId::from_json(&value)
            .ok_or_else(|| de::Error::custom(format!("invalid trade id: {value}")))
    }
}

/// Numeric ids sort before text ids; numbers compare numerically and text
/// compares lexicographically.
impl Ord for TradeId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (TradeId::Number(a), TradeId::Number(b)) => a.cmp(b),
            (TradeId::Number(_), TradeId::Text(_)) => Ordering::Less,
            (TradeId::Text(_), TradeId::Number(_)) => Ordering::Greater,
            (TradeId::Text(a), TradeId::Text(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for TradeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for TradeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeId::Number(n) => write!(f, "{n}"),
            TradeId::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for TradeId {
    fn from(n: i64) -> Self {
        TradeId::Number(n)
    }
}

impl From<&str> for TradeId {
    fn from(s: &str) -> Self {
        TradeId::Text(s.to_string())
    }
}

/// The economic terms shared by trade records and email-inferred records.
///
/// Cells keep the kind the JSON file gave them, so `1000000` and
/// `"1,000,000"` compare as different values. Dates stay in their textual
/// `dd-mm-yyyy` form; see [`crate::services::format_service`] for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TradeTerms {
    #[serde(default, deserialize_with = "cell")]
    pub counterparty_name: Option<CellValue>,
    #[serde(default, deserialize_with = "cell")]
    pub product_type: Option<CellValue>,
    #[serde(default, deserialize_with = "cell")]
    pub value_date: Option<CellValue>,
    #[serde(default, deserialize_with = "cell")]
    pub buyer: Option<CellValue>,
    #[serde(default, deserialize_with = "cell")]
    pub seller: Option<CellValue>,
    #[serde(default, deserialize_with = "cell")]
    pub currency1: Option<CellValue>,
    #[serde(default, deserialize_with = "cell")]
    pub quantity_currency1: Option<CellValue>,
    #[serde(default, deserialize_with = "cell")]
    pub forward_price: Option<CellValue>,
    #[serde(default, deserialize_with = "cell")]
    pub currency2: Option<CellValue>,
    #[serde(default, deserialize_with = "cell")]
    pub quantity_currency2: Option<CellValue>,
    #[serde(default, deserialize_with = "cell")]
    pub maturity_date: Option<CellValue>,
    #[serde(default, deserialize_with = "cell")]
    pub fixing_reference: Option<CellValue>,
    #[serde(default, deserialize_with = "cell")]
    pub settlement_type: Option<CellValue>,
    #[serde(default, deserialize_with = "cell")]
    pub settlement_currency: Option<CellValue>,
    #[serde(default, deserialize_with = "cell")]
    pub payment_date: Option<CellValue>,
    #[serde(default, deserialize_with = "cell")]
    pub counterparty_payment_method: Option<CellValue>,
    #[serde(default, deserialize_with = "cell")]
    pub bank_payment_method: Option<CellValue>,
}

impl TradeTerms {
    /// Read one compared field.
    pub fn field(&self, field: TradeField) -> FieldValue<'_> {
        let cell = match field {
            TradeField::CounterpartyName => &self.counterparty_name,
            TradeField::ProductType => &self.product_type,
            TradeField::ValueDate => &self.value_date,
            TradeField::Buyer => &self.buyer,
            TradeField::Seller => &self.seller,
            TradeField::Currency1 => &self.currency1,
            TradeField::QuantityCurrency1 => &self.quantity_currency1,
            TradeField::ForwardPrice => &self.forward_price,
            TradeField::Currency2 => &self.currency2,
            TradeField::QuantityCurrency2 => &self.quantity_currency2,
            TradeField::MaturityDate => &self.maturity_date,
            TradeField::FixingReference => &self.fixing_reference,
            TradeField::SettlementType => &self.settlement_type,
            TradeField::SettlementCurrency => &self.settlement_currency,
            TradeField::PaymentDate => &self.payment_date,
            TradeField::CounterpartyPaymentMethod => &self.counterparty_payment_method,
            TradeField::BankPaymentMethod => &self.bank_payment_method,
        };
        FieldValue::cell(cell.as_ref())
    }
}

/// A trade record from `unmatched_trades.json` or `matched_trades.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    #[serde(
        rename = "TradeNumber",
        default = "TradeId::unset",
        deserialize_with = "trade_number"
    )]
    pub trade_number: TradeId,

    #[serde(flatten)]
    pub terms: TradeTerms,
}

impl TradeRecord {
    pub fn new(trade_number: impl Into<TradeId>, terms: TradeTerms) -> Self {
        Self {
            trade_number: trade_number.into(),
            terms,
        }
    }
}

impl GridRow for TradeRecord {
    fn row_id(&self) -> Option<&TradeId> {
        Some(&self.trade_number)
    }

    fn column(&self, column_id: &str) -> Option<FieldValue<'_>> {
        if column_id == "TradeNumber" {
            return Some(self.trade_number.as_field_value());
        }
        TradeField::from_column_id(column_id).map(|f| self.terms.field(f))
    }
}

// ── Lenient decoding ────────────────────────────────────────────────
//
// The JSON files are written by a separate process. A single odd cell must
// not make the whole collection unreadable, but a cell's kind is kept so
// comparisons stay exact.

fn cell<'de, D>(deserializer: D) -> Result<Option<CellValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(CellValue::Text(s)),
        Some(Value::Number(n)) => n.as_f64().map(CellValue::Number),
        Some(Value::Bool(b)) => Some(CellValue::Bool(b)),
        _ => None,
    })
}

fn trade_number<'de, D>(deserializer: D) -> Result<TradeId, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(TradeId::from_json(&value).unwrap_or_else(|| {
        tracing::warn!(cell = %value, "unreadable trade number, row kept without an id");
        TradeId::unset()
    }))
}

/// An unreadable inferred id counts as "no trade inferred".
pub(crate) fn inferred_trade_id<'de, D>(deserializer: D) -> Result<Option<TradeId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(TradeId::from_json))
}
