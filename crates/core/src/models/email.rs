use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::field::{CellValue, FieldValue, TradeField};
use super::grid::GridRow;
use super::status::{persisted_status, ReconciliationStatus, RowStatus};
use super::trade::{inferred_trade_id, TradeId, TradeTerms};

/// Product type the extractor writes when an email is not a trade confirmation.
pub const UNRECOGNIZED_PRODUCT: &str = "Not a recognized trade";

/// A trade inferred from a confirmation email (`email_matches.json`).
///
/// Several emails may point at the same `InferredTradeID`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmailMatch {
    #[serde(default, deserialize_with = "lenient_text")]
    pub email_sender: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email_subject: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email_body: Option<String>,

    /// Trade number the email is believed to confirm. May not resolve.
    #[serde(
        rename = "InferredTradeID",
        default,
        deserialize_with = "inferred_trade_id"
    )]
    pub inferred_trade_id: Option<TradeId>,

    #[serde(flatten)]
    pub terms: TradeTerms,

    /// Persisted status; takes precedence over the computed one.
    #[serde(rename = "status", default, deserialize_with = "persisted_status")]
    pub status: Option<ReconciliationStatus>,

    /// Present once the backend has changed the status at least once.
    /// The inner value is the label an undo would restore.
    #[serde(
        rename = "previous_status",
        default,
        deserialize_with = "key_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub previous_status: Option<Option<String>>,
}

impl EmailMatch {
    pub fn new(inferred_trade_id: impl Into<TradeId>, terms: TradeTerms) -> Self {
        Self {
            email_sender: None,
            email_date: None,
            email_time: None,
            email_subject: None,
            email_body: None,
            inferred_trade_id: Some(inferred_trade_id.into()),
            terms,
            status: None,
            previous_status: None,
        }
    }

    /// Inferred id, ignoring the placeholder written for non-trades.
    pub fn trade_id(&self) -> Option<&TradeId> {
        self.inferred_trade_id.as_ref().filter(|id| !id.is_unset())
    }

    pub fn is_unrecognized_product(&self) -> bool {
        self.terms.product_type.as_ref().and_then(CellValue::as_str) == Some(UNRECOGNIZED_PRODUCT)
    }

    /// The backend refuses an undo when no status change was ever recorded.
    pub fn has_undo_history(&self) -> bool {
        self.previous_status.is_some()
    }

    /// Subject and body for the email preview popup.
    pub fn preview(&self) -> Option<(String, String)> {
        let body = self.email_body.as_deref().filter(|b| !b.trim().is_empty())?;
        let subject = self.email_subject.clone().unwrap_or_default();
        Some((subject, body.to_string()))
    }
}

/// Email metadata is display-only, so any scalar is read as text.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn key_present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_text(deserializer).map(Some)
}

impl GridRow for EmailMatch {
    fn row_id(&self) -> Option<&TradeId> {
        self.inferred_trade_id.as_ref()
    }

    fn column(&self, column_id: &str) -> Option<FieldValue<'_>> {
        match column_id {
            "InferredTradeID" => Some(
                self.inferred_trade_id
                    .as_ref()
                    .map_or(FieldValue::Missing, TradeId::as_field_value),
            ),
            "EmailSender" => Some(FieldValue::text(self.email_sender.as_deref())),
            "EmailDate" => Some(FieldValue::text(self.email_date.as_deref())),
            "EmailTime" => Some(FieldValue::text(self.email_time.as_deref())),
            "EmailSubject" => Some(FieldValue::text(self.email_subject.as_deref())),
            "status" => Some(FieldValue::text(self.status.map(|s| s.as_str()))),
            other => TradeField::from_column_id(other).map(|f| self.terms.field(f)),
        }
    }
}

/// An email record paired with the status the grid displays for it.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailRow {
    pub record: EmailMatch,
    pub status: RowStatus,
}

impl GridRow for EmailRow {
    fn row_id(&self) -> Option<&TradeId> {
        self.record.row_id()
    }

    fn column(&self, column_id: &str) -> Option<FieldValue<'_>> {
        if column_id == "status" {
            return Some(FieldValue::Text(self.status.value().as_str()));
        }
        self.record.column(column_id)
    }
}
