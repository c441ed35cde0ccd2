use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Reconciliation status of an email row.
///
/// Serialized with the exact labels the backend persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReconciliationStatus {
    /// Every compared field agrees with the matched trade.
    #[serde(rename = "Confirmation OK")]
    ConfirmationOk,
    /// At least one compared field disagrees.
    Difference,
    /// Not a trade, or no matched trade carries the inferred id.
    Unrecognized,
    /// User override: the difference has been dealt with.
    Resolved,
    /// User override: flagged for follow-up.
    Tagged,
}

impl ReconciliationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconciliationStatus::ConfirmationOk => "Confirmation OK",
            ReconciliationStatus::Difference => "Difference",
            ReconciliationStatus::Unrecognized => "Unrecognized",
            ReconciliationStatus::Resolved => "Resolved",
            ReconciliationStatus::Tagged => "Tagged",
        }
    }

    /// Parse a persisted label. Empty or unknown labels yield `None`.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim() {
            "Confirmation OK" => Some(ReconciliationStatus::ConfirmationOk),
            "Difference" => Some(ReconciliationStatus::Difference),
            "Unrecognized" => Some(ReconciliationStatus::Unrecognized),
            "Resolved" => Some(ReconciliationStatus::Resolved),
            "Tagged" => Some(ReconciliationStatus::Tagged),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReconciliationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status shown for an email row, keeping track of where it came from.
///
/// A persisted status always wins over the computed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    /// Computed by comparing the email against its matched trade.
    Derived(ReconciliationStatus),
    /// Read from the record's persisted `status`.
    Overridden(ReconciliationStatus),
}

impl RowStatus {
    pub fn value(&self) -> ReconciliationStatus {
        match self {
            RowStatus::Derived(s) | RowStatus::Overridden(s) => *s,
        }
    }

    pub fn is_overridden(&self) -> bool {
        matches!(self, RowStatus::Overridden(_))
    }
}

impl std::fmt::Display for RowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value().fmt(f)
    }
}

/// User action from the status context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    Tag,
    Resolve,
    Undo,
}

impl StatusAction {
    /// Status requested from the backend; `None` for [`StatusAction::Undo`].
    pub fn target_status(&self) -> Option<ReconciliationStatus> {
        match self {
            StatusAction::Tag => Some(ReconciliationStatus::Tagged),
            StatusAction::Resolve => Some(ReconciliationStatus::Resolved),
            StatusAction::Undo => None,
        }
    }
}

impl std::fmt::Display for StatusAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusAction::Tag => write!(f, "Tagged"),
            StatusAction::Resolve => write!(f, "Resolved"),
            StatusAction::Undo => write!(f, "Undo"),
        }
    }
}

/// `status` may be missing, null, empty (after an undo back to nothing) or
/// carry a label; only a known label counts as persisted.
pub(crate) fn persisted_status<'de, D>(
    deserializer: D,
) -> Result<Option<ReconciliationStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let label = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => return Ok(None),
        Some(other) => other.to_string(),
    };
    let parsed = ReconciliationStatus::parse(&label);
    if parsed.is_none() && !label.trim().is_empty() {
        tracing::warn!(
            label = %label,
            "unknown persisted status, row shows the derived status"
        );
    }
    Ok(parsed)
}
