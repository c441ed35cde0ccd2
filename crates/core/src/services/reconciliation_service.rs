//! Email ↔ trade comparison rules.
//!
//! Pure functions, no I/O. The renderer calls them per row / per cell.

use crate::models::email::EmailMatch;
use crate::models::field::{TradeField, ROW_HIGHLIGHT_FIELDS, STATUS_COMPARE_FIELDS};
use crate::models::status::{ReconciliationStatus, RowStatus};
use crate::models::trade::{TradeId, TradeRecord, TradeTerms};

/// Status of an email row.
///
/// 1. A persisted status is returned unchanged ([`RowStatus::Overridden`]).
/// 2. Otherwise the computed status ([`computed_status`]) is returned as
///    [`RowStatus::Derived`].
pub fn derive_status(email: &EmailMatch, matched: &[TradeRecord]) -> RowStatus {
    match email.status {
        Some(status) => RowStatus::Overridden(status),
        None => RowStatus::Derived(computed_status(email, matched)),
    }
}

/// Status from the data alone, ignoring any persisted override.
///
/// - `ProductType == "Not a recognized trade"` → `Unrecognized`
/// - no matched trade with `TradeNumber == InferredTradeID` → `Unrecognized`
/// - any of [`STATUS_COMPARE_FIELDS`] differs → `Difference`
/// - otherwise → `Confirmation OK`
pub fn computed_status(email: &EmailMatch, matched: &[TradeRecord]) -> ReconciliationStatus {
    if email.is_unrecognized_product() {
        return ReconciliationStatus::Unrecognized;
    }

    let Some(trade) = email
        .trade_id()
        .and_then(|id| matched.iter().find(|t| &t.trade_number == id))
    else {
        return ReconciliationStatus::Unrecognized;
    };

    if has_differences(&email.terms, &trade.terms, &STATUS_COMPARE_FIELDS) {
        ReconciliationStatus::Difference
    } else {
        ReconciliationStatus::ConfirmationOk
    }
}

/// Fields in `fields` whose values differ, in the order given.
///
/// Comparison is strict: `1000000` and `"1,000,000"` differ, and a missing
/// value differs from any present one.
pub fn differing_fields(a: &TradeTerms, b: &TradeTerms, fields: &[TradeField]) -> Vec<TradeField> {
    fields
        .iter()
        .copied()
        .filter(|f| a.field(*f) != b.field(*f))
        .collect()
}

fn has_differences(a: &TradeTerms, b: &TradeTerms, fields: &[TradeField]) -> bool {
    fields.iter().any(|f| a.field(*f) != b.field(*f))
}

/// Cell-level highlight: `field` of `email` differs from the selected trade.
///
/// Only rows pointing at the selected trade are ever highlighted, and only
/// against the selection's snapshot (not against every matched trade).
/// Rows without a usable inferred id never highlight.
pub fn is_mismatched(
    field: TradeField,
    email: &EmailMatch,
    selected_id: Option<&TradeId>,
    selected_terms: Option<&TradeTerms>,
) -> bool {
    let (Some(selected_id), Some(selected_terms)) = (selected_id, selected_terms) else {
        return false;
    };
    match email.trade_id() {
        Some(id) if id == selected_id => email.terms.field(field) != selected_terms.field(field),
        _ => false,
    }
}

/// Row-level highlight for the matched grid: the first email pointing at
/// `trade` differs on any of [`ROW_HIGHLIGHT_FIELDS`].
pub fn matched_row_has_difference(trade: &TradeRecord, emails: &[EmailMatch]) -> bool {
    emails
        .iter()
        .find(|e| e.inferred_trade_id.as_ref() == Some(&trade.trade_number))
        .is_some_and(|email| has_differences(&trade.terms, &email.terms, &ROW_HIGHLIGHT_FIELDS))
}

/// Row-level highlight for the email grid.
pub fn is_unrecognized_row(email: &EmailMatch) -> bool {
    email.is_unrecognized_product()
}
