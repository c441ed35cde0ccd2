use std::cmp::Ordering;

use crate::models::email::EmailMatch;
use crate::models::grid::{GridId, GridRow, SortRequest};
use crate::models::trade::{TradeId, TradeRecord, TradeTerms};

/// Which trade is selected and the terms mismatches are measured against.
///
/// Ephemeral view state: reset whenever the collections are reloaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    pub selected_id: Option<TradeId>,
    pub selected_terms: Option<TradeTerms>,
}

impl SelectionState {
    pub fn is_selected(&self, id: Option<&TradeId>) -> bool {
        self.selected_id.is_some() && self.selected_id.as_ref() == id
    }
}

/// Input to [`reduce`].
#[derive(Debug, Clone, Copy)]
pub enum SelectionAction<'a> {
    /// A row of the matched grid was clicked.
    SelectMatched(&'a TradeRecord),
    /// A row of the email grid was clicked.
    SelectEmail(&'a EmailMatch),
    Clear,
}

/// New selection plus the re-sorts the renderer must apply.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionUpdate {
    pub state: SelectionState,
    pub resorts: Vec<SortRequest>,
}

/// Selection reducer: action → new state + resort requests.
///
/// The new state never depends on the previous one. Re-sorts are requested on every click, even when the selection does not
/// change. `matched` is only consulted for [`SelectionAction::SelectEmail`],
/// to find the trade the email points at; when there is none the email's
/// own terms become the baseline, so its cells never show as mismatched.
pub fn reduce(action: SelectionAction<'_>, matched: &[TradeRecord]) -> SelectionUpdate {
    match action {
        SelectionAction::SelectMatched(trade) => SelectionUpdate {
            state: SelectionState {
                selected_id: Some(trade.trade_number.clone()),
                selected_terms: Some(trade.terms.clone()),
            },
            resorts: vec![
                SortRequest::by_trade_id(GridId::Unmatched),
                SortRequest::by_trade_id(GridId::EmailMatches),
            ],
        },
        SelectionAction::SelectEmail(email) => {
            let selected_id = email.inferred_trade_id.clone();
            let baseline = selected_id
                .as_ref()
                .and_then(|id| matched.iter().find(|t| &t.trade_number == id))
                .map(|t| t.terms.clone())
                .unwrap_or_else(|| email.terms.clone());
            SelectionUpdate {
                state: SelectionState {
                    selected_id,
                    selected_terms: Some(baseline),
                },
                resorts: vec![
                    SortRequest::by_trade_id(GridId::Unmatched),
                    SortRequest::by_trade_id(GridId::Matched),
                ],
            }
        }
        SelectionAction::Clear => SelectionUpdate {
            state: SelectionState::default(),
            resorts: Vec::new(),
        },
    }
}

/// Comparator for the trade-id column: the selected id always sorts first,
/// everything else in natural order (numbers, then text, missing ids last).
///
/// Two selected rows compare by natural order too, so this stays a total order.
pub fn compare_selected_first(
    a: Option<&TradeId>,
    b: Option<&TradeId>,
    selected: Option<&TradeId>,
) -> Ordering {
    let a_selected = selected.is_some() && a == selected;
    let b_selected = selected.is_some() && b == selected;
    match (a_selected, b_selected) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => natural_order(a, b),
    }
}

fn natural_order(a: Option<&TradeId>, b: Option<&TradeId>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Rows ordered ascending by id with the selected id on top. Stable.
pub fn order_rows<'a, R: GridRow>(rows: &'a [R], selected: Option<&TradeId>) -> Vec<&'a R> {
    let mut ordered: Vec<&R> = rows.iter().collect();
    ordered.sort_by(|a, b| compare_selected_first(a.row_id(), b.row_id(), selected));
    ordered
}
