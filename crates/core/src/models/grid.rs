use serde::{Deserialize, Serialize};

use super::field::FieldValue;
use super::trade::TradeId;

/// One of the three synchronized tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridId {
    /// Trades with no email evidence yet ("Murex Data").
    Unmatched,
    /// Trades believed to correspond to an email ("Probable Murex Matches").
    Matched,
    /// Trade data extracted from emails ("Email Data").
    EmailMatches,
}

impl GridId {
    pub const ALL: [GridId; 3] = [GridId::Matched, GridId::EmailMatches, GridId::Unmatched];

    /// Column holding the trade identifier in this grid.
    pub fn id_column(&self) -> &'static str {
        match self {
            GridId::Unmatched | GridId::Matched => "TradeNumber",
            GridId::EmailMatches => "InferredTradeID",
        }
    }

    /// Static JSON resource backing this grid.
    pub fn resource(&self) -> &'static str {
        match self {
            GridId::Unmatched => "unmatched_trades.json",
            GridId::Matched => "matched_trades.json",
            GridId::EmailMatches => "email_matches.json",
        }
    }
}

impl std::fmt::Display for GridId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridId::Unmatched => write!(f, "unmatched"),
            GridId::Matched => write!(f, "matched"),
            GridId::EmailMatches => write!(f, "email_matches"),
        }
    }
}

/// Ask the renderer to sort a grid ascending by one column, clearing any
/// other sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortRequest {
    pub grid: GridId,
    pub column: &'static str,
}

impl SortRequest {
    /// Ascending sort on the grid's trade-identifier column.
    pub fn by_trade_id(grid: GridId) -> Self {
        Self {
            grid,
            column: grid.id_column(),
        }
    }
}

/// Row access the filter and ordering rules need, independent of the record type.
pub trait GridRow {
    /// Identifier used for selection and ordering.
    fn row_id(&self) -> Option<&TradeId>;

    /// Cell value by column id; `None` if the row has no such column.
    fn column(&self, column_id: &str) -> Option<FieldValue<'_>>;
}
