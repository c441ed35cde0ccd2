use serde::{Deserialize, Serialize};

use super::email::EmailMatch;
use super::grid::GridId;
use super::trade::{TradeId, TradeRecord};

/// The three collections as of one load. Always replaced as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeSnapshot {
    pub unmatched: Vec<TradeRecord>,
    pub matched: Vec<TradeRecord>,
    pub email_matches: Vec<EmailMatch>,
}

impl TradeSnapshot {
    /// Trade rows of a trade grid; empty for [`GridId::EmailMatches`].
    pub fn trades(&self, grid: GridId) -> &[TradeRecord] {
        match grid {
            GridId::Unmatched => &self.unmatched,
            GridId::Matched => &self.matched,
            GridId::EmailMatches => &[],
        }
    }

    /// First matched trade carrying `trade_number`.
    pub fn find_matched(&self, trade_number: &TradeId) -> Option<&TradeRecord> {
        self.matched.iter().find(|t| &t.trade_number == trade_number)
    }
}
