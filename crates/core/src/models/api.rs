//! Request and response bodies of the confirmation backend endpoints.

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

use super::grid::GridId;
use super::status::ReconciliationStatus;
use super::trade::TradeId;

pub const UPDATE_EMAIL_STATUS_PATH: &str = "/update-email-status";
pub const UNDO_STATUS_CHANGE_PATH: &str = "/undo-status-change";
pub const CLEAR_JSON_FILE_PATH: &str = "/clear-json-file";

/// Body of `POST /update-email-status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub email_id: TradeId,
    pub status: ReconciliationStatus,
}

/// Body of `POST /undo-status-change`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoStatusRequest {
    pub email_id: TradeId,
}

/// A collection the backend can wipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearTarget {
    MatchedTrades,
    EmailMatches,
}

impl ClearTarget {
    /// `fileType` value sent to `/clear-json-file`.
    pub fn file_type(&self) -> &'static str {
        match self {
            ClearTarget::MatchedTrades => "matched_trades",
            ClearTarget::EmailMatches => "email_matches",
        }
    }

    /// Body-less endpoint of the older API.
    pub fn legacy_path(&self) -> &'static str {
        match self {
            ClearTarget::MatchedTrades => "/clear-matched-trades",
            ClearTarget::EmailMatches => "/clear-email-matches",
        }
    }

    pub fn grid(&self) -> GridId {
        match self {
            ClearTarget::MatchedTrades => GridId::Matched,
            ClearTarget::EmailMatches => GridId::EmailMatches,
        }
    }

    /// Question the shell must get a "yes" to before clearing.
    pub fn confirmation_prompt(&self) -> &'static str {
        match self {
            ClearTarget::MatchedTrades => {
                "Are you sure you want to clear all matched trades? This action cannot be undone."
            }
            ClearTarget::EmailMatches => {
                "Are you sure you want to clear all email matches? This action cannot be undone."
            }
        }
    }
}

impl std::fmt::Display for ClearTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_type())
    }
}

/// Body of `POST /clear-json-file`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearFileRequest {
    pub file_type: ClearTarget,
}

/// Envelope every JSON endpoint answers with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }

    /// Turn a declared failure into [`CoreError::Rejected`], keeping the
    /// backend's message verbatim.
    pub fn into_result(self) -> Result<Option<String>, CoreError> {
        if self.success {
            Ok(self.message)
        } else {
            Err(CoreError::Rejected(
                self.message
                    .unwrap_or_else(|| "no reason given by the server".to_string()),
            ))
        }
    }
}
