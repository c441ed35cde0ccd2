use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::api::{
    ApiResponse, ClearFileRequest, ClearTarget, UndoStatusRequest, UpdateStatusRequest,
};

/// Where the three JSON collections are read from.
///
/// The desktop shell serves them as static files; tests use in-memory
/// fixtures. Implementations return the raw bytes of one resource
/// (`unmatched_trades.json`, `matched_trades.json`, `email_matches.json`);
/// decoding is done by the data store so every source fails the same way
/// on malformed content.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait TradeDataSource: Send + Sync {
    /// Human-readable name of this source (for logs/errors).
    fn name(&self) -> &str;

    async fn fetch_resource(&self, resource: &str) -> Result<Vec<u8>, CoreError>;
}

/// The confirmation backend that owns persisted status and the JSON files.
///
/// Contract for the JSON endpoints: a non-2xx response is an `Err`
/// ([`CoreError::Transport`]); a 2xx response is returned as-is even when
/// it declares `success: false`. Callers decide what a declared failure means.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait ConfirmationBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn update_email_status(
        &self,
        request: &UpdateStatusRequest,
    ) -> Result<ApiResponse, CoreError>;

    async fn undo_status_change(
        &self,
        request: &UndoStatusRequest,
    ) -> Result<ApiResponse, CoreError>;

    async fn clear_json_file(&self, request: &ClearFileRequest)
        -> Result<ApiResponse, CoreError>;

    /// Older body-less clear endpoints. Any 2xx counts as success.
    async fn clear_legacy(&self, target: ClearTarget) -> Result<(), CoreError>;
}
