use futures_util::future::try_join3;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::errors::CoreError;
use crate::models::api::{ClearFileRequest, ClearTarget};
use crate::models::grid::GridId;
use crate::models::snapshot::TradeSnapshot;
use crate::providers::traits::{ConfirmationBackend, TradeDataSource};

/// Result of a [`DataStore::load`] call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// All three collections were fetched and replaced.
    Loaded,
    /// Another load was already in flight; nothing was fetched.
    Skipped,
}

/// What a successful clear reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearReport {
    pub target: ClearTarget,
    /// Backend message, shown to the user.
    pub message: String,
    /// Whether the follow-up load replaced the collections.
    pub reloaded: bool,
}

/// Holds the three collections and keeps them consistent with the backend.
///
/// - `load()` fetches the three resources concurrently and commits them
///   together, or not at all.
/// - A `load()` issued while one is in flight returns
///   [`LoadOutcome::Skipped`]; there is no queue.
/// - On failure the previous snapshot stays in place.
pub struct DataStore {
    source: Box<dyn TradeDataSource>,
    backend: Arc<dyn ConfirmationBackend>,
    snapshot: RwLock<Arc<TradeSnapshot>>,
    refreshing: AtomicBool,
}

/// Clears the in-flight flag on every exit path, including early `?` returns.
struct RefreshGuard<'a>(&'a AtomicBool);

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl DataStore {
    pub fn new(source: Box<dyn TradeDataSource>, backend: Arc<dyn ConfirmationBackend>) -> Self {
        Self {
            source,
            backend,
            snapshot: RwLock::new(Arc::new(TradeSnapshot::default())),
            refreshing: AtomicBool::new(false),
        }
    }

    /// The collections as of the last successful load.
    pub fn snapshot(&self) -> Arc<TradeSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    /// Fetch all three collections and replace them atomically.
    pub async fn load(&self) -> Result<LoadOutcome, CoreError> {
        if self.refreshing.swap(true, Ordering::AcqRel) {
            tracing::debug!("load already in flight, skipping");
            return Ok(LoadOutcome::Skipped);
        }
        let _guard = RefreshGuard(&self.refreshing);

        let fetched = try_join3(
            self.source.fetch_resource(GridId::Unmatched.resource()),
            self.source.fetch_resource(GridId::Matched.resource()),
            self.source.fetch_resource(GridId::EmailMatches.resource()),
        )
        .await;
        let (unmatched, matched, email_matches) = match fetched {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(source = self.source.name(), error = %e, "failed to fetch trade data");
                return Err(e);
            }
        };

        let snapshot = match decode_snapshot(&unmatched, &matched, &email_matches) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!(source = self.source.name(), error = %e, "failed to decode trade data");
                return Err(e);
            }
        };

        tracing::info!(
            unmatched = snapshot.unmatched.len(),
            matched = snapshot.matched.len(),
            email_matches = snapshot.email_matches.len(),
            "trade data loaded"
        );
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(snapshot);
        Ok(LoadOutcome::Loaded)
    }

    /// Reload after a successful remote change. Failures are logged only;
    /// the previous data stays visible. Returns whether the data was replaced.
    pub async fn reload_after_change(&self) -> bool {
        match self.load().await {
            Ok(LoadOutcome::Loaded) => true,
            Ok(LoadOutcome::Skipped) => false,
            Err(e) => {
                tracing::warn!(error = %e, "reload after change failed, keeping stale data");
                false
            }
        }
    }

    /// Ask the backend to wipe a collection, then reload.
    ///
    /// Destructive; the shell must confirm with the user first
    /// ([`ClearTarget::confirmation_prompt`]).
    pub async fn clear(&self, target: ClearTarget) -> Result<ClearReport, CoreError> {
        tracing::info!(%target, "clearing collection");
        let response = self
            .backend
            .clear_json_file(&ClearFileRequest { file_type: target })
            .await?;
        let message = match response.into_result() {
            Ok(message) => message.unwrap_or_else(|| format!("{target} cleared")),
            Err(e) => {
                tracing::warn!(%target, error = %e, "backend refused to clear collection");
                return Err(e);
            }
        };

        let reloaded = self.reload_after_change().await;
        Ok(ClearReport {
            target,
            message,
            reloaded,
        })
    }

    /// Clear through the older body-less endpoints, then reload.
    pub async fn clear_legacy(&self, target: ClearTarget) -> Result<ClearReport, CoreError> {
        tracing::info!(%target, "clearing collection (legacy endpoint)");
        self.backend.clear_legacy(target).await?;
        let reloaded = self.reload_after_change().await;
        Ok(ClearReport {
            target,
            message: format!("{target} cleared"),
            reloaded,
        })
    }
}

fn decode_snapshot(
    unmatched: &[u8],
    matched: &[u8],
    email_matches: &[u8],
) -> Result<TradeSnapshot, CoreError> {
    Ok(TradeSnapshot {
        unmatched: decode(GridId::Unmatched, unmatched)?,
        matched: decode(GridId::Matched, matched)?,
        email_matches: decode(GridId::EmailMatches, email_matches)?,
    })
}

fn decode<T: DeserializeOwned>(grid: GridId, bytes: &[u8]) -> Result<Vec<T>, CoreError> {
    // A freshly cleared file may be completely empty.
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(bytes)
        .map_err(|e| CoreError::Deserialization(format!("{}: {e}", grid.resource())))
}
