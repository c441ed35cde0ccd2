use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::api::{UndoStatusRequest, UpdateStatusRequest};
use crate::models::email::EmailMatch;
use crate::models::status::StatusAction;
use crate::models::trade::TradeId;
use crate::providers::traits::ConfirmationBackend;
use crate::services::data_store::DataStore;

/// Outcome of an accepted status change.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub email_id: TradeId,
    pub action: StatusAction,
    /// Backend message, if it sent one.
    pub message: Option<String>,
    /// Whether the follow-up load replaced the collections.
    pub reloaded: bool,
}

/// Tag / resolve / undo on email rows.
///
/// Never touches local state: the backend is the source of truth and every
/// accepted change is followed by a full reload, so the displayed status is
/// always re-derived from what was persisted.
pub struct StatusService {
    backend: Arc<dyn ConfirmationBackend>,
}

impl StatusService {
    pub fn new(backend: Arc<dyn ConfirmationBackend>) -> Self {
        Self { backend }
    }

    /// Send `action` for `email` and reload `store` when the backend accepts it.
    ///
    /// # Errors
    ///
    /// - [`CoreError::ValidationError`] if the row has no inferred trade id
    ///   (nothing is sent).
    /// - [`CoreError::Transport`] / [`CoreError::Network`] on transport failure.
    /// - [`CoreError::Rejected`] with the backend's message on `success: false`.
    ///
    /// No reload happens on any error.
    pub async fn apply(
        &self,
        store: &DataStore,
        email: &EmailMatch,
        action: StatusAction,
    ) -> Result<StatusChange, CoreError> {
        let email_id = email.inferred_trade_id.clone().ok_or_else(|| {
            CoreError::ValidationError("email row has no inferred trade id".into())
        })?;

        tracing::info!(%email_id, %action, backend = self.backend.name(), "changing email status");
        let response = match action.target_status() {
            Some(status) => {
                self.backend
                    .update_email_status(&UpdateStatusRequest {
                        email_id: email_id.clone(),
                        status,
                    })
                    .await
            }
            None => {
                self.backend
                    .undo_status_change(&UndoStatusRequest {
                        email_id: email_id.clone(),
                    })
                    .await
            }
        };

        let message = match response.and_then(|r| r.into_result()) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(%email_id, %action, error = %e, "status change not applied");
                return Err(e);
            }
        };

        let reloaded = store.reload_after_change().await;
        Ok(StatusChange {
            email_id,
            action,
            message,
            reloaded,
        })
    }

    pub async fn tag(&self, store: &DataStore, email: &EmailMatch) -> Result<StatusChange, CoreError> {
        self.apply(store, email, StatusAction::Tag).await
    }

    pub async fn resolve(
        &self,
        store: &DataStore,
        email: &EmailMatch,
    ) -> Result<StatusChange, CoreError> {
        self.apply(store, email, StatusAction::Resolve).await
    }

    pub async fn undo(&self, store: &DataStore, email: &EmailMatch) -> Result<StatusChange, CoreError> {
        self.apply(store, email, StatusAction::Undo).await
    }
}
