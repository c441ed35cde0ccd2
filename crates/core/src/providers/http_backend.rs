use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::api::{
    ApiResponse, ClearFileRequest, ClearTarget, UndoStatusRequest, UpdateStatusRequest,
    CLEAR_JSON_FILE_PATH, UNDO_STATUS_CHANGE_PATH, UPDATE_EMAIL_STATUS_PATH,
};
use super::traits::ConfirmationBackend;

/// Confirmation backend reached over JSON/HTTP.
///
/// - **Endpoints**: `/update-email-status`, `/undo-status-change`,
///   `/clear-json-file`, plus the legacy `/clear-matched-trades` and
///   `/clear-email-matches`.
/// - **Method**: `POST` with a JSON body (legacy endpoints: no body).
/// - **Errors**: non-2xx → [`CoreError::Transport`]; connection failures →
///   [`CoreError::Network`]; unreadable body → [`CoreError::Deserialization`].
pub struct HttpConfirmationBackend {
    client: Client,
    base_url: String,
}

impl HttpConfirmationBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self, CoreError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(CoreError::Config(format!(
                "backend URL must start with http:// or https://, got '{base_url}'"
            )));
        }

        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        Ok(Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, CoreError> {
        let resp = self.client.post(self.url(path)).json(body).send().await?;
        let resp = ensure_success(resp, path)?;

        resp.json::<ApiResponse>()
            .await
            .map_err(|e| CoreError::Deserialization(format!("Unexpected response from {path}: {e}")))
    }
}

/// Map a non-2xx status to [`CoreError::Transport`].
pub(crate) fn ensure_success(resp: Response, endpoint: &str) -> Result<Response, CoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    tracing::error!(endpoint, status = status.as_u16(), "backend returned an error status");
    Err(CoreError::Transport {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("").to_string(),
    })
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl ConfirmationBackend for HttpConfirmationBackend {
    fn name(&self) -> &str {
        "ConfirmationBackend"
    }

    async fn update_email_status(
        &self,
        request: &UpdateStatusRequest,
    ) -> Result<ApiResponse, CoreError> {
        self.post_json(UPDATE_EMAIL_STATUS_PATH, request).await
    }

    async fn undo_status_change(
        &self,
        request: &UndoStatusRequest,
    ) -> Result<ApiResponse, CoreError> {
        self.post_json(UNDO_STATUS_CHANGE_PATH, request).await
    }

    async fn clear_json_file(
        &self,
        request: &ClearFileRequest,
    ) -> Result<ApiResponse, CoreError> {
        self.post_json(CLEAR_JSON_FILE_PATH, request).await
    }

    async fn clear_legacy(&self, target: ClearTarget) -> Result<(), CoreError> {
        let path = target.legacy_path();
        let resp = self.client.post(self.url(path)).send().await?;
        ensure_success(resp, path)?;
        Ok(())
    }
}
