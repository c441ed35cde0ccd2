use async_trait::async_trait;
use reqwest::Client;
#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use super::http_backend::ensure_success;
use super::traits::TradeDataSource;

/// Reads the JSON resources from a local directory (native only).
#[cfg(not(target_arch = "wasm32"))]
pub struct AssetDirSource {
    root: PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl AssetDirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[async_trait]
impl TradeDataSource for AssetDirSource {
    fn name(&self) -> &str {
        "AssetDir"
    }

    async fn fetch_resource(&self, resource: &str) -> Result<Vec<u8>, CoreError> {
        let path = self.root.join(resource);
        tokio::fs::read(&path)
            .await
            .map_err(|e| CoreError::FileIO(format!("{}: {e}", path.display())))
    }
}

/// Reads the JSON resources with `GET {base_url}/{resource}`.
///
/// Used when the shell serves the assets over HTTP instead of from disk.
pub struct HttpAssetSource {
    client: Client,
    base_url: String,
}

impl HttpAssetSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl TradeDataSource for HttpAssetSource {
    fn name(&self) -> &str {
        "HttpAssets"
    }

    async fn fetch_resource(&self, resource: &str) -> Result<Vec<u8>, CoreError> {
        let url = format!("{}/{resource}", self.base_url);
        let resp = self.client.get(&url).send().await?;
        let resp = ensure_success(resp, resource)?;
        let bytes = resp.bytes().await?;
        Ok(bytes.to_vec())
    }
}
