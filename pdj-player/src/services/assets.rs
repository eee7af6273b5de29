//! Asset fetching and decoding
//!
//! The transport resolves a clip's asset reference to decoded audio through
//! the [`AssetProvider`] seam; production fetches the preview URL over HTTP
//! and decodes it, tests substitute synthetic assets.

use crate::audio::{decode_bytes, DecodedAsset};
use crate::error::{Error, Result};
use std::future::Future;
use tracing::debug;

/// Resolves an asset reference to decoded audio.
pub trait AssetProvider: Send + Sync + 'static {
    /// Fetch and decode the asset behind `asset_ref`
    fn fetch(&self, asset_ref: &str) -> impl Future<Output = Result<DecodedAsset>> + Send;
}

/// Fetches preview assets over HTTP and decodes them.
///
/// Assets are fetched fresh per play action; preview clips are small and
/// the remote CDN handles caching.
pub struct HttpAssetProvider {
    http: reqwest::Client,
}

impl HttpAssetProvider {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

impl Default for HttpAssetProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetProvider for HttpAssetProvider {
    async fn fetch(&self, asset_ref: &str) -> Result<DecodedAsset> {
        debug!("fetching asset {}", asset_ref);

        let response = self.http.get(asset_ref).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::NetworkFailure(format!(
                "asset fetch returned {} for {}",
                status, asset_ref
            )));
        }

        let bytes = response.bytes().await?.to_vec();
        let hint = extension_hint(asset_ref);

        // Decoding is CPU-bound; keep it off the event loop
        let asset =
            tokio::task::spawn_blocking(move || decode_bytes(bytes, hint.as_deref()))
                .await
                .map_err(|e| Error::Internal(format!("decode task failed: {}", e)))??;

        Ok(asset)
    }
}

/// File extension from an asset URL, if it carries a recognizable one
fn extension_hint(asset_ref: &str) -> Option<String> {
    let path = asset_ref.split(['?', '#']).next().unwrap_or(asset_ref);
    let ext = path.rsplit('.').next()?;
    if ext.len() <= 4 && !ext.contains('/') && ext != path {
        Some(ext.to_ascii_lowercase())
    } else {
        None
    }
}
