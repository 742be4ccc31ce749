//! Cloudflare Images integration
//!
//! Creates, lists and deletes hosted images and composes the public
//! delivery URL for a freshly uploaded asset.

pub mod client;
pub mod mime;
pub mod mock;

pub use client::CloudflareImagesClient;
pub use mock::MockImageHost;

use crate::models::{RemoteAsset, DELIVERY_BASE_URL};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ImageHostService: Send + Sync {
    /// Upload `data` and return its delivery URL.
    async fn upload_image(&self, data: &[u8], file_name: &str) -> Result<String>;
    async fn list_images(&self) -> Result<Vec<RemoteAsset>>;
    async fn delete_image(&self, id: &str) -> Result<()>;
}

/// `https://imagedelivery.net/<account_hash>/<asset_id>/<variant>`.
///
/// The variant may be given with or without its leading slash.
pub fn delivery_url(account_hash: &str, asset_id: &str, variant: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        DELIVERY_BASE_URL,
        account_hash,
        asset_id,
        variant.trim_start_matches('/')
    )
}
