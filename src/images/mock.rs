use super::{delivery_url, ImageHostService};
use crate::models::RemoteAsset;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// In-memory stand-in for the Images API. Clones share state.
#[derive(Clone)]
pub struct MockImageHost {
    assets: Arc<Mutex<Vec<RemoteAsset>>>,
    uploads: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    deleted: Arc<Mutex<Vec<String>>>,
    failing_deletes: Arc<Mutex<HashSet<String>>>,
    fail_uploads: Arc<Mutex<bool>>,
    fail_listing: Arc<Mutex<bool>>,
    account_hash: String,
    variant: String,
}

impl MockImageHost {
    pub fn new() -> Self {
        Self {
            assets: Arc::new(Mutex::new(Vec::new())),
            uploads: Arc::new(Mutex::new(Vec::new())),
            deleted: Arc::new(Mutex::new(Vec::new())),
            failing_deletes: Arc::new(Mutex::new(HashSet::new())),
            fail_uploads: Arc::new(Mutex::new(false)),
            fail_listing: Arc::new(Mutex::new(false)),
            account_hash: "mock-hash".to_string(),
            variant: "/public".to_string(),
        }
    }

    pub fn with_delivery(mut self, account_hash: String, variant: String) -> Self {
        self.account_hash = account_hash;
        self.variant = variant;
        self
    }

    pub fn with_asset(self, asset: RemoteAsset) -> Self {
        self.assets.lock().unwrap().push(asset);
        self
    }

    pub fn with_failing_delete(self, id: &str) -> Self {
        self.failing_deletes.lock().unwrap().insert(id.to_string());
        self
    }

    pub fn with_upload_failure(self, fail: bool) -> Self {
        *self.fail_uploads.lock().unwrap() = fail;
        self
    }

    pub fn with_listing_failure(self, fail: bool) -> Self {
        *self.fail_listing.lock().unwrap() = fail;
        self
    }

    pub fn get_upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    /// File names of every upload, in call order.
    pub fn get_uploaded_names(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Ids of every delete call that succeeded, in call order.
    pub fn get_deleted_ids(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

impl Default for MockImageHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageHostService for MockImageHost {
    async fn upload_image(&self, data: &[u8], file_name: &str) -> Result<String> {
        if *self.fail_uploads.lock().unwrap() {
            return Err(Error::Upload("Mock upload failure".to_string()));
        }

        let mut uploads = self.uploads.lock().unwrap();
        uploads.push((file_name.to_string(), data.to_vec()));
        let id = format!("mock-{}", uploads.len());
        Ok(delivery_url(&self.account_hash, &id, &self.variant))
    }

    async fn list_images(&self) -> Result<Vec<RemoteAsset>> {
        if *self.fail_listing.lock().unwrap() {
            return Err(Error::RemoteApi("Mock listing failure".to_string()));
        }
        Ok(self.assets.lock().unwrap().clone())
    }

    async fn delete_image(&self, id: &str) -> Result<()> {
        if self.failing_deletes.lock().unwrap().contains(id) {
            return Err(Error::RemoteApi(format!("Mock delete failure for {}", id)));
        }

        self.assets.lock().unwrap().retain(|asset| asset.id != id);
        self.deleted.lock().unwrap().push(id.to_string());
        Ok(())
    }
}
