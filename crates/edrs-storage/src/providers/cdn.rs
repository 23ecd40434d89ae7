//! CDN front for any provider.

use crate::error::StorageError;
use crate::storage::FileStorage;
use crate::upload::{UploadRules, UploadTarget, join_url};

/// Serves public URLs from a CDN origin; uploads still go to the provider.
pub struct CdnStorage {
    inner: Box<dyn FileStorage>,
    cdn_url: String,
}

impl CdnStorage {
    #[must_use]
    pub fn new(inner: Box<dyn FileStorage>, cdn_url: impl Into<String>) -> Self {
        Self {
            inner,
            cdn_url: cdn_url.into(),
        }
    }
}

impl FileStorage for CdnStorage {
    fn backend(&self) -> &'static str {
        self.inner.backend()
    }

    fn rules(&self) -> &UploadRules {
        self.inner.rules()
    }

    fn object_key(&self, folder: &str, filename: &str) -> Result<String, StorageError> {
        self.inner.object_key(folder, filename)
    }

    fn public_url(&self, key: &str) -> String {
        join_url(&self.cdn_url, key)
    }

    fn upload_target(&self, key: &str, content_type: &str) -> UploadTarget {
        self.inner.upload_target(key, content_type)
    }
}
