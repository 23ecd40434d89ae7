//! Google Cloud Storage.

use edrs_config::GcsStorageConfig;

use crate::storage::FileStorage;
use crate::upload::{UploadMethod, UploadRules, UploadTarget, encode_query, join_url};

const PUBLIC_HOST: &str = "https://storage.googleapis.com";

/// GCS bucket.
#[derive(Debug, Clone)]
pub struct GcsStorage {
    bucket: String,
    rules: UploadRules,
}

impl GcsStorage {
    #[must_use]
    pub fn new(config: &GcsStorageConfig, rules: UploadRules) -> Self {
        Self {
            bucket: config.bucket.clone(),
            rules,
        }
    }
}

impl FileStorage for GcsStorage {
    fn backend(&self) -> &'static str {
        "gcs"
    }

    fn rules(&self) -> &UploadRules {
        &self.rules
    }

    fn public_url(&self, key: &str) -> String {
        join_url(&format!("{PUBLIC_HOST}/{}", self.bucket), key)
    }

    fn upload_target(&self, key: &str, content_type: &str) -> UploadTarget {
        let url = format!(
            "{PUBLIC_HOST}/upload/storage/v1/b/{}/o?uploadType=media&name={}",
            self.bucket,
            encode_query(key)
        );
        UploadTarget::new(UploadMethod::Post, url).header("Content-Type", content_type)
    }
}
