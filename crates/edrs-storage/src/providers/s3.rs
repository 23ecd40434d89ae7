//! Amazon S3 and S3-compatible services.

use edrs_config::S3StorageConfig;

use crate::storage::FileStorage;
use crate::upload::{UploadMethod, UploadRules, UploadTarget, join_url};

/// Server-side encryption request header.
const SSE_HEADER: &str = "x-amz-server-side-encryption";

/// S3 bucket.
///
/// Without a custom endpoint, URLs use virtual-hosted style
/// (`https://{bucket}.s3.{region}.amazonaws.com/{key}`). With one, path style
/// (`{endpoint}/{bucket}/{key}`), which S3-compatible services expect.
#[derive(Debug, Clone)]
pub struct S3Storage {
    base: String,
    encryption: bool,
    rules: UploadRules,
}

impl S3Storage {
    #[must_use]
    pub fn new(config: &S3StorageConfig, encryption: bool, rules: UploadRules) -> Self {
        let base = match &config.endpoint {
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), config.bucket),
            None => format!(
                "https://{}.s3.{}.amazonaws.com",
                config.bucket, config.region
            ),
        };
        Self {
            base,
            encryption,
            rules,
        }
    }
}

impl FileStorage for S3Storage {
    fn backend(&self) -> &'static str {
        "s3"
    }

    fn rules(&self) -> &UploadRules {
        &self.rules
    }

    fn public_url(&self, key: &str) -> String {
        join_url(&self.base, key)
    }

    fn upload_target(&self, key: &str, content_type: &str) -> UploadTarget {
        let target = UploadTarget::new(UploadMethod::Put, join_url(&self.base, key))
            .header("Content-Type", content_type);
        if self.encryption {
            target.header(SSE_HEADER, "AES256")
        } else {
            target
        }
    }
}
