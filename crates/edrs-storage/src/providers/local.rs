//! Backend-hosted storage.

use crate::storage::FileStorage;
use crate::upload::{UploadMethod, UploadRules, UploadTarget, encode_query, join_url};

/// Files uploaded through the EDRS backend and served from its media path.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    upload_url: String,
    media_url: String,
    rules: UploadRules,
}

impl LocalStorage {
    /// `upload_url` and `media_url` may be absolute or relative to `origin`.
    #[must_use]
    pub fn new(origin: &str, upload_url: &str, media_url: &str, rules: UploadRules) -> Self {
        Self {
            upload_url: absolutize(origin, upload_url),
            media_url: absolutize(origin, media_url),
            rules,
        }
    }
}

fn absolutize(origin: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_owned()
    } else {
        format!(
            "{}/{}",
            origin.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }
}

impl FileStorage for LocalStorage {
    fn backend(&self) -> &'static str {
        "local"
    }

    fn rules(&self) -> &UploadRules {
        &self.rules
    }

    fn public_url(&self, key: &str) -> String {
        join_url(&self.media_url, key)
    }

    fn upload_target(&self, key: &str, _content_type: &str) -> UploadTarget {
        // Multipart body; the backend sets the part's content type.
        let separator = if self.upload_url.contains('?') { '&' } else { '?' };
        let url = format!("{}{separator}key={}", self.upload_url, encode_query(key));
        UploadTarget::new(UploadMethod::Post, url)
    }
}
