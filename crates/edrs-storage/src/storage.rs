//! Provider trait.

use crate::error::StorageError;
use crate::upload::{UploadRules, UploadTarget, build_key};

/// File storage provider.
///
/// One implementation per backend, chosen once from configuration by
/// [`crate::from_config`]. Implementations only compute keys, URLs and upload
/// targets; moving bytes is left to the caller.
pub trait FileStorage: Send + Sync {
    /// Provider identifier (e.g., "local", "s3").
    fn backend(&self) -> &'static str;

    /// Limits applied by [`FileStorage::validate_upload`].
    fn rules(&self) -> &UploadRules;

    /// Object key for `filename` inside `folder`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the folder or filename cannot form a key.
    fn object_key(&self, folder: &str, filename: &str) -> Result<String, StorageError> {
        build_key(folder, filename).map_err(|err| err.with_backend(self.backend()))
    }

    /// Public URL of the object at `key`.
    fn public_url(&self, key: &str) -> String;

    /// Request that uploads an object to `key`.
    fn upload_target(&self, key: &str, content_type: &str) -> UploadTarget;

    /// Check a file before upload.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the file is too large or of a disallowed type.
    fn validate_upload(&self, filename: &str, size: u64) -> Result<(), StorageError> {
        self.rules()
            .validate(filename, size)
            .map_err(|err| err.with_backend(self.backend()))
    }
}
