//! File storage providers for EDRS document uploads.
//!
//! The `[storage]` section of `edrs.toml` names one provider. [`from_config`]
//! turns it into a [`FileStorage`] once, at startup; callers never branch on
//! the provider name afterwards.
//!
//! Providers compute object keys, public URLs and upload requests. They do not
//! transfer bytes themselves.
//!
//! # Example
//!
//! ```ignore
//! use edrs_config::Config;
//!
//! let config = Config::load(None, None)?;
//! let storage = edrs_storage::from_config(config.require_storage()?, "http://localhost:8000")?;
//!
//! storage.validate_upload("lease.pdf", 120_000)?;
//! let key = storage.object_key("contracts", "lease.pdf")?;
//! println!("{}", storage.public_url(&key));
//! ```

mod error;
mod providers;
mod storage;
mod upload;

use edrs_config::{StorageConfig, StorageProvider};
use tracing::debug;

pub use error::{StorageError, StorageErrorKind};
pub use providers::{AzureStorage, CdnStorage, GcsStorage, LocalStorage, S3Storage};
pub use storage::FileStorage;
pub use upload::{UploadMethod, UploadRules, UploadTarget, build_key};

/// Build the provider selected by `config`.
///
/// `origin` is the backend origin that relative `local` URLs resolve against.
/// A configured `cdn_url` wraps the provider in [`CdnStorage`].
///
/// # Errors
///
/// Returns [`StorageErrorKind::Misconfigured`] if the storage section does not
/// validate.
pub fn from_config(
    config: &StorageConfig,
    origin: &str,
) -> Result<Box<dyn FileStorage>, StorageError> {
    let backend = provider_name(config.provider);
    config.validate().map_err(|err| {
        StorageError::new(StorageErrorKind::Misconfigured)
            .with_backend(backend)
            .with_source(err)
    })?;

    let rules = UploadRules::from_config(config);
    let missing = || StorageError::misconfigured(backend, format!("[storage.{backend}] missing"));

    let storage: Box<dyn FileStorage> = match config.provider {
        StorageProvider::Local => Box::new(LocalStorage::new(
            origin,
            &config.local.upload_url,
            &config.local.media_url,
            rules,
        )),
        StorageProvider::S3 => Box::new(S3Storage::new(
            config.s3.as_ref().ok_or_else(missing)?,
            config.encryption,
            rules,
        )),
        StorageProvider::Azure => Box::new(AzureStorage::new(
            config.azure.as_ref().ok_or_else(missing)?,
            rules,
        )),
        StorageProvider::Gcs => Box::new(GcsStorage::new(
            config.gcs.as_ref().ok_or_else(missing)?,
            rules,
        )),
    };

    debug!(
        provider = backend,
        cdn = config.cdn_url.as_deref().unwrap_or(""),
        encryption = config.encryption,
        "file storage selected"
    );

    Ok(match &config.cdn_url {
        Some(cdn) => Box::new(CdnStorage::new(storage, cdn.as_str())),
        None => storage,
    })
}

fn provider_name(provider: StorageProvider) -> &'static str {
    match provider {
        StorageProvider::Local => "local",
        StorageProvider::S3 => "s3",
        StorageProvider::Azure => "azure",
        StorageProvider::Gcs => "gcs",
    }
}

#[cfg(test)]
mod tests {
    use edrs_config::{AzureStorageConfig, S3StorageConfig};
    use pretty_assertions::assert_eq;

    use super::*;

    const ORIGIN: &str = "http://localhost:8000";

    #[test]
    fn test_default_is_local() {
        let storage = from_config(&StorageConfig::default(), ORIGIN).unwrap();
        assert_eq!(storage.backend(), "local");
        assert_eq!(
            storage.public_url("a.pdf"),
            "http://localhost:8000/media/a.pdf"
        );
    }

    #[test]
    fn test_s3_with_encryption() {
        let config = StorageConfig {
            provider: StorageProvider::S3,
            encryption: true,
            s3: Some(S3StorageConfig {
                bucket: "edrs-docs".to_owned(),
                region: "us-east-1".to_owned(),
                endpoint: None,
                access_key_id: None,
                secret_access_key: None,
            }),
            ..StorageConfig::default()
        };

        let storage = from_config(&config, ORIGIN).unwrap();
        let target = storage.upload_target("a.pdf", "application/pdf");

        assert_eq!(storage.backend(), "s3");
        assert_eq!(
            target.header_value("x-amz-server-side-encryption"),
            Some("AES256")
        );
    }

    #[test]
    fn test_cdn_wraps_provider() {
        let config = StorageConfig {
            provider: StorageProvider::Azure,
            cdn_url: Some("https://cdn.example.com".to_owned()),
            azure: Some(AzureStorageConfig {
                account: "edrsfiles".to_owned(),
                container: "documents".to_owned(),
                sas_token: None,
            }),
            ..StorageConfig::default()
        };

        let storage = from_config(&config, ORIGIN).unwrap();

        assert_eq!(storage.backend(), "azure");
        assert_eq!(
            storage.public_url("contracts/a.pdf"),
            "https://cdn.example.com/contracts/a.pdf"
        );
    }

    #[test]
    fn test_missing_section_is_misconfigured() {
        let config = StorageConfig {
            provider: StorageProvider::Gcs,
            ..StorageConfig::default()
        };

        let err = from_config(&config, ORIGIN).err().unwrap();

        assert_eq!(err.kind, StorageErrorKind::Misconfigured);
        assert_eq!(err.backend, Some("gcs"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().starts_with("[gcs] Misconfigured: "));
    }

    #[test]
    fn test_validate_upload_tags_backend() {
        let storage = from_config(&StorageConfig::default(), ORIGIN).unwrap();

        let err = storage.validate_upload("virus.exe", 10).unwrap_err();

        assert_eq!(err.kind, StorageErrorKind::UnsupportedType);
        assert_eq!(err.backend, Some("local"));
        assert!(storage.validate_upload("lease.pdf", 10).is_ok());
    }

    #[test]
    fn test_object_key_through_trait() {
        let storage = from_config(&StorageConfig::default(), ORIGIN).unwrap();
        assert_eq!(
            storage.object_key("contracts", "Lease 2024.pdf").unwrap(),
            "contracts/Lease_2024.pdf"
        );
    }
}
