//! Provider implementations.

mod azure;
mod cdn;
mod gcs;
mod local;
mod s3;

pub use azure::AzureStorage;
pub use cdn::CdnStorage;
pub use gcs::GcsStorage;
pub use local::LocalStorage;
pub use s3::S3Storage;
