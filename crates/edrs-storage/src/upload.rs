//! Object keys, upload rules and upload targets.

use std::fmt;

use edrs_config::StorageConfig;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::error::{StorageError, StorageErrorKind};

/// Characters left as-is in a URL path: unreserved plus `/`.
const PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// Characters left as-is in a query value.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode an object key for use in a URL path.
pub(crate) fn encode_path(key: &str) -> String {
    utf8_percent_encode(key, PATH_ENCODE_SET).to_string()
}

/// Percent-encode a value for use in a query string.
pub(crate) fn encode_query(value: &str) -> String {
    utf8_percent_encode(value, QUERY_ENCODE_SET).to_string()
}

/// Join a base URL and a key with exactly one slash.
pub(crate) fn join_url(base: &str, key: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        encode_path(key.trim_start_matches('/'))
    )
}

/// Build `folder/filename` as a normalized object key.
///
/// The folder may be empty or nested (`contracts/2024`). Characters outside
/// `[A-Za-z0-9._-]` in the filename are replaced with `_`.
///
/// # Errors
///
/// Returns [`StorageErrorKind::InvalidKey`] for empty filenames and for
/// `.`/`..` segments.
pub fn build_key(folder: &str, filename: &str) -> Result<String, StorageError> {
    let name: String = filename
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if name.is_empty() || name.chars().all(|c| c == '.') {
        return Err(StorageError::invalid_key(filename, "empty filename"));
    }

    let mut segments = Vec::new();
    for segment in folder.split(['/', '\\']).filter(|s| !s.is_empty()) {
        if segment == "." || segment == ".." {
            return Err(StorageError::invalid_key(
                folder,
                "relative segments not allowed",
            ));
        }
        segments.push(segment);
    }
    segments.push(name.as_str());

    Ok(segments.join("/"))
}

/// Size and type limits applied before any upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRules {
    /// Largest accepted upload in bytes.
    pub max_bytes: u64,
    /// Accepted extensions, lowercase, without the dot. Empty accepts all.
    pub allowed_extensions: Vec<String>,
}

impl UploadRules {
    /// Rules from the `[storage]` section.
    #[must_use]
    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            max_bytes: config.max_file_size_mb.saturating_mul(1024 * 1024),
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    /// Check `filename` and `size` against the rules.
    ///
    /// # Errors
    ///
    /// Returns [`StorageErrorKind::TooLarge`] or
    /// [`StorageErrorKind::UnsupportedType`].
    pub fn validate(&self, filename: &str, size: u64) -> Result<(), StorageError> {
        if size > self.max_bytes {
            return Err(StorageError::new(StorageErrorKind::TooLarge)
                .with_key(filename)
                .with_message(format!(
                    "{size} bytes exceeds limit of {} bytes",
                    self.max_bytes
                )));
        }

        if self.allowed_extensions.is_empty() {
            return Ok(());
        }

        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if !self.allowed_extensions.contains(&extension) {
            return Err(StorageError::new(StorageErrorKind::UnsupportedType)
                .with_key(filename)
                .with_message(format!(
                    "allowed: {}",
                    self.allowed_extensions.join(", ")
                )));
        }

        Ok(())
    }
}

/// HTTP method for an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMethod {
    Put,
    Post,
}

impl fmt::Display for UploadMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Put => "PUT",
            Self::Post => "POST",
        })
    }
}

/// Where and how to send file bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub method: UploadMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl UploadTarget {
    pub(crate) fn new(method: UploadMethod, url: String) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
        }
    }

    #[must_use]
    pub(crate) fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_owned(), value.into()));
        self
    }

    /// First value for `name`, case-insensitively.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
