//! Storage error types.

/// Semantic error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// Folder or filename cannot form an object key.
    InvalidKey,
    /// File exceeds the configured size limit.
    TooLarge,
    /// File extension is not in the allow-list.
    UnsupportedType,
    /// Provider settings are missing or invalid.
    Misconfigured,
}

/// Storage error with semantic kind and provider context.
#[derive(Debug)]
pub struct StorageError {
    /// Semantic error category.
    pub kind: StorageErrorKind,
    /// Provider identifier (e.g., "s3", "azure").
    pub backend: Option<&'static str>,
    /// Object key or filename the error concerns.
    pub key: Option<String>,
    message: Option<String>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Create a new storage error.
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            backend: None,
            key: None,
            message: None,
            source: None,
        }
    }

    /// Attach key context.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attach provider identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach a human-readable message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Key rejected with a reason.
    #[must_use]
    pub fn invalid_key(key: impl Into<String>, reason: &str) -> Self {
        Self::new(StorageErrorKind::InvalidKey)
            .with_key(key)
            .with_message(reason)
    }

    /// Provider settings unusable.
    #[must_use]
    pub fn misconfigured(backend: &'static str, message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::Misconfigured)
            .with_backend(backend)
            .with_message(message)
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // "[backend] Kind: message (key: docs/a.pdf)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StorageErrorKind::InvalidKey => "Invalid key",
            StorageErrorKind::TooLarge => "File too large",
            StorageErrorKind::UnsupportedType => "Unsupported file type",
            StorageErrorKind::Misconfigured => "Misconfigured",
        };
        write!(f, "{kind_str}")?;

        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        } else if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(key) = &self.key {
            write!(f, " (key: {key})")?;
        }

        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}
