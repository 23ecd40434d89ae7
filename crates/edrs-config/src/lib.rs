//! Configuration management for the EDRS client.
//!
//! Parses `edrs.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `api.development_url`, `api.production_url`
//! - `storage.cdn_url`
//! - `storage.local.*`, `storage.s3.*`, `storage.azure.*`, `storage.gcs.*`

mod expand;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override environment mode.
    pub mode: Option<Mode>,
    /// Override API origin for whichever mode is active.
    pub api_url: Option<String>,
    /// Override retry budget.
    pub max_retries: Option<u32>,
    /// Override session file location.
    pub session_path: Option<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "edrs.toml";

/// Upper bound for `api.max_retries`.
const MAX_RETRIES: u32 = 10;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend API configuration.
    pub api: ApiConfig,
    /// Session configuration (paths are relative strings from TOML).
    session: SessionConfigRaw,
    /// File storage configuration.
    pub storage: StorageConfig,

    /// Resolved session configuration (set after loading).
    #[serde(skip)]
    pub session_resolved: SessionConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Execution environment the client targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Local development backend, short timeouts.
    #[default]
    #[serde(alias = "dev")]
    Development,
    /// Deployed backend, long timeouts.
    #[serde(alias = "prod")]
    Production,
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ConfigError::Validation(format!(
                "unknown mode '{other}', expected development or production"
            ))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
        }
    }
}

/// Backend API configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Mode used when `EDRS_MODE` is not set.
    pub mode: Mode,
    /// Backend origin in development.
    pub development_url: String,
    /// Backend origin in production.
    pub production_url: Option<String>,
    /// Fixed path segment appended to the origin for API calls.
    pub api_path: String,
    /// Retry budget for transient failures.
    pub max_retries: u32,
    /// Per-call timeouts.
    pub timeout: TimeoutConfig,
    /// Origin forced from the command line; wins over everything else.
    #[serde(skip)]
    pub url_override: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Development,
            development_url: "http://localhost:8000".to_owned(),
            production_url: None,
            api_path: "/api".to_owned(),
            max_retries: 3,
            timeout: TimeoutConfig::default(),
            url_override: None,
        }
    }
}

impl ApiConfig {
    /// Timeout applied to each call in the given mode.
    #[must_use]
    pub fn timeout_for(&self, mode: Mode) -> Duration {
        let ms = match mode {
            Mode::Development => self.timeout.development_ms,
            Mode::Production => self.timeout.production_ms,
        };
        Duration::from_millis(ms)
    }

    /// Configured origin for the given mode, if any.
    #[must_use]
    pub fn url_for(&self, mode: Mode) -> Option<&str> {
        match mode {
            Mode::Development => Some(self.development_url.as_str()),
            Mode::Production => self.production_url.as_deref(),
        }
    }
}

/// Per-mode request timeouts in milliseconds.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Timeout in development mode.
    pub development_ms: u64,
    /// Timeout in production mode.
    pub production_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            development_ms: 10_000,
            production_ms: 30_000,
        }
    }
}

/// Raw session configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SessionConfigRaw {
    path: Option<String>,
}

/// Resolved session configuration with absolute paths.
#[derive(Debug, Default)]
pub struct SessionConfig {
    /// JSON file holding the session token and cached user.
    pub path: PathBuf,
}

/// Storage provider selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    /// Uploads go through the backend, files served from its media path.
    #[default]
    Local,
    /// Amazon S3 or an S3-compatible service.
    S3,
    /// Azure Blob Storage.
    Azure,
    /// Google Cloud Storage.
    Gcs,
}

impl fmt::Display for StorageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Local => "local",
            Self::S3 => "s3",
            Self::Azure => "azure",
            Self::Gcs => "gcs",
        };
        f.write_str(name)
    }
}

/// File storage configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Which provider backs file storage.
    pub provider: StorageProvider,
    /// CDN origin that replaces the provider host in public URLs.
    pub cdn_url: Option<String>,
    /// Request server-side encryption where the provider supports it.
    pub encryption: bool,
    /// Largest accepted upload in megabytes.
    pub max_file_size_mb: u64,
    /// Accepted file extensions, lowercase, without the dot.
    pub allowed_extensions: Vec<String>,
    /// Settings for the `local` provider.
    pub local: LocalStorageConfig,
    /// Settings for the `s3` provider.
    pub s3: Option<S3StorageConfig>,
    /// Settings for the `azure` provider.
    pub azure: Option<AzureStorageConfig>,
    /// Settings for the `gcs` provider.
    pub gcs: Option<GcsStorageConfig>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: StorageProvider::Local,
            cdn_url: None,
            encryption: false,
            max_file_size_mb: 50,
            allowed_extensions: ["pdf", "doc", "docx", "xls", "xlsx", "txt", "png", "jpg", "jpeg"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            local: LocalStorageConfig::default(),
            s3: None,
            azure: None,
            gcs: None,
        }
    }
}

/// Backend-hosted storage.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocalStorageConfig {
    /// Upload endpoint, absolute or relative to the backend origin.
    pub upload_url: String,
    /// Public media prefix, absolute or relative to the backend origin.
    pub media_url: String,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            upload_url: "/api/documents/upload/".to_owned(),
            media_url: "/media".to_owned(),
        }
    }
}

/// S3 bucket settings.
#[derive(Debug, Clone, Deserialize)]
pub struct S3StorageConfig {
    /// Bucket name.
    pub bucket: String,
    /// AWS region.
    #[serde(default = "default_region")]
    pub region: String,
    /// S3-compatible endpoint (for non-AWS services).
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Access key ID.
    #[serde(default)]
    pub access_key_id: Option<String>,
    /// Secret access key.
    #[serde(default)]
    pub secret_access_key: Option<String>,
}

fn default_region() -> String {
    "us-east-1".to_owned()
}

/// Azure Blob container settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AzureStorageConfig {
    /// Storage account name.
    pub account: String,
    /// Blob container name.
    pub container: String,
    /// Shared access signature appended to upload URLs.
    #[serde(default)]
    pub sas_token: Option<String>,
}

/// Google Cloud Storage bucket settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GcsStorageConfig {
    /// Bucket name.
    pub bucket: String,
    /// GCP project.
    #[serde(default)]
    pub project_id: Option<String>,
}

impl StorageConfig {
    /// Validate the selected provider and shared settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the selected provider's section is
    /// missing or any field is empty or malformed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(cdn) = &self.cdn_url {
            require_http_url(cdn, "storage.cdn_url")?;
        }
        if self.max_file_size_mb == 0 {
            return Err(ConfigError::Validation(
                "storage.max_file_size_mb must be greater than 0".to_owned(),
            ));
        }

        match self.provider {
            StorageProvider::Local => {
                require_non_empty(&self.local.upload_url, "storage.local.upload_url")?;
                require_non_empty(&self.local.media_url, "storage.local.media_url")?;
            }
            StorageProvider::S3 => {
                let s3 = require_section(self.s3.as_ref(), "s3")?;
                require_non_empty(&s3.bucket, "storage.s3.bucket")?;
                require_non_empty(&s3.region, "storage.s3.region")?;
                if let Some(endpoint) = &s3.endpoint {
                    require_http_url(endpoint, "storage.s3.endpoint")?;
                }
            }
            StorageProvider::Azure => {
                let azure = require_section(self.azure.as_ref(), "azure")?;
                require_non_empty(&azure.account, "storage.azure.account")?;
                require_non_empty(&azure.container, "storage.azure.container")?;
            }
            StorageProvider::Gcs => {
                let gcs = require_section(self.gcs.as_ref(), "gcs")?;
                require_non_empty(&gcs.bucket, "storage.gcs.bucket")?;
            }
        }
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        expand::expand_opt(&mut self.cdn_url, "storage.cdn_url")?;

        self.local.upload_url =
            expand::expand_env(&self.local.upload_url, "storage.local.upload_url")?;
        self.local.media_url =
            expand::expand_env(&self.local.media_url, "storage.local.media_url")?;

        if let Some(ref mut s3) = self.s3 {
            s3.bucket = expand::expand_env(&s3.bucket, "storage.s3.bucket")?;
            s3.region = expand::expand_env(&s3.region, "storage.s3.region")?;
            expand::expand_opt(&mut s3.endpoint, "storage.s3.endpoint")?;
            expand::expand_opt(&mut s3.access_key_id, "storage.s3.access_key_id")?;
            expand::expand_opt(&mut s3.secret_access_key, "storage.s3.secret_access_key")?;
        }
        if let Some(ref mut azure) = self.azure {
            azure.account = expand::expand_env(&azure.account, "storage.azure.account")?;
            azure.container = expand::expand_env(&azure.container, "storage.azure.container")?;
            expand::expand_opt(&mut azure.sas_token, "storage.azure.sas_token")?;
        }
        if let Some(ref mut gcs) = self.gcs {
            gcs.bucket = expand::expand_env(&gcs.bucket, "storage.gcs.bucket")?;
            expand::expand_opt(&mut gcs.project_id, "storage.gcs.project_id")?;
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`storage.s3.bucket`").
        field: String,
        /// Error message (e.g., "${`EDRS_BUCKET`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

fn require_section<'a, T>(section: Option<&'a T>, name: &str) -> Result<&'a T, ConfigError> {
    section.ok_or_else(|| {
        ConfigError::Validation(format!(
            "[storage.{name}] section required when storage.provider = \"{name}\""
        ))
    })
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `edrs.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(mode) = settings.mode {
            self.api.mode = mode;
        }
        if let Some(api_url) = &settings.api_url {
            self.api.url_override = Some(api_url.clone());
        }
        if let Some(max_retries) = settings.max_retries {
            self.api.max_retries = max_retries;
        }
        if let Some(session_path) = &settings.session_path {
            self.session_resolved.path.clone_from(session_path);
        }
    }

    /// Get validated storage configuration.
    ///
    /// Storage settings are only checked by commands that need them, so a
    /// half-filled `[storage]` section does not break unrelated commands.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the storage section is invalid.
    pub fn require_storage(&self) -> Result<&StorageConfig, ConfigError> {
        self.storage.validate()?;
        Ok(&self.storage)
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            api: ApiConfig::default(),
            session: SessionConfigRaw::default(),
            storage: StorageConfig::default(),
            session_resolved: SessionConfig {
                path: base.join(".edrs").join("session.json"),
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Checks the API section. Storage is validated on demand through
    /// [`Config::require_storage`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_api()
    }

    fn validate_api(&self) -> Result<(), ConfigError> {
        let api = &self.api;
        require_non_empty(&api.development_url, "api.development_url")?;
        require_http_url(&api.development_url, "api.development_url")?;
        if let Some(url) = &api.production_url {
            require_http_url(url, "api.production_url")?;
        }
        if let Some(url) = &api.url_override {
            require_http_url(url, "api url override")?;
        }

        if !api.api_path.starts_with('/') {
            return Err(ConfigError::Validation(
                "api.api_path must start with '/'".to_owned(),
            ));
        }
        if api.max_retries > MAX_RETRIES {
            return Err(ConfigError::Validation(format!(
                "api.max_retries cannot exceed {MAX_RETRIES}"
            )));
        }
        if api.timeout.development_ms == 0 || api.timeout.production_ms == 0 {
            return Err(ConfigError::Validation(
                "api.timeout values must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.api.development_url =
            expand::expand_env(&self.api.development_url, "api.development_url")?;
        expand::expand_opt(&mut self.api.production_url, "api.production_url")?;
        self.storage.expand_env_vars()
    }

    /// Resolve relative paths against the config file's directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let path = self
            .session
            .path
            .as_deref()
            .map_or_else(|| config_dir.join(".edrs").join("session.json"), |p| config_dir.join(p));
        self.session_resolved = SessionConfig { path };
    }
}
