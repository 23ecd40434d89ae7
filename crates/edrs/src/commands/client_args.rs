//! Options shared by every command that talks to the backend.

use std::path::PathBuf;

use clap::Args;
use edrs_client::{ApiClient, Session, resolve_mode};
use edrs_config::{CliSettings, Config, Mode};

use crate::error::CliError;

/// Backend connection options.
#[derive(Args)]
pub(crate) struct ClientArgs {
    /// Path to configuration file (default: auto-discover edrs.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Environment mode (development or production; overrides EDRS_MODE).
    #[arg(long)]
    mode: Option<Mode>,

    /// Backend origin (overrides config and environment).
    #[arg(long)]
    api_url: Option<String>,

    /// Retry budget for 5xx and network failures.
    #[arg(long)]
    retries: Option<u32>,

    /// Session file (default: .edrs/session.json next to edrs.toml).
    #[arg(long)]
    session: Option<PathBuf>,
}

impl ClientArgs {
    /// Load configuration with these options applied.
    pub(crate) fn load_config(&self) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            mode: self.mode,
            api_url: self.api_url.clone(),
            max_retries: self.retries,
            session_path: self.session.clone(),
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }

    /// Active mode: `--mode`, then `EDRS_MODE`, then `api.mode`.
    pub(crate) fn mode(&self, config: &Config) -> Mode {
        self.mode
            .unwrap_or_else(|| resolve_mode(&config.api, |key| std::env::var(key).ok()))
    }

    /// Client for the active mode.
    pub(crate) fn client(&self, config: &Config) -> Result<ApiClient, CliError> {
        let mode = self.mode(config);
        let client = ApiClient::configured(&config.api, mode, |key| std::env::var(key).ok())?
            .build();
        Ok(client)
    }

    /// Session persisted at the configured path.
    pub(crate) fn session(config: &Config) -> Session {
        Session::from_file(&config.session_resolved.path)
    }
}
