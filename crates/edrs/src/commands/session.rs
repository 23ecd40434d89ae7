//! `edrs session` subcommand group.

use clap::{Args, Subcommand};

use super::client_args::ClientArgs;
use crate::error::CliError;
use crate::output::Output;

/// Session commands.
#[derive(Subcommand)]
pub(crate) enum SessionCommand {
    /// Show the stored session.
    Show(SessionArgs),
    /// Store a token obtained from the backend's login endpoint.
    Login(LoginArgs),
    /// Remove the stored token and cached user.
    Clear(SessionArgs),
}

/// Arguments shared by session commands.
#[derive(Args)]
pub(crate) struct SessionArgs {
    #[command(flatten)]
    client: ClientArgs,
}

/// Arguments for `session login`.
#[derive(Args)]
pub(crate) struct LoginArgs {
    /// Bearer token.
    #[arg(long, env = "EDRS_TOKEN", hide_env_values = true)]
    token: String,

    /// Cached user identity as JSON.
    #[arg(long)]
    user: Option<String>,

    #[command(flatten)]
    client: ClientArgs,
}

impl SessionCommand {
    /// Execute the session subcommand.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        match self {
            Self::Show(args) => {
                let config = args.client.load_config()?;
                let session = ClientArgs::session(&config);
                output.info(&format!(
                    "Session file: {}",
                    config.session_resolved.path.display()
                ));
                match session.token() {
                    Some(_) => output.success("Authenticated: yes"),
                    None => output.warning("Authenticated: no"),
                }
                if let Some(user) = session.user() {
                    output.data(&serde_json::to_string_pretty(&user)?);
                }
                Ok(())
            }
            Self::Login(args) => {
                let config = args.client.load_config()?;
                let session = ClientArgs::session(&config);
                let user = args
                    .user
                    .as_deref()
                    .map(serde_json::from_str)
                    .transpose()?;
                if args.token.trim().is_empty() {
                    return Err(CliError::Validation("token cannot be empty".to_owned()));
                }
                session.store_login(args.token.trim(), user)?;
                output.success("Session stored.");
                Ok(())
            }
            Self::Clear(args) => {
                let config = args.client.load_config()?;
                ClientArgs::session(&config).invalidate();
                output.success("Session cleared.");
                Ok(())
            }
        }
    }
}
