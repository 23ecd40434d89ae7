//! `edrs storage` subcommand group.

use clap::{Args, Subcommand};
use edrs_config::Config;
use edrs_storage::FileStorage;

use super::client_args::ClientArgs;
use crate::error::CliError;
use crate::output::Output;

/// File storage commands.
#[derive(Subcommand)]
pub(crate) enum StorageCommand {
    /// Show the configured provider and upload limits.
    Info(InfoArgs),
    /// Compute the object key, public URL and upload request for a file.
    Url(UrlArgs),
}

/// Arguments for `storage info`.
#[derive(Args)]
pub(crate) struct InfoArgs {
    #[command(flatten)]
    client: ClientArgs,
}

/// Arguments for `storage url`.
#[derive(Args)]
pub(crate) struct UrlArgs {
    /// Destination folder (e.g. contracts/2024).
    folder: String,

    /// File name.
    filename: String,

    /// File size in bytes; checked against the upload limits when given.
    #[arg(long)]
    size: Option<u64>,

    /// Content type for the upload request.
    #[arg(long, default_value = "application/octet-stream")]
    content_type: String,

    #[command(flatten)]
    client: ClientArgs,
}

impl StorageCommand {
    /// Execute the storage subcommand.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        match self {
            Self::Info(args) => args.execute(),
            Self::Url(args) => args.execute(),
        }
    }
}

fn open(client: &ClientArgs) -> Result<(Config, Box<dyn FileStorage>), CliError> {
    let config = client.load_config()?;
    let origin = client.client(&config)?.base_url().origin().to_owned();
    let storage = edrs_storage::from_config(config.require_storage()?, &origin)?;
    Ok((config, storage))
}

impl InfoArgs {
    fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let (config, storage) = open(&self.client)?;
        let settings = &config.storage;

        output.highlight(&format!("Provider: {}", storage.backend()));
        output.info(&format!(
            "CDN: {}",
            settings.cdn_url.as_deref().unwrap_or("(none)")
        ));
        output.info(&format!(
            "Encryption: {}",
            if settings.encryption { "on" } else { "off" }
        ));
        output.info(&format!("Max file size: {} MB", settings.max_file_size_mb));
        output.info(&format!(
            "Allowed extensions: {}",
            storage.rules().allowed_extensions.join(", ")
        ));
        Ok(())
    }
}

impl UrlArgs {
    fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let (_, storage) = open(&self.client)?;

        if let Some(size) = self.size {
            storage.validate_upload(&self.filename, size)?;
            output.success("Upload allowed.");
        }

        let key = storage.object_key(&self.folder, &self.filename)?;
        let target = storage.upload_target(&key, &self.content_type);

        output.info(&format!("Key: {key}"));
        output.info(&format!("Upload: {} {}", target.method, target.url));
        for (name, value) in &target.headers {
            output.muted(&format!("  {name}: {value}"));
        }
        output.data(&storage.public_url(&key));
        Ok(())
    }
}
