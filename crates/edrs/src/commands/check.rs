//! `edrs check` command implementation.

use clap::Args;
use edrs_client::diagnostics::{CheckStatus, DiagnosticsReport, run_diagnostics};

use super::client_args::ClientArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    #[command(flatten)]
    client: ClientArgs,

    /// Print the report as JSON on stdout.
    #[arg(long)]
    json: bool,
}

impl CheckArgs {
    /// Execute the check command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid or every check failed.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.client.load_config()?;
        let mode = self.client.mode(&config);
        let client = self.client.client(&config)?;
        let session = ClientArgs::session(&config);

        if !self.json {
            output.highlight(&format!("Checking {} ({mode})", client.base_url().api()));
            output.separator();
        }

        let report = run_diagnostics(&client, &session);

        if self.json {
            output.data(&serde_json::to_string_pretty(&report)?);
        } else {
            print_report(&output, &report);
        }

        match report.overall() {
            CheckStatus::Fail => Err(CliError::CheckFailed),
            CheckStatus::Pass | CheckStatus::Partial => Ok(()),
        }
    }
}

fn print_report(output: &Output, report: &DiagnosticsReport) {
    for check in &report.checks {
        let line = format!(
            "{:<8} {:<11} {:<28} {}",
            check.status.to_string(),
            check.name,
            check.endpoint,
            check.detail
        );
        match check.status {
            CheckStatus::Pass => output.success(&line),
            CheckStatus::Partial => output.warning(&line),
            CheckStatus::Fail => output.error(&line),
        }
    }

    output.separator();
    let summary = format!("Overall: {}", report.overall());
    match report.overall() {
        CheckStatus::Pass => output.success(&summary),
        CheckStatus::Partial => output.warning(&summary),
        CheckStatus::Fail => output.error(&summary),
    }
}
