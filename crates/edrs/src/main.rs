//! EDRS CLI - backend client.
//!
//! Provides commands for:
//! - `check`: Probe backend connectivity and report PASS/PARTIAL/FAIL
//! - `request`: Send one request through the client pipeline
//! - `session show|login|clear`: Inspect or change the stored session
//! - `storage info|url`: Inspect the configured file storage provider

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CheckArgs, RequestArgs, SessionCommand, StorageCommand};
use output::Output;

/// EDRS - backend client.
#[derive(Parser)]
#[command(name = "edrs", version, about)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check connectivity to the backend.
    Check(CheckArgs),
    /// Send a request to the backend API.
    Request(RequestArgs),
    /// Session commands.
    #[command(subcommand)]
    Session(SessionCommand),
    /// File storage commands.
    #[command(subcommand)]
    Storage(StorageCommand),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Check(args) => args.execute(),
        Commands::Request(args) => args.execute(),
        Commands::Session(cmd) => cmd.execute(),
        Commands::Storage(cmd) => cmd.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
