//! Permit CLI binary entrypoint.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use permit_host::cli::Cli;
use permit_host::commands::LedgerCommand;
use permit_host::output::OutputFormat;
use permit_host::{Host, HostConfig, HostError};
use permit_registry::AbortCode;

const DEFAULT_STATE_DIR: &str = ".permit";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            abort_code(&e).map_or(ExitCode::FAILURE, |code| ExitCode::from(code.as_u8()))
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => HostConfig::load(path).context("loading host configuration")?,
        None => HostConfig::default(),
    };
    if let Some(dir) = cli.state_dir {
        config.state_dir = Some(dir);
    } else if config.state_dir.is_none() {
        config.state_dir = Some(DEFAULT_STATE_DIR.into());
    }

    let mut host = Host::open(config).context("opening ledger state")?;
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();
    LedgerCommand::new(&mut host, cli.caller).execute(&mut stdout, &format, &cli.command)?;
    Ok(())
}

/// Aborted calls exit with their abort code; anything else exits with 1.
fn abort_code(err: &anyhow::Error) -> Option<AbortCode> {
    err.downcast_ref::<HostError>()
        .and_then(HostError::abort_code)
}
