//! Worldsync: single-writer lock and world data sync for game servers.
//!
//! This is the main entry point for the `worldsync` CLI. It parses arguments,
//! loads configuration from the environment, connects to the bucket,
//! dispatches to the command handler, and maps errors to exit codes.

pub mod backup;
mod cli;
mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod exit_codes;
pub mod fs;
pub mod locks;
pub mod logging;
pub mod storage;
pub mod transfer;

#[cfg(test)]
mod test_support;

use cli::{Cli, Command};
use config::SyncConfig;
use context::SyncContext;
use std::process::ExitCode;
use tracing::warn;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // Values already in the environment win over `.env`.
    let dotenv = dotenvy::dotenv();
    logging::init();
    if let Err(e) = dotenv
        && !e.not_found()
    {
        warn!(error = %e, "ignoring unreadable .env file");
    }

    match run(cli.command) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Operator-facing output stays on stdout
            println!("Error: {}", err);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

fn run(command: Command) -> error::Result<()> {
    let config = SyncConfig::from_env()?;
    let ctx = SyncContext::connect(config)?;
    commands::dispatch(command, &ctx)
}
