//! CLI argument parsing for worldsync.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use crate::exit_codes;
use clap::{Parser, Subcommand};

/// Worldsync: share a game server's world data between hosts through an
/// S3-compatible bucket.
///
/// Run `init` before starting the server and `shutdown` after stopping it.
/// A lock object in the bucket keeps two hosts from running the server at
/// the same time.
///
/// Configuration comes from the environment (or a `.env` file):
/// R2_ACCOUNT_ID, R2_ACCESS_KEY_ID, R2_SECRET_ACCESS_KEY, R2_BUCKET_NAME,
/// R2_ENDPOINT, and optionally LOCAL_DATA_DIR (default ./server001/data).
#[derive(Parser, Debug)]
#[command(name = "worldsync")]
#[command(author, version, about)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for worldsync.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Acquire the lock and download data (run before server start).
    Init,

    /// Upload data and release the lock (run after server stop).
    Shutdown,

    /// Download server data only.
    Download,

    /// Upload server data only.
    Upload,

    /// Acquire the server lock only.
    Lock,

    /// Release the server lock only.
    Unlock,

    /// Show the current lock status.
    CheckLock,

    /// Upload a timestamped backup of server data, keeping the newest three.
    Backup,

    /// List backups in the bucket, newest first.
    ListBackups,
}

impl Cli {
    /// Parse command-line arguments.
    ///
    /// Usage errors (no command, unknown command, stray arguments) print
    /// clap's message and exit with [`exit_codes::FAILURE`]; `--help` and
    /// `--version` exit with [`exit_codes::SUCCESS`]. Either way the text
    /// goes to stdout.
    pub fn parse_args() -> Self {
        match Cli::try_parse() {
            Ok(cli) => cli,
            Err(err) => {
                let (text, code) = render_parse_error(&err);
                print!("{}", text);
                std::process::exit(code);
            }
        }
    }
}

/// Plain text and exit code for a parse result that ends the process.
fn render_parse_error(err: &clap::Error) -> (String, i32) {
    let code = if err.use_stderr() {
        exit_codes::FAILURE
    } else {
        exit_codes::SUCCESS
    };
    (err.render().to_string(), code)
}
