//! # Doccache CLI Module
//!
//! ```bash
//! # Consume deltas from stdin
//! firehose-adapter | doccache config.yml
//!
//! # Replay a recorded stream
//! doccache config.yml --deltas deltas.ndjson
//!
//! # Validate the configuration and print the schema it installs
//! doccache config.yml --check
//! ```

mod commands;

use clap::Parser;
use doccache_core::DoccacheError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Doccache - projects on-chain documents into a GraphQL graph database
#[derive(Parser, Debug)]
#[command(name = "doccache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file (YAML, or TOML by extension)
    pub config: PathBuf,

    /// Newline-delimited JSON delta file (default: stdin)
    #[arg(long)]
    pub deltas: Option<PathBuf>,

    /// Validate the configuration, print the installed schema and exit
    #[arg(long)]
    pub check: bool,

    /// Suppress banner output
    #[arg(short, long)]
    pub quiet: bool,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), DoccacheError> {
    if cli.check {
        return cmd_check(&cli.config);
    }
    cmd_run(&cli.config, cli.deltas.as_deref()).await
}
