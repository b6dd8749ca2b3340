//! Command-line interface definition.

use std::path::PathBuf;

use clap::Parser;

/// staysync - availability and calendar reconciliation for rental listings
#[derive(Debug, Parser)]
#[command(name = "staysync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "STAYSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on (overrides http.bind)
    #[arg(long, env = "STAYSYNC_BIND")]
    pub bind: Option<String>,

    /// JSON seed file for the in-memory store (overrides data.seed)
    #[arg(long)]
    pub seed: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}
