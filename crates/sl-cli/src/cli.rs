//! CLI argument definitions using clap derive API

use clap::Parser;
use std::path::PathBuf;

/// sledger - reconcile a database's migration ledger with declared migrations
#[derive(Parser, Debug)]
#[command(name = "sledger")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory containing migration files
    #[arg(short, long, env = "SLEDGER_LEDGER")]
    pub ledger: Option<PathBuf>,

    /// Database connection string (postgresql://, duckdb:, cassandra://)
    #[arg(short, long, env = "SLEDGER_DATABASE", hide_env_values = true)]
    pub database: Option<String>,

    /// Config file path (default: ./sledger.yml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Expand ${NAME} in statements from the environment
    #[arg(long)]
    pub expand_env: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
