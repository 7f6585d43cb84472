//! Effective run settings from flags, config file and environment

use anyhow::{Context, Result};
use sl_core::{database_url_from_env, Config, DEFAULT_DATABASE_URL, DEFAULT_LEDGER_ROOT};
use std::path::{Path, PathBuf};

use crate::cli::Cli;

/// Settings for one reconciliation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Migration directory
    pub ledger: PathBuf,

    /// Connection string
    pub database_url: String,

    /// Expand `${NAME}` in statements
    pub expand_env: bool,
}

impl Settings {
    /// Resolve settings for `cli`, reading the config file relative to `cwd`
    /// and `DATABASE_*` variables through `lookup`.
    pub fn resolve<F>(cli: &Cli, cwd: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = match &cli.config {
            Some(path) => Config::load(path).context("Failed to load configuration file")?,
            None => Config::load_from_dir(cwd).context("Failed to load sledger configuration")?,
        };

        let ledger = cli
            .ledger
            .clone()
            .or_else(|| config.ledger.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER_ROOT));

        let database_url = match cli.database.clone().or(config.database) {
            Some(url) => url,
            None => database_url_from_env(lookup)
                .context("Failed to compose database URL from environment")?
                .unwrap_or_else(|| {
                    log::info!("Database not specified. Default to {DEFAULT_DATABASE_URL}.");
                    DEFAULT_DATABASE_URL.to_string()
                }),
        };

        Ok(Self {
            ledger,
            database_url,
            expand_env: cli.expand_env || config.expand_env,
        })
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
