//! sledger CLI - reconcile a database's migration ledger with declared migrations

use anyhow::{Context, Result};
use clap::Parser;
use sl_core::{MigrationSource, Step};

mod cli;
mod settings;

use cli::Cli;
use settings::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    run(&cli).await
}

async fn run(cli: &Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to determine working directory")?;
    let settings = Settings::resolve(cli, &cwd, |key| std::env::var(key).ok())?;

    let source = MigrationSource::new(&settings.ledger).with_env_expansion(settings.expand_env);
    let summary = sl_engine::run(&settings.database_url, &source)
        .await
        .context("Reconciliation failed")?;

    log::info!(
        "{} {} skipped, {} forwarded, {} rolled back in {}ms",
        Step::Complete,
        summary.skipped,
        summary.forwarded,
        summary.reversed.len(),
        summary.duration.as_millis()
    );
    Ok(())
}

/// Log to stderr; `RUST_LOG` overrides the level chosen by `--verbose`.
fn setup_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();
}
