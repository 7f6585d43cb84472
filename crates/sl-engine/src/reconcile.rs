//! Apply pass, rollback pass and the connect/reconcile/close run

use crate::error::{EngineError, EngineResult};
use crate::plan::plan;
use sl_core::{Migration, MigrationSource, Step};
use sl_db::{ApplyOutcome, Driver};
use std::time::{Duration, Instant};

/// What a reconciliation did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Declared changes already present in the ledger
    pub skipped: usize,

    /// Declared changes executed and recorded
    pub forwarded: usize,

    /// Orphaned indices rolled back, in the order they were reversed
    pub reversed: Vec<u64>,

    /// Wall time of the apply and rollback passes
    pub duration: Duration,
}

/// Reconcile `migrations` against the ledger behind `driver`.
///
/// Every declared change is applied in order before the single rollback
/// pass; an apply failure stops the run with the rollback pass not started.
pub async fn reconcile(
    driver: &mut dyn Driver,
    migrations: &[Migration],
) -> EngineResult<ReconcileSummary> {
    let start = Instant::now();
    let planned = plan(migrations, driver.backend())?;
    log::debug!(
        "{} declared changes for the {} backend",
        planned.len(),
        driver.backend()
    );

    let mut summary = ReconcileSummary::default();
    for (index, change) in planned.iter().enumerate() {
        let outcome = driver
            .apply(change.statements)
            .await
            .map_err(|source| EngineError::Apply {
                migration: change.migration.to_string(),
                position: change.position,
                index: index as u64,
                source,
            })?;
        match outcome {
            ApplyOutcome::Skipped => summary.skipped += 1,
            ApplyOutcome::Forwarded => summary.forwarded += 1,
        }
    }

    summary.reversed = driver.rollback().await.map_err(EngineError::Rollback)?;
    summary.duration = start.elapsed();
    Ok(summary)
}

/// Load `source`, connect to `database_url`, reconcile and close.
///
/// The driver is closed even when reconciliation fails; in that case the
/// reconciliation error wins and a close error is only logged.
pub async fn run(database_url: &str, source: &MigrationSource) -> EngineResult<ReconcileSummary> {
    let migrations = source.load()?;
    let mut driver = sl_db::connect(database_url).await?;

    let result = reconcile(driver.as_mut(), &migrations).await;
    let closed = driver.close().await;

    match (result, closed) {
        (Ok(summary), Ok(())) => Ok(summary),
        (Ok(_), Err(e)) => Err(EngineError::Close(e)),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            log::warn!("{} {close_err}", Step::Error);
            Err(e)
        }
    }
}

#[cfg(test)]
#[path = "reconcile_test.rs"]
mod tests;
