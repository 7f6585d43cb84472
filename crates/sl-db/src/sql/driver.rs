//! Reconciliation against a relational ledger

use super::{SqlConnection, CREATE_LEDGER_TABLE, CREATE_VERSION_TABLE};
use crate::error::{DbError, DbResult};
use crate::traits::{ApplyOutcome, Driver};
use crate::version::{check_version, VersionCheck, SLEDGER_VERSION};
use async_trait::async_trait;
use sl_core::{abbreviate, Backend, LedgerEntry, Statements, Step};

/// Relational storage driver.
///
/// The ordered ledger is read once when the driver opens and consumed as a
/// forward-only cursor: `apply` takes the next row, `rollback` drains the
/// rest.
pub struct SqlDriver<C: SqlConnection> {
    conn: C,
    cursor: std::vec::IntoIter<LedgerEntry>,
    index: u64,
}

impl<C: SqlConnection> SqlDriver<C> {
    /// Gate on the ledger version, create the ledger table and open the
    /// ledger cursor.
    pub async fn open(mut conn: C) -> DbResult<Self> {
        verify_version(&mut conn).await?;

        log::info!("{} Creating sledger table if it does not exist...", Step::Setup);
        conn.execute_batch(CREATE_LEDGER_TABLE)
            .await
            .map_err(|e| DbError::SetupError(e.to_string()))?;

        let entries = conn.query_ledger().await?;
        log::debug!("{} ledger has {} entries", conn.db_type(), entries.len());

        Ok(Self {
            conn,
            cursor: entries.into_iter(),
            index: 0,
        })
    }

    /// Index the next `apply` will compare against
    pub fn index(&self) -> u64 {
        self.index
    }

    async fn forward(&mut self, change: &Statements) -> DbResult<()> {
        log::info!("{} {}", Step::Forward, abbreviate(&change.forward));
        log::debug!("forward[{}]: {}", self.index, change.forward);

        let entry = LedgerEntry::new(self.index, change);
        self.begin().await?;
        let result = self.forward_in_transaction(&entry).await;
        self.finish(result).await
    }

    async fn forward_in_transaction(&mut self, entry: &LedgerEntry) -> DbResult<()> {
        self.conn.execute_batch(&entry.forward).await?;
        self.conn.insert_entry(entry).await
    }

    async fn reverse(&mut self, entry: &LedgerEntry) -> DbResult<()> {
        log::info!("{} {}", Step::Rollback, abbreviate(&entry.backward));
        log::debug!("rollback[{}]: {}", entry.index, entry.backward);

        self.begin().await?;
        let result = self.reverse_in_transaction(entry).await;
        self.finish(result).await
    }

    async fn reverse_in_transaction(&mut self, entry: &LedgerEntry) -> DbResult<()> {
        self.conn.execute_batch(&entry.backward).await?;
        self.conn.delete_entry(entry.index).await
    }

    async fn begin(&mut self) -> DbResult<()> {
        self.conn
            .execute_batch("BEGIN")
            .await
            .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))
    }

    /// Commit on success, roll back on error.
    async fn finish(&mut self, result: DbResult<()>) -> DbResult<()> {
        match result {
            Ok(()) => {
                if let Err(commit_err) = self.conn.execute_batch("COMMIT").await {
                    let _ = self.conn.execute_batch("ROLLBACK").await;
                    return Err(DbError::TransactionError(format!(
                        "COMMIT failed: {commit_err}"
                    )));
                }
                Ok(())
            }
            Err(e) => {
                if let Err(rollback_err) = self.conn.execute_batch("ROLLBACK").await {
                    log::warn!("ROLLBACK failed: {rollback_err}");
                }
                Err(e)
            }
        }
    }
}

/// Ensure exactly one version marker exists and that it matches this build.
async fn verify_version<C: SqlConnection>(conn: &mut C) -> DbResult<()> {
    log::info!("{} Ensuring sledger_version table exists...", Step::Setup);
    conn.execute_batch(CREATE_VERSION_TABLE)
        .await
        .map_err(|e| DbError::SetupError(e.to_string()))?;

    log::info!("{} Getting sledger_version...", Step::Setup);
    let found = conn.query_version().await?;

    if check_version(found.as_deref())? == VersionCheck::Initialize {
        log::info!("{} Setting sledger_version...", Step::Setup);
        conn.insert_version(&SLEDGER_VERSION.to_string()).await?;
    }
    Ok(())
}

#[async_trait]
impl<C: SqlConnection> Driver for SqlDriver<C> {
    fn backend(&self) -> Backend {
        Backend::Sql
    }

    fn db_type(&self) -> &'static str {
        self.conn.db_type()
    }

    async fn apply(&mut self, change: &Statements) -> DbResult<ApplyOutcome> {
        let Some(stored) = self.cursor.next() else {
            self.forward(change).await?;
            self.index += 1;
            return Ok(ApplyOutcome::Forwarded);
        };

        if stored.index != self.index {
            return Err(DbError::IndexMismatch {
                expected: self.index,
                found: stored.index,
            });
        }

        if !stored.matches(change) {
            return Err(DbError::Divergence {
                index: self.index,
                stored: stored.forward,
                declared: change.forward.clone(),
            });
        }

        log::info!("{} {}", Step::Skip, abbreviate(&change.forward));
        self.index += 1;
        Ok(ApplyOutcome::Skipped)
    }

    async fn rollback(&mut self) -> DbResult<Vec<u64>> {
        let orphans: Vec<LedgerEntry> = self.cursor.by_ref().collect();

        for (offset, entry) in orphans.iter().enumerate() {
            let expected = self.index + offset as u64;
            if entry.index != expected {
                return Err(DbError::IndexMismatch {
                    expected,
                    found: entry.index,
                });
            }
        }

        if let Some(entry) = orphans.iter().rev().find(|e| !e.is_reversible()) {
            return Err(DbError::IrreversibleOrphan {
                index: entry.index,
                forward: entry.forward.clone(),
            });
        }

        let mut reversed = Vec::with_capacity(orphans.len());
        for entry in orphans.iter().rev() {
            self.reverse(entry).await?;
            reversed.push(entry.index);
        }
        Ok(reversed)
    }

    async fn close(self: Box<Self>) -> DbResult<()> {
        log::info!("{} {}", Step::Disconnect, self.conn.db_type());
        self.conn.close().await
    }
}

#[cfg(test)]
#[path = "driver_test.rs"]
mod tests;
