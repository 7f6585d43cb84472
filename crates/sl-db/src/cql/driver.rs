//! Reconciliation against a wide-column ledger

use super::{
    decode_entry, encode_entry, parse_latest, CqlSession, LedgerWrite, CREATE_LEDGER_TABLE,
    CREATE_VERSION_TABLE, LATEST_KEY,
};
use crate::error::{DbError, DbResult};
use crate::traits::{ApplyOutcome, Driver};
use crate::version::{check_version, VersionCheck, SLEDGER_VERSION};
use async_trait::async_trait;
use sl_core::{abbreviate, Backend, LedgerEntry, Statements, Step};

/// Wide-column storage driver.
///
/// Entries are looked up one key at a time. Forward statements run outside
/// the bookkeeping batch, so a failure between the two leaves the schema
/// change applied without a ledger row.
pub struct CqlDriver<S: CqlSession> {
    session: S,
    index: u64,
}

impl<S: CqlSession> CqlDriver<S> {
    /// Gate on the ledger version and create the ledger table
    pub async fn open(mut session: S) -> DbResult<Self> {
        log::info!("{} Ensuring sledger_version table exists...", Step::Setup);
        session
            .execute(CREATE_VERSION_TABLE)
            .await
            .map_err(|e| DbError::SetupError(e.to_string()))?;

        log::info!("{} Getting sledger_version...", Step::Setup);
        let found = session.read_version().await?;
        if check_version(found.as_deref())? == VersionCheck::Initialize {
            log::info!("{} Setting sledger_version...", Step::Setup);
            session.write_version(&SLEDGER_VERSION.to_string()).await?;
        }

        log::info!("{} Creating sledger table if it does not exist...", Step::Setup);
        session
            .execute(CREATE_LEDGER_TABLE)
            .await
            .map_err(|e| DbError::SetupError(e.to_string()))?;

        Ok(Self { session, index: 0 })
    }

    /// Index the next `apply` will compare against
    pub fn index(&self) -> u64 {
        self.index
    }

    async fn entry(&mut self, index: u64) -> DbResult<Option<LedgerEntry>> {
        match self.session.get(&index.to_string()).await? {
            Some(raw) => decode_entry(index, &raw).map(Some),
            None => Ok(None),
        }
    }

    async fn latest(&mut self) -> DbResult<Option<u64>> {
        match self.session.get(LATEST_KEY).await? {
            Some(raw) => parse_latest(&raw).map(Some),
            None => Ok(None),
        }
    }

    async fn forward(&mut self, change: &Statements) -> DbResult<()> {
        if let Some(latest) = self.latest().await? {
            if latest >= self.index {
                return Err(DbError::CorruptLedger(format!(
                    "missing entry {} below latest index {latest}",
                    self.index
                )));
            }
        }

        log::info!("{} {}", Step::Forward, abbreviate(&change.forward));
        log::debug!("forward[{}]: {}", self.index, change.forward);
        self.session.execute(&change.forward).await?;

        let index = self.index.to_string();
        let writes = [
            LedgerWrite::put(index.clone(), encode_entry(change)?),
            LedgerWrite::put(LATEST_KEY, index),
        ];
        self.session.write_batch(&writes).await
    }

    async fn reverse(&mut self, entry: &LedgerEntry) -> DbResult<()> {
        log::info!("{} {}", Step::Rollback, abbreviate(&entry.backward));
        log::debug!("rollback[{}]: {}", entry.index, entry.backward);
        self.session.execute(&entry.backward).await?;

        let latest = match entry.index.checked_sub(1) {
            Some(previous) => LedgerWrite::put(LATEST_KEY, previous.to_string()),
            None => LedgerWrite::delete(LATEST_KEY),
        };
        let writes = [LedgerWrite::delete(entry.index.to_string()), latest];
        self.session.write_batch(&writes).await
    }
}

#[async_trait]
impl<S: CqlSession> Driver for CqlDriver<S> {
    fn backend(&self) -> Backend {
        Backend::Cql
    }

    fn db_type(&self) -> &'static str {
        "cassandra"
    }

    async fn apply(&mut self, change: &Statements) -> DbResult<ApplyOutcome> {
        let Some(stored) = self.entry(self.index).await? else {
            self.forward(change).await?;
            self.index += 1;
            return Ok(ApplyOutcome::Forwarded);
        };

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
        let Some(latest) = self.latest().await? else {
            return Ok(Vec::new());
        };
        if latest < self.index {
            return Ok(Vec::new());
        }

        let mut orphans = Vec::new();
        for index in (self.index..=latest).rev() {
            let entry = self.entry(index).await?.ok_or_else(|| {
                DbError::CorruptLedger(format!(
                    "missing entry {index} below latest index {latest}"
                ))
            })?;
            orphans.push(entry);
        }

        if let Some(entry) = orphans.iter().find(|e| !e.is_reversible()) {
            return Err(DbError::IrreversibleOrphan {
                index: entry.index,
                forward: entry.forward.clone(),
            });
        }

        let mut reversed = Vec::with_capacity(orphans.len());
        for entry in &orphans {
            self.reverse(entry).await?;
            reversed.push(entry.index);
        }
        Ok(reversed)
    }

    /// Session close errors are logged, never returned.
    async fn close(self: Box<Self>) -> DbResult<()> {
        log::info!("{} cassandra", Step::Disconnect);
        if let Err(e) = self.session.close().await {
            log::debug!("ignoring session close error: {e}");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "driver_test.rs"]
mod tests;
