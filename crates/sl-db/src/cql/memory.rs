//! In-memory wide-column session for tests

use super::{CqlSession, LedgerWrite};
use crate::error::{DbError, DbResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct MemoryState {
    version: Option<String>,
    rows: BTreeMap<String, String>,
    executed: Vec<String>,
    batches: Vec<Vec<LedgerWrite>>,
    fail_on: Option<String>,
    fail_close: bool,
    closed: bool,
}

/// Session that keeps the ledger in memory and records every statement.
///
/// Clones share state, so a test can hand one clone to a driver and inspect
/// the other, or reopen a driver over the same ledger.
#[derive(Debug, Clone, Default)]
pub struct MemorySession {
    state: Arc<Mutex<MemoryState>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail any statement containing `pattern`
    pub fn fail_on(&self, pattern: impl Into<String>) {
        self.state().fail_on = Some(pattern.into());
    }

    /// Make `close` return an error
    pub fn fail_close(&self) {
        self.state().fail_close = true;
    }

    /// Statements executed outside batches, in order
    pub fn executed(&self) -> Vec<String> {
        self.state().executed.clone()
    }

    /// Every batch written, in order
    pub fn batches(&self) -> Vec<Vec<LedgerWrite>> {
        self.state().batches.clone()
    }

    /// Current ledger rows by key
    pub fn rows(&self) -> BTreeMap<String, String> {
        self.state().rows.clone()
    }

    /// Overwrite a ledger row directly
    pub fn set_row(&self, key: impl Into<String>, value: impl Into<String>) {
        self.state().rows.insert(key.into(), value.into());
    }

    /// Remove a ledger row directly
    pub fn remove_row(&self, key: &str) {
        self.state().rows.remove(key);
    }

    pub fn version(&self) -> Option<String> {
        self.state().version.clone()
    }

    pub fn set_version(&self, version: impl Into<String>) {
        self.state().version = Some(version.into());
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }
}

#[async_trait]
impl CqlSession for MemorySession {
    async fn execute(&mut self, cql: &str) -> DbResult<()> {
        let mut state = self.state();
        if let Some(pattern) = &state.fail_on {
            if cql.contains(pattern.as_str()) {
                return Err(DbError::execution(cql, "injected failure"));
            }
        }
        state.executed.push(cql.to_string());
        Ok(())
    }

    async fn read_version(&mut self) -> DbResult<Option<String>> {
        Ok(self.version())
    }

    async fn write_version(&mut self, version: &str) -> DbResult<()> {
        self.set_version(version);
        Ok(())
    }

    async fn get(&mut self, key: &str) -> DbResult<Option<String>> {
        Ok(self.state().rows.get(key).cloned())
    }

    async fn write_batch(&mut self, writes: &[LedgerWrite]) -> DbResult<()> {
        let mut state = self.state();
        for write in writes {
            match write {
                LedgerWrite::Put { key, value } => {
                    state.rows.insert(key.clone(), value.clone());
                }
                LedgerWrite::Delete { key } => {
                    state.rows.remove(key);
                }
            }
        }
        state.batches.push(writes.to_vec());
        Ok(())
    }

    async fn close(self) -> DbResult<()> {
        let mut state = self.state();
        state.closed = true;
        if state.fail_close {
            return Err(DbError::CloseError("injected failure".to_string()));
        }
        Ok(())
    }
}
