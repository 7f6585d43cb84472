//! Storage driver trait definition

use crate::error::DbResult;
use async_trait::async_trait;
use sl_core::{Backend, Statements};

/// What `Driver::apply` did with one declared change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Already persisted with identical forward text
    Skipped,
    /// Executed and recorded in the ledger
    Forwarded,
}

/// Storage driver contract used by the reconciliation engine.
///
/// A driver owns its connection and an internal cursor that starts at index 0
/// and advances by one on every successful `apply`. Implementations must not
/// share transaction handling: each backend commits its own way.
#[async_trait]
pub trait Driver: Send {
    /// Statement variant this driver executes
    fn backend(&self) -> Backend;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;

    /// Compare `change` against the ledger entry at the cursor, executing and
    /// recording it when no entry exists. Advances the cursor on success.
    async fn apply(&mut self, change: &Statements) -> DbResult<ApplyOutcome>;

    /// Reverse every persisted entry at or beyond the cursor, highest index
    /// first. Returns the reversed indices in the order they were reversed.
    async fn rollback(&mut self) -> DbResult<Vec<u64>>;

    /// Release the connection
    async fn close(self: Box<Self>) -> DbResult<()>;
}
