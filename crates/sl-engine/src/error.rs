//! Error types for sl-engine

use sl_core::CoreError;
use sl_db::DbError;
use thiserror::Error;

/// Reconciliation errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Declared sequence could not be loaded or planned
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Connecting or preparing the ledger failed
    #[error(transparent)]
    Db(#[from] DbError),

    /// Apply pass failed (R001)
    #[error("[R001] Failed to apply change {position} of migration {migration} at index {index}: {source}")]
    Apply {
        migration: String,
        position: usize,
        index: u64,
        #[source]
        source: DbError,
    },

    /// Rollback pass failed (R002)
    #[error("[R002] Rollback failed: {0}")]
    Rollback(#[source] DbError),

    /// Driver close failed after a successful run (R003)
    #[error("[R003] {0}")]
    Close(#[source] DbError),
}

/// Result type alias for EngineError
pub type EngineResult<T> = Result<T, EngineError>;
