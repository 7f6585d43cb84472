//! Error types for sl-db

use thiserror::Error;

/// Storage driver errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Every transport security option failed (D002)
    #[error("[D002] Database connection failed on every attempt:\n{}", .0.join("\n"))]
    ConnectionAttempts(Vec<String>),

    /// Statement execution error (D003)
    #[error("[D003] Statement execution failed: {message}\n Statement: {statement}")]
    ExecutionError { statement: String, message: String },

    /// Ledger setup error (D004)
    #[error("[D004] Ledger setup failed: {0}")]
    SetupError(String),

    /// Ledger storage version mismatch (D005)
    #[error("[D005] Unsupported sledger version {found} (expected {expected}). Please use the correct version of sledger.")]
    VersionMismatch { found: String, expected: String },

    /// Persisted forward text differs from the declared change (D006)
    #[error("[D006] Database does not match migration at index {index}.\n Database: {stored}\nMigration: {declared}")]
    Divergence {
        index: u64,
        stored: String,
        declared: String,
    },

    /// Persisted index differs from the cursor (D007)
    #[error("[D007] Expected index {expected}, got index {found}")]
    IndexMismatch { expected: u64, found: u64 },

    /// Orphaned entry without a backward statement (D008)
    #[error("[D008] Missing rollback command for index {index}, cannot rollback: {forward}")]
    IrreversibleOrphan { index: u64, forward: String },

    /// Ledger content could not be read back (D009)
    #[error("[D009] Corrupt ledger: {0}")]
    CorruptLedger(String),

    /// Transaction or batch management error (D010)
    #[error("[D010] Transaction failed: {0}")]
    TransactionError(String),

    /// Connection string could not be used (D011)
    #[error("[D011] Invalid database url: {0}")]
    InvalidUrl(String),

    /// Not implemented (D012)
    #[error("[D012] Feature not implemented: {0}")]
    NotImplemented(String),

    /// Closing the connection failed (D013)
    #[error("[D013] Failed to close database connection: {0}")]
    CloseError(String),

    /// Ledger bookkeeping query failed (D014)
    #[error("[D014] Ledger query failed: {0}")]
    QueryError(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// Execution error for `statement`
    pub fn execution(statement: &str, err: impl std::fmt::Display) -> Self {
        DbError::ExecutionError {
            statement: statement.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        DbError::QueryError(err.to_string())
    }
}

impl From<tokio_postgres::Error> for DbError {
    fn from(err: tokio_postgres::Error) -> Self {
        DbError::QueryError(err.to_string())
    }
}

impl From<openssl::error::ErrorStack> for DbError {
    fn from(err: openssl::error::ErrorStack) -> Self {
        DbError::ConnectionError(format!("TLS configuration failed: {err}"))
    }
}
