//! sl-db - Storage drivers for sledger
//!
//! This crate provides the `Driver` trait used by the reconciliation engine
//! and its two implementations: a relational driver (DuckDB, PostgreSQL) and
//! a wide-column driver (Cassandra/Scylla). Connection strings pick the
//! driver; both drivers gate on the ledger storage version before use.

pub mod connection;
pub mod cql;
pub mod error;
pub mod sql;
pub mod tls;
pub mod traits;
pub mod version;

pub use connection::{connect, ConnectionUrl, DbKind};
#[cfg(any(test, feature = "test-support"))]
pub use cql::MemorySession;
pub use cql::{CqlDriver, CqlSession, LedgerWrite, ScyllaSession};
pub use error::{DbError, DbResult};
pub use sql::{DuckDbConnection, PostgresConnection, SqlConnection, SqlDriver};
pub use tls::{SslMode, TlsOptions, TlsSettings};
pub use traits::{ApplyOutcome, Driver};
pub use version::{check_version, VersionCheck, SLEDGER_VERSION};
