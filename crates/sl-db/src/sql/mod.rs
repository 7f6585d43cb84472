//! Relational storage driver
//!
//! The ledger lives in two tables, `sledger_version` and `sledger`. Every
//! forward apply and every rollback step runs in its own local transaction.

mod driver;
mod duckdb;
mod postgres;

pub use self::driver::SqlDriver;
pub use self::duckdb::DuckDbConnection;
pub use self::postgres::PostgresConnection;

use crate::error::{DbError, DbResult};
use async_trait::async_trait;
use sl_core::LedgerEntry;

pub(crate) const CREATE_VERSION_TABLE: &str =
    r#"create table if not exists "sledger_version" ("sledger_version" text)"#;

pub(crate) const SELECT_VERSION: &str =
    r#"select "sledger_version" from "sledger_version" limit 1"#;

pub(crate) const INSERT_VERSION: &str = r#"insert into "sledger_version" values ($1)"#;

pub(crate) const CREATE_LEDGER_TABLE: &str = r#"create table if not exists "sledger" ("index" bigint not null, "forward" text not null, "backward" text not null, "timestamp" timestamp not null default current_timestamp)"#;

pub(crate) const SELECT_LEDGER: &str =
    r#"select "index", "forward", "backward" from "sledger" order by "index""#;

pub(crate) const INSERT_ENTRY: &str =
    r#"insert into "sledger" ("index", "forward", "backward") values ($1, $2, $3)"#;

pub(crate) const DELETE_ENTRY: &str = r#"delete from "sledger" where "index" = $1"#;

/// Connection to a relational engine holding the ledger tables.
///
/// Implementations run the shared ledger SQL above with their own client
/// library; transaction control goes through [`execute_batch`].
///
/// [`execute_batch`]: SqlConnection::execute_batch
#[async_trait]
pub trait SqlConnection: Send {
    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;

    /// Execute one or more statements, discarding any rows
    async fn execute_batch(&mut self, sql: &str) -> DbResult<()>;

    /// First row of `sledger_version`, if any
    async fn query_version(&mut self) -> DbResult<Option<String>>;

    /// Write the version marker row
    async fn insert_version(&mut self, version: &str) -> DbResult<()>;

    /// Every ledger row ordered by index
    async fn query_ledger(&mut self) -> DbResult<Vec<LedgerEntry>>;

    /// Insert one ledger row
    async fn insert_entry(&mut self, entry: &LedgerEntry) -> DbResult<()>;

    /// Delete the ledger row at `index`
    async fn delete_entry(&mut self, index: u64) -> DbResult<()>;

    /// Close the connection, surfacing any error
    async fn close(self) -> DbResult<()>
    where
        Self: Sized;
}

/// Convert a persisted `bigint` index
pub(crate) fn index_from_sql(raw: i64) -> DbResult<u64> {
    u64::try_from(raw).map_err(|_| DbError::CorruptLedger(format!("negative ledger index {raw}")))
}

/// Convert an index for binding as `bigint`
pub(crate) fn index_to_sql(index: u64) -> DbResult<i64> {
    i64::try_from(index)
        .map_err(|_| DbError::CorruptLedger(format!("ledger index {index} exceeds bigint")))
}
