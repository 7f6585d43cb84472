//! DuckDB ledger connection

use super::{
    index_from_sql, index_to_sql, SqlConnection, DELETE_ENTRY, INSERT_ENTRY, INSERT_VERSION,
    SELECT_LEDGER, SELECT_VERSION,
};
use crate::error::{DbError, DbResult};
use async_trait::async_trait;
use duckdb::{params, Connection};
use sl_core::LedgerEntry;
use std::path::Path;

/// DuckDB connection
pub struct DuckDbConnection {
    conn: Connection,
}

impl DuckDbConnection {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self { conn })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }
}

#[async_trait]
impl SqlConnection for DuckDbConnection {
    fn db_type(&self) -> &'static str {
        "duckdb"
    }

    async fn execute_batch(&mut self, sql: &str) -> DbResult<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| DbError::execution(sql, e))
    }

    async fn query_version(&mut self) -> DbResult<Option<String>> {
        let mut stmt = self.conn.prepare(SELECT_VERSION)?;
        let mut rows = stmt.query([])?;
        match rows.next()? {
            Some(row) => Ok(row.get::<_, Option<String>>(0)?),
            None => Ok(None),
        }
    }

    async fn insert_version(&mut self, version: &str) -> DbResult<()> {
        self.conn.execute(INSERT_VERSION, params![version])?;
        Ok(())
    }

    async fn query_ledger(&mut self) -> DbResult<Vec<LedgerEntry>> {
        let mut stmt = self.conn.prepare(SELECT_LEDGER)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(index, forward, backward)| -> DbResult<LedgerEntry> {
                Ok(LedgerEntry {
                    index: index_from_sql(index)?,
                    forward,
                    backward,
                })
            })
            .collect()
    }

    async fn insert_entry(&mut self, entry: &LedgerEntry) -> DbResult<()> {
        self.conn.execute(
            INSERT_ENTRY,
            params![index_to_sql(entry.index)?, entry.forward, entry.backward],
        )?;
        Ok(())
    }

    async fn delete_entry(&mut self, index: u64) -> DbResult<()> {
        self.conn.execute(DELETE_ENTRY, params![index_to_sql(index)?])?;
        Ok(())
    }

    async fn close(self) -> DbResult<()> {
        self.conn
            .close()
            .map_err(|(_, e)| DbError::CloseError(e.to_string()))
    }
}
