//! Wide-column storage driver
//!
//! The backend cannot order by key, so the ledger table carries a `latest`
//! row holding the highest applied index next to one row per entry. Schema
//! statements run on their own; ledger bookkeeping goes through logged
//! batches.

mod driver;
#[cfg(any(test, feature = "test-support"))]
mod memory;
mod scylla;

pub use self::driver::CqlDriver;
#[cfg(any(test, feature = "test-support"))]
pub use self::memory::MemorySession;
pub use self::scylla::ScyllaSession;

use crate::error::{DbError, DbResult};
use async_trait::async_trait;
use sl_core::{Change, LedgerEntry, Statements};

pub(crate) const CREATE_VERSION_TABLE: &str = r#"CREATE TABLE IF NOT EXISTS "sledger_version" ("key" text PRIMARY KEY, "sledger_version" text)"#;

pub(crate) const SELECT_VERSION: &str =
    r#"SELECT "sledger_version" FROM "sledger_version" WHERE "key" = 'version'"#;

pub(crate) const INSERT_VERSION: &str =
    r#"INSERT INTO "sledger_version" ("key", "sledger_version") VALUES ('version', ?)"#;

pub(crate) const CREATE_LEDGER_TABLE: &str =
    r#"CREATE TABLE IF NOT EXISTS "sledger" ("index" text PRIMARY KEY, "change" text)"#;

pub(crate) const SELECT_ENTRY: &str = r#"SELECT "change" FROM "sledger" WHERE "index" = ?"#;

pub(crate) const INSERT_ENTRY: &str = r#"INSERT INTO "sledger" ("index", "change") VALUES (?, ?)"#;

pub(crate) const DELETE_ENTRY: &str = r#"DELETE FROM "sledger" WHERE "index" = ?"#;

/// Ledger row key holding the highest applied index
pub const LATEST_KEY: &str = "latest";

/// One bookkeeping write inside a logged batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerWrite {
    /// Insert or overwrite the row at `key`
    Put { key: String, value: String },
    /// Remove the row at `key`
    Delete { key: String },
}

impl LedgerWrite {
    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        LedgerWrite::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        LedgerWrite::Delete { key: key.into() }
    }
}

/// Session against a wide-column cluster, already bound to the keyspace.
#[async_trait]
pub trait CqlSession: Send {
    /// Run one statement outside any batch
    async fn execute(&mut self, cql: &str) -> DbResult<()>;

    /// The `version` row of `sledger_version`, if any
    async fn read_version(&mut self) -> DbResult<Option<String>>;

    /// Write the `version` row
    async fn write_version(&mut self, version: &str) -> DbResult<()>;

    /// `change` column of the ledger row at `key`
    async fn get(&mut self, key: &str) -> DbResult<Option<String>>;

    /// Apply `writes` to the ledger table as one logged batch
    async fn write_batch(&mut self, writes: &[LedgerWrite]) -> DbResult<()>;

    /// Release the session
    async fn close(self) -> DbResult<()>
    where
        Self: Sized;
}

/// Quote a keyspace name, rejecting names that would need escaping
pub(crate) fn quote_identifier(id: &str) -> DbResult<String> {
    if id.contains('"') {
        return Err(DbError::InvalidUrl(format!("invalid cql id: {id}")));
    }
    Ok(format!("\"{id}\""))
}

/// Ledger row value for `statements`: `{"cql":{"forward":..,"backward":..}}`
pub(crate) fn encode_entry(statements: &Statements) -> DbResult<String> {
    serde_json::to_string(&Change::cql(statements.clone()))
        .map_err(|e| DbError::CorruptLedger(format!("failed to encode ledger entry: {e}")))
}

pub(crate) fn decode_entry(index: u64, raw: &str) -> DbResult<LedgerEntry> {
    let change: Change = serde_json::from_str(raw)
        .map_err(|e| DbError::CorruptLedger(format!("entry {index} is not valid JSON: {e}")))?;
    let statements = change
        .cql
        .ok_or_else(|| DbError::CorruptLedger(format!("entry {index} has no cql statements")))?;
    Ok(LedgerEntry::new(index, &statements))
}

pub(crate) fn parse_latest(raw: &str) -> DbResult<u64> {
    raw.trim()
        .parse()
        .map_err(|_| DbError::CorruptLedger(format!("latest index {raw:?} is not a number")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_encoding() {
        let raw = encode_entry(&Statements::new("CREATE TABLE a (x int PRIMARY KEY)", "DROP TABLE a"))
            .unwrap();
        assert_eq!(
            raw,
            r#"{"cql":{"forward":"CREATE TABLE a (x int PRIMARY KEY)","backward":"DROP TABLE a"}}"#
        );

        let entry = decode_entry(3, &raw).unwrap();
        assert_eq!(entry.index, 3);
        assert_eq!(entry.backward, "DROP TABLE a");
    }

    #[test]
    fn test_irreversible_entry_omits_backward() {
        let raw = encode_entry(&Statements::new("INSERT INTO t (k) VALUES (1)", "")).unwrap();
        assert_eq!(raw, r#"{"cql":{"forward":"INSERT INTO t (k) VALUES (1)"}}"#);
        assert!(!decode_entry(0, &raw).unwrap().is_reversible());
    }

    #[test]
    fn test_decode_rejects_other_shapes() {
        assert!(matches!(
            decode_entry(0, "not json"),
            Err(DbError::CorruptLedger(_))
        ));
        assert!(matches!(
            decode_entry(0, r#"{"sql":{"forward":"x"}}"#),
            Err(DbError::CorruptLedger(_))
        ));
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("inventory").unwrap(), "\"inventory\"");
        assert!(quote_identifier("bad\"name").is_err());
    }

    #[test]
    fn test_parse_latest() {
        assert_eq!(parse_latest("12").unwrap(), 12);
        assert!(parse_latest("twelve").is_err());
    }
}
