//! Statement dialect selector

use serde::{Deserialize, Serialize};

/// Which statement variant of a change a storage driver executes.
///
/// Relational drivers (PostgreSQL, DuckDB) run `sql` statements, the
/// wide-column driver runs `cql` statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Relational SQL
    Sql,
    /// Cassandra Query Language
    Cql,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Sql => write!(f, "sql"),
            Backend::Cql => write!(f, "cql"),
        }
    }
}
