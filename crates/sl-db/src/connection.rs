//! Connection strings and driver selection
//!
//! The URL scheme picks the storage driver:
//!
//! | Scheme | Driver |
//! |--------|--------|
//! | `postgresql`, `postgres` | relational, PostgreSQL |
//! | `duckdb` | relational, DuckDB (`duckdb::memory:` or a file path) |
//! | `cassandra` | wide-column |

use crate::cql::{CqlDriver, ScyllaSession};
use crate::error::{DbError, DbResult};
use crate::sql::{DuckDbConnection, PostgresConnection, SqlDriver};
use crate::tls::{TlsOptions, TLS_QUERY_KEYS};
use crate::traits::Driver;
use sl_core::Step;
use std::fmt;
use url::Url;

/// Storage engine named by a connection string scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    Postgres,
    DuckDb,
    Cassandra,
}

impl DbKind {
    fn from_scheme(scheme: &str) -> DbResult<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "postgresql" | "postgres" => Ok(DbKind::Postgres),
            "duckdb" => Ok(DbKind::DuckDb),
            "cassandra" => Ok(DbKind::Cassandra),
            other => Err(DbError::InvalidUrl(format!(
                "Unknown database protocol: {other:?}"
            ))),
        }
    }
}

impl fmt::Display for DbKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbKind::Postgres => write!(f, "postgresql"),
            DbKind::DuckDb => write!(f, "duckdb"),
            DbKind::Cassandra => write!(f, "cassandra"),
        }
    }
}

/// Parsed connection string
#[derive(Debug, Clone)]
pub struct ConnectionUrl {
    kind: DbKind,
    url: Url,
}

impl ConnectionUrl {
    /// Parse `raw` and identify its driver
    pub fn parse(raw: &str) -> DbResult<Self> {
        let url = Url::parse(raw).map_err(|e| DbError::InvalidUrl(format!("{raw}: {e}")))?;
        let kind = DbKind::from_scheme(url.scheme())?;
        Ok(Self { kind, url })
    }

    /// Driver selected by the scheme
    pub fn kind(&self) -> DbKind {
        self.kind
    }

    /// Underlying URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Transport security options from the query string
    pub fn tls_options(&self) -> DbResult<TlsOptions> {
        let pairs: Vec<(String, String)> = self.url.query_pairs().into_owned().collect();
        TlsOptions::from_query(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    /// Path component without its leading slash
    pub fn path_name(&self) -> &str {
        self.url.path().trim_start_matches('/')
    }

    /// Keyspace named by the path; required by the wide-column driver
    pub fn keyspace(&self) -> DbResult<&str> {
        match self.path_name() {
            "" => Err(DbError::InvalidUrl(
                "database url missing required keyspace".to_string(),
            )),
            keyspace => Ok(keyspace),
        }
    }

    /// DuckDB database location: `:memory:` or a file path.
    ///
    /// Only `duckdb::memory:` and `duckdb:///:memory:` open an in-memory
    /// database. In `duckdb://ledger.duckdb` the first segment parses as a
    /// host, so host and path together form a relative file path.
    pub fn duckdb_path(&self) -> DbResult<String> {
        let host = self.url.host_str().unwrap_or_default();
        match (host, self.url.path()) {
            ("", ":memory:" | "/:memory:") => Ok(":memory:".to_string()),
            ("", "" | "/") => Err(DbError::InvalidUrl(format!(
                "database url missing DuckDB file path: {}",
                self.url
            ))),
            ("", path) => Ok(path.to_string()),
            (host, path) => Ok(format!("{host}{path}")),
        }
    }

    /// Copy of the URL with sledger's TLS parameters removed
    pub fn without_tls_params(&self) -> Url {
        let kept: Vec<(String, String)> = self
            .url
            .query_pairs()
            .filter(|(k, _)| !TLS_QUERY_KEYS.contains(&k.as_ref()))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let mut url = self.url.clone();
        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
        url
    }
}

impl fmt::Display for ConnectionUrl {
    /// Formats the URL with any password masked
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.url.password().is_some() {
            let mut redacted = self.url.clone();
            if redacted.set_password(Some("****")).is_ok() {
                return write!(f, "{redacted}");
            }
        }
        write!(f, "{}", self.url)
    }
}

/// Open the driver selected by `database_url`.
///
/// Connecting also prepares the ledger: version gate, ledger tables and, for
/// the wide-column driver, the keyspace.
pub async fn connect(database_url: &str) -> DbResult<Box<dyn Driver>> {
    let url = ConnectionUrl::parse(database_url)?;
    log::info!("{} {}", Step::Connect, url);

    let driver: Box<dyn Driver> = match url.kind() {
        DbKind::Postgres => {
            let conn = PostgresConnection::connect(&url).await?;
            Box::new(SqlDriver::open(conn).await?)
        }
        DbKind::DuckDb => {
            let conn = DuckDbConnection::new(&url.duckdb_path()?)?;
            Box::new(SqlDriver::open(conn).await?)
        }
        DbKind::Cassandra => {
            let session = ScyllaSession::connect(&url).await?;
            Box::new(CqlDriver::open(session).await?)
        }
    };
    Ok(driver)
}

#[cfg(test)]
#[path = "connection_test.rs"]
mod tests;
