//! End-to-end reconciliation against DuckDB files and the in-memory
//! wide-column session.

use sl_core::{Migration, MigrationSource};
use sl_db::{CqlDriver, Driver, MemorySession};
use sl_engine::{reconcile, run, EngineError};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("migrations")).unwrap();
        Self { dir }
    }

    fn migrations(&self) -> PathBuf {
        self.dir.path().join("migrations")
    }

    fn write(&self, id: &str, body: &str) {
        fs::write(self.migrations().join(format!("{id}.yml")), body).unwrap();
    }

    fn remove(&self, id: &str) {
        fs::remove_file(self.migrations().join(format!("{id}.yml"))).unwrap();
    }

    fn database_url(&self) -> String {
        format!("duckdb://{}", self.dir.path().join("ledger.duckdb").display())
    }

    fn source(&self) -> MigrationSource {
        MigrationSource::new(self.migrations())
    }

    fn tables(&self) -> Vec<String> {
        let conn = duckdb::Connection::open(self.dir.path().join("ledger.duckdb")).unwrap();
        let mut stmt = conn
            .prepare("select table_name from information_schema.tables order by table_name")
            .unwrap();
        let tables = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        tables
    }
}

const USERS: &str = r#"
id: 0001_users
changes:
  - sql:
      forward: create table users (id integer)
      backward: drop table users
"#;

const ORDERS: &str = r#"
id: 0002_orders
changes:
  - sql:
      forward: create table orders (id integer)
      backward: drop table orders
"#;

const AUDIT: &str = r#"
id: 0002_audit
changes:
  - sql:
      forward: create table audit (id integer)
      backward: drop table audit
"#;

#[tokio::test]
async fn test_apply_is_idempotent() {
    let ws = Workspace::new();
    ws.write("0001_users", USERS);
    ws.write("0002_orders", ORDERS);

    let first = run(&ws.database_url(), &ws.source()).await.unwrap();
    assert_eq!(first.forwarded, 2);

    let second = run(&ws.database_url(), &ws.source()).await.unwrap();
    assert_eq!(second.forwarded, 0);
    assert_eq!(second.skipped, 2);
    assert!(second.reversed.is_empty());
}

#[tokio::test]
async fn test_replacing_a_migration_rolls_back_then_forwards() {
    let ws = Workspace::new();
    ws.write("0001_users", USERS);
    ws.write("0002_orders", ORDERS);
    run(&ws.database_url(), &ws.source()).await.unwrap();

    ws.remove("0002_orders");
    let summary = run(&ws.database_url(), &ws.source()).await.unwrap();
    assert_eq!(summary.reversed, vec![1]);

    ws.write("0002_audit", AUDIT);
    let summary = run(&ws.database_url(), &ws.source()).await.unwrap();
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.forwarded, 1);

    let tables = ws.tables();
    assert!(tables.contains(&"users".to_string()));
    assert!(tables.contains(&"audit".to_string()));
    assert!(!tables.contains(&"orders".to_string()));
}

#[tokio::test]
async fn test_edited_migration_is_divergence() {
    let ws = Workspace::new();
    ws.write("0001_users", USERS);
    run(&ws.database_url(), &ws.source()).await.unwrap();

    ws.write(
        "0001_users",
        &USERS.replace("users (id integer)", "users (id bigint)"),
    );
    let err = run(&ws.database_url(), &ws.source()).await.unwrap_err();
    assert!(matches!(err, EngineError::Apply { index: 0, .. }));
    let message = err.to_string();
    assert!(message.contains("create table users (id integer)"));
    assert!(message.contains("create table users (id bigint)"));
}

#[tokio::test]
async fn test_missing_migration_root() {
    let ws = Workspace::new();
    let source = MigrationSource::new(ws.dir.path().join("nope"));
    let err = run(&ws.database_url(), &source).await.unwrap_err();
    assert!(matches!(err, EngineError::Core(_)));
}

#[tokio::test]
async fn test_wide_column_reconcile() {
    let session = MemorySession::new();
    let declared: Vec<Migration> = vec![load_fixture(
        r#"
id: 0001_events
changes:
  - cql:
      forward: CREATE TABLE events (id uuid PRIMARY KEY)
      backward: DROP TABLE events
  - cql:
      forward: CREATE TABLE sessions (id uuid PRIMARY KEY)
      backward: DROP TABLE sessions
"#,
    )];

    let mut driver = CqlDriver::open(session.clone()).await.unwrap();
    let summary = reconcile(&mut driver, &declared).await.unwrap();
    assert_eq!(summary.forwarded, 2);
    Box::new(driver).close().await.unwrap();

    let mut trimmed = declared.clone();
    trimmed[0].changes.truncate(1);
    let mut driver = CqlDriver::open(session.clone()).await.unwrap();
    let summary = reconcile(&mut driver, &trimmed).await.unwrap();
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.reversed, vec![1]);
    assert_eq!(
        session.rows().get("latest").map(String::as_str),
        Some("0")
    );
    assert_eq!(
        session.executed().last().map(String::as_str),
        Some("DROP TABLE sessions")
    );
}

fn load_fixture(body: &str) -> Migration {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("0001_events.yml");
    fs::write(&path, body).unwrap();
    sl_core::load_migration(&path).unwrap()
}

#[tokio::test]
async fn test_dropping_trailing_alter_reverses_it() {
    let ws = Workspace::new();
    ws.write(
        "0001_table",
        r#"
id: 0001_table
changes:
  - sql:
      forward: CREATE TABLE t (id integer)
      backward: DROP TABLE t
"#,
    );
    ws.write(
        "0002_column",
        r#"
id: 0002_column
changes:
  - sql:
      forward: ALTER TABLE t ADD COLUMN c integer
      backward: ALTER TABLE t DROP COLUMN c
"#,
    );

    let first = run(&ws.database_url(), &ws.source()).await.unwrap();
    assert_eq!(first.forwarded, 2);
    assert!(first.reversed.is_empty());

    ws.remove("0002_column");
    let second = run(&ws.database_url(), &ws.source()).await.unwrap();
    assert_eq!(second.skipped, 1);
    assert_eq!(second.reversed, vec![1]);

    let conn = duckdb::Connection::open(ws.dir.path().join("ledger.duckdb")).unwrap();
    let rows: i64 = conn
        .query_row(r#"select count(*) from "sledger""#, [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
    let columns: i64 = conn
        .query_row(
            "select count(*) from information_schema.columns where table_name = 't' and column_name = 'c'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(columns, 0);
}
