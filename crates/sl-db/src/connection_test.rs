use super::*;
use crate::tls::SslMode;

#[test]
fn test_scheme_selects_driver() {
    assert_eq!(
        ConnectionUrl::parse("postgresql://localhost/app").unwrap().kind(),
        DbKind::Postgres
    );
    assert_eq!(
        ConnectionUrl::parse("postgres://localhost").unwrap().kind(),
        DbKind::Postgres
    );
    assert_eq!(
        ConnectionUrl::parse("CASSANDRA://localhost/ks").unwrap().kind(),
        DbKind::Cassandra
    );
    assert_eq!(
        ConnectionUrl::parse("duckdb::memory:").unwrap().kind(),
        DbKind::DuckDb
    );
}

#[test]
fn test_unknown_scheme() {
    let err = ConnectionUrl::parse("mysql://localhost/app").unwrap_err();
    assert!(err.to_string().contains("Unknown database protocol"));
}

#[test]
fn test_unparseable_url() {
    assert!(matches!(
        ConnectionUrl::parse("not a url").unwrap_err(),
        DbError::InvalidUrl(_)
    ));
}

#[test]
fn test_keyspace_from_path() {
    let url = ConnectionUrl::parse("cassandra://user:pw@localhost:9042/inventory").unwrap();
    assert_eq!(url.keyspace().unwrap(), "inventory");
}

#[test]
fn test_missing_keyspace() {
    let url = ConnectionUrl::parse("cassandra://localhost:9042").unwrap();
    let err = url.keyspace().unwrap_err();
    assert!(err.to_string().contains("missing required keyspace"));
}

fn duckdb_path(raw: &str) -> DbResult<String> {
    ConnectionUrl::parse(raw).unwrap().duckdb_path()
}

#[test]
fn test_duckdb_paths() {
    assert_eq!(duckdb_path("duckdb::memory:").unwrap(), ":memory:");
    assert_eq!(duckdb_path("duckdb:///:memory:").unwrap(), ":memory:");
    assert_eq!(
        duckdb_path("duckdb:///tmp/ledger.duckdb").unwrap(),
        "/tmp/ledger.duckdb"
    );
}

#[test]
fn test_duckdb_relative_paths() {
    assert_eq!(duckdb_path("duckdb://ledger.duckdb").unwrap(), "ledger.duckdb");
    assert_eq!(
        duckdb_path("duckdb://data/ledger.duckdb").unwrap(),
        "data/ledger.duckdb"
    );
}

#[test]
fn test_duckdb_missing_path() {
    assert!(matches!(
        duckdb_path("duckdb://").unwrap_err(),
        DbError::InvalidUrl(_)
    ));
}

#[tokio::test]
async fn test_connect_duckdb_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join("ledger.duckdb");
    let driver = connect(&format!("duckdb://{}", file.display()))
        .await
        .unwrap();
    driver.close().await.unwrap();
    assert!(file.exists());
}

#[test]
fn test_tls_options_from_query() {
    let url =
        ConnectionUrl::parse("cassandra://localhost/ks?sslmode=require&sslrootcert=/ca.pem").unwrap();
    let opts = url.tls_options().unwrap();
    assert_eq!(opts.mode, SslMode::Require);
    assert_eq!(opts.settings.ca_path.as_deref(), Some("/ca.pem"));
}

#[test]
fn test_without_tls_params() {
    let url = ConnectionUrl::parse(
        "postgresql://u:p@localhost:5432/app?sslmode=allow&application_name=sledger&sslcert=c.pem",
    )
    .unwrap();
    assert_eq!(
        url.without_tls_params().as_str(),
        "postgresql://u:p@localhost:5432/app?application_name=sledger"
    );

    let url = ConnectionUrl::parse("postgresql://localhost/app?sslmode=disable").unwrap();
    assert_eq!(url.without_tls_params().as_str(), "postgresql://localhost/app");
}

#[test]
fn test_display_redacts_password() {
    let url = ConnectionUrl::parse("postgresql://migrator:s3cret@db:5432/app").unwrap();
    let shown = url.to_string();
    assert!(!shown.contains("s3cret"));
    assert!(shown.contains("migrator:****@db"));
}

#[tokio::test]
async fn test_connect_duckdb_in_memory() {
    let driver = connect("duckdb::memory:").await.unwrap();
    assert_eq!(driver.db_type(), "duckdb");
    assert_eq!(driver.backend(), sl_core::Backend::Sql);
    driver.close().await.unwrap();
}

#[tokio::test]
async fn test_connect_unknown_scheme() {
    assert!(connect("sqlite://ledger.db").await.is_err());
}
