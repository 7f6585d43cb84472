//! PostgreSQL ledger connection

use super::{
    index_from_sql, index_to_sql, SqlConnection, DELETE_ENTRY, INSERT_ENTRY, INSERT_VERSION,
    SELECT_LEDGER, SELECT_VERSION,
};
use crate::connection::ConnectionUrl;
use crate::error::{DbError, DbResult};
use crate::tls::{configure_tls, connect_with_fallback, TlsAttempt, TlsSettings};
use async_trait::async_trait;
use openssl::ssl::{SslConnector, SslMethod};
use postgres_openssl::MakeTlsConnector;
use sl_core::LedgerEntry;
use tokio::task::JoinHandle;
use tokio_postgres::config::SslMode as PgSslMode;
use tokio_postgres::{Client, Config, NoTls};

/// PostgreSQL connection.
///
/// The connection future runs on its own task; closing drops the client and
/// waits for that task so connection errors are not lost.
pub struct PostgresConnection {
    client: Client,
    connection: JoinHandle<Result<(), tokio_postgres::Error>>,
}

impl PostgresConnection {
    /// Connect using the TLS attempts implied by the URL's `sslmode`
    pub async fn connect(url: &ConnectionUrl) -> DbResult<Self> {
        let config: Config = url
            .without_tls_params()
            .as_str()
            .parse()
            .map_err(|e: tokio_postgres::Error| DbError::InvalidUrl(e.to_string()))?;
        let attempts = url.tls_options()?.attempts()?;

        connect_with_fallback(&attempts, |attempt| {
            let config = config.clone();
            async move { Self::connect_once(config, attempt).await }
        })
        .await
    }

    async fn connect_once(mut config: Config, attempt: TlsAttempt) -> DbResult<Self> {
        let connection_error = |e: tokio_postgres::Error| DbError::ConnectionError(e.to_string());

        let (client, connection) = match attempt {
            None => {
                config.ssl_mode(PgSslMode::Disable);
                let (client, connection) = config.connect(NoTls).await.map_err(connection_error)?;
                (client, tokio::spawn(connection))
            }
            Some(settings) => {
                config.ssl_mode(PgSslMode::Require);
                let tls = tls_connector(&settings)?;
                let (client, connection) = config.connect(tls).await.map_err(connection_error)?;
                (client, tokio::spawn(connection))
            }
        };

        Ok(Self { client, connection })
    }
}

fn tls_connector(settings: &TlsSettings) -> DbResult<MakeTlsConnector> {
    let mut builder = SslConnector::builder(SslMethod::tls())?;
    // The connector checks the host name itself on each handshake.
    configure_tls(&mut builder, settings, None)?;

    let mut connector = MakeTlsConnector::new(builder.build());
    if !settings.verify_peer {
        connector.set_callback(|config, _| {
            config.set_verify_hostname(false);
            Ok(())
        });
    }
    Ok(connector)
}

#[async_trait]
impl SqlConnection for PostgresConnection {
    fn db_type(&self) -> &'static str {
        "postgresql"
    }

    async fn execute_batch(&mut self, sql: &str) -> DbResult<()> {
        self.client
            .batch_execute(sql)
            .await
            .map_err(|e| DbError::execution(sql, e))
    }

    async fn query_version(&mut self) -> DbResult<Option<String>> {
        let rows = self.client.query(SELECT_VERSION, &[]).await?;
        match rows.first() {
            Some(row) => Ok(row.try_get::<_, Option<String>>(0)?),
            None => Ok(None),
        }
    }

    async fn insert_version(&mut self, version: &str) -> DbResult<()> {
        self.client.execute(INSERT_VERSION, &[&version]).await?;
        Ok(())
    }

    async fn query_ledger(&mut self) -> DbResult<Vec<LedgerEntry>> {
        let rows = self.client.query(SELECT_LEDGER, &[]).await?;
        rows.iter()
            .map(|row| -> DbResult<LedgerEntry> {
                Ok(LedgerEntry {
                    index: index_from_sql(row.try_get::<_, i64>(0)?)?,
                    forward: row.try_get(1)?,
                    backward: row.try_get(2)?,
                })
            })
            .collect()
    }

    async fn insert_entry(&mut self, entry: &LedgerEntry) -> DbResult<()> {
        let index = index_to_sql(entry.index)?;
        self.client
            .execute(INSERT_ENTRY, &[&index, &entry.forward, &entry.backward])
            .await?;
        Ok(())
    }

    async fn delete_entry(&mut self, index: u64) -> DbResult<()> {
        let index = index_to_sql(index)?;
        self.client.execute(DELETE_ENTRY, &[&index]).await?;
        Ok(())
    }

    async fn close(self) -> DbResult<()> {
        drop(self.client);
        match self.connection.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(DbError::CloseError(e.to_string())),
            Err(e) => Err(DbError::CloseError(e.to_string())),
        }
    }
}
