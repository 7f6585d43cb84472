//! Cassandra/Scylla session

use super::{
    quote_identifier, CqlSession, LedgerWrite, DELETE_ENTRY, INSERT_ENTRY, INSERT_VERSION,
    SELECT_ENTRY, SELECT_VERSION,
};
use crate::connection::ConnectionUrl;
use crate::error::{DbError, DbResult};
use crate::tls::{configure_tls, connect_with_fallback, TlsAttempt};
use async_trait::async_trait;
use openssl::ssl::{SslContext, SslMethod};
use scylla::batch::{Batch, BatchType};
use scylla::{QueryResult, Session, SessionBuilder};
use sl_core::Step;

/// Native protocol port used when the URL names none
pub const DEFAULT_PORT: u16 = 9042;

/// Session against a Cassandra-compatible cluster, bound to the keyspace
/// named by the connection string.
pub struct ScyllaSession {
    session: Session,
}

#[derive(Clone)]
struct Credentials {
    username: String,
    password: String,
}

impl ScyllaSession {
    /// Connect, create the keyspace if absent and switch to it.
    pub async fn connect(url: &ConnectionUrl) -> DbResult<Self> {
        let keyspace = url.keyspace()?;
        let quoted = quote_identifier(keyspace)?;
        let attempts = url.tls_options()?.attempts()?;

        let host = url
            .url()
            .host_str()
            .ok_or_else(|| DbError::InvalidUrl("database url missing host".to_string()))?;
        let node = format!("{host}:{}", url.url().port().unwrap_or(DEFAULT_PORT));
        let host = host.to_string();
        let credentials = (!url.url().username().is_empty()).then(|| Credentials {
            username: url.url().username().to_string(),
            password: url.url().password().unwrap_or_default().to_string(),
        });

        let session = connect_with_fallback(&attempts, |attempt| {
            let node = node.clone();
            let host = host.clone();
            let credentials = credentials.clone();
            async move { connect_once(node, host, credentials, attempt).await }
        })
        .await?;

        // SimpleStrategy with a single replica works on one-node clusters;
        // operators adjust replication with ALTER KEYSPACE migrations.
        log::info!("{} Creating sledger keyspace if it does not exist...", Step::Setup);
        let create = format!(
            "CREATE KEYSPACE IF NOT EXISTS {quoted} WITH replication = {{'class': 'SimpleStrategy', 'replication_factor': 1}}"
        );
        session
            .query(create.as_str(), ())
            .await
            .map_err(|e| DbError::SetupError(e.to_string()))?;
        session
            .use_keyspace(keyspace, true)
            .await
            .map_err(|e| DbError::SetupError(e.to_string()))?;

        Ok(Self { session })
    }
}

async fn connect_once(
    node: String,
    host: String,
    credentials: Option<Credentials>,
    attempt: TlsAttempt,
) -> DbResult<Session> {
    let mut builder = SessionBuilder::new().known_node(node);
    if let Some(credentials) = credentials {
        builder = builder.user(credentials.username, credentials.password);
    }
    if let Some(settings) = attempt {
        let mut context = SslContext::builder(SslMethod::tls())?;
        configure_tls(&mut context, &settings, Some(&host))?;
        builder = builder.ssl_context(Some(context.build()));
    }

    builder
        .build()
        .await
        .map_err(|e| DbError::ConnectionError(e.to_string()))
}

/// Single text column of the first row, if any
fn first_text(result: QueryResult) -> DbResult<Option<String>> {
    let row = result
        .maybe_first_row_typed::<(Option<String>,)>()
        .map_err(|e| DbError::QueryError(e.to_string()))?;
    Ok(row.and_then(|(value,)| value))
}

#[async_trait]
impl CqlSession for ScyllaSession {
    async fn execute(&mut self, cql: &str) -> DbResult<()> {
        self.session
            .query(cql, ())
            .await
            .map_err(|e| DbError::execution(cql, e))?;
        Ok(())
    }

    async fn read_version(&mut self) -> DbResult<Option<String>> {
        let result = self
            .session
            .query(SELECT_VERSION, ())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        first_text(result)
    }

    async fn write_version(&mut self, version: &str) -> DbResult<()> {
        self.session
            .query(INSERT_VERSION, (version,))
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        Ok(())
    }

    async fn get(&mut self, key: &str) -> DbResult<Option<String>> {
        let result = self
            .session
            .query(SELECT_ENTRY, (key,))
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        first_text(result)
    }

    async fn write_batch(&mut self, writes: &[LedgerWrite]) -> DbResult<()> {
        let mut batch = Batch::new(BatchType::Logged);
        let mut values: Vec<Vec<String>> = Vec::with_capacity(writes.len());
        for write in writes {
            match write {
                LedgerWrite::Put { key, value } => {
                    batch.append_statement(INSERT_ENTRY);
                    values.push(vec![key.clone(), value.clone()]);
                }
                LedgerWrite::Delete { key } => {
                    batch.append_statement(DELETE_ENTRY);
                    values.push(vec![key.clone()]);
                }
            }
        }

        self.session
            .batch(&batch, values)
            .await
            .map_err(|e| DbError::TransactionError(format!("logged batch failed: {e}")))?;
        Ok(())
    }

    async fn close(self) -> DbResult<()> {
        drop(self.session);
        Ok(())
    }
}
