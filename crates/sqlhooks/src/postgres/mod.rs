//! [`Driver`] implementation over `tokio-postgres`.
//!
//! Enabled with the `postgres` cargo feature. Connections use `NoTls`; each
//! connection drives its socket on a spawned task.
//!
//! Placeholders are PostgreSQL's positional `$1, $2, ...`, so
//! [`Capabilities::named_parameters`] is off and the hook layer rejects
//! named arguments before they reach this driver.
//!
//! The context forms honour cancellation and deadlines: when the context
//! ends first, a cancel request is sent to the server and the call returns
//! [`crate::DbError::Cancelled`] or [`crate::DbError::DeadlineExceeded`].

mod rows;
mod types;

pub use rows::{PgRows, PgStatement};

use crate::context::Context;
use crate::driver::{Capabilities, Connection, Driver, ExecResult, Transaction, TxOptions};
use crate::error::DbResult;
use crate::value::{NamedValue, Value, named_to_positional};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls};

/// Connection settings applied on top of the DSN.
#[derive(Debug, Clone, Default)]
pub struct PgDriverConfig {
    /// Reported to the server as `application_name`, unless the DSN sets one.
    pub application_name: Option<String>,
    /// Connect timeout, unless the DSN sets one.
    pub connect_timeout: Option<Duration>,
}

impl PgDriverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Fill in settings the parsed DSN left unset.
    fn apply(&self, pg_config: &mut tokio_postgres::Config) {
        if let Some(name) = &self.application_name
            && pg_config.get_application_name().is_none()
        {
            pg_config.application_name(name);
        }
        if let Some(timeout) = self.connect_timeout
            && pg_config.get_connect_timeout().is_none()
        {
            pg_config.connect_timeout(timeout);
        }
    }
}

/// Opens `tokio-postgres` connections from a DSN.
///
/// Accepts both URL (`postgres://user@host/db`) and key/value
/// (`host=localhost user=app`) connection strings.
#[derive(Debug, Clone, Default)]
pub struct PgDriver {
    config: PgDriverConfig,
}

impl PgDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PgDriverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PgDriverConfig {
        &self.config
    }
}

impl Driver for PgDriver {
    type Conn = PgConnection;

    async fn open(&self, dsn: &str) -> DbResult<PgConnection> {
        let mut pg_config: tokio_postgres::Config = dsn.parse()?;
        self.config.apply(&mut pg_config);

        let (client, connection) = pg_config.connect(NoTls).await?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::warn!(target: "sqlhooks", error = %e, "postgres connection closed with error");
            }
        });

        tracing::debug!(target: "sqlhooks", hosts = ?pg_config.get_hosts(), "opened postgres connection");
        Ok(PgConnection {
            client: Arc::new(client),
        })
    }
}

/// A single PostgreSQL session.
#[derive(Clone)]
pub struct PgConnection {
    client: Arc<Client>,
}

impl fmt::Debug for PgConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgConnection")
            .field("closed", &self.client.is_closed())
            .finish()
    }
}

impl PgConnection {
    /// Get the underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Run `fut` under `ctx`; if the context ends first, ask the server to
/// cancel whatever the session is running.
pub(crate) async fn guarded<T, F>(client: &Client, ctx: &Context, fut: F) -> DbResult<T>
where
    F: Future<Output = DbResult<T>>,
{
    if let Some(err) = ctx.err() {
        return Err(err);
    }
    let result = ctx.guard(fut).await;
    if let Err(err) = &result {
        if err.is_context_error() {
            let cancel_token = client.cancel_token();
            tokio::spawn(async move {
                let _ = cancel_token.cancel_query(NoTls).await;
            });
        }
    }
    result
}

pub(crate) fn params(values: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    values.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

impl Connection for PgConnection {
    type Stmt = PgStatement;
    type Rows = PgRows;
    type Tx = PgTransaction;

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            named_parameters: false,
            ..Capabilities::all()
        }
    }

    async fn prepare(&self, query: &str) -> DbResult<PgStatement> {
        let stmt = self.client.prepare(query).await?;
        Ok(PgStatement::new(self.client.clone(), stmt))
    }

    async fn execute(&self, query: &str, args: &[Value]) -> DbResult<ExecResult> {
        let n = self.client.execute(query, &params(args)).await?;
        Ok(ExecResult::new(n))
    }

    async fn query(&self, query: &str, args: &[Value]) -> DbResult<PgRows> {
        let stmt = self.client.prepare(query).await?;
        PgRows::start(&self.client, &stmt, args).await
    }

    async fn execute_context(
        &self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> DbResult<ExecResult> {
        let values = named_to_positional(args)?;
        guarded(&self.client, ctx, self.execute(query, &values)).await
    }

    async fn query_context(
        &self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> DbResult<PgRows> {
        let values = named_to_positional(args)?;
        guarded(&self.client, ctx, self.query(query, &values)).await
    }

    async fn begin(&self) -> DbResult<PgTransaction> {
        self.client.batch_execute("BEGIN").await?;
        Ok(PgTransaction::new(self.client.clone()))
    }

    async fn begin_tx(&self, ctx: &Context, opts: TxOptions) -> DbResult<PgTransaction> {
        let sql = begin_statement(opts);
        guarded(&self.client, ctx, async {
            self.client.batch_execute(&sql).await?;
            Ok(PgTransaction::new(self.client.clone()))
        })
        .await
    }

    async fn ping(&self, ctx: &Context) -> DbResult<()> {
        guarded(&self.client, ctx, async {
            self.client.simple_query("SELECT 1").await?;
            Ok(())
        })
        .await
    }

    async fn reset_session(&self, ctx: &Context) -> DbResult<()> {
        guarded(&self.client, ctx, async {
            self.client.batch_execute("DISCARD ALL").await?;
            Ok(())
        })
        .await
    }

    async fn close(&self) -> DbResult<()> {
        // The connection task ends once every client handle is dropped.
        Ok(())
    }
}

fn begin_statement(opts: TxOptions) -> String {
    let mut sql = String::from("BEGIN");
    if let Some(level) = opts.isolation {
        sql.push_str(" ISOLATION LEVEL ");
        sql.push_str(level.as_sql());
    }
    if opts.read_only {
        sql.push_str(" READ ONLY");
    }
    sql
}

/// An open transaction, ended with `COMMIT` or `ROLLBACK`.
///
/// Dropping it unfinished rolls back in the background.
pub struct PgTransaction {
    client: Arc<Client>,
    finished: bool,
}

impl fmt::Debug for PgTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgTransaction")
            .field("finished", &self.finished)
            .finish()
    }
}

impl PgTransaction {
    fn new(client: Arc<Client>) -> Self {
        Self {
            client,
            finished: false,
        }
    }

    async fn finish(mut self, sql: &str) -> DbResult<()> {
        self.finished = true;
        self.client.batch_execute(sql).await?;
        Ok(())
    }
}

impl Transaction for PgTransaction {
    async fn commit(self) -> DbResult<()> {
        self.finish("COMMIT").await
    }

    async fn rollback(self) -> DbResult<()> {
        self.finish("ROLLBACK").await
    }
}

impl Drop for PgTransaction {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        tracing::warn!(target: "sqlhooks", "transaction dropped without commit or rollback");
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let client = self.client.clone();
            handle.spawn(async move {
                let _ = client.batch_execute("ROLLBACK").await;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::IsolationLevel;

    #[test]
    fn begin_statement_options() {
        assert_eq!(begin_statement(TxOptions::new()), "BEGIN");
        assert_eq!(
            begin_statement(
                TxOptions::new()
                    .isolation(IsolationLevel::Serializable)
                    .read_only(true)
            ),
            "BEGIN ISOLATION LEVEL SERIALIZABLE READ ONLY"
        );
    }

    #[test]
    fn driver_config_builder() {
        let config = PgDriverConfig::new()
            .application_name("loghooks")
            .connect_timeout(Duration::from_secs(3));
        assert_eq!(config.application_name.as_deref(), Some("loghooks"));
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(3)));
        assert_eq!(
            PgDriver::with_config(config).config().application_name.as_deref(),
            Some("loghooks")
        );
    }

    #[test]
    fn driver_config_fills_only_unset_dsn_settings() {
        let config = PgDriverConfig::new()
            .application_name("loghooks")
            .connect_timeout(Duration::from_secs(3));

        let mut from_dsn: tokio_postgres::Config =
            "host=localhost application_name=reports connect_timeout=10"
                .parse()
                .unwrap();
        config.apply(&mut from_dsn);
        assert_eq!(from_dsn.get_application_name(), Some("reports"));
        assert_eq!(from_dsn.get_connect_timeout(), Some(&Duration::from_secs(10)));

        let mut bare: tokio_postgres::Config = "postgres://app@localhost/db".parse().unwrap();
        config.apply(&mut bare);
        assert_eq!(bare.get_application_name(), Some("loghooks"));
        assert_eq!(bare.get_connect_timeout(), Some(&Duration::from_secs(3)));

        let mut untouched: tokio_postgres::Config = "host=localhost".parse().unwrap();
        PgDriverConfig::new().apply(&mut untouched);
        assert_eq!(untouched.get_application_name(), None);
        assert_eq!(untouched.get_connect_timeout(), None);
    }
}
