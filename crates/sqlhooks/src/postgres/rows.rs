use super::types::decode_row;
use super::{guarded, params};
use crate::context::Context;
use crate::driver::{ExecResult, Rows, Statement, StatementCapabilities};
use crate::error::DbResult;
use crate::value::{NamedValue, Value, named_to_positional};
use futures_util::StreamExt;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use tokio_postgres::{Client, RowStream};

/// A server-side prepared statement.
///
/// The server releases it when the last handle is dropped.
pub struct PgStatement {
    client: Arc<Client>,
    stmt: tokio_postgres::Statement,
}

impl PgStatement {
    pub(super) fn new(client: Arc<Client>, stmt: tokio_postgres::Statement) -> Self {
        Self { client, stmt }
    }

    /// Get the underlying `tokio-postgres` statement.
    pub fn inner(&self) -> &tokio_postgres::Statement {
        &self.stmt
    }
}

impl fmt::Debug for PgStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgStatement")
            .field("params", &self.stmt.params().len())
            .field("columns", &self.stmt.columns().len())
            .finish()
    }
}

impl Statement for PgStatement {
    type Rows = PgRows;

    fn capabilities(&self) -> StatementCapabilities {
        StatementCapabilities {
            execute_context: true,
            query_context: true,
            named_parameters: false,
        }
    }

    fn num_input(&self) -> Option<usize> {
        Some(self.stmt.params().len())
    }

    async fn execute(&self, args: &[Value]) -> DbResult<ExecResult> {
        let n = self.client.execute(&self.stmt, &params(args)).await?;
        Ok(ExecResult::new(n))
    }

    async fn query(&self, args: &[Value]) -> DbResult<PgRows> {
        PgRows::start(&self.client, &self.stmt, args).await
    }

    async fn execute_context(&self, ctx: &Context, args: &[NamedValue]) -> DbResult<ExecResult> {
        let values = named_to_positional(args)?;
        guarded(&self.client, ctx, self.execute(&values)).await
    }

    async fn query_context(&self, ctx: &Context, args: &[NamedValue]) -> DbResult<PgRows> {
        let values = named_to_positional(args)?;
        guarded(&self.client, ctx, self.query(&values)).await
    }

    async fn close(&self) -> DbResult<()> {
        Ok(())
    }
}

/// A streaming result set.
///
/// Rows are decoded into [`Value`]s as they arrive.
pub struct PgRows {
    columns: Vec<String>,
    stream: Option<Pin<Box<RowStream>>>,
}

impl PgRows {
    pub(super) async fn start(
        client: &Client,
        stmt: &tokio_postgres::Statement,
        args: &[Value],
    ) -> DbResult<Self> {
        let columns = stmt
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        let stream = client.query_raw(stmt, args.iter()).await?;
        Ok(Self {
            columns,
            stream: Some(Box::pin(stream)),
        })
    }

    /// Rows affected, known once the stream is exhausted.
    pub fn rows_affected(&self) -> Option<u64> {
        self.stream.as_ref().and_then(|s| s.rows_affected())
    }
}

impl fmt::Debug for PgRows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgRows")
            .field("columns", &self.columns)
            .field("open", &self.stream.is_some())
            .finish()
    }
}

impl Rows for PgRows {
    fn columns(&self) -> Vec<String> {
        self.columns.clone()
    }

    async fn next(&mut self) -> DbResult<Option<Vec<Value>>> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };
        match stream.next().await {
            Some(row) => Ok(Some(decode_row(&row?)?)),
            None => Ok(None),
        }
    }

    async fn close(&mut self) -> DbResult<()> {
        self.stream = None;
        Ok(())
    }
}
