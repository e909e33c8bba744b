//! The three-tier driver contract: driver, connection, statement.
//!
//! A concrete database driver implements these traits; the wrappers in
//! [`crate::wrap`] implement them too, so a wrapped driver can stand in
//! wherever the original is accepted.
//!
//! Optional operations have default bodies returning
//! [`DbError::Unsupported`], and each object reports what it actually
//! implements through a capability record ([`Capabilities`] or
//! [`StatementCapabilities`]). Callers consult the record instead of probing.

use crate::context::Context;
use crate::error::{DbError, DbResult};
use crate::value::{NamedValue, Value};
use std::future::Future;

/// Optional operations a connection implements.
///
/// The context-carrying forms take [`NamedValue`]s. Unless `named_parameters`
/// is set, the arguments a connection receives there never carry names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// [`Connection::execute`] (positional values, no context).
    pub execute: bool,
    /// [`Connection::query`] (positional values, no context).
    pub query: bool,
    /// [`Connection::execute_context`].
    pub execute_context: bool,
    /// [`Connection::query_context`].
    pub query_context: bool,
    /// The context forms accept named arguments.
    pub named_parameters: bool,
    /// [`Connection::begin_tx`].
    pub begin_tx: bool,
    /// [`Connection::ping`].
    pub ping: bool,
    /// [`Connection::reset_session`].
    pub reset_session: bool,
}

impl Capabilities {
    /// A connection that only prepares statements and begins transactions.
    pub fn none() -> Self {
        Self::default()
    }

    /// Every optional operation.
    pub fn all() -> Self {
        Self {
            execute: true,
            query: true,
            execute_context: true,
            query_context: true,
            named_parameters: true,
            begin_tx: true,
            ping: true,
            reset_session: true,
        }
    }

    /// Ad hoc execution without preparing, in either form.
    pub fn direct_execute(&self) -> bool {
        self.execute || self.execute_context
    }

    /// Ad hoc queries without preparing, in either form.
    pub fn direct_query(&self) -> bool {
        self.query || self.query_context
    }
}

/// Optional operations a prepared statement implements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatementCapabilities {
    /// [`Statement::execute_context`].
    pub execute_context: bool,
    /// [`Statement::query_context`].
    pub query_context: bool,
    /// The context forms accept named arguments.
    pub named_parameters: bool,
}

impl StatementCapabilities {
    pub fn all() -> Self {
        Self {
            execute_context: true,
            query_context: true,
            named_parameters: true,
        }
    }
}

/// Outcome of a statement that does not return rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// Rows inserted, updated or deleted.
    pub rows_affected: u64,
    /// Database-generated id of the last inserted row, if the driver reports one.
    pub last_insert_id: Option<i64>,
}

impl ExecResult {
    pub fn new(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            last_insert_id: None,
        }
    }

    pub fn with_last_insert_id(mut self, id: i64) -> Self {
        self.last_insert_id = Some(id);
        self
    }
}

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    /// SQL spelling, as used in `SET TRANSACTION ISOLATION LEVEL ...`.
    pub fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

/// Options for [`Connection::begin_tx`].
///
/// By default the driver's isolation level and read/write mode apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxOptions {
    /// Isolation level. `None` uses the driver default.
    pub isolation: Option<IsolationLevel>,
    /// Start a read-only transaction.
    pub read_only: bool,
}

impl TxOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn isolation(mut self, level: IsolationLevel) -> Self {
        self.isolation = Some(level);
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }
}

/// Opens connections.
pub trait Driver: Send + Sync {
    type Conn: Connection;

    /// Open a new connection using a driver-specific connection string.
    fn open(&self, dsn: &str) -> impl Future<Output = DbResult<Self::Conn>> + Send;
}

/// A single database session.
///
/// Used by one logical operation at a time; the owner (typically a pool)
/// enforces that.
pub trait Connection: Send + Sync {
    type Stmt: Statement;
    type Rows: Rows;
    type Tx: Transaction;

    /// The optional operations this connection implements.
    fn capabilities(&self) -> Capabilities;

    /// Prepare a statement for repeated execution.
    fn prepare(&self, query: &str) -> impl Future<Output = DbResult<Self::Stmt>> + Send;

    /// Prepare a statement under a call context.
    ///
    /// The default implementation checks the context once and calls
    /// [`Connection::prepare`].
    fn prepare_context(
        &self,
        ctx: &Context,
        query: &str,
    ) -> impl Future<Output = DbResult<Self::Stmt>> + Send {
        let early = ctx.err();
        async move {
            match early {
                Some(err) => Err(err),
                None => self.prepare(query).await,
            }
        }
    }

    /// Run a statement without preparing it, positional parameters only.
    fn execute(
        &self,
        query: &str,
        args: &[Value],
    ) -> impl Future<Output = DbResult<ExecResult>> + Send {
        let _ = (query, args);
        async { Err(DbError::Unsupported("execute")) }
    }

    /// Run a query without preparing it, positional parameters only.
    fn query(
        &self,
        query: &str,
        args: &[Value],
    ) -> impl Future<Output = DbResult<Self::Rows>> + Send {
        let _ = (query, args);
        async { Err(DbError::Unsupported("query")) }
    }

    /// Run a statement without preparing it, honouring `ctx`.
    fn execute_context(
        &self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> impl Future<Output = DbResult<ExecResult>> + Send {
        let _ = (ctx, query, args);
        async { Err(DbError::Unsupported("execute_context")) }
    }

    /// Run a query without preparing it, honouring `ctx`.
    fn query_context(
        &self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> impl Future<Output = DbResult<Self::Rows>> + Send {
        let _ = (ctx, query, args);
        async { Err(DbError::Unsupported("query_context")) }
    }

    /// Begin a transaction with driver defaults.
    fn begin(&self) -> impl Future<Output = DbResult<Self::Tx>> + Send;

    /// Begin a transaction with explicit options, honouring `ctx`.
    fn begin_tx(
        &self,
        ctx: &Context,
        opts: TxOptions,
    ) -> impl Future<Output = DbResult<Self::Tx>> + Send {
        let _ = (ctx, opts);
        async { Err(DbError::Unsupported("begin_tx")) }
    }

    /// Check that the session is still usable.
    fn ping(&self, ctx: &Context) -> impl Future<Output = DbResult<()>> + Send {
        let _ = ctx;
        async { Err(DbError::Unsupported("ping")) }
    }

    /// Reset session state before the connection is reused.
    fn reset_session(&self, ctx: &Context) -> impl Future<Output = DbResult<()>> + Send {
        let _ = ctx;
        async { Err(DbError::Unsupported("reset_session")) }
    }

    /// Close the session.
    fn close(&self) -> impl Future<Output = DbResult<()>> + Send;
}

/// A prepared statement bound to the connection that prepared it.
pub trait Statement: Send + Sync {
    type Rows: Rows;

    /// The optional operations this statement implements.
    fn capabilities(&self) -> StatementCapabilities {
        StatementCapabilities::default()
    }

    /// Number of placeholders, or `None` if the driver cannot tell.
    fn num_input(&self) -> Option<usize>;

    fn execute(&self, args: &[Value]) -> impl Future<Output = DbResult<ExecResult>> + Send;

    fn query(&self, args: &[Value]) -> impl Future<Output = DbResult<Self::Rows>> + Send;

    fn execute_context(
        &self,
        ctx: &Context,
        args: &[NamedValue],
    ) -> impl Future<Output = DbResult<ExecResult>> + Send {
        let _ = (ctx, args);
        async { Err(DbError::Unsupported("statement execute_context")) }
    }

    fn query_context(
        &self,
        ctx: &Context,
        args: &[NamedValue],
    ) -> impl Future<Output = DbResult<Self::Rows>> + Send {
        let _ = (ctx, args);
        async { Err(DbError::Unsupported("statement query_context")) }
    }

    fn close(&self) -> impl Future<Output = DbResult<()>> + Send;
}

/// A forward-only row cursor.
pub trait Rows: Send {
    /// Column names of the result set.
    fn columns(&self) -> Vec<String>;

    /// The next row, or `None` when the cursor is exhausted.
    fn next(&mut self) -> impl Future<Output = DbResult<Option<Vec<Value>>>> + Send;

    fn close(&mut self) -> impl Future<Output = DbResult<()>> + Send;
}

/// An open transaction.
pub trait Transaction: Send {
    fn commit(self) -> impl Future<Output = DbResult<()>> + Send;

    fn rollback(self) -> impl Future<Output = DbResult<()>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_execution_in_either_form() {
        let caps = Capabilities {
            execute_context: true,
            ..Capabilities::none()
        };
        assert!(caps.direct_execute());
        assert!(!caps.direct_query());
        assert!(!caps.named_parameters);

        let positional = Capabilities {
            query: true,
            ..Capabilities::none()
        };
        assert!(positional.direct_query());
        assert!(!positional.direct_execute());
        assert!(Capabilities::all().named_parameters);
    }

    #[test]
    fn tx_options_builder() {
        let opts = TxOptions::new()
            .isolation(IsolationLevel::Serializable)
            .read_only(true);
        assert_eq!(opts.isolation, Some(IsolationLevel::Serializable));
        assert!(opts.read_only);
        assert_eq!(IsolationLevel::RepeatableRead.as_sql(), "REPEATABLE READ");
    }
}
