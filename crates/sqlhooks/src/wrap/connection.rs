use super::{close_discarded, ordinal_only};
use super::rows::HookedRows;
use super::statement::WrappedStatement;
use crate::context::Context;
use crate::driver::{Capabilities, Connection, ExecResult, TxOptions};
use crate::error::{DbError, DbResult};
use crate::hooks::HookSet;
use crate::value::{NamedValue, Value, named_to_positional, positional_to_named};

/// A connection whose ad hoc statements run through a [`HookSet`].
///
/// Ad hoc execution is offered in both the plain and the context-carrying
/// form whenever the wrapped connection supports it in either form:
///
/// - the plain form runs hooks under [`Context::background`];
/// - the context form falls back to the wrapped connection's plain form when
///   it has no context form, translating arguments with
///   [`named_to_positional`];
/// - named arguments are rejected before reaching a connection that does not
///   declare `named_parameters`.
///
/// [`Connection::capabilities`] reports the wrapped connection's record
/// unchanged. A connection without direct execution returns
/// [`DbError::Unsupported`] from both forms without running hooks.
#[derive(Debug)]
pub struct WrappedConnection<C> {
    conn: C,
    hooks: HookSet,
    caps: Capabilities,
}

impl<C: Connection> WrappedConnection<C> {
    pub fn new(conn: C, hooks: HookSet) -> Self {
        let caps = conn.capabilities();
        Self { conn, hooks, caps }
    }

    /// Get a reference to the wrapped connection.
    pub fn inner(&self) -> &C {
        &self.conn
    }

    /// Get the wrapped connection, consuming this wrapper.
    pub fn into_inner(self) -> C {
        self.conn
    }

    pub fn hooks(&self) -> &HookSet {
        &self.hooks
    }

    async fn exec_hooked(
        &self,
        ctx: Context,
        query: &str,
        named: &[NamedValue],
        positional: Option<&[Value]>,
    ) -> DbResult<ExecResult> {
        if !self.caps.direct_execute() {
            return Err(DbError::Unsupported("execute"));
        }
        let caps = self.caps;
        let out = self
            .hooks
            .invoke(ctx, query, named, |ctx| async move {
                match positional {
                    Some(values) if caps.execute => self.conn.execute(query, values).await,
                    _ if caps.execute_context && caps.named_parameters => {
                        self.conn.execute_context(&ctx, query, named).await
                    }
                    _ if caps.execute_context => {
                        let args = ordinal_only(named)?;
                        self.conn.execute_context(&ctx, query, &args).await
                    }
                    _ => {
                        let values = named_to_positional(named)?;
                        self.conn.execute(query, &values).await
                    }
                }
            })
            .await?;
        Ok(out.unwrap_or_default())
    }

    async fn query_hooked(
        &self,
        ctx: Context,
        query: &str,
        named: &[NamedValue],
        positional: Option<&[Value]>,
    ) -> DbResult<HookedRows<C::Rows>> {
        if !self.caps.direct_query() {
            return Err(DbError::Unsupported("query"));
        }
        let caps = self.caps;
        let out = self
            .hooks
            .invoke_with_discard(
                ctx,
                query,
                named,
                |ctx| async move {
                    match positional {
                        Some(values) if caps.query => self.conn.query(query, values).await,
                        _ if caps.query_context && caps.named_parameters => {
                            self.conn.query_context(&ctx, query, named).await
                        }
                        _ if caps.query_context => {
                            let args = ordinal_only(named)?;
                            self.conn.query_context(&ctx, query, &args).await
                        }
                        _ => {
                            let values = named_to_positional(named)?;
                            self.conn.query(query, &values).await
                        }
                    }
                },
                close_discarded,
            )
            .await?;
        Ok(HookedRows::from_outcome(out))
    }
}

impl<C: Connection> Connection for WrappedConnection<C> {
    type Stmt = WrappedStatement<C::Stmt>;
    type Rows = HookedRows<C::Rows>;
    type Tx = C::Tx;

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    async fn prepare(&self, query: &str) -> DbResult<Self::Stmt> {
        let stmt = self.conn.prepare(query).await?;
        Ok(WrappedStatement::new(stmt, query, self.hooks.clone()))
    }

    async fn prepare_context(&self, ctx: &Context, query: &str) -> DbResult<Self::Stmt> {
        let stmt = self.conn.prepare_context(ctx, query).await?;
        Ok(WrappedStatement::new(stmt, query, self.hooks.clone()))
    }

    async fn execute(&self, query: &str, args: &[Value]) -> DbResult<ExecResult> {
        let named = positional_to_named(args);
        self.exec_hooked(Context::background(), query, &named, Some(args))
            .await
    }

    async fn query(&self, query: &str, args: &[Value]) -> DbResult<Self::Rows> {
        let named = positional_to_named(args);
        self.query_hooked(Context::background(), query, &named, Some(args))
            .await
    }

    async fn execute_context(
        &self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> DbResult<ExecResult> {
        self.exec_hooked(ctx.clone(), query, args, None).await
    }

    async fn query_context(
        &self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> DbResult<Self::Rows> {
        self.query_hooked(ctx.clone(), query, args, None).await
    }

    async fn begin(&self) -> DbResult<Self::Tx> {
        self.conn.begin().await
    }

    async fn begin_tx(&self, ctx: &Context, opts: TxOptions) -> DbResult<Self::Tx> {
        self.conn.begin_tx(ctx, opts).await
    }

    async fn ping(&self, ctx: &Context) -> DbResult<()> {
        self.conn.ping(ctx).await
    }

    async fn reset_session(&self, ctx: &Context) -> DbResult<()> {
        self.conn.reset_session(ctx).await
    }

    async fn close(&self) -> DbResult<()> {
        self.conn.close().await
    }
}
