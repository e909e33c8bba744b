use super::{close_discarded, ordinal_only};
use super::rows::HookedRows;
use crate::context::Context;
use crate::driver::{ExecResult, Statement, StatementCapabilities};
use crate::error::DbResult;
use crate::hooks::HookSet;
use crate::value::{NamedValue, Value, named_to_positional, positional_to_named};

/// A prepared statement whose executions run through a [`HookSet`].
///
/// Hooks see the query text captured when the statement was prepared.
/// Preparing fires no hooks; every execute or query fires them once.
///
/// The context forms work whether or not the wrapped statement has them;
/// without native support they translate arguments and call the positional
/// form. The capability record is reported unchanged.
#[derive(Debug)]
pub struct WrappedStatement<S> {
    stmt: S,
    query: String,
    hooks: HookSet,
    caps: StatementCapabilities,
}

impl<S: Statement> WrappedStatement<S> {
    pub fn new(stmt: S, query: impl Into<String>, hooks: HookSet) -> Self {
        let caps = stmt.capabilities();
        Self {
            stmt,
            query: query.into(),
            hooks,
            caps,
        }
    }

    /// The query text this statement was prepared from.
    pub fn query_text(&self) -> &str {
        &self.query
    }

    /// Get a reference to the wrapped statement.
    pub fn inner(&self) -> &S {
        &self.stmt
    }

    async fn exec_hooked(
        &self,
        ctx: Context,
        named: &[NamedValue],
        positional: Option<&[Value]>,
    ) -> DbResult<ExecResult> {
        let caps = self.caps;
        let out = self
            .hooks
            .invoke(ctx, &self.query, named, |ctx| async move {
                match positional {
                    Some(values) => self.stmt.execute(values).await,
                    None if caps.execute_context && caps.named_parameters => {
                        self.stmt.execute_context(&ctx, named).await
                    }
                    None if caps.execute_context => {
                        let args = ordinal_only(named)?;
                        self.stmt.execute_context(&ctx, &args).await
                    }
                    None => {
                        let values = named_to_positional(named)?;
                        self.stmt.execute(&values).await
                    }
                }
            })
            .await?;
        Ok(out.unwrap_or_default())
    }

    async fn query_hooked(
        &self,
        ctx: Context,
        named: &[NamedValue],
        positional: Option<&[Value]>,
    ) -> DbResult<HookedRows<S::Rows>> {
        let caps = self.caps;
        let out = self
            .hooks
            .invoke_with_discard(
                ctx,
                &self.query,
                named,
                |ctx| async move {
                    match positional {
                        Some(values) => self.stmt.query(values).await,
                        None if caps.query_context && caps.named_parameters => {
                            self.stmt.query_context(&ctx, named).await
                        }
                        None if caps.query_context => {
                            let args = ordinal_only(named)?;
                            self.stmt.query_context(&ctx, &args).await
                        }
                        None => {
                            let values = named_to_positional(named)?;
                            self.stmt.query(&values).await
                        }
                    }
                },
                close_discarded,
            )
            .await?;
        Ok(HookedRows::from_outcome(out))
    }
}

impl<S: Statement> Statement for WrappedStatement<S> {
    type Rows = HookedRows<S::Rows>;

    fn capabilities(&self) -> StatementCapabilities {
        self.caps
    }

    fn num_input(&self) -> Option<usize> {
        self.stmt.num_input()
    }

    async fn execute(&self, args: &[Value]) -> DbResult<ExecResult> {
        let named = positional_to_named(args);
        self.exec_hooked(Context::background(), &named, Some(args))
            .await
    }

    async fn query(&self, args: &[Value]) -> DbResult<Self::Rows> {
        let named = positional_to_named(args);
        self.query_hooked(Context::background(), &named, Some(args))
            .await
    }

    async fn execute_context(&self, ctx: &Context, args: &[NamedValue]) -> DbResult<ExecResult> {
        self.exec_hooked(ctx.clone(), args, None).await
    }

    async fn query_context(&self, ctx: &Context, args: &[NamedValue]) -> DbResult<Self::Rows> {
        self.query_hooked(ctx.clone(), args, None).await
    }

    async fn close(&self) -> DbResult<()> {
        self.stmt.close().await
    }
}
