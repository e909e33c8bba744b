use super::truncate_sql_bytes;
use super::types::{ErrorAction, Hooks, OnErrorHook};
use crate::context::Context;
use crate::error::{DbError, DbResult};
use crate::value::NamedValue;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

const LOG_SQL_BYTES: usize = 120;

/// The hooks attached to a wrapped driver.
///
/// Whether an OnError hook is present is settled when the set is built, never
/// probed per call.
#[derive(Clone)]
pub struct HookSet {
    hooks: Arc<dyn Hooks>,
    on_error: Option<Arc<dyn OnErrorHook>>,
}

impl HookSet {
    /// Before/After hooks only; driver errors pass through unchanged.
    pub fn new<H: Hooks + 'static>(hooks: H) -> Self {
        Self::from_arc(Arc::new(hooks))
    }

    /// Before/After hooks from an `Arc`.
    pub fn from_arc(hooks: Arc<dyn Hooks>) -> Self {
        Self {
            hooks,
            on_error: None,
        }
    }

    /// A single value providing Before, After and OnError.
    pub fn full<H: Hooks + OnErrorHook + 'static>(hooks: H) -> Self {
        let shared = Arc::new(hooks);
        Self {
            hooks: shared.clone(),
            on_error: Some(shared),
        }
    }

    /// Set the OnError hook.
    pub fn with_on_error<E: OnErrorHook + 'static>(self, hook: E) -> Self {
        self.with_on_error_arc(Arc::new(hook))
    }

    /// Set the OnError hook from an `Arc`.
    pub fn with_on_error_arc(mut self, hook: Arc<dyn OnErrorHook>) -> Self {
        self.on_error = Some(hook);
        self
    }

    pub fn has_on_error(&self) -> bool {
        self.on_error.is_some()
    }

    /// Run `op` under the Before → operation → After | OnError protocol.
    ///
    /// - A Before error is returned verbatim; nothing else runs.
    /// - On success, After runs; its error replaces the result.
    /// - On failure, OnError decides the outcome. `Ok(None)` means the hook
    ///   suppressed the failure and there is no result.
    pub async fn invoke<T, F, Fut>(
        &self,
        ctx: Context,
        query: &str,
        args: &[NamedValue],
        op: F,
    ) -> DbResult<Option<T>>
    where
        F: FnOnce(Context) -> Fut,
        Fut: Future<Output = DbResult<T>>,
    {
        self.invoke_with_discard(ctx, query, args, op, |_| async {})
            .await
    }

    /// Like [`HookSet::invoke`], but a result superseded by an After error is
    /// handed to `discard` before the error is returned. Queries use it to
    /// close the cursor they are dropping.
    pub async fn invoke_with_discard<T, F, Fut, D, DFut>(
        &self,
        ctx: Context,
        query: &str,
        args: &[NamedValue],
        op: F,
        discard: D,
    ) -> DbResult<Option<T>>
    where
        F: FnOnce(Context) -> Fut,
        Fut: Future<Output = DbResult<T>>,
        D: FnOnce(T) -> DFut,
        DFut: Future<Output = ()>,
    {
        let ctx = match self.hooks.before(ctx, query, args) {
            Ok(ctx) => ctx,
            Err(err) => {
                tracing::debug!(
                    target: "sqlhooks",
                    sql = %truncate_sql_bytes(query, LOG_SQL_BYTES),
                    error = %err,
                    "before hook rejected query"
                );
                return Err(err);
            }
        };

        match op(ctx.clone()).await {
            Ok(value) => match self.hooks.after(ctx, query, args) {
                Ok(_) => Ok(Some(value)),
                Err(err) => {
                    tracing::debug!(
                        target: "sqlhooks",
                        sql = %truncate_sql_bytes(query, LOG_SQL_BYTES),
                        error = %err,
                        "after hook failed a successful query"
                    );
                    discard(value).await;
                    Err(err)
                }
            },
            Err(err) => match self.handle_error(&ctx, &err, query, args) {
                ErrorAction::Propagate => Err(err),
                ErrorAction::Replace(replaced) => Err(replaced),
                ErrorAction::Suppress => {
                    tracing::debug!(
                        target: "sqlhooks",
                        sql = %truncate_sql_bytes(query, LOG_SQL_BYTES),
                        error = %err,
                        "error hook suppressed driver error"
                    );
                    Ok(None)
                }
            },
        }
    }

    fn handle_error(
        &self,
        ctx: &Context,
        err: &DbError,
        query: &str,
        args: &[NamedValue],
    ) -> ErrorAction {
        tracing::trace!(
            target: "sqlhooks",
            sql = %truncate_sql_bytes(query, LOG_SQL_BYTES),
            error = %err,
            "query failed"
        );
        OnErrorHook::on_error(self, ctx, err, query, args)
    }
}

impl Hooks for HookSet {
    fn before(&self, ctx: Context, query: &str, args: &[NamedValue]) -> DbResult<Context> {
        self.hooks.before(ctx, query, args)
    }

    fn after(&self, ctx: Context, query: &str, args: &[NamedValue]) -> DbResult<Context> {
        self.hooks.after(ctx, query, args)
    }
}

impl OnErrorHook for HookSet {
    fn on_error(
        &self,
        ctx: &Context,
        err: &DbError,
        query: &str,
        args: &[NamedValue],
    ) -> ErrorAction {
        match &self.on_error {
            Some(hook) => hook.on_error(ctx, err, query, args),
            None => ErrorAction::Propagate,
        }
    }
}

impl fmt::Debug for HookSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSet")
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
