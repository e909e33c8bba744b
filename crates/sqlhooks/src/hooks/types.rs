use crate::context::Context;
use crate::error::{DbError, DbResult};
use crate::value::NamedValue;

/// Call-level hooks run around every execute and query.
///
/// `before` may veto the call by returning an error, or hand back a new
/// [`Context`] (for instance carrying a start instant); that context is what
/// the operation and `after` receive. `after` runs only when the operation
/// succeeded and may still turn the call into a failure.
///
/// Hooks can be called concurrently from several connections; implementations
/// holding shared state synchronize it themselves.
pub trait Hooks: Send + Sync {
    /// Called before the operation runs.
    ///
    /// Default implementation passes the context through.
    fn before(&self, ctx: Context, query: &str, args: &[NamedValue]) -> DbResult<Context> {
        let _ = (query, args);
        Ok(ctx)
    }

    /// Called after the operation succeeded.
    ///
    /// An error here becomes the outcome of the call and the operation's
    /// result is dropped.
    fn after(&self, ctx: Context, query: &str, args: &[NamedValue]) -> DbResult<Context> {
        let _ = (query, args);
        Ok(ctx)
    }
}

/// What to do with an error raised by the wrapped driver.
#[derive(Debug, Clone)]
pub enum ErrorAction {
    /// Return the original error unchanged.
    Propagate,
    /// Return this error instead (it may wrap the original).
    Replace(DbError),
    /// Report success; the operation's result is empty.
    Suppress,
}

/// Optional hook run when the wrapped operation fails.
///
/// Without one, the driver error reaches the caller unchanged.
pub trait OnErrorHook: Send + Sync {
    fn on_error(
        &self,
        ctx: &Context,
        err: &DbError,
        query: &str,
        args: &[NamedValue],
    ) -> ErrorAction;
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl Hooks for NoopHooks {}
