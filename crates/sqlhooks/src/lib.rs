//! # sqlhooks
//!
//! Before/After/OnError hooks for any database driver, without touching the
//! driver or the code that uses it.
//!
//! ## Features
//!
//! - **Drop-in**: a wrapped driver implements the same [`Driver`] /
//!   [`Connection`] / [`Statement`] traits as the driver it wraps
//! - **One protocol**: direct, context-carrying, ad hoc and prepared calls all
//!   run Before → operation → After | OnError the same way
//! - **Honest capabilities**: optional operations are forwarded as the wrapped
//!   driver reports them, read once per wrapper
//! - **Typed context**: hooks pass per-call state through [`Context`] values
//!   keyed by type
//! - **Composition**: [`CompositeHooks`] runs several hook sets as one
//! - **Logging**: [`TracingHooks`] logs statements with durations via `tracing`
//!
//! ## Example
//!
//! ```ignore
//! use sqlhooks::{Context, Connection, DbResult, Driver, HookSet, Hooks, NamedValue};
//! use std::time::Instant;
//!
//! struct Timing;
//!
//! impl Hooks for Timing {
//!     fn before(&self, ctx: Context, _: &str, _: &[NamedValue]) -> DbResult<Context> {
//!         Ok(ctx.with_value(Instant::now()))
//!     }
//!
//!     fn after(&self, ctx: Context, query: &str, _: &[NamedValue]) -> DbResult<Context> {
//!         if let Some(start) = ctx.value::<Instant>() {
//!             println!("{query} took {:?}", start.elapsed());
//!         }
//!         Ok(ctx)
//!     }
//! }
//!
//! let driver = sqlhooks::wrap(raw_driver, HookSet::new(Timing));
//! let conn = driver.open("postgres://localhost/app").await?;
//! conn.execute("UPDATE users SET active = $1", &[true.into()]).await?;
//! ```

pub mod context;
pub mod driver;
pub mod error;
pub mod hooks;
pub mod value;
pub mod wrap;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use context::{Context, Extensions};
pub use driver::{
    Capabilities, Connection, Driver, ExecResult, IsolationLevel, Rows, Statement,
    StatementCapabilities, Transaction, TxOptions,
};
pub use error::{BoxError, DbError, DbResult};
pub use hooks::{
    CompositeHooks, ErrorAction, HookSet, Hooks, NoopHooks, OnErrorHook, QueryStart, TracingHooks,
};
pub use value::{NamedValue, Value, named_to_positional, positional_to_named};
pub use wrap::{HookedRows, WrappedConnection, WrappedDriver, WrappedStatement, wrap};

#[cfg(feature = "postgres")]
pub use postgres::{PgConnection, PgDriver, PgDriverConfig, PgRows, PgStatement, PgTransaction};

// Re-export for implementors of `Context`-aware drivers
pub use tokio_util::sync::CancellationToken;
