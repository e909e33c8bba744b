//! Call-level hooks for driver operations.
//!
//! This module provides:
//! - [`Hooks`]: Before/After callbacks around every execute and query
//! - [`OnErrorHook`]: an optional callback deciding what a driver error becomes
//! - [`HookSet`]: the hooks attached to a wrapped driver, and the single
//!   Before → operation → After | OnError protocol every call shape uses
//! - [`CompositeHooks`]: several hook sets run as one
//! - [`TracingHooks`]: statement logging with durations
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlhooks::{Context, DbError, DbResult, HookSet, Hooks, NamedValue};
//!
//! struct ReadOnly;
//!
//! impl Hooks for ReadOnly {
//!     fn before(&self, ctx: Context, query: &str, _: &[NamedValue]) -> DbResult<Context> {
//!         if query.trim_start().to_ascii_uppercase().starts_with("SELECT") {
//!             Ok(ctx)
//!         } else {
//!             Err(DbError::hook_msg("read-only connection"))
//!         }
//!     }
//! }
//!
//! let driver = sqlhooks::wrap(raw_driver, HookSet::new(ReadOnly));
//! ```

mod composite;
mod set;
mod tracing_hooks;
mod types;


pub use composite::CompositeHooks;
pub use set::HookSet;
pub use tracing_hooks::{QueryStart, TracingHooks};
pub use types::{ErrorAction, Hooks, NoopHooks, OnErrorHook};

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
