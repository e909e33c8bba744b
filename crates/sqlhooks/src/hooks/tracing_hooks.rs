use super::truncate_sql_bytes;
use super::types::{ErrorAction, Hooks, OnErrorHook};
use crate::context::Context;
use crate::error::{DbError, DbResult};
use crate::value::NamedValue;
use std::time::Instant;
use tracing::Level;

/// Start instant stored in the call [`Context`] by [`TracingHooks`].
#[derive(Debug, Clone, Copy)]
pub struct QueryStart(pub Instant);

/// A `tracing`-based hook set that logs each statement with its duration.
///
/// `before` records a [`QueryStart`] in the context; `after` and `on_error`
/// read it back to report elapsed time. Failed statements are logged at
/// `WARN` and propagate unchanged.
///
/// ```rust,ignore
/// let driver = sqlhooks::wrap(raw, HookSet::full(TracingHooks::new().log_args(true)));
/// ```
#[derive(Debug, Clone)]
pub struct TracingHooks {
    /// Tracing event level for completed statements.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
    /// Include argument values in events.
    pub log_args: bool,
}

impl Default for TracingHooks {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
            log_args: false,
        }
    }
}

impl TracingHooks {
    /// Create a new hook set with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    /// Log argument values (may expose sensitive data).
    pub fn log_args(mut self, enabled: bool) -> Self {
        self.log_args = enabled;
        self
    }

    pub(crate) fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }

    fn format_args(&self, args: &[NamedValue]) -> String {
        if !self.log_args {
            return format!("<{} args>", args.len());
        }
        let parts: Vec<String> = args
            .iter()
            .map(|a| match a.name.as_deref() {
                Some(name) if !name.is_empty() => format!("{name}={}", a.value),
                _ => format!("${}={}", a.ordinal, a.value),
            })
            .collect();
        format!("[{}]", parts.join(", "))
    }

    fn elapsed_ms(ctx: &Context) -> Option<f64> {
        ctx.value::<QueryStart>()
            .map(|start| start.0.elapsed().as_secs_f64() * 1000.0)
    }
}

/// Dispatch a tracing event at a runtime-determined level.
macro_rules! emit_at_level {
    ($level:expr, $($field:tt)*) => {
        match $level {
            Level::ERROR => tracing::error!($($field)*),
            Level::WARN  => tracing::warn!($($field)*),
            Level::INFO  => tracing::info!($($field)*),
            Level::DEBUG => tracing::debug!($($field)*),
            Level::TRACE => tracing::trace!($($field)*),
        }
    };
}

impl Hooks for TracingHooks {
    fn before(&self, ctx: Context, _query: &str, _args: &[NamedValue]) -> DbResult<Context> {
        Ok(ctx.with_value(QueryStart(Instant::now())))
    }

    fn after(&self, ctx: Context, query: &str, args: &[NamedValue]) -> DbResult<Context> {
        let sql = self.truncate_sql(query);
        let args = self.format_args(args);
        let elapsed_ms = Self::elapsed_ms(&ctx).unwrap_or_default();
        emit_at_level!(
            self.level,
            target: "sqlhooks.sql",
            sql = %sql,
            args = %args,
            elapsed_ms,
            "query complete"
        );
        Ok(ctx)
    }
}

impl OnErrorHook for TracingHooks {
    fn on_error(
        &self,
        ctx: &Context,
        err: &DbError,
        query: &str,
        args: &[NamedValue],
    ) -> ErrorAction {
        tracing::warn!(
            target: "sqlhooks.sql",
            sql = %self.truncate_sql(query),
            args = %self.format_args(args),
            elapsed_ms = Self::elapsed_ms(ctx).unwrap_or_default(),
            error = %err,
            "query failed"
        );
        ErrorAction::Propagate
    }
}
