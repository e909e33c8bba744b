//! Hook-wrapped driver, connection and statement.
//!
//! [`wrap`] composes a raw [`Driver`] with a [`HookSet`]. The result
//! implements [`Driver`] itself, so it can be passed anywhere the raw driver
//! is accepted. Every execute and query on the connections and statements it
//! produces runs through [`HookSet::invoke`]; preparing, transactions, ping,
//! session reset and close are forwarded without hooks.
//!
//! ```rust,ignore
//! use sqlhooks::{Connection, Driver, HookSet, TracingHooks};
//!
//! let driver = sqlhooks::wrap(PgDriver::new(), HookSet::full(TracingHooks::new()));
//! let conn = driver.open("postgres://localhost/app").await?;
//! let stmt = conn.prepare("SELECT name FROM users WHERE id = $1").await?; // no hooks
//! let rows = stmt.query(&[1.into()]).await?;                              // Before + After
//! ```

mod connection;
mod driver;
mod rows;
mod statement;


pub use connection::WrappedConnection;
pub use driver::WrappedDriver;
pub use rows::HookedRows;
pub use statement::WrappedStatement;

use crate::driver::{Driver, Rows};
use crate::error::DbResult;
use crate::hooks::HookSet;
use crate::value::{NamedValue, named_to_positional, positional_to_named};

/// Compose a raw driver with a hook set.
pub fn wrap<D: Driver>(driver: D, hooks: HookSet) -> WrappedDriver<D> {
    WrappedDriver::new(driver, hooks)
}

/// Arguments for a context form without named-parameter support: names are
/// rejected and ordinals renumbered in order.
pub(crate) fn ordinal_only(args: &[NamedValue]) -> DbResult<Vec<NamedValue>> {
    Ok(positional_to_named(&named_to_positional(args)?))
}

/// Close a cursor whose result an After hook superseded.
pub(crate) async fn close_discarded<R: Rows>(mut rows: R) {
    if let Err(err) = rows.close().await {
        tracing::debug!(target: "sqlhooks", error = %err, "closing discarded rows failed");
    }
}
