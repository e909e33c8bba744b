use super::connection::WrappedConnection;
use crate::driver::{Connection, Driver};
use crate::error::DbResult;
use crate::hooks::HookSet;

/// A driver whose connections run every statement through a [`HookSet`].
#[derive(Debug, Clone)]
pub struct WrappedDriver<D> {
    driver: D,
    hooks: HookSet,
}

impl<D: Driver> WrappedDriver<D> {
    pub fn new(driver: D, hooks: HookSet) -> Self {
        Self { driver, hooks }
    }

    /// Get a reference to the raw driver.
    pub fn inner(&self) -> &D {
        &self.driver
    }

    /// Get the raw driver, consuming this wrapper.
    pub fn into_inner(self) -> D {
        self.driver
    }

    pub fn hooks(&self) -> &HookSet {
        &self.hooks
    }
}

impl<D: Driver> Driver for WrappedDriver<D> {
    type Conn = WrappedConnection<D::Conn>;

    async fn open(&self, dsn: &str) -> DbResult<Self::Conn> {
        let conn = self.driver.open(dsn).await?;
        let wrapped = WrappedConnection::new(conn, self.hooks.clone());
        tracing::trace!(
            target: "sqlhooks",
            capabilities = ?wrapped.capabilities(),
            "opened wrapped connection"
        );
        Ok(wrapped)
    }
}
