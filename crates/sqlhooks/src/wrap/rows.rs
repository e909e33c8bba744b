use crate::driver::Rows;
use crate::error::DbResult;
use crate::value::Value;

/// Rows returned by a hooked query.
///
/// Normally this forwards to the wrapped driver's cursor. When an OnError
/// hook suppressed the failure there is no cursor and the result set is empty.
#[derive(Debug)]
pub struct HookedRows<R> {
    inner: Option<R>,
}

impl<R: Rows> HookedRows<R> {
    pub fn new(rows: R) -> Self {
        Self { inner: Some(rows) }
    }

    /// An empty result set standing in for a suppressed failure.
    pub fn suppressed() -> Self {
        Self { inner: None }
    }

    pub(crate) fn from_outcome(outcome: Option<R>) -> Self {
        Self { inner: outcome }
    }

    /// Whether this result stands in for a suppressed failure.
    pub fn is_suppressed(&self) -> bool {
        self.inner.is_none()
    }

    pub fn inner(&self) -> Option<&R> {
        self.inner.as_ref()
    }

    pub fn into_inner(self) -> Option<R> {
        self.inner
    }
}

impl<R: Rows> Rows for HookedRows<R> {
    fn columns(&self) -> Vec<String> {
        self.inner.as_ref().map(Rows::columns).unwrap_or_default()
    }

    async fn next(&mut self) -> DbResult<Option<Vec<Value>>> {
        match self.inner.as_mut() {
            Some(rows) => rows.next().await,
            None => Ok(None),
        }
    }

    async fn close(&mut self) -> DbResult<()> {
        match self.inner.as_mut() {
            Some(rows) => rows.close().await,
            None => Ok(()),
        }
    }
}
