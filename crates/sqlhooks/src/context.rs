//! Call-scoped context threaded through hooks and driver calls.
//!
//! A [`Context`] carries cancellation, an optional deadline, and typed
//! correlation data ([`Extensions`]). The context a Before hook returns is the
//! one the operation and the After/OnError hooks observe, which makes it the
//! channel for per-call hook state such as a start instant.

use crate::error::{DbError, DbResult};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Typed key/value storage, one value per Rust type.
///
/// Values are stored behind `Arc`, so cloning an `Extensions` is cheap.
#[derive(Clone, Default)]
pub struct Extensions {
    map: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning `true` if a value of this type was replaced.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) -> bool {
        self.map.insert(TypeId::of::<T>(), Arc::new(value)).is_some()
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
    }

    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }

    pub fn remove<T: Send + Sync + 'static>(&mut self) -> bool {
        self.map.remove(&TypeId::of::<T>()).is_some()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions")
            .field("len", &self.map.len())
            .finish()
    }
}

/// Cancellation, deadline and correlation data for one call.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancel: Option<CancellationToken>,
    deadline: Option<Instant>,
    extensions: Extensions,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Attach a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Set an absolute deadline. An earlier existing deadline wins.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Set a deadline relative to now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Store a typed value, replacing any earlier value of the same type.
    pub fn with_value<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.extensions.insert(value);
        self
    }

    /// Read a typed value stored with [`Context::with_value`].
    pub fn value<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    /// Whether this context can ever end an operation early.
    pub fn is_cancellable(&self) -> bool {
        self.cancel.is_some() || self.deadline.is_some()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }

    /// Time left before the deadline, `None` if there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// The error this context ends an operation with, if it already has.
    pub fn err(&self) -> Option<DbError> {
        if self.is_cancelled() {
            return Some(DbError::Cancelled);
        }
        match self.deadline {
            Some(d) if Instant::now() >= d => Some(DbError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Run `future` until it completes or this context ends.
    ///
    /// Intended for driver implementations honouring cancellation; the hook
    /// layer itself never calls it.
    pub async fn guard<T, F>(&self, future: F) -> DbResult<T>
    where
        F: Future<Output = DbResult<T>>,
    {
        if let Some(err) = self.err() {
            return Err(err);
        }
        if !self.is_cancellable() {
            return future.await;
        }

        let cancelled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending::<()>().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(d) => tokio::time::sleep_until(d.into()).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::pin!(future);
        tokio::select! {
            result = &mut future => result,
            _ = cancelled => Err(DbError::Cancelled),
            _ = expired => Err(DbError::DeadlineExceeded),
        }
    }
}
