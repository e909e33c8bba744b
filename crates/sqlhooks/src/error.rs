//! Error types for sqlhooks

use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

/// Result type alias for sqlhooks operations
pub type DbResult<T> = Result<T, DbError>;

/// A shareable, type-erased error source.
pub type BoxError = Arc<dyn StdError + Send + Sync + 'static>;

/// Error types shared by drivers, hooks and the wrapping layer.
///
/// The layer itself never wraps or annotates an error that a hook or the
/// wrapped driver returns: whatever value arrives is handed to the caller
/// as-is.
#[derive(Debug, Clone, Error)]
pub enum DbError {
    /// Error returned by a hook (Before, After or OnError)
    #[error("{0}")]
    Hook(BoxError),

    /// Error returned by the wrapped driver
    #[error("{0}")]
    Driver(BoxError),

    /// Argument list cannot be represented for the wrapped driver
    #[error("Argument error: {0}")]
    Argument(String),

    /// The wrapped object does not provide this operation
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    /// The call context was cancelled
    #[error("Context cancelled")]
    Cancelled,

    /// The call context deadline passed
    #[error("Context deadline exceeded")]
    DeadlineExceeded,

    /// Several composed hooks failed
    #[error("{}", join_errors(.0))]
    Multiple(Vec<DbError>),
}

fn join_errors(errors: &[DbError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug)]
struct Message(String);

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for Message {}

impl DbError {
    /// Create a hook error from any error value
    pub fn hook<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Hook(Arc::new(err))
    }

    /// Create a hook error from a message
    pub fn hook_msg(message: impl Into<String>) -> Self {
        Self::Hook(Arc::new(Message(message.into())))
    }

    /// Create a driver error from any error value
    pub fn driver<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Driver(Arc::new(err))
    }

    /// Create a driver error from a message
    pub fn driver_msg(message: impl Into<String>) -> Self {
        Self::Driver(Arc::new(Message(message.into())))
    }

    /// Create an argument error
    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument(message.into())
    }

    /// Check if this error came from a hook
    pub fn is_hook(&self) -> bool {
        matches!(self, Self::Hook(_))
    }

    /// Check if this error came from the wrapped driver
    pub fn is_driver(&self) -> bool {
        matches!(self, Self::Driver(_))
    }

    /// Check if this is an unsupported-operation error
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }

    /// Check if the call context ended the operation
    pub fn is_context_error(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Whether two errors are the same value.
    ///
    /// Boxed sources compare by identity, so a hook error handed back unchanged
    /// is recognised as the original.
    pub fn same_as(&self, other: &DbError) -> bool {
        match (self, other) {
            (Self::Hook(a), Self::Hook(b)) | (Self::Driver(a), Self::Driver(b)) => {
                Arc::ptr_eq(a, b)
            }
            (Self::Argument(a), Self::Argument(b)) => a == b,
            (Self::Unsupported(a), Self::Unsupported(b)) => a == b,
            (Self::Cancelled, Self::Cancelled) => true,
            (Self::DeadlineExceeded, Self::DeadlineExceeded) => true,
            (Self::Multiple(a), Self::Multiple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_as(y))
            }
            _ => false,
        }
    }

    /// Try to view the boxed source of a hook or driver error as `E`.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            Self::Hook(e) | Self::Driver(e) => e.downcast_ref::<E>(),
            _ => None,
        }
    }
}

#[cfg(feature = "postgres")]
impl From<tokio_postgres::Error> for DbError {
    fn from(err: tokio_postgres::Error) -> Self {
        Self::driver(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_as_compares_sources_by_identity() {
        let boom = DbError::hook_msg("boom");
        let copy = boom.clone();
        let other = DbError::hook_msg("boom");

        assert!(boom.same_as(&copy));
        assert!(!boom.same_as(&other));
        assert_eq!(boom.to_string(), other.to_string());
    }

    #[test]
    fn multiple_joins_messages() {
        let err = DbError::Multiple(vec![DbError::hook_msg("a"), DbError::argument("b")]);
        assert_eq!(err.to_string(), "a; Argument error: b");
    }

    #[test]
    fn downcast_hook_source() {
        #[derive(Debug, thiserror::Error)]
        #[error("quota exceeded")]
        struct Quota;

        let err = DbError::hook(Quota);
        assert!(err.downcast_ref::<Quota>().is_some());
        assert!(err.is_hook());
        assert!(!err.is_driver());
    }
}
