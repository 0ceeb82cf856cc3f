use std::time::Duration;
use thiserror::Error;

/// Errors returned by the time limiter.
#[derive(Debug, Error)]
pub enum TimeLimiterError<E> {
    /// The call exceeded its allotted duration; the in-flight future was
    /// dropped.
    #[error("operation timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// An error returned by the inner service.
    #[error("inner service error: {0}")]
    Inner(E),
}

impl<E> TimeLimiterError<E> {
    /// Returns `true` if the deadline was exceeded.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TimeLimiterError::Timeout { .. })
    }

    /// Returns the inner error if present.
    pub fn into_inner(self) -> Option<E> {
        match self {
            TimeLimiterError::Inner(e) => Some(e),
            _ => None,
        }
    }
}

impl<E> From<E> for TimeLimiterError<E> {
    fn from(err: E) -> Self {
        TimeLimiterError::Inner(err)
    }
}
