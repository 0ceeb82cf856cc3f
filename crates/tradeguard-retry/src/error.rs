use thiserror::Error;

/// Errors returned by the retry executor.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every attempt failed; carries the last underlying error and the
    /// number of invocations made.
    #[error("retry attempts exhausted after {attempts} attempts")]
    Exhausted { attempts: usize, source: E },

    /// The error did not match the retryable set and propagated unchanged
    /// (no retry accounting happened).
    #[error("inner service error: {0}")]
    Inner(E),
}

impl<E> RetryError<E> {
    /// Returns `true` if the attempt budget was exhausted.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }

    /// Returns the attempt count for an exhausted retry.
    pub fn attempts(&self) -> Option<usize> {
        match self {
            RetryError::Exhausted { attempts, .. } => Some(*attempts),
            RetryError::Inner(_) => None,
        }
    }

    /// Unwraps the underlying error from either variant.
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted { source, .. } => source,
            RetryError::Inner(e) => e,
        }
    }
}

impl<E> From<E> for RetryError<E> {
    fn from(err: E) -> Self {
        RetryError::Inner(err)
    }
}
