//! Unified error type for composed resilience stacks.
//!
//! When a call threads through circuit breaker → retry → timeout, each layer
//! has its own error enum wrapping the one below it. Matching on
//! `CircuitBreakerError<RetryError<TimeLimiterError<E>>>` is miserable, so
//! the pipeline flattens every layer's failure into [`ResilienceError<E>`]:
//!
//! ```
//! use tradeguard_core::ResilienceError;
//!
//! # #[derive(Debug)]
//! # struct AppError;
//! fn handle(err: ResilienceError<AppError>) {
//!     match err {
//!         ResilienceError::Timeout { layer } => {
//!             eprintln!("timed out in {layer}");
//!         }
//!         ResilienceError::CircuitOpen { name } => {
//!             eprintln!("circuit {name:?} is open, backing off");
//!         }
//!         ResilienceError::RetryExhausted { attempts, .. } => {
//!             eprintln!("gave up after {attempts} attempts");
//!         }
//!         ResilienceError::Application(_) => {
//!             eprintln!("dependency failed");
//!         }
//!     }
//! }
//! ```

use std::fmt;

/// A flattened error for a composed resilience stack.
///
/// `E` is the application error type of the wrapped operation; for the
/// pipeline this is `StructuredError`.
#[derive(Debug, Clone)]
pub enum ResilienceError<E> {
    /// An attempt exceeded its allotted duration.
    Timeout {
        /// The layer that enforced the deadline (e.g. `"time_limiter"`).
        layer: &'static str,
    },

    /// A circuit breaker rejected the call without invoking the operation.
    CircuitOpen {
        /// The breaker's configured name, when it has one.
        name: Option<String>,
    },

    /// Every retry attempt failed; `source` is the last underlying error.
    RetryExhausted { attempts: usize, source: E },

    /// The operation itself failed with a non-retryable or unhandled error.
    Application(E),
}

impl<E> ResilienceError<E> {
    /// Returns `true` if this is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ResilienceError::Timeout { .. })
    }

    /// Returns `true` if a circuit breaker rejected the call.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, ResilienceError::CircuitOpen { .. })
    }

    /// Returns `true` if retries were exhausted.
    pub fn is_retry_exhausted(&self) -> bool {
        matches!(self, ResilienceError::RetryExhausted { .. })
    }

    /// Returns `true` if the operation failed directly.
    pub fn is_application(&self) -> bool {
        matches!(self, ResilienceError::Application(_))
    }

    /// Extracts the underlying application error, from either the
    /// `Application` variant or the `RetryExhausted` wrapper.
    pub fn into_source(self) -> Option<E> {
        match self {
            ResilienceError::Application(e) => Some(e),
            ResilienceError::RetryExhausted { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Maps the application error type.
    pub fn map_application<F, T>(self, f: F) -> ResilienceError<T>
    where
        F: FnOnce(E) -> T,
    {
        match self {
            ResilienceError::Timeout { layer } => ResilienceError::Timeout { layer },
            ResilienceError::CircuitOpen { name } => ResilienceError::CircuitOpen { name },
            ResilienceError::RetryExhausted { attempts, source } => {
                ResilienceError::RetryExhausted {
                    attempts,
                    source: f(source),
                }
            }
            ResilienceError::Application(e) => ResilienceError::Application(f(e)),
        }
    }
}

impl<E> fmt::Display for ResilienceError<E>
where
    E: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResilienceError::Timeout { layer } => write!(f, "timeout in {layer}"),
            ResilienceError::CircuitOpen { name } => match name {
                Some(n) => write!(f, "circuit breaker '{n}' is open"),
                None => write!(f, "circuit breaker is open"),
            },
            ResilienceError::RetryExhausted { attempts, source } => {
                write!(f, "retries exhausted after {attempts} attempts: {source}")
            }
            ResilienceError::Application(e) => write!(f, "application error: {e}"),
        }
    }
}

impl<E> std::error::Error for ResilienceError<E> where E: std::error::Error {}
