//! The retry policy: attempt budget, delay pipeline, and predicates.

use crate::backoff::IntervalFunction;
use std::sync::Arc;
use std::time::Duration;

/// Decides whether an error should be retried.
pub type RetryPredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Decides whether a *successful* result should still be retried
/// (e.g. an empty fill report that the caller treats as "not ready yet").
pub type ResultPredicate<Res> = Arc<dyn Fn(&Res) -> bool + Send + Sync>;

/// Retry policy shared by the executor.
///
/// The delay for an attempt goes through a fixed pipeline: the interval
/// function computes the raw delay, the result is clamped to
/// `[0, max_delay]`, and jitter (when enabled) multiplies it by a uniform
/// factor in `1 ± jitter_factor`.
pub struct RetryPolicy<Res, E> {
    pub(crate) max_attempts: usize,
    pub(crate) interval_fn: Arc<dyn IntervalFunction>,
    pub(crate) max_delay: Duration,
    pub(crate) jitter: bool,
    pub(crate) jitter_factor: f64,
    pub(crate) retry_predicate: Option<RetryPredicate<E>>,
    pub(crate) result_predicate: Option<ResultPredicate<Res>>,
}

impl<Res, E> RetryPolicy<Res, E> {
    /// Creates a policy with the given attempt budget and interval function.
    ///
    /// Defaults: `max_delay` 60s, jitter on with factor 0.1, every error
    /// retryable, no result predicate.
    pub fn new(max_attempts: usize, interval_fn: Arc<dyn IntervalFunction>) -> Self {
        Self {
            max_attempts,
            interval_fn,
            max_delay: Duration::from_secs(60),
            jitter: true,
            jitter_factor: 0.1,
            retry_predicate: None,
            result_predicate: None,
        }
    }

    /// The maximum number of operation invocations (initial call included).
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Returns `true` if the error matches the retryable set.
    pub fn should_retry(&self, error: &E) -> bool {
        match &self.retry_predicate {
            Some(p) => p(error),
            None => true,
        }
    }

    /// Returns `true` if a successful result should be treated as retryable.
    pub fn should_retry_result(&self, result: &Res) -> bool {
        match &self.result_predicate {
            Some(p) => p(result),
            None => false,
        }
    }

    /// Computes the post-clamp, post-jitter delay for a zero-based attempt.
    pub fn next_backoff(&self, attempt: usize) -> Duration {
        let raw = self.interval_fn.interval(attempt);
        let clamped = raw.min(self.max_delay);
        if !self.jitter || self.jitter_factor <= 0.0 {
            return clamped;
        }
        // Uniform in [1 - jitter_factor, 1 + jitter_factor].
        let spread = self.jitter_factor.clamp(0.0, 1.0);
        let factor = 1.0 + spread * (rand::random::<f64>() * 2.0 - 1.0);
        clamped.mul_f64(factor.max(0.0))
    }
}
