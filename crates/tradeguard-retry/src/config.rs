use crate::backoff::{
    ExponentialBackoff, FibonacciBackoff, FixedInterval, IntervalFunction, LinearBackoff,
};
use crate::events::RetryEvent;
use crate::policy::{ResultPredicate, RetryPolicy, RetryPredicate};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tradeguard_core::events::{EventListeners, FnListener};
use tradeguard_core::{ErrorKind, StructuredError};

/// Configuration for the retry executor.
pub struct RetryConfig<Res, E> {
    pub(crate) policy: RetryPolicy<Res, E>,
    pub(crate) event_listeners: EventListeners<RetryEvent>,
    pub(crate) name: String,
}

impl<Res, E> RetryConfig<Res, E> {
    /// Creates a new configuration builder.
    pub fn builder() -> RetryConfigBuilder<Res, E> {
        RetryConfigBuilder::new()
    }
}

/// Builder for [`RetryConfig`].
pub struct RetryConfigBuilder<Res, E> {
    max_attempts: usize,
    interval_fn: Option<Arc<dyn IntervalFunction>>,
    max_delay: Duration,
    jitter: bool,
    jitter_factor: f64,
    retry_predicate: Option<RetryPredicate<E>>,
    result_predicate: Option<ResultPredicate<Res>>,
    event_listeners: EventListeners<RetryEvent>,
    name: String,
}

impl<Res, E> Default for RetryConfigBuilder<Res, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Res, E> RetryConfigBuilder<Res, E> {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - max_attempts: 3
    /// - backoff: exponential, 1s base, factor 2.0
    /// - max_delay: 60s
    /// - jitter: on, factor 0.1
    /// - every error retryable, no result predicate
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            max_attempts: 3,
            interval_fn: None,
            max_delay: Duration::from_secs(60),
            jitter: true,
            jitter_factor: 0.1,
            retry_predicate: None,
            result_predicate: None,
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Sets the maximum number of operation invocations, initial attempt
    /// included. Must be at least 1.
    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Uses the same delay for every attempt.
    pub fn fixed_backoff(mut self, delay: Duration) -> Self {
        self.interval_fn = Some(Arc::new(FixedInterval::new(delay)));
        self
    }

    /// Uses exponential backoff (`base * 2^attempt`).
    pub fn exponential_backoff(mut self, base: Duration) -> Self {
        self.interval_fn = Some(Arc::new(ExponentialBackoff::new(base)));
        self
    }

    /// Uses exponential backoff with a custom multiplier.
    pub fn exponential_backoff_with_factor(mut self, base: Duration, factor: f64) -> Self {
        self.interval_fn = Some(Arc::new(ExponentialBackoff::new(base).factor(factor)));
        self
    }

    /// Uses linear backoff (`base * (attempt + 1)`).
    pub fn linear_backoff(mut self, base: Duration) -> Self {
        self.interval_fn = Some(Arc::new(LinearBackoff::new(base)));
        self
    }

    /// Uses fibonacci backoff (`base * fib(attempt + 1)`).
    pub fn fibonacci_backoff(mut self, base: Duration) -> Self {
        self.interval_fn = Some(Arc::new(FibonacciBackoff::new(base)));
        self
    }

    /// Uses a custom interval function.
    pub fn backoff<I>(mut self, interval_fn: I) -> Self
    where
        I: IntervalFunction + 'static,
    {
        self.interval_fn = Some(Arc::new(interval_fn));
        self
    }

    /// Sets the ceiling every computed delay is clamped to.
    ///
    /// Default: 60 seconds
    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Enables or disables jitter.
    ///
    /// Default: enabled
    pub fn jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Sets the jitter spread: the clamped delay is multiplied by a uniform
    /// factor in `1 ± jitter_factor`. Values are clamped to `[0, 1]`.
    ///
    /// Default: 0.1
    pub fn jitter_factor(mut self, jitter_factor: f64) -> Self {
        self.jitter_factor = jitter_factor;
        self
    }

    /// Sets a predicate deciding which errors are retried. Errors that fail
    /// the predicate propagate immediately without touching the stats.
    pub fn retry_on<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.retry_predicate = Some(Arc::new(predicate));
        self
    }

    /// Sets a predicate over *successful* results; a matching result is
    /// treated as a retryable outcome while attempts remain.
    pub fn retry_on_result<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Res) -> bool + Send + Sync + 'static,
    {
        self.result_predicate = Some(Arc::new(predicate));
        self
    }

    /// Gives this retry instance a name for events and logging.
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback invoked before each retry attempt with the
    /// 1-based retry number and the delay about to be slept.
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Retry { attempt, delay, .. } = event {
                f(*attempt, *delay);
            }
        }));
        self
    }

    /// Registers a callback invoked on success with the total number of
    /// invocations made (1 = no retries were needed).
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Success { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Registers a callback invoked when the attempt budget is exhausted,
    /// with the total number of invocations made.
    pub fn on_exhausted<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Exhausted { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Registers a callback invoked when an error is propagated without
    /// retrying because it failed the retry predicate.
    pub fn on_ignored_error<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, RetryEvent::IgnoredError { .. }) {
                f();
            }
        }));
        self
    }

    /// Builds the retry layer.
    ///
    /// # Panics
    ///
    /// Panics if `max_attempts` is zero.
    pub fn build(self) -> crate::RetryLayer<Res, E> {
        assert!(self.max_attempts >= 1, "max_attempts must be at least 1");

        let interval_fn = self
            .interval_fn
            .unwrap_or_else(|| Arc::new(ExponentialBackoff::new(Duration::from_secs(1))));

        let mut policy = RetryPolicy::new(self.max_attempts, interval_fn);
        policy.max_delay = self.max_delay;
        policy.jitter = self.jitter;
        policy.jitter_factor = self.jitter_factor;
        policy.retry_predicate = self.retry_predicate;
        policy.result_predicate = self.result_predicate;

        let config = RetryConfig {
            policy,
            event_listeners: self.event_listeners,
            name: self.name,
        };

        crate::RetryLayer::new(config)
    }
}

impl<Res> RetryConfigBuilder<Res, StructuredError> {
    /// Retries only errors whose [`ErrorKind`] is in the given set.
    pub fn retry_on_kinds<I>(self, kinds: I) -> Self
    where
        I: IntoIterator<Item = ErrorKind>,
    {
        let kinds: HashSet<ErrorKind> = kinds.into_iter().collect();
        self.retry_on(move |error: &StructuredError| kinds.contains(&error.kind()))
    }

    /// Retries only errors flagged recoverable.
    pub fn retry_on_recoverable(self) -> Self {
        self.retry_on(|error: &StructuredError| error.recoverable())
    }
}
