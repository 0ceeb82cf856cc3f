//! Retry middleware for trading operations.
//!
//! Runs a wrapped operation up to `max_attempts` times with a configurable
//! backoff strategy (fixed, exponential, linear, or fibonacci), delay
//! clamping, and jitter. Errors that fail the retry predicate propagate
//! immediately and bypass the retry accounting entirely; exhausting the
//! attempt budget returns [`RetryError::Exhausted`] wrapping the last error.
//!
//! # Example
//!
//! ```
//! use tradeguard_retry::{RetryConfig, RetryLayer};
//! use tower::ServiceBuilder;
//! use std::time::Duration;
//!
//! # #[derive(Debug, Clone)]
//! # struct FeedError;
//! # impl std::fmt::Display for FeedError {
//! #     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//! #         write!(f, "feed error")
//! #     }
//! # }
//! # async fn example() {
//! let retry: RetryLayer<String, FeedError> = RetryConfig::builder()
//!     .max_attempts(5)
//!     .exponential_backoff(Duration::from_millis(100))
//!     .max_delay(Duration::from_secs(10))
//!     .on_retry(|attempt, delay| {
//!         println!("retry {attempt} after {delay:?}");
//!     })
//!     .build();
//!
//! let service = ServiceBuilder::new()
//!     .layer(retry)
//!     .service(tower::service_fn(|req: String| async move {
//!         Ok::<_, FeedError>(format!("quote for {req}"))
//!     }));
//! # }
//! ```
//!
//! A successful result can also be treated as retryable via
//! [`retry_on_result`](RetryConfigBuilder::retry_on_result) — useful when a
//! dependency signals "not ready yet" through an empty payload instead of an
//! error. When attempts run out on a result-predicate match, the last result
//! is returned as-is.
//!
//! The delay suspends only the calling task (`tokio::time::sleep`); no lock
//! is held across it, so other tasks sharing the executor stay responsive.

mod backoff;
mod config;
mod error;
mod events;
mod layer;
mod policy;
mod stats;

pub use backoff::{
    ExponentialBackoff, FibonacciBackoff, FixedInterval, FnInterval, IntervalFunction,
    LinearBackoff,
};
pub use config::{RetryConfig, RetryConfigBuilder};
pub use error::RetryError;
pub use events::RetryEvent;
pub use layer::RetryLayer;
pub use policy::{ResultPredicate, RetryPolicy, RetryPredicate};
pub use stats::RetryStats;

use futures::future::BoxFuture;
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Instant;
use tower::Service;

/// A Tower [`Service`] that retries failed calls to an inner service.
pub struct Retry<S, Res, E> {
    inner: S,
    config: Arc<RetryConfig<Res, E>>,
    stats: Arc<Mutex<RetryStats>>,
}

impl<S, Res, E> Retry<S, Res, E> {
    /// Creates a new `Retry` wrapping the given service.
    pub fn new(inner: S, config: Arc<RetryConfig<Res, E>>) -> Self {
        Self {
            inner,
            config,
            stats: Arc::new(Mutex::new(RetryStats::default())),
        }
    }

    /// Returns a snapshot of the execution counters.
    ///
    /// The snapshot is copied out under the lock; callers never observe the
    /// live counters.
    pub fn stats(&self) -> RetryStats {
        self.stats
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl<S, Res, E> Clone for Retry<S, Res, E>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: Arc::clone(&self.config),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<S, Req, Res, E> Service<Req> for Retry<S, Res, E>
where
    S: Service<Req, Response = Res, Error = E> + Clone + Send + 'static,
    S::Future: Send + 'static,
    Req: Clone + Send + 'static,
    Res: Send + 'static,
    E: Display + Send + 'static,
{
    type Response = Res;
    type Error = RetryError<E>;
    type Future = BoxFuture<'static, Result<Res, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(RetryError::Inner)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let mut service = self.inner.clone();
        let config = Arc::clone(&self.config);
        let stats = Arc::clone(&self.stats);

        Box::pin(async move {
            // `attempt` counts retries performed so far; invocations made is
            // `attempt + 1`.
            let mut attempt = 0;

            loop {
                let result = service.call(req.clone()).await;

                match result {
                    Ok(response) => {
                        if config.policy.should_retry_result(&response)
                            && attempt + 1 < config.policy.max_attempts
                        {
                            let delay = config.policy.next_backoff(attempt);
                            attempt += 1;
                            if let Ok(mut s) = stats.lock() {
                                s.attempts += 1;
                            }
                            config.event_listeners.emit(&RetryEvent::Retry {
                                pattern_name: config.name.clone(),
                                timestamp: Instant::now(),
                                attempt,
                                delay,
                            });
                            #[cfg(feature = "tracing")]
                            tracing::debug!(
                                retry = %config.name,
                                attempt,
                                ?delay,
                                "result matched retry predicate, retrying"
                            );
                            tokio::time::sleep(delay).await;
                            continue;
                        }

                        if let Ok(mut s) = stats.lock() {
                            s.successes += 1;
                        }
                        config.event_listeners.emit(&RetryEvent::Success {
                            pattern_name: config.name.clone(),
                            timestamp: Instant::now(),
                            attempts: attempt + 1,
                        });
                        return Ok(response);
                    }
                    Err(error) => {
                        if !config.policy.should_retry(&error) {
                            config.event_listeners.emit(&RetryEvent::IgnoredError {
                                pattern_name: config.name.clone(),
                                timestamp: Instant::now(),
                            });
                            return Err(RetryError::Inner(error));
                        }

                        if attempt + 1 >= config.policy.max_attempts {
                            if let Ok(mut s) = stats.lock() {
                                s.last_error = Some(error.to_string());
                            }
                            config.event_listeners.emit(&RetryEvent::Exhausted {
                                pattern_name: config.name.clone(),
                                timestamp: Instant::now(),
                                attempts: attempt + 1,
                            });
                            #[cfg(feature = "tracing")]
                            tracing::warn!(
                                retry = %config.name,
                                attempts = attempt + 1,
                                "retry attempts exhausted"
                            );
                            return Err(RetryError::Exhausted {
                                attempts: attempt + 1,
                                source: error,
                            });
                        }

                        let delay = config.policy.next_backoff(attempt);
                        attempt += 1;
                        if let Ok(mut s) = stats.lock() {
                            s.attempts += 1;
                            s.failures += 1;
                            s.last_error = Some(error.to_string());
                        }
                        config.event_listeners.emit(&RetryEvent::Retry {
                            pattern_name: config.name.clone(),
                            timestamp: Instant::now(),
                            attempt,
                            delay,
                        });
                        #[cfg(feature = "tracing")]
                        tracing::debug!(retry = %config.name, attempt, ?delay, "retrying after failure");
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        })
    }
}
