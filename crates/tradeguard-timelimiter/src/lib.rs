//! Per-attempt timeout middleware.
//!
//! Bounds each call to a fixed deadline. On timeout the in-flight future is
//! dropped — cancellation is cooperative, so the wrapped operation stops at
//! its next await point and no new work is started on its behalf.
//!
//! In a composed stack this sits innermost (directly around the operation)
//! so that every retry attempt gets a fresh budget and a single slow attempt
//! cannot consume the whole retry allowance.
//!
//! # Example
//!
//! ```
//! use tradeguard_timelimiter::TimeLimiterLayer;
//! use tower::{Layer, service_fn};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let layer = TimeLimiterLayer::builder()
//!     .timeout_duration(Duration::from_secs(5))
//!     .name("broker-api")
//!     .on_timeout(|| {
//!         eprintln!("broker call timed out");
//!     })
//!     .build();
//!
//! let svc = service_fn(|req: String| async move {
//!     Ok::<String, ()>(req)
//! });
//!
//! let mut service = layer.layer(svc);
//! # }
//! ```

mod config;
mod error;
mod events;
mod layer;

pub use config::{TimeLimiterConfig, TimeLimiterConfigBuilder};
pub use error::TimeLimiterError;
pub use events::TimeLimiterEvent;
pub use layer::TimeLimiterLayer;

use futures::future::BoxFuture;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::Service;

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter};

#[cfg(feature = "metrics")]
use std::sync::Once;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

/// A Tower service that bounds each call to a fixed deadline.
pub struct TimeLimiter<S> {
    inner: S,
    config: Arc<TimeLimiterConfig>,
}

impl<S> TimeLimiter<S> {
    pub(crate) fn new(inner: S, config: Arc<TimeLimiterConfig>) -> Self {
        #[cfg(feature = "metrics")]
        METRICS_INIT.call_once(|| {
            describe_counter!(
                "timelimiter_calls_total",
                "Total number of time limiter calls (success, error, or timeout)"
            );
        });

        Self { inner, config }
    }
}

impl<S> Clone for TimeLimiter<S>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S, Req> Service<Req> for TimeLimiter<S>
where
    S: Service<Req> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
    Req: Send + 'static,
{
    type Response = S::Response;
    type Error = TimeLimiterError<S::Error>;
    type Future = BoxFuture<'static, Result<S::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(TimeLimiterError::Inner)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let mut inner = self.inner.clone();
        let config = Arc::clone(&self.config);

        Box::pin(async move {
            let start = Instant::now();
            match tokio::time::timeout(config.timeout, inner.call(req)).await {
                Ok(Ok(response)) => {
                    config.event_listeners.emit(&TimeLimiterEvent::Success {
                        pattern_name: config.name.clone(),
                        timestamp: Instant::now(),
                        duration: start.elapsed(),
                    });
                    #[cfg(feature = "metrics")]
                    counter!("timelimiter_calls_total", "timelimiter" => config.name.clone(), "outcome" => "success")
                        .increment(1);
                    Ok(response)
                }
                Ok(Err(error)) => {
                    config.event_listeners.emit(&TimeLimiterEvent::Error {
                        pattern_name: config.name.clone(),
                        timestamp: Instant::now(),
                        duration: start.elapsed(),
                    });
                    #[cfg(feature = "metrics")]
                    counter!("timelimiter_calls_total", "timelimiter" => config.name.clone(), "outcome" => "error")
                        .increment(1);
                    Err(TimeLimiterError::Inner(error))
                }
                Err(_elapsed) => {
                    config.event_listeners.emit(&TimeLimiterEvent::Timeout {
                        pattern_name: config.name.clone(),
                        timestamp: Instant::now(),
                    });
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        timelimiter = %config.name,
                        timeout = ?config.timeout,
                        "call exceeded deadline, in-flight attempt dropped"
                    );
                    #[cfg(feature = "metrics")]
                    counter!("timelimiter_calls_total", "timelimiter" => config.name.clone(), "outcome" => "timeout")
                        .increment(1);
                    Err(TimeLimiterError::Timeout {
                        timeout: config.timeout,
                    })
                }
            }
        })
    }
}
