//! Resilience composer: one wrapped call surface around an operation.
//!
//! [`ResiliencePipeline`] combines per-attempt timeout, retry, circuit
//! breaker, and fallback into a single service with a fixed nesting order,
//! outermost first:
//!
//! ```text
//! fallback ( circuit breaker ( retry ( per-attempt timeout ( operation ))))
//! ```
//!
//! The order is deliberate:
//!
//! - the circuit breaker wraps the whole retry loop so it sees exactly one
//!   logical call per invocation and counts dependency-level failures, not
//!   attempt-level noise;
//! - the timeout sits innermost so every retry attempt gets a fresh budget
//!   and one slow attempt cannot consume the whole retry allowance;
//! - the fallback sits outermost and is consulted only once every other
//!   layer has given up.
//!
//! Errors surface as [`PipelineError`] (`ResilienceError<StructuredError>`),
//! so callers can match on `Timeout` / `CircuitOpen` / `RetryExhausted`
//! without unwrapping nested layer enums. A per-attempt timeout becomes a
//! retryable `CONNECTION_TIMEOUT` structured error inside the retry loop;
//! dropping the composed future cancels the in-flight attempt cooperatively.
//!
//! # Example
//!
//! ```
//! use tradeguard_pipeline::{PipelineError, ResiliencePipeline};
//! use tradeguard_core::StructuredError;
//! use std::time::Duration;
//! use tower::service_fn;
//!
//! # async fn example() {
//! let pipeline = ResiliencePipeline::<String>::api_call("binance");
//!
//! let mut service = pipeline.wrap(service_fn(|symbol: String| async move {
//!     Ok::<_, StructuredError>(format!("ticker for {symbol}"))
//! }));
//!
//! match service.execute("BTC/USD".to_string()).await {
//!     Ok(ticker) => println!("{ticker}"),
//!     Err(PipelineError::CircuitOpen { .. }) => println!("venue isolated"),
//!     Err(err) => println!("failed: {err}"),
//! }
//! # }
//! ```

mod registry;

pub use registry::PipelineRegistry;
pub use tradeguard_core::ResilienceError;

use futures::future::BoxFuture;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::util::BoxCloneService;
use tower::{Layer, Service, ServiceExt};
pub use tradeguard_circuitbreaker::{CircuitBreakerLayer, CircuitHandle, CircuitState};
pub use tradeguard_retry::RetryLayer;
pub use tradeguard_timelimiter::TimeLimiterLayer;

use tradeguard_circuitbreaker::CircuitBreakerError;
use tradeguard_core::StructuredError;
use tradeguard_retry::RetryError;
use tradeguard_timelimiter::TimeLimiterError;

/// The pipeline's error currency.
pub type PipelineError = ResilienceError<StructuredError>;

/// Produces a replacement result once every resilience layer has given up.
pub type FallbackFn<Res> = Arc<
    dyn Fn(&PipelineError) -> BoxFuture<'static, Result<Res, StructuredError>> + Send + Sync,
>;

/// Builder for a composed resilience pipeline around one dependency.
///
/// `Res` is the operation's success type. Construct, configure the layers
/// you need, then [`wrap`](Self::wrap) the operation once; the returned
/// [`ResilientService`] is the single call surface handed to workers.
pub struct ResiliencePipeline<Res> {
    name: String,
    timeout: Option<Duration>,
    retry: Option<RetryLayer<Res, StructuredError>>,
    breaker: Option<CircuitBreakerLayer<Res, PipelineError>>,
    fallback: Option<FallbackFn<Res>>,
}

impl<Res> ResiliencePipeline<Res> {
    /// Creates an empty pipeline named after the dependency it guards.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timeout: None,
            retry: None,
            breaker: None,
            fallback: None,
        }
    }

    /// Bounds each attempt to the given duration.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Adds a retry layer (built via [`RetryLayer::builder`]).
    pub fn retry(mut self, retry: RetryLayer<Res, StructuredError>) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Adds a circuit breaker (built via [`CircuitBreakerLayer::builder`]).
    ///
    /// The breaker wraps the whole retry loop: one invocation of the
    /// wrapped service counts as one call against the circuit.
    pub fn circuit_breaker(mut self, breaker: CircuitBreakerLayer<Res, PipelineError>) -> Self {
        self.breaker = Some(breaker);
        self
    }

    /// Registers a fallback consulted when the composed call fails. The
    /// fallback's own failure is logged and the original error propagates.
    pub fn fallback<F>(mut self, fallback: F) -> Self
    where
        F: Fn(&PipelineError) -> BoxFuture<'static, Result<Res, StructuredError>>
            + Send
            + Sync
            + 'static,
    {
        self.fallback = Some(Arc::new(fallback));
        self
    }

    /// Pre-tuned pipeline for third-party API calls: 10s attempts, three
    /// tries with exponential backoff on recoverable errors, and a breaker
    /// at the documented defaults.
    pub fn api_call(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(name.clone())
            .timeout(Duration::from_secs(10))
            .retry(
                RetryLayer::builder()
                    .max_attempts(3)
                    .exponential_backoff(Duration::from_secs(1))
                    .max_delay(Duration::from_secs(30))
                    .retry_on_recoverable()
                    .name(name.clone())
                    .build(),
            )
            .circuit_breaker(
                CircuitBreakerLayer::builder()
                    .failure_threshold(5)
                    .failure_window(Duration::from_secs(60))
                    .recovery_timeout(Duration::from_secs(60))
                    .success_threshold(2)
                    .name(name)
                    .build(),
            )
    }

    /// Pre-tuned pipeline for database calls: short attempts, linear
    /// backoff, and a breaker that trips and probes faster than the API
    /// preset.
    pub fn database_call(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(name.clone())
            .timeout(Duration::from_secs(5))
            .retry(
                RetryLayer::builder()
                    .max_attempts(5)
                    .linear_backoff(Duration::from_millis(500))
                    .max_delay(Duration::from_secs(5))
                    .retry_on_recoverable()
                    .name(name.clone())
                    .build(),
            )
            .circuit_breaker(
                CircuitBreakerLayer::builder()
                    .failure_threshold(3)
                    .failure_window(Duration::from_secs(30))
                    .recovery_timeout(Duration::from_secs(30))
                    .success_threshold(2)
                    .name(name)
                    .build(),
            )
    }

    /// Pre-tuned pipeline for strategy evaluation: generous attempt budget,
    /// one quick retry, no breaker (strategy code is local, not a
    /// dependency).
    pub fn strategy_call(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(name.clone()).timeout(Duration::from_secs(30)).retry(
            RetryLayer::builder()
                .max_attempts(2)
                .fixed_backoff(Duration::from_millis(100))
                .name(name)
                .build(),
        )
    }

    /// Wraps an operation, producing the single composed call surface.
    pub fn wrap<S, Req>(self, operation: S) -> ResilientService<Req, Res>
    where
        S: Service<Req, Response = Res, Error = StructuredError> + Clone + Send + 'static,
        S::Future: Send + 'static,
        Req: Clone + Send + 'static,
        Res: Send + 'static,
    {
        // Innermost: per-attempt timeout. A timeout becomes a retryable
        // structured error so the retry layer can grant the next attempt a
        // fresh budget.
        let svc: BoxCloneService<Req, Res, StructuredError> = match self.timeout {
            Some(timeout) => {
                let limiter = TimeLimiterLayer::builder()
                    .timeout_duration(timeout)
                    .name(self.name.clone())
                    .build();
                BoxCloneService::new(limiter.layer(operation).map_err(flatten_timeout))
            }
            None => BoxCloneService::new(operation),
        };

        // Retry wraps the timeout.
        let svc: BoxCloneService<Req, Res, PipelineError> = match self.retry {
            Some(retry) => BoxCloneService::new(retry.layer(svc).map_err(flatten_retry)),
            None => BoxCloneService::new(svc.map_err(PipelineError::Application)),
        };

        // The circuit breaker wraps the retry loop.
        let (svc, breaker): (
            BoxCloneService<Req, Res, PipelineError>,
            Option<CircuitHandle>,
        ) = match self.breaker {
            Some(breaker_layer) => {
                let breaker = breaker_layer.layer_fn(svc);
                let handle = breaker.handle();
                let breaker_name = handle.name().to_string();
                let flatten = move |error: CircuitBreakerError<PipelineError>| match error {
                    CircuitBreakerError::OpenCircuit => PipelineError::CircuitOpen {
                        name: Some(breaker_name.clone()),
                    },
                    CircuitBreakerError::Inner(inner) => inner,
                };
                (BoxCloneService::new(breaker.map_err(flatten)), Some(handle))
            }
            None => (svc, None),
        };

        ResilientService {
            name: self.name,
            inner: svc,
            fallback: self.fallback,
            breaker,
        }
    }
}

fn flatten_timeout(error: TimeLimiterError<StructuredError>) -> StructuredError {
    match error {
        TimeLimiterError::Timeout { timeout } => StructuredError::connection_timeout(format!(
            "attempt exceeded its {timeout:?} budget"
        )),
        TimeLimiterError::Inner(inner) => inner,
    }
}

fn flatten_retry(error: RetryError<StructuredError>) -> PipelineError {
    match error {
        RetryError::Exhausted { attempts, source } => {
            PipelineError::RetryExhausted { attempts, source }
        }
        RetryError::Inner(inner) => PipelineError::Application(inner),
    }
}

/// The composed call surface produced by [`ResiliencePipeline::wrap`].
///
/// Clones share the underlying circuit: hand one clone to each worker and
/// they all contribute to the same breaker state.
pub struct ResilientService<Req, Res> {
    name: String,
    inner: BoxCloneService<Req, Res, PipelineError>,
    fallback: Option<FallbackFn<Res>>,
    breaker: Option<CircuitHandle>,
}

impl<Req, Res> ResilientService<Req, Res> {
    /// The dependency name this pipeline guards.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The circuit handle, when a breaker is configured.
    pub fn circuit(&self) -> Option<&CircuitHandle> {
        self.breaker.as_ref()
    }

    /// The breaker's current state, `Closed` when no breaker is configured.
    pub fn circuit_state(&self) -> CircuitState {
        self.breaker
            .as_ref()
            .map(CircuitHandle::state_sync)
            .unwrap_or(CircuitState::Closed)
    }
}

impl<Req, Res> Clone for ResilientService<Req, Res> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            inner: self.inner.clone(),
            fallback: self.fallback.clone(),
            breaker: self.breaker.clone(),
        }
    }
}

impl<Req, Res> ResilientService<Req, Res>
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    /// Waits for readiness and performs one composed call.
    pub async fn execute(&mut self, req: Req) -> Result<Res, PipelineError> {
        self.ready().await?.call(req).await
    }
}

impl<Req, Res> Service<Req> for ResilientService<Req, Res>
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    type Response = Res;
    type Error = PipelineError;
    type Future = BoxFuture<'static, Result<Res, PipelineError>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let fut = self.inner.call(req);
        let fallback = self.fallback.clone();
        #[cfg(feature = "tracing")]
        let name = self.name.clone();

        Box::pin(async move {
            match fut.await {
                Ok(response) => Ok(response),
                Err(error) => match fallback {
                    Some(fallback) => match fallback(&error).await {
                        Ok(response) => {
                            #[cfg(feature = "tracing")]
                            tracing::debug!(pipeline = %name, "fallback produced a result");
                            Ok(response)
                        }
                        Err(_fallback_err) => {
                            // The fallback's failure never masks the
                            // original pipeline error.
                            #[cfg(feature = "tracing")]
                            tracing::warn!(
                                pipeline = %name,
                                code = _fallback_err.code(),
                                "fallback failed"
                            );
                            Err(error)
                        }
                    },
                    None => Err(error),
                },
            }
        })
    }
}
