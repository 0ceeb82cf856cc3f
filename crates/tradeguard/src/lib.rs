//! Composable resilience primitives for trading systems.
//!
//! `tradeguard` lets any operation — an API call, an order placement, a data
//! fetch — run with bounded retries, failure isolation via a circuit
//! breaker, pluggable recovery strategies, and centralized error
//! observability with alerting. Each pattern is available as both an
//! individual crate and a feature in this meta-crate.
//!
//! # Patterns
//!
//! - **Retry** (`retry` feature): bounded retries with fixed, exponential,
//!   linear, or fibonacci backoff, delay clamping, and jitter
//! - **Circuit Breaker** (`circuitbreaker` feature): a three-state gate
//!   guarding one logical dependency with windowed failure counting
//! - **Time Limiter** (`timelimiter` feature): per-attempt deadlines with
//!   cooperative cancellation
//! - **Recovery** (`recovery` feature): per-component recovery strategies
//!   (retry, fallback, degrade, restart, ignore, alert)
//! - **Monitor** (`monitor` feature): bounded error-event buffer, windowed
//!   statistics, alerting, and reports
//! - **Pipeline** (`pipeline` feature): the composer — circuit breaker,
//!   retry, per-attempt timeout, and fallback in one fixed-order stack
//!
//! # Usage
//!
//! Enable specific patterns via features:
//!
//! ```toml
//! [dependencies]
//! tradeguard = { version = "0.1", features = ["pipeline", "monitor"] }
//! ```
//!
//! Or enable everything:
//!
//! ```toml
//! [dependencies]
//! tradeguard = { version = "0.1", features = ["full"] }
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! # #[cfg(feature = "pipeline")]
//! # {
//! use tradeguard::pipeline::ResiliencePipeline;
//! use tradeguard::core::StructuredError;
//! use tower::service_fn;
//!
//! # async fn example() {
//! let pipeline = ResiliencePipeline::<String>::api_call("binance");
//! let mut service = pipeline.wrap(service_fn(|symbol: String| async move {
//!     Ok::<_, StructuredError>(format!("ticker for {symbol}"))
//! }));
//! let _ = service.execute("BTC/USD".to_string()).await;
//! # }
//! # }
//! ```

// Re-export core (always available)
pub use tradeguard_core as core;

// Re-export patterns based on features
#[cfg(feature = "circuitbreaker")]
pub use tradeguard_circuitbreaker as circuitbreaker;

#[cfg(feature = "monitor")]
pub use tradeguard_monitor as monitor;

#[cfg(feature = "pipeline")]
pub use tradeguard_pipeline as pipeline;

#[cfg(feature = "recovery")]
pub use tradeguard_recovery as recovery;

#[cfg(feature = "retry")]
pub use tradeguard_retry as retry;

#[cfg(feature = "timelimiter")]
pub use tradeguard_timelimiter as timelimiter;
