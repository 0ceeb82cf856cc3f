//! Circuit breaker middleware for trading dependencies.
//!
//! One breaker guards one logical dependency (an exchange, a data feed, a
//! database). It counts failures within a sliding time window; when the
//! windowed count reaches the threshold the circuit opens and calls fail
//! fast with [`CircuitBreakerError::OpenCircuit`] without ever invoking the
//! dependency. After the recovery timeout the *next* call is allowed through
//! as a trial (the transition is evaluated lazily at call time, not on a
//! background timer); enough consecutive trial successes close the circuit,
//! while a single trial failure reopens it immediately.
//!
//! # Usage
//!
//! ```
//! use tradeguard_circuitbreaker::CircuitBreakerLayer;
//! use tower::{ServiceBuilder, service_fn};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let breaker = CircuitBreakerLayer::<String, std::io::Error>::builder()
//!     .failure_threshold(5)
//!     .failure_window(Duration::from_secs(60))
//!     .recovery_timeout(Duration::from_secs(60))
//!     .success_threshold(2)
//!     .name("binance")
//!     .build();
//!
//! let service = ServiceBuilder::new()
//!     .layer(breaker)
//!     .service(service_fn(|req: String| async move {
//!         Ok::<String, std::io::Error>(req)
//!     }));
//! # }
//! ```
//!
//! # Sharing one breaker
//!
//! Cloned services share the same circuit, so many trading workers calling
//! through clones of one breaker all contribute to (and observe) the same
//! state. [`CircuitHandle`] gives dashboards and supervisors access to the
//! state and the manual overrides without carrying the service's type
//! parameters:
//!
//! ```
//! use tradeguard_circuitbreaker::{CircuitBreakerLayer, CircuitState};
//! use tower::service_fn;
//!
//! # async fn example() {
//! let layer = CircuitBreakerLayer::<String, std::io::Error>::builder()
//!     .name("kraken")
//!     .build();
//! let svc = service_fn(|req: String| async move { Ok::<_, std::io::Error>(req) });
//! let breaker = layer.layer_fn(svc);
//!
//! let handle = breaker.handle();
//! assert_eq!(handle.state_sync(), CircuitState::Closed);
//! if handle.is_open() {
//!     // route orders to the backup venue
//! }
//! # }
//! ```
//!
//! # Failure classification
//!
//! By default every `Err` counts against the window. Errors that will never
//! succeed on retry (validation failures, insufficient funds) should be
//! excluded so they bypass the breaker's accounting entirely:
//!
//! ```
//! use tradeguard_circuitbreaker::CircuitBreakerLayer;
//! use tradeguard_core::StructuredError;
//!
//! let layer = CircuitBreakerLayer::<String, StructuredError>::builder()
//!     .failure_classifier(|result: &Result<String, StructuredError>| {
//!         match result {
//!             Ok(_) => false,
//!             Err(e) => e.recoverable(),
//!         }
//!     })
//!     .build();
//! ```

use futures::future::BoxFuture;
use std::sync::Arc;
use std::sync::atomic::AtomicU8;
use std::task::{Context, Poll};
use tokio::sync::Mutex;
use tower::Service;

pub use circuit::{CircuitState, CircuitStats};
pub use config::{
    BreakerSettings, CircuitBreakerConfig, CircuitBreakerConfigBuilder, SharedFailureClassifier,
};
pub use error::CircuitBreakerError;
pub use events::CircuitBreakerEvent;
pub use layer::CircuitBreakerLayer;

use crate::circuit::Circuit;

mod circuit;
mod config;
mod error;
mod events;
mod layer;

/// A Tower service that applies circuit breaker logic to an inner service.
pub struct CircuitBreaker<S, Res, E> {
    inner: S,
    circuit: Arc<Mutex<Circuit>>,
    state_atomic: Arc<AtomicU8>,
    config: CircuitBreakerConfig<Res, E>,
}

impl<S, Res, E> CircuitBreaker<S, Res, E> {
    /// Creates a new `CircuitBreaker` wrapping the given service.
    pub(crate) fn new(inner: S, config: CircuitBreakerConfig<Res, E>) -> Self {
        let state_atomic = Arc::new(AtomicU8::new(CircuitState::Closed as u8));
        Self {
            inner,
            circuit: Arc::new(Mutex::new(Circuit::new(Arc::clone(&state_atomic)))),
            state_atomic,
            config,
        }
    }

    /// Returns a handle to the shared circuit for inspection and manual
    /// overrides, free of the service's type parameters.
    pub fn handle(&self) -> CircuitHandle {
        CircuitHandle {
            circuit: Arc::clone(&self.circuit),
            state_atomic: Arc::clone(&self.state_atomic),
            settings: Arc::clone(&self.config.settings),
        }
    }

    /// Forces the circuit open, bypassing normal transition logic.
    pub async fn force_open(&self) {
        let mut circuit = self.circuit.lock().await;
        circuit.force_open(&self.config.settings);
    }

    /// Forces the circuit closed, bypassing normal transition logic.
    pub async fn force_close(&self) {
        let mut circuit = self.circuit.lock().await;
        circuit.force_close(&self.config.settings);
    }

    /// Resets the circuit to closed and clears the failure history.
    pub async fn reset(&self) {
        let mut circuit = self.circuit.lock().await;
        circuit.reset(&self.config.settings);
    }

    /// Returns the current state of the circuit.
    pub async fn state(&self) -> CircuitState {
        let circuit = self.circuit.lock().await;
        circuit.state()
    }

    /// Returns the current state without locking; safe from sync contexts.
    pub fn state_sync(&self) -> CircuitState {
        CircuitState::from_u8(self.state_atomic.load(std::sync::atomic::Ordering::Acquire))
    }

    /// Returns whether the circuit is currently open.
    pub fn is_open(&self) -> bool {
        self.state_sync() == CircuitState::Open
    }

    /// Returns a snapshot of the breaker's observable state.
    pub async fn stats(&self) -> CircuitStats {
        let circuit = self.circuit.lock().await;
        circuit.stats(&self.config.settings)
    }
}

impl<S, Res, E> Clone for CircuitBreaker<S, Res, E>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            circuit: Arc::clone(&self.circuit),
            state_atomic: Arc::clone(&self.state_atomic),
            config: self.config.clone(),
        }
    }
}

impl<S, Req, Res, E> Service<Req> for CircuitBreaker<S, Res, E>
where
    S: Service<Req, Response = Res, Error = E> + Clone + Send + 'static,
    S::Future: Send + 'static,
    Req: Send + 'static,
    Res: Send + 'static,
    E: Send + 'static,
{
    type Response = Res;
    type Error = CircuitBreakerError<E>;
    type Future = BoxFuture<'static, Result<Res, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner
            .poll_ready(cx)
            .map_err(CircuitBreakerError::Inner)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let config = self.config.clone();
        let circuit = Arc::clone(&self.circuit);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let permitted = {
                let mut circuit = circuit.lock().await;
                circuit.try_acquire(&config.settings)
            };

            #[cfg(feature = "tracing")]
            {
                if permitted {
                    tracing::trace!(breaker = %config.settings.name, "circuit breaker permitted call");
                } else {
                    tracing::trace!(breaker = %config.settings.name, "circuit breaker rejected call");
                }
            }

            if !permitted {
                return Err(CircuitBreakerError::OpenCircuit);
            }

            // The lock is not held while the dependency runs.
            let result = inner.call(req).await;

            let is_failure = (config.failure_classifier)(&result);
            {
                let mut circuit = circuit.lock().await;
                if is_failure {
                    circuit.record_failure(&config.settings);
                } else {
                    circuit.record_success(&config.settings);
                }
            }

            result.map_err(CircuitBreakerError::Inner)
        })
    }
}

/// A type-parameter-free handle to a shared circuit.
///
/// Obtained from [`CircuitBreaker::handle`]; clones observe and control the
/// same circuit as the service they came from.
#[derive(Clone)]
pub struct CircuitHandle {
    circuit: Arc<Mutex<Circuit>>,
    state_atomic: Arc<AtomicU8>,
    settings: Arc<BreakerSettings>,
}

impl CircuitHandle {
    /// Returns the breaker's configured name.
    pub fn name(&self) -> &str {
        &self.settings.name
    }

    /// Returns the current state of the circuit.
    pub async fn state(&self) -> CircuitState {
        let circuit = self.circuit.lock().await;
        circuit.state()
    }

    /// Returns the current state without locking.
    pub fn state_sync(&self) -> CircuitState {
        CircuitState::from_u8(self.state_atomic.load(std::sync::atomic::Ordering::Acquire))
    }

    /// Returns whether the circuit is currently open.
    pub fn is_open(&self) -> bool {
        self.state_sync() == CircuitState::Open
    }

    /// Returns a snapshot of the breaker's observable state.
    pub async fn stats(&self) -> CircuitStats {
        let circuit = self.circuit.lock().await;
        circuit.stats(&self.settings)
    }

    /// Forces the circuit open.
    pub async fn force_open(&self) {
        let mut circuit = self.circuit.lock().await;
        circuit.force_open(&self.settings);
    }

    /// Forces the circuit closed.
    pub async fn force_close(&self) {
        let mut circuit = self.circuit.lock().await;
        circuit.force_close(&self.settings);
    }

    /// Resets the circuit to closed and clears the failure history.
    pub async fn reset(&self) {
        let mut circuit = self.circuit.lock().await;
        circuit.reset(&self.settings);
    }
}
