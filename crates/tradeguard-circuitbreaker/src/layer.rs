use crate::{CircuitBreaker, CircuitBreakerConfig};
use tower::Layer;

/// A Tower [`Layer`] that wraps services with a circuit breaker.
///
/// Every call to [`Layer::layer`] creates a *fresh* circuit. To share one
/// circuit across callers, clone the built [`CircuitBreaker`] service (or
/// its [`handle`](CircuitBreaker::handle)) instead of re-applying the layer.
pub struct CircuitBreakerLayer<Res, E> {
    config: CircuitBreakerConfig<Res, E>,
}

impl<Res, E> CircuitBreakerLayer<Res, E> {
    /// Creates a new layer from a built configuration.
    pub fn new(config: CircuitBreakerConfig<Res, E>) -> Self {
        Self { config }
    }

    /// Creates a new builder for configuring a circuit breaker.
    pub fn builder() -> crate::CircuitBreakerConfigBuilder<Res, E> {
        crate::CircuitBreakerConfigBuilder::new()
    }

    /// Wraps a service directly, preserving the concrete
    /// [`CircuitBreaker`] type so its handle methods stay reachable.
    pub fn layer_fn<S>(&self, service: S) -> CircuitBreaker<S, Res, E> {
        CircuitBreaker::new(service, self.config.clone())
    }
}

impl<Res, E> Clone for CircuitBreakerLayer<Res, E> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
        }
    }
}

impl<S, Res, E> Layer<S> for CircuitBreakerLayer<Res, E> {
    type Service = CircuitBreaker<S, Res, E>;

    fn layer(&self, service: S) -> Self::Service {
        CircuitBreaker::new(service, self.config.clone())
    }
}
