use crate::{TimeLimiter, TimeLimiterConfig};
use std::sync::Arc;
use tower::Layer;

/// A Tower [`Layer`] that applies a fixed per-call deadline.
#[derive(Clone)]
pub struct TimeLimiterLayer {
    config: Arc<TimeLimiterConfig>,
}

impl TimeLimiterLayer {
    /// Creates a new `TimeLimiterLayer` from a built configuration.
    pub fn new(config: TimeLimiterConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Creates a new builder for configuring a time limiter layer.
    pub fn builder() -> crate::TimeLimiterConfigBuilder {
        crate::TimeLimiterConfigBuilder::new()
    }
}

impl<S> Layer<S> for TimeLimiterLayer {
    type Service = TimeLimiter<S>;

    fn layer(&self, service: S) -> Self::Service {
        TimeLimiter::new(service, Arc::clone(&self.config))
    }
}
