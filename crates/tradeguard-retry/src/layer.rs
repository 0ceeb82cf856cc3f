use crate::{Retry, RetryConfig};
use std::sync::Arc;
use tower::Layer;

/// A Tower [`Layer`] that applies retry logic to a service.
///
/// # Example
///
/// ```
/// use tradeguard_retry::RetryLayer;
/// use tower::ServiceBuilder;
/// use std::time::Duration;
///
/// # #[derive(Debug, Clone)]
/// # struct MyError;
/// # impl std::fmt::Display for MyError {
/// #     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
/// #         write!(f, "my error")
/// #     }
/// # }
/// # async fn example() {
/// let retry = RetryLayer::<String, MyError>::builder()
///     .max_attempts(5)
///     .linear_backoff(Duration::from_millis(100))
///     .build();
///
/// let service = ServiceBuilder::new()
///     .layer(retry)
///     .service(tower::service_fn(|req: String| async move {
///         Ok::<_, MyError>(req)
///     }));
/// # }
/// ```
pub struct RetryLayer<Res, E> {
    config: Arc<RetryConfig<Res, E>>,
}

impl<Res, E> RetryLayer<Res, E> {
    /// Creates a new `RetryLayer` from a built configuration.
    pub fn new(config: RetryConfig<Res, E>) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Creates a new builder for configuring a retry layer.
    pub fn builder() -> crate::RetryConfigBuilder<Res, E> {
        crate::RetryConfigBuilder::new()
    }
}

impl<Res, E> Clone for RetryLayer<Res, E> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
        }
    }
}

impl<S, Res, E> Layer<S> for RetryLayer<Res, E> {
    type Service = Retry<S, Res, E>;

    fn layer(&self, service: S) -> Self::Service {
        Retry::new(service, Arc::clone(&self.config))
    }
}
