use crate::events::CircuitBreakerEvent;
use std::sync::Arc;
use std::time::Duration;
use tradeguard_core::EventListeners;

/// Classifies an outcome as a failure for the breaker's accounting.
///
/// Outcomes the classifier does not flag bypass the failure accounting
/// entirely — a validation error that will never succeed on retry should not
/// push a healthy dependency toward an open circuit.
pub type SharedFailureClassifier<Res, E> =
    Arc<dyn Fn(&Result<Res, E>) -> bool + Send + Sync>;

/// The non-generic part of the breaker configuration: thresholds, windows,
/// name, and event listeners. Shared with [`CircuitHandle`](crate::CircuitHandle)
/// so handles stay free of the service's type parameters.
pub struct BreakerSettings {
    pub(crate) name: String,
    pub(crate) failure_threshold: usize,
    pub(crate) failure_window: Duration,
    pub(crate) recovery_timeout: Duration,
    pub(crate) success_threshold: usize,
    pub(crate) event_listeners: EventListeners<CircuitBreakerEvent>,
}

/// Configuration for the circuit breaker pattern.
pub struct CircuitBreakerConfig<Res, E> {
    pub(crate) settings: Arc<BreakerSettings>,
    pub(crate) failure_classifier: SharedFailureClassifier<Res, E>,
}

impl<Res, E> CircuitBreakerConfig<Res, E> {
    /// Creates a new configuration builder.
    pub fn builder() -> CircuitBreakerConfigBuilder<Res, E> {
        CircuitBreakerConfigBuilder::new()
    }
}

impl<Res, E> Clone for CircuitBreakerConfig<Res, E> {
    fn clone(&self) -> Self {
        Self {
            settings: Arc::clone(&self.settings),
            failure_classifier: Arc::clone(&self.failure_classifier),
        }
    }
}

/// Builder for configuring and constructing a circuit breaker.
pub struct CircuitBreakerConfigBuilder<Res, E> {
    failure_threshold: usize,
    failure_window: Duration,
    recovery_timeout: Duration,
    success_threshold: usize,
    failure_classifier: SharedFailureClassifier<Res, E>,
    event_listeners: EventListeners<CircuitBreakerEvent>,
    name: String,
}

impl<Res, E> CircuitBreakerConfigBuilder<Res, E> {
    /// Creates a new builder with default values.
    ///
    /// Defaults:
    /// - failure_threshold: 5
    /// - failure_window: 60s
    /// - recovery_timeout: 60s
    /// - success_threshold: 2
    /// - failure classifier: every `Err` is a failure
    pub fn new() -> Self {
        Self {
            failure_threshold: 5,
            failure_window: Duration::from_secs(60),
            recovery_timeout: Duration::from_secs(60),
            success_threshold: 2,
            failure_classifier: Arc::new(|res| res.is_err()),
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Sets the number of windowed failures at which the circuit opens.
    ///
    /// Default: 5
    pub fn failure_threshold(mut self, threshold: usize) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Sets the window over which failures are counted; older failures are
    /// pruned lazily.
    ///
    /// Default: 60 seconds
    pub fn failure_window(mut self, window: Duration) -> Self {
        self.failure_window = window;
        self
    }

    /// Sets how long the circuit stays open before the next call is allowed
    /// to probe (Open → HalfOpen is evaluated lazily at call time).
    ///
    /// Default: 60 seconds
    pub fn recovery_timeout(mut self, timeout: Duration) -> Self {
        self.recovery_timeout = timeout;
        self
    }

    /// Sets the number of consecutive half-open successes required to close
    /// the circuit. Also bounds the number of trial calls admitted per
    /// half-open episode.
    ///
    /// Default: 2
    pub fn success_threshold(mut self, threshold: usize) -> Self {
        self.success_threshold = threshold;
        self
    }

    /// Sets a custom failure classifier.
    ///
    /// Default: every `Err` counts as a failure.
    pub fn failure_classifier<F>(mut self, classifier: F) -> Self
    where
        F: Fn(&Result<Res, E>) -> bool + Send + Sync + 'static,
    {
        self.failure_classifier = Arc::new(classifier);
        self
    }

    /// Gives this breaker a name for observability. One breaker guards one
    /// logical dependency, so the name is typically the dependency's
    /// (e.g. `"binance"`, `"order-db"`).
    pub fn name<N: Into<String>>(mut self, name: N) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback invoked on every state transition with the
    /// from- and to-states.
    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(crate::CircuitState, crate::CircuitState) + Send + Sync + 'static,
    {
        use tradeguard_core::FnListener;
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::StateTransition {
                    from_state,
                    to_state,
                    ..
                } = event
                {
                    f(*from_state, *to_state);
                }
            }));
        self
    }

    /// Registers a callback invoked when a call is permitted through,
    /// with the state it was permitted in.
    pub fn on_call_permitted<F>(mut self, f: F) -> Self
    where
        F: Fn(crate::CircuitState) + Send + Sync + 'static,
    {
        use tradeguard_core::FnListener;
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::CallPermitted { state, .. } = event {
                    f(*state);
                }
            }));
        self
    }

    /// Registers a callback invoked when a call is rejected because the
    /// circuit is open (or half-open with no probe slots left).
    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        use tradeguard_core::FnListener;
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if matches!(event, CircuitBreakerEvent::CallRejected { .. }) {
                    f();
                }
            }));
        self
    }

    /// Registers a callback invoked when a success is recorded.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(crate::CircuitState) + Send + Sync + 'static,
    {
        use tradeguard_core::FnListener;
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::SuccessRecorded { state, .. } = event {
                    f(*state);
                }
            }));
        self
    }

    /// Registers a callback invoked when a failure is recorded.
    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: Fn(crate::CircuitState) + Send + Sync + 'static,
    {
        use tradeguard_core::FnListener;
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::FailureRecorded { state, .. } = event {
                    f(*state);
                }
            }));
        self
    }

    /// Builds the configuration and returns a `CircuitBreakerLayer`.
    ///
    /// # Panics
    ///
    /// Panics if `failure_threshold` or `success_threshold` is zero.
    pub fn build(self) -> crate::layer::CircuitBreakerLayer<Res, E> {
        assert!(
            self.failure_threshold >= 1,
            "failure_threshold must be at least 1"
        );
        assert!(
            self.success_threshold >= 1,
            "success_threshold must be at least 1"
        );

        let config = CircuitBreakerConfig {
            settings: Arc::new(BreakerSettings {
                name: self.name,
                failure_threshold: self.failure_threshold,
                failure_window: self.failure_window,
                recovery_timeout: self.recovery_timeout,
                success_threshold: self.success_threshold,
                event_listeners: self.event_listeners,
            }),
            failure_classifier: self.failure_classifier,
        };

        crate::layer::CircuitBreakerLayer::new(config)
    }
}

impl<Res, E> Default for CircuitBreakerConfigBuilder<Res, E> {
    fn default() -> Self {
        Self::new()
    }
}
