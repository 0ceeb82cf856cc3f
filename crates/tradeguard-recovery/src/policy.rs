use crate::context::RecoveryContext;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tradeguard_core::StructuredError;

/// How a failing component is recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// Re-run the operation with backoff, up to the policy's attempt budget.
    Retry,
    /// Produce a replacement result from the fallback hook.
    Fallback,
    /// Produce a reduced-fidelity result from the degrade hook.
    Degrade,
    /// Wait, invoke the restart hook, then re-attempt the operation once.
    Restart,
    /// Swallow the failure and return the policy's explicit default value.
    Ignore,
    /// Invoke the alert hook, then re-raise the original error.
    Alert,
}

/// A hook producing a replacement result for a failed operation.
pub type RecoveryHook<T> = Arc<
    dyn Fn(&StructuredError, &RecoveryContext) -> BoxFuture<'static, Result<T, StructuredError>>
        + Send
        + Sync,
>;

/// A hook invoked to restart a component before a single re-attempt.
pub type RestartHook =
    Arc<dyn Fn() -> BoxFuture<'static, Result<(), StructuredError>> + Send + Sync>;

/// A hook notified of a failure; alerting never suppresses the failure.
pub type AlertHook =
    Arc<dyn Fn(&StructuredError, &RecoveryContext) -> Result<(), StructuredError> + Send + Sync>;

/// A recovery policy for one component.
///
/// Constructed through the strategy-specific constructors so each strategy
/// carries exactly the hooks it needs. Policies are immutable once built and
/// live in a caller-owned [`RecoveryManager`](crate::RecoveryManager).
pub struct RecoveryPolicy<T> {
    pub(crate) strategy: RecoveryStrategy,
    pub(crate) max_attempts: usize,
    pub(crate) base_delay: Duration,
    pub(crate) timeout: Option<Duration>,
    pub(crate) restart_delay: Duration,
    pub(crate) fallback: Option<RecoveryHook<T>>,
    pub(crate) degrade: Option<RecoveryHook<T>>,
    pub(crate) restart: Option<RestartHook>,
    pub(crate) alert: Option<AlertHook>,
    pub(crate) default_value: Option<T>,
}

impl<T> RecoveryPolicy<T> {
    fn base(strategy: RecoveryStrategy) -> Self {
        Self {
            strategy,
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            timeout: None,
            restart_delay: Duration::from_secs(5),
            fallback: None,
            degrade: None,
            restart: None,
            alert: None,
            default_value: None,
        }
    }

    /// Re-run the failing operation up to `max_attempts` times with
    /// exponential backoff.
    pub fn retry(max_attempts: usize) -> Self {
        let mut policy = Self::base(RecoveryStrategy::Retry);
        policy.max_attempts = max_attempts.max(1);
        policy
    }

    /// Produce a replacement result from the given hook.
    pub fn fallback<F>(hook: F) -> Self
    where
        F: Fn(&StructuredError, &RecoveryContext) -> BoxFuture<'static, Result<T, StructuredError>>
            + Send
            + Sync
            + 'static,
    {
        let mut policy = Self::base(RecoveryStrategy::Fallback);
        policy.fallback = Some(Arc::new(hook));
        policy
    }

    /// Produce a reduced-fidelity result from the given hook.
    pub fn degrade<F>(hook: F) -> Self
    where
        F: Fn(&StructuredError, &RecoveryContext) -> BoxFuture<'static, Result<T, StructuredError>>
            + Send
            + Sync
            + 'static,
    {
        let mut policy = Self::base(RecoveryStrategy::Degrade);
        policy.degrade = Some(Arc::new(hook));
        policy
    }

    /// Wait `restart_delay`, invoke the restart hook, then re-attempt the
    /// operation once.
    pub fn restart<F>(hook: F, restart_delay: Duration) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<(), StructuredError>> + Send + Sync + 'static,
    {
        let mut policy = Self::base(RecoveryStrategy::Restart);
        policy.restart = Some(Arc::new(hook));
        policy.restart_delay = restart_delay;
        policy
    }

    /// Swallow the failure and return `default_value`.
    ///
    /// The default is explicit by design; there is no implicit null result.
    pub fn ignore(default_value: T) -> Self {
        let mut policy = Self::base(RecoveryStrategy::Ignore);
        policy.default_value = Some(default_value);
        policy
    }

    /// Invoke the alert hook, then re-raise the original error.
    pub fn alert<F>(hook: F) -> Self
    where
        F: Fn(&StructuredError, &RecoveryContext) -> Result<(), StructuredError>
            + Send
            + Sync
            + 'static,
    {
        let mut policy = Self::base(RecoveryStrategy::Alert);
        policy.alert = Some(Arc::new(hook));
        policy
    }

    /// Sets the per-attempt timeout used by the Retry strategy.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the backoff base delay used by the Retry strategy.
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn strategy(&self) -> RecoveryStrategy {
        self.strategy
    }
}

impl<T> Clone for RecoveryPolicy<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Self {
            strategy: self.strategy,
            max_attempts: self.max_attempts,
            base_delay: self.base_delay,
            timeout: self.timeout,
            restart_delay: self.restart_delay,
            fallback: self.fallback.clone(),
            degrade: self.degrade.clone(),
            restart: self.restart.clone(),
            alert: self.alert.clone(),
            default_value: self.default_value.clone(),
        }
    }
}
