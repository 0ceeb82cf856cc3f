//! Recovery manager: maps failing components to recovery strategies.
//!
//! Callers own a [`RecoveryManager`] and register a [`RecoveryPolicy`] per
//! component key at startup — there is no hidden global registry. When an
//! operation fails, [`execute_recovery`](RecoveryManager::execute_recovery)
//! resolves the policy from the context's component (falling back to
//! classification by the error's kind) and dispatches:
//!
//! - **Retry** — re-run the operation with exponential backoff and an
//!   optional per-attempt timeout.
//! - **Fallback** — return the fallback hook's replacement result.
//! - **Degrade** — return the degrade hook's reduced-fidelity result.
//! - **Restart** — wait, invoke the restart hook, re-attempt once.
//! - **Ignore** — return the policy's explicit default value.
//! - **Alert** — invoke the alert hook, then re-raise the original error.
//!
//! Every hook runs inside a protective boundary: a hook that fails (or
//! panics) is logged and the *original* error propagates — a broken recovery
//! path never masks the failure it was meant to handle.
//!
//! # Example
//!
//! ```
//! use tradeguard_recovery::{RecoveryContext, RecoveryManager, RecoveryPolicy};
//! use tradeguard_core::{ErrorKind, StructuredError};
//!
//! # async fn example() {
//! let mut manager: RecoveryManager<f64> = RecoveryManager::new();
//! manager.register_recovery(
//!     "data_feed",
//!     RecoveryPolicy::fallback(|_err, _ctx| {
//!         Box::pin(async { Ok(0.0) }) // last known price
//!     }),
//! );
//!
//! let error = StructuredError::new(ErrorKind::DataFeed, "feed stalled");
//! let ctx = RecoveryContext::for_component("data_feed");
//! let price = manager
//!     .execute_recovery(|| async { Err(error.clone()) }, error.clone(), &ctx)
//!     .await;
//! assert_eq!(price.unwrap(), 0.0);
//! # }
//! ```

mod context;
mod policy;

pub use context::RecoveryContext;
pub use policy::{AlertHook, RecoveryHook, RecoveryPolicy, RecoveryStrategy, RestartHook};

use futures::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tradeguard_core::StructuredError;
use tradeguard_retry::{ExponentialBackoff, RetryPolicy};

/// A caller-owned registry of recovery policies keyed by component.
pub struct RecoveryManager<T> {
    policies: HashMap<String, RecoveryPolicy<T>>,
}

impl<T> Default for RecoveryManager<T>
where
    T: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecoveryManager<T>
where
    T: Clone,
{
    pub fn new() -> Self {
        Self {
            policies: HashMap::new(),
        }
    }

    /// Registers (or replaces) the policy for a component key.
    pub fn register_recovery(&mut self, component: impl Into<String>, policy: RecoveryPolicy<T>) {
        self.policies.insert(component.into(), policy);
    }

    /// Returns whether a policy is registered for the key.
    pub fn has_policy(&self, component: &str) -> bool {
        self.policies.contains_key(component)
    }

    /// Returns the registered component keys.
    pub fn policy_keys(&self) -> Vec<&str> {
        self.policies.keys().map(String::as_str).collect()
    }

    /// Runs recovery for a failed operation.
    ///
    /// The policy is resolved from `context.component()` when present, else
    /// by classifying `error.kind()` to its component key. When no policy is
    /// registered the original error is returned unchanged.
    ///
    /// `operation` must be re-invokable: the Retry and Restart strategies
    /// call it again.
    pub async fn execute_recovery<F, Fut>(
        &self,
        operation: F,
        error: StructuredError,
        context: &RecoveryContext,
    ) -> Result<T, StructuredError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, StructuredError>>,
    {
        let key = context
            .component()
            .unwrap_or_else(|| error.kind().component_key());

        let Some(policy) = self.policies.get(key) else {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                component = key,
                code = error.code(),
                "no recovery policy registered, re-raising original error"
            );
            return Err(error);
        };

        match policy.strategy {
            RecoveryStrategy::Retry => self.run_retry(policy, operation).await,
            RecoveryStrategy::Fallback => {
                let hook = policy.fallback.clone();
                self.run_hook(hook, error, context, "fallback").await
            }
            RecoveryStrategy::Degrade => {
                let hook = policy.degrade.clone();
                self.run_hook(hook, error, context, "degrade").await
            }
            RecoveryStrategy::Restart => self.run_restart(policy, operation).await,
            RecoveryStrategy::Ignore => match &policy.default_value {
                Some(value) => Ok(value.clone()),
                None => Err(error),
            },
            RecoveryStrategy::Alert => {
                if let Some(hook) = &policy.alert {
                    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
                        hook(&error, context)
                    }));
                    match outcome {
                        Ok(Ok(())) => {}
                        Ok(Err(_hook_err)) => {
                            #[cfg(feature = "tracing")]
                            tracing::warn!(code = _hook_err.code(), "alert hook failed");
                        }
                        Err(_) => {
                            #[cfg(feature = "tracing")]
                            tracing::warn!("alert hook panicked");
                        }
                    }
                }
                // Alerting never suppresses the failure.
                Err(error)
            }
        }
    }

    async fn run_retry<F, Fut>(
        &self,
        policy: &RecoveryPolicy<T>,
        operation: F,
    ) -> Result<T, StructuredError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, StructuredError>>,
    {
        // Delegate the backoff arithmetic (clamp + jitter) to the retry
        // executor's policy.
        let backoff: RetryPolicy<(), StructuredError> = RetryPolicy::new(
            policy.max_attempts,
            Arc::new(ExponentialBackoff::new(policy.base_delay)),
        );

        let mut attempt = 0;
        loop {
            let result = match policy.timeout {
                Some(limit) => match tokio::time::timeout(limit, operation()).await {
                    Ok(result) => result,
                    Err(_) => Err(StructuredError::connection_timeout(format!(
                        "recovery attempt timed out after {limit:?}"
                    ))),
                },
                None => operation().await,
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if attempt + 1 >= policy.max_attempts {
                        return Err(e.with_context("recovery_attempts", attempt + 1));
                    }
                    let delay = backoff.next_backoff(attempt);
                    attempt += 1;
                    #[cfg(feature = "tracing")]
                    tracing::debug!(attempt, ?delay, "recovery retry");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn run_restart<F, Fut>(
        &self,
        policy: &RecoveryPolicy<T>,
        operation: F,
    ) -> Result<T, StructuredError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, StructuredError>>,
    {
        tokio::time::sleep(policy.restart_delay).await;

        if let Some(hook) = &policy.restart {
            match AssertUnwindSafe(hook()).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(_hook_err)) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(code = _hook_err.code(), "restart hook failed");
                }
                Err(_) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("restart hook panicked");
                }
            }
        }

        // One re-attempt after the restart; its outcome is the result.
        operation().await
    }

    async fn run_hook(
        &self,
        hook: Option<RecoveryHook<T>>,
        error: StructuredError,
        context: &RecoveryContext,
        _label: &'static str,
    ) -> Result<T, StructuredError> {
        let Some(hook) = hook else {
            return Err(error);
        };

        match AssertUnwindSafe(hook(&error, context)).catch_unwind().await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_hook_err)) => {
                // The hook's own failure is logged but never masks the
                // original error.
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    hook = _label,
                    code = _hook_err.code(),
                    "recovery hook failed"
                );
                Err(error)
            }
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(hook = _label, "recovery hook panicked");
                Err(error)
            }
        }
    }
}
