//! Policy resolution and strategy dispatch.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tradeguard_core::{ErrorKind, StructuredError};
use tradeguard_recovery::{RecoveryContext, RecoveryManager, RecoveryPolicy};

fn broker_error() -> StructuredError {
    StructuredError::new(ErrorKind::Broker, "order rejected")
}

/// The component key in the context always wins, even when the error's kind
/// would classify to a different policy.
#[tokio::test]
async fn explicit_component_beats_kind_classification() {
    let mut manager: RecoveryManager<&str> = RecoveryManager::new();
    manager.register_recovery(
        "network",
        RecoveryPolicy::fallback(|_, _| Box::pin(async { Ok("network") })),
    );
    manager.register_recovery(
        "broker",
        RecoveryPolicy::fallback(|_, _| Box::pin(async { Ok("broker") })),
    );

    let ctx = RecoveryContext::for_component("network");
    let result = manager
        .execute_recovery(|| async { Err(broker_error()) }, broker_error(), &ctx)
        .await;
    assert_eq!(result.unwrap(), "network");
}

#[tokio::test]
async fn kind_classification_when_no_component_given() {
    let mut manager: RecoveryManager<&str> = RecoveryManager::new();
    manager.register_recovery(
        "broker",
        RecoveryPolicy::fallback(|_, _| Box::pin(async { Ok("broker") })),
    );

    let result = manager
        .execute_recovery(
            || async { Err(broker_error()) },
            broker_error(),
            &RecoveryContext::new(),
        )
        .await;
    assert_eq!(result.unwrap(), "broker");
}

#[tokio::test]
async fn missing_policy_re_raises_the_original() {
    let manager: RecoveryManager<&str> = RecoveryManager::new();
    let original = broker_error().with_context("order_id", 42);

    let result = manager
        .execute_recovery(
            || async { Err(broker_error()) },
            original.clone(),
            &RecoveryContext::new(),
        )
        .await;

    // Unchanged: same message, kind, and context.
    assert_eq!(result.unwrap_err(), original);
}

#[tokio::test]
async fn retry_with_per_attempt_timeout() {
    let mut manager: RecoveryManager<&str> = RecoveryManager::new();
    manager.register_recovery(
        "network",
        RecoveryPolicy::retry(2)
            .with_base_delay(Duration::from_millis(1))
            .with_timeout(Duration::from_millis(20)),
    );

    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    // Every attempt hangs past the timeout.
    let result = manager
        .execute_recovery(
            move || {
                c.fetch_add(1, Ordering::SeqCst);
                async move {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok("never")
                }
            },
            StructuredError::new(ErrorKind::Network, "slow"),
            &RecoveryContext::new(),
        )
        .await;

    let err = result.unwrap_err();
    assert_eq!(err.code(), "CONNECTION_TIMEOUT");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn degrade_returns_reduced_fidelity_result() {
    let mut manager: RecoveryManager<Vec<f64>> = RecoveryManager::new();
    manager.register_recovery(
        "data_feed",
        RecoveryPolicy::degrade(|_err, ctx| {
            // A degraded answer built from context: stale cache, fewer points.
            let points = ctx
                .get("cached_points")
                .and_then(|v| v.as_u64())
                .unwrap_or(0);
            Box::pin(async move { Ok(vec![0.0; points as usize]) })
        }),
    );

    let ctx = RecoveryContext::for_component("data_feed").with_value("cached_points", 3);
    let result = manager
        .execute_recovery(
            || async { Err(StructuredError::data_unavailable("feed gap")) },
            StructuredError::data_unavailable("feed gap"),
            &ctx,
        )
        .await;
    assert_eq!(result.unwrap().len(), 3);
}
