//! The protective boundary around recovery hooks.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tradeguard_core::{ErrorKind, StructuredError};
use tradeguard_recovery::{RecoveryContext, RecoveryManager, RecoveryPolicy};

fn feed_error() -> StructuredError {
    StructuredError::new(ErrorKind::DataFeed, "stale candles")
}

#[tokio::test]
async fn hook_error_is_swallowed_and_original_returned() {
    let mut manager: RecoveryManager<u32> = RecoveryManager::new();
    manager.register_recovery(
        "data_feed",
        RecoveryPolicy::fallback(|_, _| {
            Box::pin(async { Err(StructuredError::new(ErrorKind::Recovery, "cache miss")) })
        }),
    );

    let original = feed_error();
    let result = manager
        .execute_recovery(
            || async { Err(feed_error()) },
            original.clone(),
            &RecoveryContext::new(),
        )
        .await;
    assert_eq!(result.unwrap_err(), original);
}

#[tokio::test]
async fn panicking_hook_is_contained() {
    let mut manager: RecoveryManager<u32> = RecoveryManager::new();
    manager.register_recovery(
        "data_feed",
        RecoveryPolicy::degrade(|_, _| panic!("degrade hook bug")),
    );

    let original = feed_error();
    let result = manager
        .execute_recovery(
            || async { Err(feed_error()) },
            original.clone(),
            &RecoveryContext::new(),
        )
        .await;
    assert_eq!(result.unwrap_err(), original);
}

#[tokio::test]
async fn alert_failure_still_re_raises_the_original() {
    let alerted = Arc::new(AtomicUsize::new(0));
    let a = Arc::clone(&alerted);

    let mut manager: RecoveryManager<u32> = RecoveryManager::new();
    manager.register_recovery(
        "broker",
        RecoveryPolicy::alert(move |_, _| {
            a.fetch_add(1, Ordering::SeqCst);
            Err(StructuredError::new(ErrorKind::Network, "pager down"))
        }),
    );

    let original = StructuredError::new(ErrorKind::Broker, "margin breach");
    let result = manager
        .execute_recovery(
            || async { Err(feed_error()) },
            original.clone(),
            &RecoveryContext::new(),
        )
        .await;

    assert_eq!(alerted.load(Ordering::SeqCst), 1);
    assert_eq!(result.unwrap_err(), original);
}

#[tokio::test]
async fn failing_restart_hook_still_re_attempts() {
    let mut manager: RecoveryManager<&str> = RecoveryManager::new();
    manager.register_recovery(
        "data_feed",
        RecoveryPolicy::restart(
            || Box::pin(async { Err(StructuredError::new(ErrorKind::Recovery, "no pid")) }),
            Duration::from_millis(1),
        ),
    );

    let result = manager
        .execute_recovery(
            || async { Ok("reconnected") },
            feed_error(),
            &RecoveryContext::new(),
        )
        .await;
    assert_eq!(result.unwrap(), "reconnected");
}

#[tokio::test]
async fn ignore_without_configured_default_is_impossible() {
    // The constructor requires the default value, so Ignore can never
    // silently produce a null result.
    let mut manager: RecoveryManager<i64> = RecoveryManager::new();
    manager.register_recovery("generic", RecoveryPolicy::ignore(-1));

    let result = manager
        .execute_recovery(
            || async { Err(feed_error()) },
            StructuredError::new(ErrorKind::Generic, "noise"),
            &RecoveryContext::new(),
        )
        .await;
    assert_eq!(result.unwrap(), -1);
}
