//! Retry loop behavior: attempt budgets, exhaustion, stats discipline.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tower::{Layer, Service, ServiceExt, service_fn};
use tradeguard_core::{ErrorKind, StructuredError};
use tradeguard_retry::{RetryError, RetryLayer, RetryStats};

fn transient(message: &str) -> StructuredError {
    StructuredError::new(ErrorKind::Network, message)
}

#[tokio::test]
async fn invokes_at_most_max_attempts() {
    for max_attempts in 1..=5 {
        let call_count = Arc::new(AtomicUsize::new(0));
        let cc = Arc::clone(&call_count);

        let svc = service_fn(move |_req: ()| {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(transient("still down"))
            }
        });

        let layer = RetryLayer::<(), StructuredError>::builder()
            .max_attempts(max_attempts)
            .fixed_backoff(Duration::from_millis(1))
            .jitter(false)
            .build();
        let mut service = layer.layer(svc);

        let result = service.ready().await.unwrap().call(()).await;
        match result {
            Err(RetryError::Exhausted { attempts, .. }) => assert_eq!(attempts, max_attempts),
            other => panic!("expected Exhausted, got {other:?}"),
        }
        assert_eq!(call_count.load(Ordering::SeqCst), max_attempts);
    }
}

#[tokio::test]
async fn exhausted_error_carries_the_last_failure() {
    let call_count = Arc::new(AtomicUsize::new(0));
    let cc = Arc::clone(&call_count);

    let svc = service_fn(move |_req: ()| {
        let n = cc.fetch_add(1, Ordering::SeqCst);
        async move { Err::<(), _>(transient(&format!("failure #{n}"))) }
    });

    let layer = RetryLayer::<(), StructuredError>::builder()
        .max_attempts(3)
        .fixed_backoff(Duration::from_millis(1))
        .jitter(false)
        .build();
    let mut service = layer.layer(svc);

    match service.ready().await.unwrap().call(()).await {
        Err(RetryError::Exhausted { source, .. }) => {
            assert_eq!(source.message(), "failure #2");
        }
        other => panic!("expected Exhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn stats_count_only_retried_attempts() {
    let call_count = Arc::new(AtomicUsize::new(0));
    let cc = Arc::clone(&call_count);

    let svc = service_fn(move |_req: ()| {
        let cc = Arc::clone(&cc);
        async move {
            if cc.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(transient("blip"))
            } else {
                Ok(())
            }
        }
    });

    let layer = RetryLayer::<(), StructuredError>::builder()
        .max_attempts(5)
        .fixed_backoff(Duration::from_millis(1))
        .jitter(false)
        .build();
    let mut service = layer.layer(svc);
    let handle = service.clone();

    service.ready().await.unwrap().call(()).await.unwrap();

    let stats = handle.stats();
    assert_eq!(
        stats,
        RetryStats {
            attempts: 1,
            successes: 1,
            failures: 1,
            last_error: Some(transient("blip").to_string()),
        }
    );
}

#[tokio::test]
async fn delay_suspends_only_the_calling_task() {
    // A slow retry sequence must not block an independent task sharing the
    // runtime.
    let svc = service_fn(|_req: ()| async move { Err::<(), _>(transient("down")) });

    let layer = RetryLayer::<(), StructuredError>::builder()
        .max_attempts(3)
        .fixed_backoff(Duration::from_millis(80))
        .jitter(false)
        .build();
    let mut service = layer.layer(svc);

    let side_task = tokio::spawn(async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        "responsive"
    });

    let retrying = service.ready().await.unwrap().call(());
    let (retry_result, side_result) = tokio::join!(retrying, side_task);

    assert!(retry_result.is_err());
    assert_eq!(side_result.unwrap(), "responsive");
}
