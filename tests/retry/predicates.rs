//! Retry predicates over errors and successful results.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tower::{Layer, Service, ServiceExt, service_fn};
use tradeguard_core::{ErrorKind, StructuredError};
use tradeguard_retry::{RetryError, RetryLayer};

#[tokio::test]
async fn kind_filter_retries_only_matching_kinds() {
    let call_count = Arc::new(AtomicUsize::new(0));
    let cc = Arc::clone(&call_count);

    // Validation errors must propagate immediately.
    let svc = service_fn(move |_req: ()| {
        let cc = Arc::clone(&cc);
        async move {
            cc.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(StructuredError::invalid_order("qty <= 0"))
        }
    });

    let layer = RetryLayer::<(), StructuredError>::builder()
        .max_attempts(4)
        .fixed_backoff(Duration::from_millis(1))
        .retry_on_kinds([ErrorKind::Network, ErrorKind::DataFeed])
        .build();
    let mut service = layer.layer(svc);
    let handle = service.clone();

    let result = service.ready().await.unwrap().call(()).await;
    match result {
        Err(RetryError::Inner(err)) => assert_eq!(err.kind(), ErrorKind::Validation),
        other => panic!("expected Inner, got {other:?}"),
    }
    assert_eq!(call_count.load(Ordering::SeqCst), 1);
    // Non-retryable errors bypass the accounting entirely.
    assert_eq!(handle.stats().attempts, 0);
}

#[tokio::test]
async fn recoverable_filter_respects_the_flag() {
    let call_count = Arc::new(AtomicUsize::new(0));
    let cc = Arc::clone(&call_count);

    let svc = service_fn(move |_req: ()| {
        let cc = Arc::clone(&cc);
        async move {
            cc.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(StructuredError::insufficient_funds("no margin"))
        }
    });

    let layer = RetryLayer::<(), StructuredError>::builder()
        .max_attempts(4)
        .fixed_backoff(Duration::from_millis(1))
        .retry_on_recoverable()
        .build();
    let mut service = layer.layer(svc);

    let result = service.ready().await.unwrap().call(()).await;
    assert!(matches!(result, Err(RetryError::Inner(_))));
    assert_eq!(call_count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn result_predicate_retries_until_non_empty() {
    let call_count = Arc::new(AtomicUsize::new(0));
    let cc = Arc::clone(&call_count);

    // "Retry if null": the first two reads return nothing.
    let svc = service_fn(move |_req: ()| {
        let cc = Arc::clone(&cc);
        async move {
            let n = cc.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Ok::<_, StructuredError>(None)
            } else {
                Ok(Some(101.25f64))
            }
        }
    });

    let layer = RetryLayer::<Option<f64>, StructuredError>::builder()
        .max_attempts(5)
        .fixed_backoff(Duration::from_millis(1))
        .jitter(false)
        .retry_on_result(|price: &Option<f64>| price.is_none())
        .build();
    let mut service = layer.layer(svc);

    let price = service.ready().await.unwrap().call(()).await.unwrap();
    assert_eq!(price, Some(101.25));
    assert_eq!(call_count.load(Ordering::SeqCst), 3);
}
