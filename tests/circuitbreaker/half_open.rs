//! Half-open trial behavior.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::sleep;
use tower::{Service, ServiceExt, service_fn};
use tradeguard_circuitbreaker::{CircuitBreakerError, CircuitBreakerLayer, CircuitState};

#[tokio::test]
async fn needs_success_threshold_consecutive_successes() {
    let svc = service_fn(|_req: ()| async { Ok::<_, &str>(()) });

    let layer = CircuitBreakerLayer::<(), &str>::builder()
        .failure_threshold(1)
        .recovery_timeout(Duration::from_millis(30))
        .success_threshold(2)
        .name("two-successes")
        .build();
    let mut breaker = layer.layer_fn(svc);

    breaker.force_open().await;
    sleep(Duration::from_millis(60)).await;

    // First trial success is not enough.
    assert!(breaker.ready().await.unwrap().call(()).await.is_ok());
    assert_eq!(breaker.state().await, CircuitState::HalfOpen);

    // The second consecutive success closes the circuit.
    assert!(breaker.ready().await.unwrap().call(()).await.is_ok());
    assert_eq!(breaker.state().await, CircuitState::Closed);
}

#[tokio::test]
async fn single_trial_failure_reopens() {
    let call_count = Arc::new(AtomicUsize::new(0));
    let cc = Arc::clone(&call_count);

    let svc = service_fn(move |_req: ()| {
        let n = cc.fetch_add(1, Ordering::SeqCst);
        async move {
            // Succeed once in half-open, then fail the second trial.
            if n == 0 { Ok::<_, &str>(()) } else { Err("relapse") }
        }
    });

    let layer = CircuitBreakerLayer::<(), &str>::builder()
        .failure_threshold(1)
        .recovery_timeout(Duration::from_millis(30))
        .success_threshold(2)
        .name("relapse")
        .build();
    let mut breaker = layer.layer_fn(svc);

    breaker.force_open().await;
    sleep(Duration::from_millis(60)).await;

    assert!(breaker.ready().await.unwrap().call(()).await.is_ok());
    assert_eq!(breaker.state().await, CircuitState::HalfOpen);

    let _ = breaker.ready().await.unwrap().call(()).await;
    assert_eq!(breaker.state().await, CircuitState::Open);

    // Back in open, calls fail fast again.
    let result = breaker.ready().await.unwrap().call(()).await;
    assert!(matches!(result, Err(CircuitBreakerError::OpenCircuit)));
}

#[tokio::test]
async fn reopen_resets_the_success_counter() {
    let call_count = Arc::new(AtomicUsize::new(0));
    let cc = Arc::clone(&call_count);

    // succeed, fail (reopen), then succeed twice after the next probe window
    let svc = service_fn(move |_req: ()| {
        let n = cc.fetch_add(1, Ordering::SeqCst);
        async move {
            if n == 1 { Err("relapse") } else { Ok::<_, &str>(()) }
        }
    });

    let layer = CircuitBreakerLayer::<(), &str>::builder()
        .failure_threshold(1)
        .recovery_timeout(Duration::from_millis(30))
        .success_threshold(2)
        .name("counter-reset")
        .build();
    let mut breaker = layer.layer_fn(svc);

    breaker.force_open().await;
    sleep(Duration::from_millis(60)).await;

    // One success, then a failure reopens and discards that progress.
    assert!(breaker.ready().await.unwrap().call(()).await.is_ok());
    let _ = breaker.ready().await.unwrap().call(()).await;
    assert_eq!(breaker.state().await, CircuitState::Open);

    sleep(Duration::from_millis(60)).await;

    // A fresh half-open episode still needs two successes.
    assert!(breaker.ready().await.unwrap().call(()).await.is_ok());
    assert_eq!(breaker.state().await, CircuitState::HalfOpen);
    assert!(breaker.ready().await.unwrap().call(()).await.is_ok());
    assert_eq!(breaker.state().await, CircuitState::Closed);
}
