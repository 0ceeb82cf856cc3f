//! Opening thresholds, windowed counting, and the full recovery cycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::sleep;
use tower::{Service, ServiceExt, service_fn};
use tradeguard_circuitbreaker::{CircuitBreakerError, CircuitBreakerLayer, CircuitState};

/// The canonical lifecycle: two failures open the circuit, the third call
/// fails fast without invoking the operation, and after the recovery
/// timeout a single success closes it again.
#[tokio::test]
async fn open_fail_fast_then_recover() {
    let call_count = Arc::new(AtomicUsize::new(0));
    let cc = Arc::clone(&call_count);

    let svc = service_fn(move |_req: ()| {
        let n = cc.fetch_add(1, Ordering::SeqCst);
        async move {
            if n < 2 {
                Err("exchange down")
            } else {
                Ok::<_, &str>(())
            }
        }
    });

    let layer = CircuitBreakerLayer::<(), &str>::builder()
        .failure_threshold(2)
        .failure_window(Duration::from_secs(60))
        .recovery_timeout(Duration::from_millis(50))
        .success_threshold(1)
        .name("lifecycle")
        .build();
    let mut breaker = layer.layer_fn(svc);

    // Two failing calls transition Closed -> Open.
    let _ = breaker.ready().await.unwrap().call(()).await;
    let _ = breaker.ready().await.unwrap().call(()).await;
    assert_eq!(breaker.state().await, CircuitState::Open);

    // An immediate third call fails fast; the operation is never invoked.
    let result = breaker.ready().await.unwrap().call(()).await;
    assert!(matches!(result, Err(CircuitBreakerError::OpenCircuit)));
    assert_eq!(call_count.load(Ordering::SeqCst), 2);

    // After the recovery timeout the next call is allowed through and its
    // success closes the circuit.
    sleep(Duration::from_millis(80)).await;
    let result = breaker.ready().await.unwrap().call(()).await;
    assert!(result.is_ok());
    assert_eq!(breaker.state().await, CircuitState::Closed);
}

#[tokio::test]
async fn stays_closed_below_threshold() {
    let svc = service_fn(|_req: ()| async { Err::<(), _>("down") });

    let layer = CircuitBreakerLayer::<(), &str>::builder()
        .failure_threshold(5)
        .name("below-threshold")
        .build();
    let mut breaker = layer.layer_fn(svc);

    for _ in 0..4 {
        let _ = breaker.ready().await.unwrap().call(()).await;
    }
    assert_eq!(breaker.state().await, CircuitState::Closed);
    assert_eq!(breaker.stats().await.failure_count, 4);
}

#[tokio::test]
async fn failures_outside_the_window_do_not_count() {
    let svc = service_fn(|_req: ()| async { Err::<(), _>("down") });

    let layer = CircuitBreakerLayer::<(), &str>::builder()
        .failure_threshold(3)
        .failure_window(Duration::from_millis(50))
        .name("windowed")
        .build();
    let mut breaker = layer.layer_fn(svc);

    let _ = breaker.ready().await.unwrap().call(()).await;
    let _ = breaker.ready().await.unwrap().call(()).await;
    sleep(Duration::from_millis(80)).await;

    // The earlier failures have aged out; this is one failure in a fresh
    // window.
    let _ = breaker.ready().await.unwrap().call(()).await;
    assert_eq!(breaker.state().await, CircuitState::Closed);
}

#[tokio::test]
async fn forced_overrides_bypass_transition_logic() {
    let svc = service_fn(|_req: ()| async { Ok::<_, &str>(()) });

    let layer = CircuitBreakerLayer::<(), &str>::builder()
        .name("manual")
        .build();
    let mut breaker = layer.layer_fn(svc);

    breaker.force_open().await;
    let result = breaker.ready().await.unwrap().call(()).await;
    assert!(matches!(result, Err(CircuitBreakerError::OpenCircuit)));

    breaker.force_close().await;
    assert!(breaker.ready().await.unwrap().call(()).await.is_ok());
}

#[tokio::test]
async fn transition_listener_observes_the_cycle() {
    let transitions = Arc::new(std::sync::Mutex::new(Vec::new()));
    let t = Arc::clone(&transitions);

    let svc = service_fn(|_req: ()| async { Err::<(), _>("down") });

    let layer = CircuitBreakerLayer::<(), &str>::builder()
        .failure_threshold(1)
        .name("observed")
        .on_state_transition(move |from, to| {
            if let Ok(mut log) = t.lock() {
                log.push((from, to));
            }
        })
        .build();
    let mut breaker = layer.layer_fn(svc);

    let _ = breaker.ready().await.unwrap().call(()).await;

    let log = transitions.lock().unwrap().clone();
    assert_eq!(log, vec![(CircuitState::Closed, CircuitState::Open)]);
}
