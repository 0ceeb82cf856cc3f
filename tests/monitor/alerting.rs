//! Alert gate behavior: severity, rate, cooldown, per-window cap.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tradeguard_core::{ErrorKind, Severity, StructuredError};
use tradeguard_monitor::{AlertPayload, ErrorMonitor, MonitorConfig};

fn counting_monitor(config: MonitorConfig) -> (ErrorMonitor, Arc<AtomicUsize>) {
    let fired = Arc::new(AtomicUsize::new(0));
    let f = Arc::clone(&fired);
    let mut monitor = ErrorMonitor::new(config);
    monitor.add_alert_fn(move |_payload: &AlertPayload| {
        f.fetch_add(1, Ordering::SeqCst);
    });
    (monitor, fired)
}

/// Five Error-severity events in a 10s window with a 60s cooldown fire at
/// most one alert, not one per recorded error.
#[test]
fn burst_fires_one_alert_per_cooldown() {
    let (monitor, fired) = counting_monitor(
        MonitorConfig::builder()
            .severity_threshold(Severity::Error)
            .error_rate_threshold(0.1)
            .time_window(Duration::from_secs(10))
            .alert_cooldown(Duration::from_secs(60))
            .build(),
    );

    for i in 0..5 {
        monitor.record_error(
            StructuredError::new(ErrorKind::Network, format!("burst {i}")),
            "feed",
        );
    }
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn expired_cooldown_allows_the_next_alert() {
    let (monitor, fired) = counting_monitor(
        MonitorConfig::builder()
            .error_rate_threshold(0.0)
            .alert_cooldown(Duration::from_millis(30))
            .build(),
    );

    monitor.record_error(StructuredError::new(ErrorKind::Network, "first"), "feed");
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    std::thread::sleep(Duration::from_millis(60));
    monitor.record_error(StructuredError::new(ErrorKind::Network, "second"), "feed");
    assert_eq!(fired.load(Ordering::SeqCst), 2);
}

#[test]
fn max_alerts_per_window_caps_total() {
    let (monitor, fired) = counting_monitor(
        MonitorConfig::builder()
            .error_rate_threshold(0.0)
            .alert_cooldown(Duration::from_millis(1))
            .time_window(Duration::from_secs(60))
            .max_alerts_per_window(3)
            .build(),
    );

    for i in 0..20 {
        monitor.record_error(
            StructuredError::new(ErrorKind::Network, format!("e{i}")),
            "feed",
        );
        std::thread::sleep(Duration::from_millis(3));
    }
    assert_eq!(fired.load(Ordering::SeqCst), 3);
}

#[test]
fn severity_comparison_uses_the_total_order() {
    // Lexically "Warning" > "Error", so a string comparison would wrongly
    // alert here.
    let (monitor, fired) = counting_monitor(
        MonitorConfig::builder()
            .severity_threshold(Severity::Error)
            .error_rate_threshold(0.0)
            .build(),
    );

    monitor.record_error(
        StructuredError::new(ErrorKind::Network, "warning only").with_severity(Severity::Warning),
        "feed",
    );
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    monitor.record_error(
        StructuredError::new(ErrorKind::Network, "real error"),
        "feed",
    );
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn payload_carries_component_and_rate() {
    let seen = Arc::new(std::sync::Mutex::new(Vec::<AlertPayload>::new()));
    let s = Arc::clone(&seen);

    let mut monitor = ErrorMonitor::new(
        MonitorConfig::builder()
            .error_rate_threshold(0.0)
            .time_window(Duration::from_secs(10))
            .build(),
    );
    monitor.add_alert_fn(move |payload| {
        if let Ok(mut log) = s.lock() {
            log.push(payload.clone());
        }
    });

    monitor.record_error(
        StructuredError::new(ErrorKind::Broker, "order rejected")
            .with_context("symbol", "BTC/USD"),
        "order-engine",
    );

    let payloads = seen.lock().unwrap();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].component, "order-engine");
    assert_eq!(payloads[0].message, "order rejected");
    assert!(payloads[0].rate > 0.0);
}
