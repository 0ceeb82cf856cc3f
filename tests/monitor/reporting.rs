//! Windowed statistics and report rendering.

use std::time::Duration;
use tradeguard_core::{ErrorKind, Severity, StructuredError};
use tradeguard_monitor::{ErrorEvent, ErrorMonitor, MonitorConfig, ReportFormat};

fn seeded_monitor() -> ErrorMonitor {
    let monitor = ErrorMonitor::new(MonitorConfig::default());
    monitor.record_error(
        StructuredError::new(ErrorKind::Network, "reset").with_severity(Severity::Warning),
        "feed",
    );
    monitor.record_error(StructuredError::new(ErrorKind::Network, "refused"), "feed");
    monitor.record_error(
        StructuredError::new(ErrorKind::Broker, "rejected").with_severity(Severity::Critical),
        "order-engine",
    );
    monitor
}

#[test]
fn stats_distributions() {
    let monitor = seeded_monitor();
    let stats = monitor.get_error_stats(Duration::from_secs(300), None);

    assert_eq!(stats.total, 3);
    assert!((stats.rate - 3.0 / 300.0).abs() < 1e-9);
    assert_eq!(stats.by_severity.get(&Severity::Warning), Some(&1));
    assert_eq!(stats.by_severity.get(&Severity::Error), Some(&1));
    assert_eq!(stats.by_severity.get(&Severity::Critical), Some(&1));
    assert_eq!(stats.by_component.get("feed"), Some(&2));
    assert_eq!(stats.top_kinds.first(), Some(&(ErrorKind::Network, 2)));
}

#[test]
fn stats_respect_the_component_filter() {
    let monitor = seeded_monitor();
    let stats = monitor.get_error_stats(Duration::from_secs(300), Some("order-engine"));
    assert_eq!(stats.total, 1);
    assert_eq!(stats.by_component.len(), 1);
}

#[test]
fn recent_errors_filter_and_order() {
    let monitor = seeded_monitor();

    let recent = monitor.get_recent_errors(2, None, None);
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].error.message(), "rejected");
    assert_eq!(recent[1].error.message(), "refused");

    let critical = monitor.get_recent_errors(10, Some(Severity::Critical), None);
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0].component, "order-engine");
}

#[test]
fn events_can_carry_session_identity() {
    let monitor = ErrorMonitor::default();
    monitor.record_event(
        ErrorEvent::new(
            StructuredError::new(ErrorKind::Validation, "bad order"),
            "api",
        )
        .with_user_id("u-17")
        .with_session_id("s-203")
        .with_context("endpoint", "/orders"),
    );

    let recent = monitor.get_recent_errors(1, None, None);
    assert_eq!(recent[0].user_id.as_deref(), Some("u-17"));
    assert_eq!(recent[0].session_id.as_deref(), Some("s-203"));
}

#[test]
fn json_report_is_machine_parseable() {
    let monitor = seeded_monitor();
    let report = monitor.generate_error_report(Duration::from_secs(300), ReportFormat::Json);

    let value: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(value["stats"]["total"], 3);
    assert_eq!(value["window_secs"], 300);
    assert_eq!(value["recent_errors"].as_array().unwrap().len(), 3);
}

#[test]
fn text_report_summarizes() {
    let monitor = seeded_monitor();
    let report = monitor.generate_error_report(Duration::from_secs(300), ReportFormat::Text);

    assert!(report.contains("total: 3"));
    assert!(report.contains("order-engine"));
    assert!(report.contains("Critical"));
}
