//! Centralized error observability with alerting.
//!
//! The [`ErrorMonitor`] records [`ErrorEvent`]s into a bounded, time-ordered
//! buffer, computes windowed statistics over it, and fires registered alert
//! functions when the configured conditions are met:
//!
//! - the event's severity reaches `severity_threshold` (via the severity
//!   total order), AND
//! - the error rate over `time_window` exceeds `error_rate_threshold`
//!   (Critical events bypass the rate gate), AND
//! - at least `alert_cooldown` has passed since the last alert, AND
//! - fewer than `max_alerts_per_window` alerts have fired in the window.
//!
//! Alert functions receive a structured [`AlertPayload`]; anything they
//! raise (including panics) is caught and logged, never propagated to the
//! caller of [`record_error`](ErrorMonitor::record_error).
//!
//! # Example
//!
//! ```
//! use tradeguard_monitor::{ErrorMonitor, MonitorConfig};
//! use tradeguard_core::{ErrorKind, StructuredError};
//!
//! let mut monitor = ErrorMonitor::new(MonitorConfig::default());
//! monitor.add_alert_fn(|payload| {
//!     eprintln!("ALERT [{}] {}: {}", payload.severity, payload.component, payload.message);
//! });
//!
//! monitor.record_error(
//!     StructuredError::new(ErrorKind::Broker, "order rejected"),
//!     "order-engine",
//! );
//!
//! let stats = monitor.get_error_stats(std::time::Duration::from_secs(300), None);
//! assert_eq!(stats.total, 1);
//! ```

mod config;
mod event;
mod report;

pub use config::{MonitorConfig, MonitorConfigBuilder};
pub use event::ErrorEvent;
pub use report::{ErrorStats, ReportFormat};

use crate::report::ErrorReport;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};
use tradeguard_core::{Severity, StructuredError};

/// The structured payload passed to every alert function.
#[derive(Debug, Clone, Serialize)]
pub struct AlertPayload {
    pub message: String,
    pub severity: Severity,
    pub component: String,
    pub context: Map<String, Value>,
    /// Errors per second over the monitor's time window at alert time.
    pub rate: f64,
    pub timestamp: SystemTime,
}

/// An alert sink. No return value is consumed.
pub type AlertFn = Arc<dyn Fn(&AlertPayload) + Send + Sync>;

struct MonitorState {
    events: VecDeque<ErrorEvent>,
    alert_times: VecDeque<Instant>,
    last_alert: Option<Instant>,
}

/// Records error events, computes windowed statistics, and fires alerts.
///
/// Safe to share behind an `Arc` across workers: the buffer sits behind one
/// mutex guarding only state mutation and snapshot reads; alert functions
/// are invoked after the lock is released.
pub struct ErrorMonitor {
    config: MonitorConfig,
    alert_fns: Vec<AlertFn>,
    state: Mutex<MonitorState>,
}

impl Default for ErrorMonitor {
    fn default() -> Self {
        Self::new(MonitorConfig::default())
    }
}

impl ErrorMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            alert_fns: Vec::new(),
            state: Mutex::new(MonitorState {
                events: VecDeque::new(),
                alert_times: VecDeque::new(),
                last_alert: None,
            }),
        }
    }

    /// Registers an alert function. Registration happens at setup time,
    /// before the monitor is shared.
    pub fn add_alert_fn<F>(&mut self, f: F)
    where
        F: Fn(&AlertPayload) + Send + Sync + 'static,
    {
        self.alert_fns.push(Arc::new(f));
    }

    /// Records an error against a component, inheriting the error's severity.
    pub fn record_error(&self, error: StructuredError, component: impl Into<String>) {
        self.record_event(ErrorEvent::new(error, component));
    }

    /// Records a fully-populated event and evaluates the alert conditions.
    pub fn record_event(&self, event: ErrorEvent) {
        let payload = {
            let Ok(mut state) = self.state.lock() else {
                return;
            };

            Self::prune(&mut state.events, &self.config);
            state.events.push_back(event.clone());

            self.evaluate_alert(&mut state, &event)
        };

        if let Some(payload) = payload {
            for alert_fn in &self.alert_fns {
                let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| alert_fn(&payload)));
                if outcome.is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(component = %payload.component, "alert function panicked");
                }
            }
        }
    }

    /// Computes statistics over the retained buffer, filtered by window and
    /// optionally by component.
    pub fn get_error_stats(&self, window: Duration, component: Option<&str>) -> ErrorStats {
        let Ok(mut state) = self.state.lock() else {
            return ErrorStats::empty();
        };
        Self::prune(&mut state.events, &self.config);

        let mut total = 0usize;
        let mut by_severity: BTreeMap<Severity, usize> = BTreeMap::new();
        let mut by_component: BTreeMap<String, usize> = BTreeMap::new();
        let mut kind_counts: HashMap<_, usize> = HashMap::new();

        for event in &state.events {
            if event.recorded_at.elapsed() > window {
                continue;
            }
            if let Some(filter) = component {
                if event.component != filter {
                    continue;
                }
            }
            total += 1;
            *by_severity.entry(event.severity).or_default() += 1;
            *by_component.entry(event.component.clone()).or_default() += 1;
            *kind_counts.entry(event.error.kind()).or_default() += 1;
        }

        let mut top_kinds: Vec<_> = kind_counts.into_iter().collect();
        top_kinds.sort_by(|a, b| b.1.cmp(&a.1));
        top_kinds.truncate(5);

        let window_secs = window.as_secs_f64();
        let rate = if window_secs > 0.0 {
            total as f64 / window_secs
        } else {
            0.0
        };

        ErrorStats {
            total,
            rate,
            by_severity,
            by_component,
            top_kinds,
        }
    }

    /// Returns the most recent matching events, newest first.
    pub fn get_recent_errors(
        &self,
        limit: usize,
        min_severity: Option<Severity>,
        component: Option<&str>,
    ) -> Vec<ErrorEvent> {
        let Ok(mut state) = self.state.lock() else {
            return Vec::new();
        };
        Self::prune(&mut state.events, &self.config);

        state
            .events
            .iter()
            .rev()
            .filter(|event| min_severity.map_or(true, |min| event.severity >= min))
            .filter(|event| component.map_or(true, |c| event.component == c))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Renders a structured or textual summary over the given window.
    pub fn generate_error_report(&self, window: Duration, format: ReportFormat) -> String {
        let stats = self.get_error_stats(window, None);
        let recent_errors = self.get_recent_errors(20, None, None);

        ErrorReport {
            generated_at: SystemTime::now(),
            window_secs: window.as_secs(),
            stats,
            recent_errors,
        }
        .render(format)
    }

    fn prune(events: &mut VecDeque<ErrorEvent>, config: &MonitorConfig) {
        while let Some(oldest) = events.front() {
            if oldest.recorded_at.elapsed() > config.retention {
                events.pop_front();
            } else {
                break;
            }
        }
        while events.len() > config.max_events {
            events.pop_front();
        }
    }

    /// Evaluates the alert gates under the lock; returns the payload to fire
    /// (after releasing the lock) when every gate passes.
    fn evaluate_alert(&self, state: &mut MonitorState, event: &ErrorEvent) -> Option<AlertPayload> {
        if event.severity < self.config.severity_threshold {
            return None;
        }

        let window = self.config.time_window;
        let in_window = state
            .events
            .iter()
            .filter(|e| e.recorded_at.elapsed() <= window)
            .count();
        let window_secs = window.as_secs_f64();
        let rate = if window_secs > 0.0 {
            in_window as f64 / window_secs
        } else {
            0.0
        };

        let rate_exceeded = rate > self.config.error_rate_threshold;
        if !rate_exceeded && event.severity < Severity::Critical {
            return None;
        }

        if let Some(last) = state.last_alert {
            if last.elapsed() < self.config.alert_cooldown {
                return None;
            }
        }

        while let Some(oldest) = state.alert_times.front() {
            if oldest.elapsed() > window {
                state.alert_times.pop_front();
            } else {
                break;
            }
        }
        if state.alert_times.len() >= self.config.max_alerts_per_window {
            return None;
        }

        let now = Instant::now();
        state.last_alert = Some(now);
        state.alert_times.push_back(now);

        #[cfg(feature = "tracing")]
        tracing::info!(
            component = %event.component,
            severity = %event.severity,
            rate,
            "alert conditions met"
        );

        Some(AlertPayload {
            message: event.error.message().to_string(),
            severity: event.severity,
            component: event.component.clone(),
            context: event.context.clone(),
            rate,
            timestamp: SystemTime::now(),
        })
    }
}
