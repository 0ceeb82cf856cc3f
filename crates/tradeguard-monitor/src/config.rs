use std::time::Duration;
use tradeguard_core::Severity;

/// Configuration for the error monitor's buffer and alerting gates.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub(crate) severity_threshold: Severity,
    pub(crate) error_rate_threshold: f64,
    pub(crate) time_window: Duration,
    pub(crate) max_alerts_per_window: usize,
    pub(crate) alert_cooldown: Duration,
    pub(crate) retention: Duration,
    pub(crate) max_events: usize,
}

impl MonitorConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> MonitorConfigBuilder {
        MonitorConfigBuilder::new()
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfigBuilder::new().build()
    }
}

/// Builder for [`MonitorConfig`].
pub struct MonitorConfigBuilder {
    severity_threshold: Severity,
    error_rate_threshold: f64,
    time_window: Duration,
    max_alerts_per_window: usize,
    alert_cooldown: Duration,
    retention: Duration,
    max_events: usize,
}

impl Default for MonitorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorConfigBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - severity_threshold: Error
    /// - error_rate_threshold: 0.1 errors/second
    /// - time_window: 300s
    /// - max_alerts_per_window: 10
    /// - alert_cooldown: 60s
    /// - retention: 1h, max_events: 10_000
    pub fn new() -> Self {
        Self {
            severity_threshold: Severity::Error,
            error_rate_threshold: 0.1,
            time_window: Duration::from_secs(300),
            max_alerts_per_window: 10,
            alert_cooldown: Duration::from_secs(60),
            retention: Duration::from_secs(3600),
            max_events: 10_000,
        }
    }

    /// Minimum severity an event needs to be alert-eligible. Compared via
    /// the severity total order.
    pub fn severity_threshold(mut self, threshold: Severity) -> Self {
        self.severity_threshold = threshold;
        self
    }

    /// Error rate (events per second over `time_window`) above which
    /// alert-eligible events fire alerts. Critical events bypass this gate.
    pub fn error_rate_threshold(mut self, threshold: f64) -> Self {
        self.error_rate_threshold = threshold;
        self
    }

    /// Window for the rate computation and the alerts-per-window cap.
    pub fn time_window(mut self, window: Duration) -> Self {
        self.time_window = window;
        self
    }

    /// Maximum number of alerts fired per time window.
    pub fn max_alerts_per_window(mut self, max: usize) -> Self {
        self.max_alerts_per_window = max;
        self
    }

    /// Minimum spacing between two consecutive alerts.
    pub fn alert_cooldown(mut self, cooldown: Duration) -> Self {
        self.alert_cooldown = cooldown;
        self
    }

    /// How long recorded events are retained; older events are pruned lazily
    /// on insertion and on reads.
    pub fn retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Hard cap on the number of buffered events; the oldest are dropped
    /// first. Keeps the monitor's memory bounded regardless of error volume.
    pub fn max_events(mut self, max_events: usize) -> Self {
        self.max_events = max_events;
        self
    }

    pub fn build(self) -> MonitorConfig {
        MonitorConfig {
            severity_threshold: self.severity_threshold,
            error_rate_threshold: self.error_rate_threshold,
            time_window: self.time_window,
            max_alerts_per_window: self.max_alerts_per_window,
            alert_cooldown: self.alert_cooldown,
            retention: self.retention,
            max_events: self.max_events,
        }
    }
}
