use crate::event::ErrorEvent;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::SystemTime;
use tradeguard_core::{ErrorKind, Severity};

/// Output shape of [`generate_error_report`](crate::ErrorMonitor::generate_error_report).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Human-readable multi-line text.
    Text,
    /// Machine-parseable JSON.
    Json,
}

/// Windowed error statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorStats {
    /// Number of matching events in the window.
    pub total: usize,
    /// Events per second over the window.
    pub rate: f64,
    /// Event counts per severity.
    pub by_severity: BTreeMap<Severity, usize>,
    /// Event counts per component.
    pub by_component: BTreeMap<String, usize>,
    /// Most frequent error kinds, descending.
    pub top_kinds: Vec<(ErrorKind, usize)>,
}

impl ErrorStats {
    pub(crate) fn empty() -> Self {
        Self {
            total: 0,
            rate: 0.0,
            by_severity: BTreeMap::new(),
            by_component: BTreeMap::new(),
            top_kinds: Vec::new(),
        }
    }
}

/// A rendered error report.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ErrorReport {
    pub generated_at: SystemTime,
    pub window_secs: u64,
    pub stats: ErrorStats,
    pub recent_errors: Vec<ErrorEvent>,
}

impl ErrorReport {
    pub(crate) fn render(&self, format: ReportFormat) -> String {
        match format {
            ReportFormat::Json => {
                serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
            }
            ReportFormat::Text => self.render_text(),
        }
    }

    fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Error Report (last {}s) ===", self.window_secs);
        let _ = writeln!(
            out,
            "total: {}  rate: {:.4}/s",
            self.stats.total, self.stats.rate
        );

        if !self.stats.by_severity.is_empty() {
            let _ = writeln!(out, "by severity:");
            for (severity, count) in &self.stats.by_severity {
                let _ = writeln!(out, "  {severity}: {count}");
            }
        }

        if !self.stats.by_component.is_empty() {
            let _ = writeln!(out, "by component:");
            for (component, count) in &self.stats.by_component {
                let _ = writeln!(out, "  {component}: {count}");
            }
        }

        if !self.stats.top_kinds.is_empty() {
            let _ = writeln!(out, "top kinds:");
            for (kind, count) in &self.stats.top_kinds {
                let _ = writeln!(out, "  {kind}: {count}");
            }
        }

        if !self.recent_errors.is_empty() {
            let _ = writeln!(out, "recent:");
            for event in &self.recent_errors {
                let _ = writeln!(
                    out,
                    "  [{}] {} ({})",
                    event.severity,
                    event.error.message(),
                    event.component
                );
            }
        }

        out
    }
}
