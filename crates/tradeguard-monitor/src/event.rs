use serde::Serialize;
use serde_json::{Map, Value};
use std::time::{Instant, SystemTime};
use tradeguard_core::{Severity, StructuredError};

/// One recorded error occurrence.
///
/// Carries the structured error plus where it happened and who it affected.
/// The severity defaults to the error's own but can be overridden by the
/// recorder (a Warning-level error may still be Critical for a particular
/// component).
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEvent {
    pub error: StructuredError,
    pub severity: Severity,
    pub component: String,
    pub context: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub timestamp: SystemTime,
    #[serde(skip)]
    pub(crate) recorded_at: Instant,
}

impl ErrorEvent {
    /// Creates an event for a component, inheriting the error's severity.
    pub fn new(error: StructuredError, component: impl Into<String>) -> Self {
        Self {
            severity: error.severity(),
            component: component.into(),
            context: Map::new(),
            user_id: None,
            session_id: None,
            timestamp: SystemTime::now(),
            recorded_at: Instant::now(),
            error,
        }
    }

    /// Overrides the severity used for alert evaluation.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Adds a context entry specific to this occurrence.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}
