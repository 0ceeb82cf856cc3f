//! The structured error taxonomy.
//!
//! Every failure that flows through a tradeguard pattern is represented as a
//! [`StructuredError`]: an immutable record carrying the error kind, a
//! human-readable message, an ordered context map, a severity level with a
//! total order, and recoverability metadata. Adapters wrap native failures
//! (HTTP errors, broker rejections, parse failures) into this shape at the
//! boundary; everything inside the resilience core reasons about this one
//! type.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::time::{Duration, SystemTime};

/// The category of a failure.
///
/// Kinds form a closed taxonomy. Callers needing finer granularity attach a
/// specific [`code`](StructuredError::code) or context entries rather than
/// extending the enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Connectivity, DNS, TLS, or transport-level failures.
    Network,
    /// Failures reported by a broker or exchange (rejections, account state).
    Broker,
    /// Failures raised by strategy or signal logic.
    Strategy,
    /// Invalid or missing configuration.
    Configuration,
    /// Input that failed validation before reaching a dependency.
    Validation,
    /// Market-data feed failures (gaps, stale data, unavailable symbols).
    DataFeed,
    /// Failures raised by the recovery machinery itself.
    Recovery,
    /// Anything that does not fit a more specific kind.
    Generic,
}

impl ErrorKind {
    /// Returns the stable error-code string for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Network => "NETWORK_ERROR",
            ErrorKind::Broker => "BROKER_ERROR",
            ErrorKind::Strategy => "STRATEGY_ERROR",
            ErrorKind::Configuration => "CONFIGURATION_ERROR",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::DataFeed => "DATA_FEED_ERROR",
            ErrorKind::Recovery => "RECOVERY_ERROR",
            ErrorKind::Generic => "TRADING_ERROR",
        }
    }

    /// Returns the component key this kind classifies to when no explicit
    /// component is supplied (used by the recovery manager's registry).
    pub fn component_key(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Broker => "broker",
            ErrorKind::Strategy => "strategy",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Validation => "validation",
            ErrorKind::DataFeed => "data_feed",
            ErrorKind::Recovery => "recovery",
            ErrorKind::Generic => "generic",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Network => "Network",
            ErrorKind::Broker => "Broker",
            ErrorKind::Strategy => "Strategy",
            ErrorKind::Configuration => "Configuration",
            ErrorKind::Validation => "Validation",
            ErrorKind::DataFeed => "DataFeed",
            ErrorKind::Recovery => "Recovery",
            ErrorKind::Generic => "Generic",
        })
    }
}

/// Severity of a failure, totally ordered from `Debug` to `Critical`.
///
/// Threshold comparisons (e.g. the monitor's `severity_threshold`) use this
/// order via `PartialOrd`/`Ord` — never a string comparison.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Debug => "Debug",
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
            Severity::Critical => "Critical",
        })
    }
}

/// A structured, immutable error record.
///
/// Constructed once at the failure site and never mutated; the `with_*`
/// builders consume and return `self` so construction reads as a chain:
///
/// ```
/// use tradeguard_core::{ErrorKind, Severity, StructuredError};
/// use std::time::Duration;
///
/// let err = StructuredError::new(ErrorKind::Broker, "order rejected")
///     .with_severity(Severity::Critical)
///     .with_recoverable(false)
///     .with_context("symbol", "BTC/USD")
///     .with_context("order_id", 42);
///
/// assert_eq!(err.kind(), ErrorKind::Broker);
/// assert_eq!(err.code(), "BROKER_ERROR");
/// assert!(!err.recoverable());
/// ```
///
/// Serializes losslessly to a structured record and back via
/// [`to_record`](Self::to_record) / [`from_record`](Self::from_record).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredError {
    kind: ErrorKind,
    message: String,
    #[serde(default)]
    context: Map<String, Value>,
    severity: Severity,
    recoverable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    retry_after: Option<Duration>,
    code: String,
    timestamp: SystemTime,
}

impl StructuredError {
    /// Creates a new error with the default severity (`Error`), recoverable
    /// flag (`true`), and the kind's stable error code.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: Map::new(),
            severity: Severity::Error,
            recoverable: true,
            retry_after: None,
            code: kind.code().to_string(),
            timestamp: SystemTime::now(),
        }
    }

    /// Adds one context entry. Entries keep caller insertion order.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Replaces the whole context map.
    pub fn with_context_map(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    /// Overrides the severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Overrides the recoverable flag.
    pub fn with_recoverable(mut self, recoverable: bool) -> Self {
        self.recoverable = recoverable;
        self
    }

    /// Attaches a hint for how long the caller should wait before retrying.
    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    /// Overrides the error code (defaults to the kind's code).
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn recoverable(&self) -> bool {
        self.recoverable
    }

    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    /// Serializes this error to a structured record.
    ///
    /// The record round-trips through [`from_record`](Self::from_record)
    /// preserving message, kind, severity, code, and context exactly.
    pub fn to_record(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// Reconstructs an error from a record produced by
    /// [`to_record`](Self::to_record).
    pub fn from_record(record: &Value) -> serde_json::Result<Self> {
        serde_json::from_value(record.clone())
    }

    // Convenience constructors for well-known failure shapes. Each fixes the
    // kind, code, and recoverability so call sites stay uniform.

    /// A broker rejection for insufficient account funds. Not recoverable.
    pub fn insufficient_funds(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Broker, message)
            .with_code("INSUFFICIENT_FUNDS")
            .with_recoverable(false)
    }

    /// A rate-limit rejection carrying the server's retry hint.
    pub fn rate_limited(message: impl Into<String>, retry_after: Duration) -> Self {
        Self::new(ErrorKind::Network, message)
            .with_code("RATE_LIMIT")
            .with_severity(Severity::Warning)
            .with_retry_after(retry_after)
    }

    /// A connection or attempt timeout. Recoverable by default.
    pub fn connection_timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message).with_code("CONNECTION_TIMEOUT")
    }

    /// Market data missing or stale for a requested symbol/window.
    pub fn data_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataFeed, message).with_code("DATA_UNAVAILABLE")
    }

    /// An order that failed validation before submission. Not recoverable.
    pub fn invalid_order(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
            .with_code("INVALID_ORDER")
            .with_recoverable(false)
    }

    /// A call rejected because a circuit breaker is open.
    pub fn circuit_open(breaker: impl Into<String>) -> Self {
        let breaker = breaker.into();
        Self::new(
            ErrorKind::Recovery,
            format!("circuit breaker '{breaker}' is open"),
        )
        .with_code("CIRCUIT_OPEN")
        .with_recoverable(false)
        .with_context("breaker", breaker)
    }
}

impl fmt::Display for StructuredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.kind, self.message)
    }
}

impl std::error::Error for StructuredError {}
