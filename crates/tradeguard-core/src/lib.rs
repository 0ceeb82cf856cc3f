//! Core infrastructure shared by every tradeguard resilience pattern.
//!
//! This crate provides:
//!
//! - [`StructuredError`]: the uniform error currency every pattern reasons
//!   about, carrying a kind, severity, context map, and recoverability
//!   metadata.
//! - [`ResilienceError`]: a unified error type for composed resilience
//!   stacks, so callers match on `Timeout`/`CircuitOpen`/`RetryExhausted`
//!   instead of unwrapping nested per-layer enums.
//! - The event-listener system ([`EventListeners`], [`FnListener`]) used by
//!   the retry, circuit breaker, and time limiter patterns for
//!   observability callbacks.

pub mod error;
pub mod events;
pub mod taxonomy;

pub use error::ResilienceError;
pub use events::{EventListener, EventListeners, FnListener, ResilienceEvent};
pub use taxonomy::{ErrorKind, Severity, StructuredError};
