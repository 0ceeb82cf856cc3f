use crate::config::BreakerSettings;
use crate::events::CircuitBreakerEvent;
#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};

/// The state of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum CircuitState {
    /// Operations pass through.
    Closed = 0,
    /// Calls fail fast; the guarded dependency is never invoked.
    Open = 1,
    /// A limited number of trial calls are allowed through.
    HalfOpen = 2,
}

impl CircuitState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }
}

/// Snapshot of a circuit breaker's observable state.
///
/// Copied out while holding the circuit lock; callers never see a live
/// reference to the internal counters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CircuitStats {
    /// Current state.
    pub state: CircuitState,
    /// Failures recorded within the configured failure window.
    pub failure_count: usize,
    /// Successes recorded since the last state transition.
    pub success_count: usize,
    /// Time since the last state transition.
    pub time_since_state_change: Duration,
}

/// The windowed-failure state machine guarding one logical dependency.
///
/// Failure timestamps are kept in arrival order and pruned lazily to the
/// failure window on insertion and on snapshot reads.
pub(crate) struct Circuit {
    state: CircuitState,
    state_atomic: std::sync::Arc<AtomicU8>,
    last_state_change: Instant,
    failure_times: VecDeque<Instant>,
    success_count: usize,
    half_open_probes: usize,
}

impl Circuit {
    pub(crate) fn new(state_atomic: std::sync::Arc<AtomicU8>) -> Self {
        Self {
            state: CircuitState::Closed,
            state_atomic,
            last_state_change: Instant::now(),
            failure_times: VecDeque::new(),
            success_count: 0,
            half_open_probes: 0,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    /// Returns a snapshot of the observable counters.
    pub fn stats(&self, settings: &BreakerSettings) -> CircuitStats {
        CircuitStats {
            state: self.state,
            failure_count: self.windowed_failures(settings.failure_window),
            success_count: self.success_count,
            time_since_state_change: self.last_state_change.elapsed(),
        }
    }

    fn windowed_failures(&self, window: Duration) -> usize {
        self.failure_times
            .iter()
            .filter(|t| t.elapsed() <= window)
            .count()
    }

    fn prune(&mut self, window: Duration) {
        while let Some(oldest) = self.failure_times.front() {
            if oldest.elapsed() > window {
                self.failure_times.pop_front();
            } else {
                break;
            }
        }
    }

    /// Decides whether a call may proceed, performing the lazy
    /// Open → HalfOpen transition when the recovery timeout has elapsed.
    pub fn try_acquire(&mut self, settings: &BreakerSettings) -> bool {
        match self.state {
            CircuitState::Closed => {
                settings
                    .event_listeners
                    .emit(&CircuitBreakerEvent::CallPermitted {
                        pattern_name: settings.name.clone(),
                        timestamp: Instant::now(),
                        state: self.state,
                    });
                true
            }
            CircuitState::Open => {
                if self.last_state_change.elapsed() >= settings.recovery_timeout {
                    self.transition_to(CircuitState::HalfOpen, settings);
                    self.half_open_probes = 1;
                    settings
                        .event_listeners
                        .emit(&CircuitBreakerEvent::CallPermitted {
                            pattern_name: settings.name.clone(),
                            timestamp: Instant::now(),
                            state: self.state,
                        });
                    true
                } else {
                    settings
                        .event_listeners
                        .emit(&CircuitBreakerEvent::CallRejected {
                            pattern_name: settings.name.clone(),
                            timestamp: Instant::now(),
                        });
                    false
                }
            }
            CircuitState::HalfOpen => {
                let permitted = self.half_open_probes < settings.success_threshold;
                if permitted {
                    self.half_open_probes += 1;
                    settings
                        .event_listeners
                        .emit(&CircuitBreakerEvent::CallPermitted {
                            pattern_name: settings.name.clone(),
                            timestamp: Instant::now(),
                            state: self.state,
                        });
                } else {
                    settings
                        .event_listeners
                        .emit(&CircuitBreakerEvent::CallRejected {
                            pattern_name: settings.name.clone(),
                            timestamp: Instant::now(),
                        });
                }
                permitted
            }
        }
    }

    pub fn record_success(&mut self, settings: &BreakerSettings) {
        self.success_count += 1;

        settings
            .event_listeners
            .emit(&CircuitBreakerEvent::SuccessRecorded {
                pattern_name: settings.name.clone(),
                timestamp: Instant::now(),
                state: self.state,
            });

        #[cfg(feature = "metrics")]
        counter!("circuitbreaker_calls_total", "circuitbreaker" => settings.name.clone(), "outcome" => "success")
            .increment(1);

        match self.state {
            CircuitState::HalfOpen => {
                if self.success_count >= settings.success_threshold {
                    self.transition_to(CircuitState::Closed, settings);
                }
            }
            CircuitState::Closed => {
                // Success never resets failure history; only window pruning
                // applies.
                self.prune(settings.failure_window);
            }
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&mut self, settings: &BreakerSettings) {
        settings
            .event_listeners
            .emit(&CircuitBreakerEvent::FailureRecorded {
                pattern_name: settings.name.clone(),
                timestamp: Instant::now(),
                state: self.state,
            });

        #[cfg(feature = "metrics")]
        counter!("circuitbreaker_calls_total", "circuitbreaker" => settings.name.clone(), "outcome" => "failure")
            .increment(1);

        match self.state {
            CircuitState::HalfOpen => {
                // A single failure in the trial state reopens the circuit
                // and resets the success counter.
                self.transition_to(CircuitState::Open, settings);
            }
            CircuitState::Closed => {
                self.failure_times.push_back(Instant::now());
                self.prune(settings.failure_window);
                if self.failure_times.len() >= settings.failure_threshold {
                    self.transition_to(CircuitState::Open, settings);
                }
            }
            CircuitState::Open => {}
        }
    }

    pub fn force_open(&mut self, settings: &BreakerSettings) {
        self.transition_to(CircuitState::Open, settings);
    }

    pub fn force_close(&mut self, settings: &BreakerSettings) {
        self.transition_to(CircuitState::Closed, settings);
    }

    pub fn reset(&mut self, settings: &BreakerSettings) {
        self.transition_to(CircuitState::Closed, settings);
    }

    fn transition_to(&mut self, state: CircuitState, settings: &BreakerSettings) {
        if self.state == state {
            return;
        }

        let from_state = self.state;

        settings
            .event_listeners
            .emit(&CircuitBreakerEvent::StateTransition {
                pattern_name: settings.name.clone(),
                timestamp: Instant::now(),
                from_state,
                to_state: state,
            });

        #[cfg(feature = "tracing")]
        tracing::info!(breaker = %settings.name, from = ?from_state, to = ?state, "circuit state transition");

        #[cfg(feature = "metrics")]
        {
            counter!(
                "circuitbreaker_transitions_total",
                "circuitbreaker" => settings.name.clone(),
                "from" => state_label(from_state),
                "to" => state_label(state)
            )
            .increment(1);

            gauge!("circuitbreaker_state", "circuitbreaker" => settings.name.clone())
                .set(state as u8 as f64);
        }

        self.state = state;
        self.state_atomic.store(state as u8, Ordering::Release);
        self.last_state_change = Instant::now();
        self.success_count = 0;
        self.half_open_probes = 0;
        if state == CircuitState::Closed {
            self.failure_times.clear();
        }
    }
}

#[cfg(feature = "metrics")]
fn state_label(state: CircuitState) -> &'static str {
    match state {
        CircuitState::Closed => "Closed",
        CircuitState::Open => "Open",
        CircuitState::HalfOpen => "HalfOpen",
    }
}
