//! Backoff interval functions.
//!
//! An [`IntervalFunction`] maps a zero-based attempt index to the raw delay
//! before the next attempt. Clamping to the policy's `max_delay` and jitter
//! are applied afterwards by [`RetryPolicy`](crate::RetryPolicy), so the
//! interval functions here stay pure arithmetic.

use std::time::Duration;

/// Computes the raw backoff delay for a given attempt.
///
/// `attempt` is zero-based: the delay after the first failed attempt is
/// `interval(0)`.
pub trait IntervalFunction: Send + Sync {
    fn interval(&self, attempt: usize) -> Duration;
}

/// The same delay for every attempt.
#[derive(Debug, Clone, Copy)]
pub struct FixedInterval {
    delay: Duration,
}

impl FixedInterval {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl IntervalFunction for FixedInterval {
    fn interval(&self, _attempt: usize) -> Duration {
        self.delay
    }
}

/// `base * factor^attempt`.
///
/// With base 1s and factor 2.0 the sequence is 1s, 2s, 4s, 8s, ...
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    base: Duration,
    factor: f64,
}

impl ExponentialBackoff {
    /// Creates an exponential backoff with the default factor of 2.0.
    pub fn new(base: Duration) -> Self {
        Self { base, factor: 2.0 }
    }

    /// Overrides the multiplier applied per attempt.
    pub fn factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }
}

impl IntervalFunction for ExponentialBackoff {
    fn interval(&self, attempt: usize) -> Duration {
        let secs = self.base.as_secs_f64() * self.factor.powi(attempt as i32);
        saturating_from_secs(secs)
    }
}

/// `base * (attempt + 1)`: base, 2*base, 3*base, ...
#[derive(Debug, Clone, Copy)]
pub struct LinearBackoff {
    base: Duration,
}

impl LinearBackoff {
    pub fn new(base: Duration) -> Self {
        Self { base }
    }
}

impl IntervalFunction for LinearBackoff {
    fn interval(&self, attempt: usize) -> Duration {
        let steps = u32::try_from(attempt.saturating_add(1)).unwrap_or(u32::MAX);
        self.base.checked_mul(steps).unwrap_or(Duration::MAX)
    }
}

/// `base * fib(attempt + 1)`: base, base, 2*base, 3*base, 5*base, ...
#[derive(Debug, Clone, Copy)]
pub struct FibonacciBackoff {
    base: Duration,
}

impl FibonacciBackoff {
    pub fn new(base: Duration) -> Self {
        Self { base }
    }
}

impl IntervalFunction for FibonacciBackoff {
    fn interval(&self, attempt: usize) -> Duration {
        let fib = fibonacci(attempt.saturating_add(1));
        let fib = u32::try_from(fib).unwrap_or(u32::MAX);
        self.base.checked_mul(fib).unwrap_or(Duration::MAX)
    }
}

/// An interval function backed by a plain closure.
pub struct FnInterval<F> {
    f: F,
}

impl<F> FnInterval<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> IntervalFunction for FnInterval<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    fn interval(&self, attempt: usize) -> Duration {
        (self.f)(attempt)
    }
}

fn fibonacci(n: usize) -> u64 {
    let (mut a, mut b) = (0u64, 1u64);
    for _ in 0..n {
        let next = a.saturating_add(b);
        a = b;
        b = next;
    }
    a
}

fn saturating_from_secs(secs: f64) -> Duration {
    if !secs.is_finite() || secs < 0.0 {
        return Duration::MAX;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}
