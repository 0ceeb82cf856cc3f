//! Invariants of the backoff arithmetic.

use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tradeguard_retry::{
    ExponentialBackoff, FibonacciBackoff, FixedInterval, IntervalFunction, LinearBackoff,
    RetryPolicy,
};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The computed delay never exceeds max_delay plus the jitter spread,
    /// for any attempt index and strategy.
    #[test]
    fn delay_is_always_clamped(
        base_ms in 1u64..10_000,
        attempt in 0usize..64,
        strategy in 0u8..4,
    ) {
        let interval: Arc<dyn IntervalFunction> = match strategy {
            0 => Arc::new(FixedInterval::new(Duration::from_millis(base_ms))),
            1 => Arc::new(ExponentialBackoff::new(Duration::from_millis(base_ms))),
            2 => Arc::new(LinearBackoff::new(Duration::from_millis(base_ms))),
            _ => Arc::new(FibonacciBackoff::new(Duration::from_millis(base_ms))),
        };
        let policy: RetryPolicy<(), ()> = RetryPolicy::new(10, interval);

        // Default ceiling 60s, default jitter ±10%.
        let delay = policy.next_backoff(attempt);
        prop_assert!(delay <= Duration::from_secs(66));
    }

    /// Exponential delays follow base * 2^attempt exactly (before clamping).
    #[test]
    fn exponential_is_exact(base_ms in 1u64..1000, attempt in 0usize..16) {
        let f = ExponentialBackoff::new(Duration::from_millis(base_ms));
        let expected = Duration::from_millis(base_ms) * 2u32.pow(attempt as u32);
        prop_assert_eq!(f.interval(attempt), expected);
    }

    /// Linear delays grow by exactly one base step per attempt.
    #[test]
    fn linear_is_exact(base_ms in 1u64..10_000, attempt in 0usize..100) {
        let f = LinearBackoff::new(Duration::from_millis(base_ms));
        let expected = Duration::from_millis(base_ms) * (attempt as u32 + 1);
        prop_assert_eq!(f.interval(attempt), expected);
    }

    /// Fibonacci delays are non-decreasing in the attempt index.
    #[test]
    fn fibonacci_is_monotone(base_ms in 1u64..10_000, attempt in 0usize..30) {
        let f = FibonacciBackoff::new(Duration::from_millis(base_ms));
        prop_assert!(f.interval(attempt + 1) >= f.interval(attempt));
    }
}
