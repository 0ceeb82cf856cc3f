//! Execution counters for a retry instance.

/// Snapshot of a retry instance's counters.
///
/// Counters only move when the executor actually decides to retry: an error
/// that fails the retry predicate propagates immediately and leaves the
/// stats untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetryStats {
    /// Number of retried attempts (not counting the initial invocation).
    pub attempts: usize,
    /// Number of calls that eventually returned a result.
    pub successes: usize,
    /// Number of failed attempts that were retried.
    pub failures: usize,
    /// Rendered message of the most recent retried or exhausting error.
    pub last_error: Option<String>,
}
