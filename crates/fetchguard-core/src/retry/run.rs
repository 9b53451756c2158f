//! Retry loop: run an operation until the outcome is final or the policy says stop.

use super::policy::{ErrorKind, RetryDecision, RetryPolicy};

/// Runs `op` until `classify` marks its outcome final or attempts run out.
///
/// `op` receives the 1-based attempt number. The last outcome, success or
/// failure, is returned unchanged. On a retryable outcome the thread sleeps
/// for the backoff duration before the next attempt.
pub fn run_with_retry<T, E, F, C>(policy: &RetryPolicy, mut op: F, classify: C) -> Result<T, E>
where
    F: FnMut(u32) -> Result<T, E>,
    C: Fn(&Result<T, E>) -> ErrorKind,
{
    let mut attempt = 1u32;
    loop {
        let outcome = op(attempt);
        let kind = classify(&outcome);
        match policy.decide(attempt, kind) {
            RetryDecision::NoRetry => {
                if kind != ErrorKind::Other {
                    tracing::warn!(attempt, ?kind, "giving up after {} attempts", attempt);
                }
                return outcome;
            }
            RetryDecision::RetryAfter(d) => {
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    ?kind,
                    "retrying in {:?}",
                    d
                );
                std::thread::sleep(d);
                attempt += 1;
            }
        }
    }
}
