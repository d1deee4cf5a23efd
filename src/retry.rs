//! Bounded exponential-backoff retry for collaborator calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::Result;

/// Retry policy for collaborator calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum total attempts.
    pub max_retries: u32,
    /// Delay before the first re-attempt; doubles per attempt after that.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Backoff delay after the given zero-based attempt.
    fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Invoke `f`, retrying transient failures with exponential backoff.
///
/// After a failed attempt `n` (zero-based) the caller sleeps
/// `base_delay * 2^n` before trying again, up to `max_retries` total
/// attempts. Non-transient errors and the final transient error are returned
/// as-is. This is the only failure-recovery policy in the agent; everything
/// else is converted to a failed task at the handler boundary.
pub async fn call_with_retry<T, F, Fut>(policy: RetryPolicy, mut f: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt + 1 < policy.max_retries => {
                let delay = policy.delay_after(attempt);
                warn!(
                    attempt = attempt + 1,
                    max = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "collaborator call failed, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tokio::sync::Mutex;
    use tokio::time::Instant;

    use super::*;
    use crate::error::Error;
    use crate::registry::CollaboratorName;

    fn unavailable() -> Error {
        Error::CollaboratorUnavailable {
            collaborator: CollaboratorName::DocExtractor,
            message: "connection refused".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_two_failures_with_doubling_backoff() {
        let calls = Arc::new(AtomicUsize::new(0));
        let attempt_times = Arc::new(Mutex::new(Vec::new()));

        let result = {
            let calls = calls.clone();
            let attempt_times = attempt_times.clone();
            call_with_retry(RetryPolicy::default(), move || {
                let calls = calls.clone();
                let attempt_times = attempt_times.clone();
                async move {
                    attempt_times.lock().await.push(Instant::now());
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(unavailable())
                    } else {
                        Ok(42)
                    }
                }
            })
            .await
        };

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        // Two sleeps, the second twice the first.
        let times = attempt_times.lock().await;
        assert_eq!(times.len(), 3);
        let first_gap = times[1] - times[0];
        let second_gap = times[2] - times[1];
        assert_eq!(first_gap, Duration::from_secs(1));
        assert_eq!(second_gap, Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let calls = Arc::new(AtomicUsize::new(0));

        let result: Result<()> = {
            let calls = calls.clone();
            call_with_retry(RetryPolicy::default(), move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(unavailable())
                }
            })
            .await
        };

        assert!(matches!(
            result,
            Err(Error::CollaboratorUnavailable { .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_errors_are_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let start = Instant::now();

        let result: Result<()> = {
            let calls = calls.clone();
            call_with_retry(RetryPolicy::default(), move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(Error::CollaboratorError {
                        collaborator: CollaboratorName::McpGenerator,
                        message: "invalid workflow analysis".into(),
                    })
                }
            })
            .await
        };

        assert!(matches!(result, Err(Error::CollaboratorError { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success_sleeps_zero_times() {
        let start = Instant::now();
        let result = call_with_retry(RetryPolicy::default(), || async { Ok("done") }).await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
