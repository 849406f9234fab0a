//! Retry executor: runs an async operation until it succeeds or attempts run out.

use std::fmt;
use std::future::Future;

use tracing::{debug, warn};

use super::RetryPolicy;

/// The terminal failure of a retry sequence.
///
/// `source` is the error of the last attempt, untouched.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    /// Attempts made, including the one that produced `source`.
    pub attempts: u32,
    pub source: E,
}

impl<E> RetryExhausted<E> {
    pub fn into_inner(self) -> E {
        self.source
    }
}

impl<E: fmt::Display> fmt::Display for RetryExhausted<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gave up after {} attempt(s): {}", self.attempts, self.source)
    }
}

impl<E> std::error::Error for RetryExhausted<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Wraps async operations in exponential backoff.
///
/// # Design
/// - Every error is retryable by default (no error classification).
/// - No sleep happens after the final attempt.
/// - There is no abort: a sequence runs to success or exhaustion.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation`, returning its value or the last error verbatim.
    pub async fn run<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.run_counted(operation)
            .await
            .map_err(RetryExhausted::into_inner)
    }

    /// Like [`run`](Self::run), but reports how many attempts were made.
    pub async fn run_counted<F, Fut, T, E>(&self, operation: F) -> Result<T, RetryExhausted<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.run_when(operation, |_| true).await
    }

    /// Retry only errors for which `should_retry` returns `true`.
    ///
    /// Any other error ends the sequence immediately.
    pub async fn run_when<F, Fut, T, E, P>(
        &self,
        mut operation: F,
        mut should_retry: P,
    ) -> Result<T, RetryExhausted<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
        P: FnMut(&E) -> bool,
    {
        let max_attempts = self.policy.effective_attempts();
        let mut backoff = self.policy.backoff();
        let mut attempt: u32 = 1;

        loop {
            let err = match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if attempt >= max_attempts {
                warn!(attempt, max_attempts, error = %err, "retry attempts exhausted");
                return Err(RetryExhausted {
                    attempts: attempt,
                    source: err,
                });
            }

            if !should_retry(&err) {
                debug!(attempt, error = %err, "error is not retryable");
                return Err(RetryExhausted {
                    attempts: attempt,
                    source: err,
                });
            }

            let delay = backoff.next().unwrap_or(self.policy.max_delay);
            warn!(
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "attempt failed, backing off"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Run `operation` under `policy`; the free-function form of [`RetryExecutor::run`].
pub async fn with_retry<F, Fut, T, E>(operation: F, policy: &RetryPolicy) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    RetryExecutor::new(policy.clone()).run(operation).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use parking_lot::Mutex;
    use rstest::rstest;
    use tokio::time::Instant;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn assert_close(actual: Duration, expected: Duration) {
        assert!(
            actual >= expected && actual < expected + ms(5),
            "expected ~{expected:?}, got {actual:?}"
        );
    }

    #[rstest]
    #[case(0, 1)]
    #[case(1, 2)]
    #[case(3, 4)]
    #[case(4, 10)]
    #[tokio::test(start_paused = true)]
    async fn fails_k_times_then_succeeds(#[case] k: u32, #[case] max_attempts: u32) {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(max_attempts, ms(10));

        let result = with_retry(
            || {
                let calls = Arc::clone(&calls);
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    if n < k { Err(format!("fail {n}")) } else { Ok("done") }
                }
            },
            &policy,
        )
        .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), k + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let executor = RetryExecutor::new(RetryPolicy::new(4, ms(10)));

        let err = executor
            .run_counted(|| {
                let calls = Arc::clone(&calls);
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    Err::<(), _>(format!("attempt {n} failed"))
                }
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(err.attempts, 4);
        assert_eq!(err.source, "attempt 4 failed");
        assert_eq!(err.to_string(), "gave up after 4 attempt(s): attempt 4 failed");
    }

    #[tokio::test(start_paused = true)]
    async fn observed_delays_grow_and_cap() {
        let stamps = Arc::new(Mutex::new(Vec::new()));
        let policy = RetryPolicy::new(7, ms(100)).with_max_delay(ms(1000));

        let _ = with_retry(
            || {
                let stamps = Arc::clone(&stamps);
                async move {
                    stamps.lock().push(Instant::now());
                    Err::<(), _>("nope")
                }
            },
            &policy,
        )
        .await;

        let stamps = stamps.lock();
        assert_eq!(stamps.len(), 7);
        let gaps: Vec<_> = stamps.windows(2).map(|w| w[1] - w[0]).collect();
        for (gap, expected) in gaps.iter().zip([100, 200, 400, 800, 1000, 1000]) {
            assert_close(*gap, ms(expected));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn no_sleep_after_final_attempt() {
        let policy = RetryPolicy::new(3, ms(100));
        let started = Instant::now();

        let _ = with_retry(|| async { Err::<(), _>("nope") }, &policy).await;

        // 100 + 200; a third sleep would add 400
        assert_close(started.elapsed(), ms(300));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_still_runs_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(0, ms(100));

        let result = with_retry(
            || {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>("nope")
                }
            },
            &policy,
        )
        .await;

        assert_eq!(result, Err("nope"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_error_short_circuits() {
        let calls = Arc::new(AtomicU32::new(0));
        let executor = RetryExecutor::new(RetryPolicy::new(5, ms(100)));
        let started = Instant::now();

        let err = executor
            .run_when(
                || {
                    let calls = Arc::clone(&calls);
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Err::<(), _>("invalid weight")
                    }
                },
                |e: &&str| !e.starts_with("invalid"),
            )
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
