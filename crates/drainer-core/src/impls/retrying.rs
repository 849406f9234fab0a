use async_trait::async_trait;

use crate::ports::BatchExecutor;
use crate::retry::{RetryExecutor, RetryPolicy};

/// Wraps another executor so each batch is retried with backoff before the
/// queue sees a failure.
///
/// The whole batch is re-sent on every attempt, so payloads must be `Clone`.
/// Only the last attempt's error reaches the tasks.
#[derive(Debug, Clone)]
pub struct RetryingExecutor<X> {
    inner: X,
    retry: RetryExecutor,
}

impl<X> RetryingExecutor<X> {
    pub fn new(inner: X, policy: RetryPolicy) -> Self {
        Self {
            inner,
            retry: RetryExecutor::new(policy),
        }
    }

    pub fn inner(&self) -> &X {
        &self.inner
    }

    pub fn policy(&self) -> &RetryPolicy {
        self.retry.policy()
    }
}

#[async_trait]
impl<T, X> BatchExecutor<T> for RetryingExecutor<X>
where
    T: Clone + Send + Sync + 'static,
    X: BatchExecutor<T>,
{
    type Output = X::Output;
    type Error = X::Error;

    async fn execute(&self, payloads: Vec<T>) -> Result<Vec<X::Output>, X::Error> {
        self.retry
            .run(|| self.inner.execute(payloads.clone()))
            .await
    }
}
