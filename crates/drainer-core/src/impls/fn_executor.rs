//! Closure-backed executor, so callers don't need a named type per batch job.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;

use crate::ports::BatchExecutor;

/// Adapts `Fn(Vec<T>) -> impl Future<Output = Result<Vec<R>, E>>` to
/// [`BatchExecutor`].
#[derive(Clone)]
pub struct FnExecutor<F> {
    f: F,
}

impl<F> fmt::Debug for FnExecutor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnExecutor").finish_non_exhaustive()
    }
}

/// Build a [`FnExecutor`] from an async closure.
pub fn executor_fn<F>(f: F) -> FnExecutor<F> {
    FnExecutor { f }
}

#[async_trait]
impl<T, R, E, F, Fut> BatchExecutor<T> for FnExecutor<F>
where
    T: Send + 'static,
    R: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
    F: Fn(Vec<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<R>, E>> + Send + 'static,
{
    type Output = R;
    type Error = E;

    async fn execute(&self, payloads: Vec<T>) -> Result<Vec<R>, E> {
        (self.f)(payloads).await
    }
}
