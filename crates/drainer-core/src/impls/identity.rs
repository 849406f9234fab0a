use std::convert::Infallible;

use async_trait::async_trait;

use crate::ports::BatchExecutor;

/// Default executor: every payload is its own result.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityExecutor;

#[async_trait]
impl<T> BatchExecutor<T> for IdentityExecutor
where
    T: Send + 'static,
{
    type Output = T;
    type Error = Infallible;

    async fn execute(&self, payloads: Vec<T>) -> Result<Vec<T>, Infallible> {
        Ok(payloads)
    }
}
