//! Retry module: backoff policy and the executor that applies it.

mod executor;
mod policy;

pub use executor::{RetryExecutor, RetryExhausted, with_retry};
pub use policy::{Backoff, RetryPolicy};
