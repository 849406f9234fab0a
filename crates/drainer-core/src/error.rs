use thiserror::Error;

use crate::app::BuildError;

/// Invalid queue or retry configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("batch_size must be at least 1")]
    ZeroBatchSize,

    #[error("max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("backoff_multiplier must be a finite number >= 1, got {0}")]
    InvalidMultiplier(f64),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Umbrella error for setting up queues.
///
/// Task and retry failures are not represented here; they surface through
/// `TaskError` and `RetryExhausted` on the caller's own future.
#[derive(Debug, Error)]
pub enum DrainerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Build(#[from] BuildError),
}
