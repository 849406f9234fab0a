//! Batch window: how many tasks per batch and how long to pause between batches.

use std::time::Duration;

use crate::error::ConfigError;

/// Grouping configuration of a queue, fixed for the queue's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchWindow {
    batch_size: usize,
    inter_batch_delay: Duration,
}

impl BatchWindow {
    pub const DEFAULT_BATCH_SIZE: usize = 10;
    pub const DEFAULT_INTER_BATCH_DELAY: Duration = Duration::from_millis(100);

    pub fn new(batch_size: usize, inter_batch_delay: Duration) -> Result<Self, ConfigError> {
        if batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        Ok(Self {
            batch_size,
            inter_batch_delay,
        })
    }

    /// Maximum number of tasks handed to one executor call.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Pause between batches while the queue is non-empty.
    pub fn inter_batch_delay(&self) -> Duration {
        self.inter_batch_delay
    }
}

impl Default for BatchWindow {
    fn default() -> Self {
        Self {
            batch_size: Self::DEFAULT_BATCH_SIZE,
            inter_batch_delay: Self::DEFAULT_INTER_BATCH_DELAY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window() {
        let window = BatchWindow::default();
        assert_eq!(window.batch_size(), 10);
        assert_eq!(window.inter_batch_delay(), Duration::from_millis(100));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let err = BatchWindow::new(0, Duration::ZERO).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroBatchSize));
    }
}
