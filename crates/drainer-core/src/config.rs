//! Serde-friendly configuration for queues and retry policies.
//!
//! Durations are plain milliseconds so the file format stays trivial:
//!
//! ```json
//! {
//!   "batch": { "batch_size": 10, "inter_batch_delay_ms": 100 },
//!   "retry": { "max_attempts": 3, "initial_delay_ms": 200, "backoff_multiplier": 2.0, "max_delay_ms": 30000 }
//! }
//! ```
//!
//! Every field has a default, so `{}` is a valid config.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::queue::BatchWindow;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DrainerConfig {
    pub batch: BatchWindowConfig,
    pub retry: RetryConfig,
}

impl DrainerConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.batch.to_window()?;
        self.retry.to_policy().validate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchWindowConfig {
    pub batch_size: usize,
    pub inter_batch_delay_ms: u64,
}

impl Default for BatchWindowConfig {
    fn default() -> Self {
        Self {
            batch_size: BatchWindow::DEFAULT_BATCH_SIZE,
            inter_batch_delay_ms: BatchWindow::DEFAULT_INTER_BATCH_DELAY.as_millis() as u64,
        }
    }
}

impl BatchWindowConfig {
    pub fn to_window(&self) -> Result<BatchWindow, ConfigError> {
        BatchWindow::new(
            self.batch_size,
            Duration::from_millis(self.inter_batch_delay_ms),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 200,
            backoff_multiplier: RetryPolicy::DEFAULT_BACKOFF_MULTIPLIER,
            max_delay_ms: RetryPolicy::DEFAULT_MAX_DELAY.as_millis() as u64,
        }
    }
}

impl RetryConfig {
    /// Convert without validating; call [`RetryPolicy::validate`] if needed.
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.initial_delay_ms))
            .with_backoff_multiplier(self.backoff_multiplier)
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
    }
}
