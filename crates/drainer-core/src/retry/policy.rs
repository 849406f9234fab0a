//! Retry policy: decides how many attempts and how long to back off.

use std::time::Duration;

use crate::error::ConfigError;

/// Retry policy for a single `with_retry` invocation.
///
/// The delay before retry `n` is `initial_delay * backoff_multiplier^(n-1)`,
/// capped at `max_delay`.
///
/// Example with initial_delay=100ms, backoff_multiplier=2.0, max_delay=1s:
/// - after attempt 1: 100ms
/// - after attempt 2: 200ms
/// - after attempt 3: 400ms
/// - after attempt 4: 800ms
/// - after attempt 5 and later: 1s
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,

    /// Delay after the first failure.
    pub initial_delay: Duration,

    /// Growth factor applied after every retry.
    pub backoff_multiplier: f64,

    /// Ceiling on any single delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            backoff_multiplier: Self::DEFAULT_BACKOFF_MULTIPLIER,
            max_delay: Self::DEFAULT_MAX_DELAY,
        }
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(ConfigError::InvalidMultiplier(self.backoff_multiplier));
        }
        Ok(())
    }

    /// Attempts actually made; an unvalidated zero still runs the operation once.
    pub(crate) fn effective_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    fn effective_multiplier(&self) -> f64 {
        if self.backoff_multiplier.is_finite() && self.backoff_multiplier >= 1.0 {
            self.backoff_multiplier
        } else {
            1.0
        }
    }

    /// Delay to wait after the failed attempt number `attempt` (1-indexed).
    ///
    /// `attempt = 0` is treated like the first attempt.
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let mut backoff = self.backoff();
        let mut delay = backoff.current;
        for _ in 1..attempt {
            backoff.next();
            // capped (or multiplier 1): the delay cannot change any more
            if backoff.current == delay {
                break;
            }
            delay = backoff.current;
        }
        delay
    }

    /// Infinite sequence of capped, non-decreasing delays.
    pub fn backoff(&self) -> Backoff {
        Backoff {
            current: self.initial_delay.min(self.max_delay),
            multiplier: self.effective_multiplier(),
            max_delay: self.max_delay,
        }
    }
}

/// Iterator over the delays of a retry sequence.
///
/// The running delay only ever grows (or stays at the cap); it is never reset.
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
    multiplier: f64,
    max_delay: Duration,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let delay = self.current;
        self.current = scale(self.current, self.multiplier, self.max_delay);
        Some(delay)
    }
}

/// `delay * factor`, rounded to the nanosecond and capped at `cap`.
///
/// Works on nanoseconds so that e.g. 100ms * 1.5 is exactly 150ms.
fn scale(delay: Duration, factor: f64, cap: Duration) -> Duration {
    let nanos = (delay.as_nanos() as f64 * factor).round();
    if !nanos.is_finite() || nanos >= cap.as_nanos() as f64 {
        return cap;
    }
    // past u64 nanoseconds (~584 years) only second precision matters
    let scaled = if nanos < u64::MAX as f64 {
        Duration::from_nanos(nanos as u64)
    } else {
        Duration::try_from_secs_f64(nanos / 1e9).unwrap_or(cap)
    };
    // never shrink, even if rounding misbehaves
    scaled.max(delay).min(cap)
}
