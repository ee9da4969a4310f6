// src/task/policy.rs

use std::time::Duration;

use crate::errors::{FlowdagError, Result};

/// How many times a task body may run and how long to wait in between.
///
/// `max_attempts` counts the first attempt, so `1` means "no retry".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Result<Self> {
        if max_attempts == 0 {
            return Err(FlowdagError::ConfigError(
                "retry policy max_attempts must be >= 1 (got 0)".to_string(),
            ));
        }
        Ok(Self {
            max_attempts,
            delay,
        })
    }

    /// A single attempt, no delay.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }

    /// `retries` additional attempts after the first one.
    pub fn with_retries(retries: u32, delay: Duration) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::no_retry()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_attempts_is_rejected() {
        assert!(RetryPolicy::new(0, Duration::ZERO).is_err());
        assert_eq!(RetryPolicy::new(3, Duration::ZERO).unwrap().max_attempts(), 3);
    }

    #[test]
    fn retries_count_on_top_of_first_attempt() {
        let policy = RetryPolicy::with_retries(1, Duration::from_secs(2));
        assert_eq!(policy.max_attempts(), 2);
        assert_eq!(policy.delay(), Duration::from_secs(2));
        assert_eq!(RetryPolicy::default().max_attempts(), 1);
    }
}
