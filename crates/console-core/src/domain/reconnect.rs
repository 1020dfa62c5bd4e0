//! Reconnect policy: how long to wait before each reconnect attempt.
//!
//! The default policy reproduces the admin UI's behaviour exactly: wait a
//! fixed 3 seconds after every close and retry forever.  The same type also
//! expresses capped exponential backoff and a maximum number of attempts, so
//! tests and operators can tune it without touching the bridge.

use std::time::Duration;

use thiserror::Error;

/// Default delay between a socket closing and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Errors returned when constructing an invalid [`ReconnectPolicy`].
#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    /// The backoff multiplier was below 1.0 (or not a finite number).
    #[error("backoff multiplier must be a finite number >= 1.0, got {0}")]
    InvalidMultiplier(f64),

    /// The delay cap was shorter than the first delay.
    #[error("max delay {max:?} is shorter than the initial delay {initial:?}")]
    MaxDelayBelowInitial { initial: Duration, max: Duration },
}

/// Decides the delay before each reconnect attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    initial_delay: Duration,
    multiplier: f64,
    max_delay: Duration,
    max_attempts: Option<u32>,
}

impl ReconnectPolicy {
    /// Builds a policy, validating its parameters.
    ///
    /// `max_attempts = None` retries forever.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] if `multiplier < 1.0` or
    /// `max_delay < initial_delay`.
    pub fn new(
        initial_delay: Duration,
        multiplier: f64,
        max_delay: Duration,
        max_attempts: Option<u32>,
    ) -> Result<Self, PolicyError> {
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(PolicyError::InvalidMultiplier(multiplier));
        }
        if max_delay < initial_delay {
            return Err(PolicyError::MaxDelayBelowInitial {
                initial: initial_delay,
                max: max_delay,
            });
        }
        Ok(Self {
            initial_delay,
            multiplier,
            max_delay,
            max_attempts,
        })
    }

    /// A fixed delay retried forever.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            initial_delay: delay,
            multiplier: 1.0,
            max_delay: delay,
            max_attempts: None,
        }
    }

    /// Returns a copy of this policy that gives up after `max_attempts`
    /// consecutive failed attempts.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// The configured attempt cap, if any.
    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    /// Returns the delay before reconnect attempt number `attempt` (0-based:
    /// `0` is the first retry after a close), or `None` when the policy has
    /// given up.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use console_core::ReconnectPolicy;
    ///
    /// let policy = ReconnectPolicy::default();
    /// assert_eq!(policy.delay_for(0), Some(Duration::from_millis(3000)));
    /// assert_eq!(policy.delay_for(1_000), Some(Duration::from_millis(3000)));
    /// ```
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if let Some(max) = self.max_attempts {
            if attempt >= max {
                return None;
            }
        }

        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let scaled = self.initial_delay.as_nanos() as f64 * self.multiplier.powi(exponent);
        let capped = scaled.min(self.max_delay.as_nanos() as f64);
        Some(Duration::from_nanos(capped.round() as u64))
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_RECONNECT_DELAY)
    }
}
