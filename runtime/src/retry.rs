//! Retry policy with exponential backoff for transient failures.
//!
//! The requester consults [`RetryPolicy::retry_delay`] after every failed
//! attempt. Only transient failures ([`RestError::is_transient`]) are retried,
//! never more often than `max_retries`, and never when the backoff would
//! carry the request past its deadline.
//!
//! # Example
//!
//! ```rust
//! use imgur_rest_runtime::retry::RetryPolicy;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::builder()
//!     .max_retries(2)
//!     .initial_delay(Duration::from_millis(50))
//!     .max_delay(Duration::from_secs(1))
//!     .multiplier(2.0)
//!     .build();
//!
//! assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
//! ```

use imgur_rest_core::{ConfigFlag, ConfigFlags, RestError};
use std::time::Duration;
use tokio::time::Instant;

/// Retry policy configuration for exponential backoff.
///
/// # Default Values
///
/// - `max_retries`: 1
/// - `initial_delay`: 100ms
/// - `max_delay`: 5 seconds
/// - `multiplier`: 2.0 (delay doubles each retry)
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries (cap for exponential backoff)
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RetryPolicy {
    /// Create a new policy builder.
    #[must_use]
    pub const fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder {
            max_retries: None,
            initial_delay: None,
            max_delay: None,
            multiplier: None,
        }
    }

    /// Policy that never retries.
    #[must_use]
    pub fn never() -> Self {
        Self::builder().max_retries(0).build()
    }

    /// Policy derived from client flags: one retry when
    /// [`ConfigFlag::RetryOnTimeout`] is set, none otherwise.
    #[must_use]
    pub fn from_flags(flags: ConfigFlags) -> Self {
        if flags.contains(ConfigFlag::RetryOnTimeout) {
            Self::default()
        } else {
            Self::never()
        }
    }

    /// Calculate delay for a given attempt number.
    ///
    /// Uses exponential backoff: delay = initial_delay * (multiplier ^ attempt)
    /// Capped at `max_delay`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return self.initial_delay.min(self.max_delay);
        }

        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay_ms = self.initial_delay.as_millis() as f64 * self.multiplier.powi(exponent);

        if !delay_ms.is_finite() || delay_ms >= self.max_delay.as_millis() as f64 {
            self.max_delay
        } else {
            Duration::from_millis(delay_ms as u64)
        }
    }

    /// Backoff before retrying after `error`, or `None` when the failure must
    /// be surfaced.
    ///
    /// `attempts_made` counts transport attempts so far, including the one
    /// that just failed.
    #[must_use]
    pub fn retry_delay(
        &self,
        error: &RestError,
        attempts_made: u32,
        now: Instant,
        deadline: Instant,
    ) -> Option<Duration> {
        if !error.is_transient() {
            return None;
        }
        let retries_made = attempts_made.saturating_sub(1);
        if retries_made >= self.max_retries {
            return None;
        }
        let delay = self.delay_for_attempt(retries_made);
        (delay < deadline.saturating_duration_since(now)).then_some(delay)
    }
}

/// Builder for [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    max_retries: Option<u32>,
    initial_delay: Option<Duration>,
    max_delay: Option<Duration>,
    multiplier: Option<f64>,
}

impl RetryPolicyBuilder {
    /// Set maximum number of retries.
    #[must_use]
    pub const fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Set initial delay before first retry.
    #[must_use]
    pub const fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = Some(delay);
        self
    }

    /// Set maximum delay (cap for exponential backoff).
    #[must_use]
    pub const fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Set multiplier for exponential backoff.
    #[must_use]
    pub const fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    /// Build the [`RetryPolicy`].
    #[must_use]
    pub fn build(self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries.unwrap_or(1),
            initial_delay: self.initial_delay.unwrap_or(Duration::from_millis(100)),
            max_delay: self.max_delay.unwrap_or(Duration::from_secs(5)),
            multiplier: self.multiplier.unwrap_or(2.0),
        }
    }
}
