use std::time::Duration;

use tracing::{error, warn};

/// The default number of attempts for one logical request.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// The deadline of a single control-plane request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// The deadline of a single artifact download.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// The classification of a single attempt, which controls the retry loop.
#[non_exhaustive]
#[derive(Debug, PartialEq, Eq)]
pub enum State<T> {
    /// The attempt produced a value and the loop should exit with it.
    Success(T),
    /// The attempt failed transiently and should be retried if possible.
    ///
    /// See: [`RetryConfig::retry_if_possible`]
    Retry,
    /// The attempt ended definitively without a value. The loop should exit with nothing.
    Stop,
}

impl<T> State<T> {
    /// Returns the value of a [`State::Success`], or [`None`] if the attempt ended without one.
    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Retry | Self::Stop => None,
        }
    }
}

/// Retry and timeout settings, fixed when a client is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Attempts per logical request, including the first one. Zero is treated as one.
    pub max_attempts: u32,
    /// Deadline of each control-plane request.
    pub timeout: Duration,
    /// Deadline of each artifact download attempt.
    pub download_timeout: Duration,
}

impl RetryConfig {
    /// The default settings: 3 attempts, 30s requests, 600s downloads.
    pub const DEFAULT: Self = Self {
        max_attempts: DEFAULT_MAX_ATTEMPTS,
        timeout: DEFAULT_TIMEOUT,
        download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
    };

    /// Creates the default settings with a different number of attempts.
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::DEFAULT
        }
    }

    /// Computes the backoff after the given failed attempt (1-indexed): `2^(attempt + 1)` seconds.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        Duration::from_secs(2u64.saturating_pow(attempt.saturating_add(1)))
    }

    /// Decides whether another attempt is allowed after `attempt` attempts have failed.
    ///
    /// Returns the delay to sleep before the next attempt, or [`None`] once the attempts are used
    /// up.
    pub fn retry_if_possible(&self, attempt: u32) -> Option<Duration> {
        let max_attempts = self.max_attempts.max(1);
        if attempt >= max_attempts {
            error!("retried for too many times ({max_attempts}), stopping!");
            None
        } else {
            let delay = self.delay_for_attempt(attempt);
            warn!(
                "retrying in {}s… ({} / {max_attempts})",
                delay.as_secs(),
                attempt + 1
            );
            Some(delay)
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_from_four_seconds() {
        let config = RetryConfig::DEFAULT;
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(4));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(8));
        assert_eq!(config.delay_for_attempt(3), Duration::from_secs(16));
    }

    #[test]
    fn retry_stops_at_max_attempts() {
        let config = RetryConfig::with_max_attempts(3);
        assert_eq!(config.retry_if_possible(1), Some(Duration::from_secs(4)));
        assert_eq!(config.retry_if_possible(2), Some(Duration::from_secs(8)));
        assert_eq!(config.retry_if_possible(3), None);
    }

    #[test]
    fn zero_attempts_still_allows_one_try() {
        let config = RetryConfig::with_max_attempts(0);
        assert_eq!(config.retry_if_possible(1), None);
    }

    #[test]
    fn huge_attempt_counts_saturate() {
        let delay = RetryConfig::DEFAULT.delay_for_attempt(u32::MAX);
        assert_eq!(delay, Duration::from_secs(u64::MAX));
    }

    #[test]
    fn only_success_carries_a_value() {
        assert_eq!(State::Success("x").success(), Some("x"));
        assert_eq!(State::<u8>::Stop.success(), None);
        assert_eq!(State::<u8>::Retry.success(), None);
    }
}
