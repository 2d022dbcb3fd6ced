//! Retry policy for the fetch task.

use pricefeed_market_data::RetryClass;
use std::time::Duration;

/// Maximum number of retries per tick.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base of the exponential backoff (`base * 2^attempt`).
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(60);

/// Delay after an undecodable body.
pub const DEFAULT_PARSE_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Delay after an embedded API rate-limit error.
pub const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_secs(120);

/// What to do with a tick after a failed attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Give up quietly; nothing is written.
    Abandon,
    /// Re-deliver the tick as `next_attempt` after `delay`.
    Retry { next_attempt: u32, delay: Duration },
    /// The error was retryable but the cap is reached.
    Exhausted,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub parse_retry_delay: Duration,
    pub rate_limit_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            parse_retry_delay: DEFAULT_PARSE_RETRY_DELAY,
            rate_limit_delay: DEFAULT_RATE_LIMIT_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff for `attempt` (0-based): 60s, 120s, 240s, ...
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Delay for a retry class, `None` when the class is not retryable.
    pub fn delay_for(&self, class: RetryClass, attempt: u32) -> Option<Duration> {
        match class {
            RetryClass::Never => None,
            RetryClass::WithBackoff => Some(self.backoff(attempt)),
            RetryClass::FixedDelay => Some(self.parse_retry_delay),
            RetryClass::RateLimited => Some(self.rate_limit_delay),
        }
    }

    /// Decides the fate of a tick whose `attempt` failed with `class`.
    ///
    /// Every retryable class counts against the same cap.
    pub fn decide(&self, class: RetryClass, attempt: u32) -> RetryDecision {
        match self.delay_for(class, attempt) {
            None => RetryDecision::Abandon,
            Some(_) if attempt >= self.max_retries => RetryDecision::Exhausted,
            Some(delay) => RetryDecision::Retry {
                next_attempt: attempt + 1,
                delay,
            },
        }
    }
}
