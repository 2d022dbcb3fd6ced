//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all market data operations
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// HTTP statuses that are worth retrying with exponential backoff.
pub const RETRYABLE_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

/// Embedded API error code that signals rate limiting.
pub const API_RATE_LIMIT_CODE: i64 = 429;

/// Errors that can occur while fetching prices.
///
/// Each variant is classified into a [`RetryClass`] via the
/// [`retry_class`](Self::retry_class) method.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The request never produced a response (connect failure, timeout,
    /// truncated body).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider answered with a status other than 200.
    #[error("Unexpected HTTP status {status} from {provider}: {body}")]
    HttpStatus {
        /// The provider that answered
        provider: String,
        /// The HTTP status code
        status: u16,
        /// The first bytes of the response body
        body: String,
    },

    /// The body was not valid JSON.
    #[error("Invalid JSON from {provider}: {message}")]
    InvalidJson {
        /// The provider that answered
        provider: String,
        /// The decoder error
        message: String,
    },

    /// The body carried an API-level `status.error_code`.
    #[error("API error {code} from {provider}: {message}")]
    Api {
        /// The provider that answered
        provider: String,
        /// The embedded error code
        code: i64,
        /// The embedded error message
        message: String,
    },

    /// The body decoded but is not a non-empty mapping of ids to payloads.
    #[error("Malformed response from {provider}: {message}")]
    MalformedResponse {
        /// The provider that answered
        provider: String,
        /// What was wrong with the payload
        message: String,
    },
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use pricefeed_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::HttpStatus {
    ///     provider: "COINGECKO".to_string(),
    ///     status: 503,
    ///     body: String::new(),
    /// };
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = MarketDataError::HttpStatus {
    ///     provider: "COINGECKO".to_string(),
    ///     status: 400,
    ///     body: String::new(),
    /// };
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Network(_) => RetryClass::WithBackoff,
            Self::HttpStatus { status, .. } if RETRYABLE_STATUSES.contains(status) => {
                RetryClass::WithBackoff
            }
            Self::HttpStatus { .. } => RetryClass::Never,
            Self::InvalidJson { .. } => RetryClass::FixedDelay,
            Self::Api { code, .. } if *code == API_RATE_LIMIT_CODE => RetryClass::RateLimited,
            Self::Api { .. } | Self::MalformedResponse { .. } => RetryClass::Never,
        }
    }
}
