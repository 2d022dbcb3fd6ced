/// Classification for retry policy.
///
/// Used by the fetch task to decide what happens to a tick after an error.
/// The concrete delays live with the caller's retry policy; this only says
/// which kind of delay applies.
///
/// # Behavior Summary
///
/// | Class | Retry? | Delay |
/// |-------|--------|-------|
/// | `Never` | No | - |
/// | `WithBackoff` | Yes | exponential in the attempt number |
/// | `FixedDelay` | Yes | fixed, short |
/// | `RateLimited` | Yes | fixed, long |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry. The tick is abandoned without writing anything.
    Never,

    /// Transient transport or server failure (network error, 429, 5xx).
    WithBackoff,

    /// The body could not be decoded as JSON.
    FixedDelay,

    /// The API answered with an embedded rate-limit error code.
    RateLimited,
}

impl RetryClass {
    /// Returns true when the error is worth another attempt.
    pub fn is_retryable(self) -> bool {
        !matches!(self, Self::Never)
    }
}
