//! Fetch-retry-persist task.
//!
//! One invocation (a tick, or a re-delivered retry of one) walks this state
//! machine:
//!
//! ```text
//! START → REQUESTING ─┬→ RETRY_SCHEDULED(delay) → (re-enqueued) → REQUESTING
//!                     ├→ ABANDONED
//!                     ├→ FAILED (retry cap reached)
//!                     └→ PARSING → INSERTING → COMMITTED
//! ```
//!
//! [`FetchTask::run`] returns the terminal state of one attempt to the
//! scheduler. It never sleeps; re-delivery after a backoff is the scheduler's
//! job.

mod policy;
mod task;


pub use policy::{RetryDecision, RetryPolicy, DEFAULT_MAX_RETRIES};
pub use task::{FetchError, FetchTask, TickOutcome};
