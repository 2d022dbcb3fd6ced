//! Price storage traits.
//!
//! These traits abstract the persistence layer. Methods are blocking: callers
//! in async code run them on `tokio::task::spawn_blocking`.

use super::model::{InsertReport, NewObservation, Observation};
use crate::errors::Result;

/// Storage interface for price observations.
pub trait PriceStore: Send + Sync {
    /// Leases one connection from the pool.
    ///
    /// Blocks while the pool is exhausted. The connection goes back to the
    /// pool when the session is dropped.
    fn open_session(&self) -> Result<Box<dyn PriceStoreSession>>;

    /// Most recent observations restricted to `currency_ids`, newest first.
    fn latest_observations(&self, currency_ids: &[String], limit: i64)
        -> Result<Vec<Observation>>;

    /// Cheap liveness probe (`SELECT 1`).
    fn ping(&self) -> Result<()>;
}

/// A scoped lease on a single store connection.
pub trait PriceStoreSession: Send {
    /// Inserts `rows` in one transaction.
    ///
    /// A row that fails is recorded in [`InsertReport::failures`] and does not
    /// affect its siblings. An `Err` means the transaction itself could not be
    /// started or committed; nothing was written.
    fn insert_observations(&mut self, rows: &[NewObservation]) -> Result<InsertReport>;
}
