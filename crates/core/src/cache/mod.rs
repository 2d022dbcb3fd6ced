//! Snapshot cache abstraction.
//!
//! The cache is an external key-value store with its own expiry. Operations
//! are atomic on a single key, so callers need no locking around them.

mod memory;

pub use memory::MemoryCache;

use async_trait::async_trait;
use std::time::Duration;

use crate::errors::CacheError;

/// Key-value cache holding serialized snapshots.
#[async_trait]
pub trait SnapshotCache: Send + Sync {
    /// Reads a value. Expired keys read as `None`.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Writes a value that expires after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Live connectivity probe.
    async fn ping(&self) -> Result<(), CacheError>;
}
