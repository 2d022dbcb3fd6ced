//! Pricefeed Core - domain types, services and traits.
//!
//! This crate contains the fetch-retry-persist task and the read-through
//! price cache. It is storage-agnostic: the Postgres and Redis crates
//! implement the [`prices::PriceStore`] and [`cache::SnapshotCache`] traits.

pub mod cache;
pub mod catalog;
pub mod errors;
pub mod fetch;
pub mod prices;

#[cfg(test)]
mod test_support;

pub use catalog::{CurrencyCatalog, CurrencyEntry};

// Re-export error types
pub use errors::{CacheError, DatabaseError, Error, Result};
