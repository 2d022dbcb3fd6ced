//! Core error types for the pricefeed service.
//!
//! This module defines storage-agnostic error types. Storage-specific errors
//! (from Diesel, r2d2, Redis) are converted to these types by the storage
//! crates.

use pricefeed_market_data::MarketDataError;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Cache operation failed: {0}")]
    Cache(#[from] CacheError),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// True when the error means the store could not be reached at all, as
    /// opposed to a reachable store rejecting a statement.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Error::Database(e) if e.is_connectivity())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Unexpected(format!("Blocking task failed: {}", err))
    }
}

/// Storage-agnostic error type for database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a connection or to get one from the pool in time.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// A transaction could not be started or committed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),
}

impl DatabaseError {
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolCreationFailed(_)
        )
    }
}

/// Errors raised by snapshot cache backends.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to connect to cache: {0}")]
    ConnectionFailed(String),

    #[error("Cache command failed: {0}")]
    CommandFailed(String),
}
