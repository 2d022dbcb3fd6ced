//! Storage-specific error types for PostgreSQL operations.
//!
//! Diesel and r2d2 errors are wrapped here and converted to the
//! database-agnostic error types defined in `pricefeed_core`.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use pricefeed_core::errors::{DatabaseError, Error};
use thiserror::Error;

/// Storage-specific errors that wrap Diesel and r2d2 types.
///
/// These errors are internal to the storage layer and are converted to
/// `pricefeed_core::Error` before being returned to callers.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[from] diesel::ConnectionError),

    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("Connection pool could not be built: {0}")]
    PoolBuildFailed(String),

    #[error("Query execution failed: {0}")]
    QueryFailed(#[from] DieselError),

    #[error("Transaction failed: {0}")]
    TransactionFailed(DieselError),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        let db_err = match err {
            StorageError::ConnectionFailed(e) => DatabaseError::ConnectionFailed(e.to_string()),
            // Checkout timeouts mean the server is unreachable or saturated.
            StorageError::PoolError(e) => DatabaseError::ConnectionFailed(e.to_string()),
            StorageError::PoolBuildFailed(e) => DatabaseError::PoolCreationFailed(e),
            StorageError::QueryFailed(DieselError::DatabaseError(
                DatabaseErrorKind::ClosedConnection,
                info,
            )) => DatabaseError::ConnectionFailed(info.message().to_string()),
            StorageError::QueryFailed(e) => DatabaseError::QueryFailed(e.to_string()),
            StorageError::TransactionFailed(DieselError::DatabaseError(
                DatabaseErrorKind::ClosedConnection,
                info,
            )) => DatabaseError::ConnectionFailed(info.message().to_string()),
            StorageError::TransactionFailed(e) => DatabaseError::TransactionFailed(e.to_string()),
            StorageError::MigrationFailed(e) => DatabaseError::MigrationFailed(e),
        };
        Error::Database(db_err)
    }
}

/// Extension trait for converting Diesel results to core results.
///
/// `From<DieselError> for Error` cannot live here (orphan rules), so this
/// provides `.into_core()` on any `Result<T, diesel::result::Error>`.
pub trait IntoCore<T> {
    fn into_core(self) -> pricefeed_core::Result<T>;
}

impl<T> IntoCore<T> for std::result::Result<T, DieselError> {
    fn into_core(self) -> pricefeed_core::Result<T> {
        self.map_err(|e| StorageError::QueryFailed(e).into())
    }
}

impl<T> IntoCore<T> for std::result::Result<T, r2d2::Error> {
    fn into_core(self) -> pricefeed_core::Result<T> {
        self.map_err(|e| StorageError::PoolError(e).into())
    }
}
