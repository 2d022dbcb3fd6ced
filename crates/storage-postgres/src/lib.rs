//! PostgreSQL storage implementation for pricefeed.
//!
//! This crate is the only place where Diesel dependencies exist. It
//! implements the [`pricefeed_core::prices::PriceStore`] trait and contains:
//! - Connection pooling (r2d2)
//! - Embedded Diesel migrations
//! - The `coingecko` table repository and its Diesel models
//!
//! ```text
//! core (domain)
//!       │
//!       ▼
//! storage-postgres (this crate)
//!       │
//!       ▼
//!  PostgreSQL
//! ```

pub mod db;
pub mod errors;
pub mod prices;
pub mod schema;

// Re-export database utilities
pub use db::{
    create_pool, database_url, get_connection, migrate, run_migrations, DbConnection, DbPool,
    MAX_POOL_SIZE,
};

pub use errors::{IntoCore, StorageError};
pub use prices::{PgPriceSession, PriceRepository};

// Re-export from pricefeed-core for convenience
pub use pricefeed_core::errors::{DatabaseError, Error, Result};
