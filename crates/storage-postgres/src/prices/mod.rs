//! PostgreSQL storage implementation for price observations.

mod model;
mod repository;

pub use model::{NewObservationDB, ObservationDB};
pub use repository::{PgPriceSession, PriceRepository};

// Re-export traits from core for convenience
pub use pricefeed_core::prices::{PriceStore, PriceStoreSession};
