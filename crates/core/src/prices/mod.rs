//! Price observation management.
//!
//! - [`model`] - Observations as stored and as inserted
//! - [`store`] - Storage traits implemented by the Postgres crate
//! - [`snapshot`] - The served snapshot and its error markers
//! - [`service`] - Read-through cache in front of the latest-prices query
//!
//! ```text
//! GET /price → PriceService → SnapshotCache (hit) ─────────────┐
//!                    │                                          ▼
//!                    └─ miss → PriceStore::latest_observations → PriceSnapshot
//! ```

pub mod model;
pub mod service;
pub mod snapshot;
pub mod store;


pub use model::{InsertReport, NewObservation, Observation, RowFailure};
pub use service::{PriceService, PriceServiceTrait, SNAPSHOT_CACHE_KEY, SNAPSHOT_TTL};
pub use snapshot::{PriceEntry, PriceSnapshot};
pub use store::{PriceStore, PriceStoreSession};
