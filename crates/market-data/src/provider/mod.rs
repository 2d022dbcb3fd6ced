//! Price source abstractions and implementations.
//!
//! This module contains:
//! - The `PriceSource` trait the fetch task depends on
//! - The CoinGecko `simple/price` implementation

mod traits;

pub mod coingecko;

pub use traits::PriceSource;
