//! Pricefeed Market Data Crate
//!
//! This crate talks to the external price API and turns its responses into
//! typed results the fetch task can act on.
//!
//! # Overview
//!
//! ```text
//! +------------------+     +----------------------+
//! |   Fetch task     | --> |  PriceSource (trait) |
//! +------------------+     +----------------------+
//!                                    |
//!                                    v
//!                          +----------------------+
//!                          |  CoinGeckoProvider   |  (HTTP, 10s timeout)
//!                          +----------------------+
//!                                    |
//!                                    v
//!                          +----------------------+
//!                          | SimplePriceResponse  |  or MarketDataError
//!                          +----------------------+
//! ```
//!
//! Every [`MarketDataError`] carries a [`RetryClass`] so callers never have to
//! inspect status codes or payloads themselves.

pub mod errors;
pub mod models;
pub mod provider;

pub use errors::{MarketDataError, RetryClass};
pub use models::{PriceQuote, SimplePriceResponse, SkipReason, SkippedEntry};
pub use provider::coingecko::CoinGeckoProvider;
pub use provider::PriceSource;
