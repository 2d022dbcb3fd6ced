//! Response models for the external price API.

mod simple_price;

pub use simple_price::{PriceQuote, SimplePriceResponse, SkipReason, SkippedEntry};
