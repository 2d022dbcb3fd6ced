//! Price source trait definition.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::SimplePriceResponse;

/// Trait for latest-price sources.
///
/// Implementations perform exactly one request per call. Retrying is the
/// caller's decision, driven by [`MarketDataError::retry_class`].
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use pricefeed_market_data::{MarketDataError, PriceSource, SimplePriceResponse};
///
/// struct FixedSource;
///
/// #[async_trait]
/// impl PriceSource for FixedSource {
///     fn id(&self) -> &'static str {
///         "FIXED"
///     }
///
///     async fn fetch_simple_prices(
///         &self,
///         _ids: &[String],
///         _vs_currency: &str,
///     ) -> Result<SimplePriceResponse, MarketDataError> {
///         SimplePriceResponse::parse(self.id(), 200, r#"{"bitcoin":{"usd":1.0}}"#)
///     }
/// }
/// ```
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Unique identifier for this source, used in logs and errors.
    fn id(&self) -> &'static str;

    /// Fetch the latest prices of `ids` quoted in `vs_currency`.
    async fn fetch_simple_prices(
        &self,
        ids: &[String],
        vs_currency: &str,
    ) -> Result<SimplePriceResponse, MarketDataError>;
}
