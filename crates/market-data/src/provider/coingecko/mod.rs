//! CoinGecko provider for latest crypto prices.
//!
//! Uses the public `simple/price` endpoint:
//! `GET https://api.coingecko.com/api/v3/simple/price?ids=bitcoin,ethereum&vs_currencies=usd`

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::time::Duration;

use crate::errors::MarketDataError;
use crate::models::SimplePriceResponse;
use crate::provider::PriceSource;

/// Provider ID constant
const PROVIDER_ID: &str = "COINGECKO";

/// Public `simple/price` endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3/simple/price";

/// Per-attempt HTTP request timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// CoinGecko provider.
///
/// # Example
///
/// ```ignore
/// use pricefeed_market_data::CoinGeckoProvider;
///
/// let provider = CoinGeckoProvider::new(CoinGeckoProvider::DEFAULT_BASE_URL)?;
/// ```
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
}

impl CoinGeckoProvider {
    pub const DEFAULT_BASE_URL: &'static str = DEFAULT_BASE_URL;

    /// Create a provider against `base_url` with the default 10s timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, MarketDataError> {
        Self::with_timeout(base_url, REQUEST_TIMEOUT)
    }

    /// Create a provider with a custom request timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, MarketDataError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Build the request URL for the given ids.
    fn build_url(&self, ids: &[String], vs_currency: &str) -> String {
        format!(
            "{}?ids={}&vs_currencies={}",
            self.base_url.trim_end_matches('?'),
            ids.join(","),
            vs_currency
        )
    }
}

#[async_trait]
impl PriceSource for CoinGeckoProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_simple_prices(
        &self,
        ids: &[String],
        vs_currency: &str,
    ) -> Result<SimplePriceResponse, MarketDataError> {
        let url = self.build_url(ids, vs_currency);
        debug!("Requesting {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        SimplePriceResponse::parse(PROVIDER_ID, status, &body)
    }
}
