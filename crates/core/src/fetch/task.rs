use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;

use pricefeed_market_data::{MarketDataError, PriceSource};

use super::policy::{RetryDecision, RetryPolicy};
use crate::catalog::CurrencyCatalog;
use crate::errors::Error;
use crate::prices::{NewObservation, PriceStore};

/// Quote currency requested from the price API.
const VS_CURRENCY: &str = "usd";

/// Terminal state of one task invocation.
#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// The response was persisted.
    Committed {
        /// Rows written
        inserted: usize,
        /// Entries dropped before insertion (bad payload or unknown id)
        skipped: usize,
        /// Rows rejected by the store
        failed: usize,
    },
    /// Non-retryable failure; nothing was written.
    Abandoned { reason: String },
    /// Retryable failure; the scheduler re-delivers the tick after `delay`.
    RetryScheduled { next_attempt: u32, delay: Duration },
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        attempts: u32,
        last_error: MarketDataError,
    },

    #[error("Unexpected error in fetch task: {0}")]
    Unexpected(#[from] Error),
}

/// Fetches the catalog's prices and persists them.
pub struct FetchTask {
    source: Arc<dyn PriceSource>,
    store: Arc<dyn PriceStore>,
    catalog: Arc<CurrencyCatalog>,
    policy: RetryPolicy,
}

impl FetchTask {
    pub fn new(
        source: Arc<dyn PriceSource>,
        store: Arc<dyn PriceStore>,
        catalog: Arc<CurrencyCatalog>,
    ) -> Self {
        Self {
            source,
            store,
            catalog,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Runs attempt number `attempt` (0 for a fresh tick).
    ///
    /// The store session is leased first and dropped on every return path.
    pub async fn run(&self, attempt: u32) -> Result<TickOutcome, FetchError> {
        let store = self.store.clone();
        let mut session = tokio::task::spawn_blocking(move || store.open_session())
            .await
            .map_err(Error::from)??;

        let ids = self.catalog.external_ids();
        debug!(
            "Fetching {} prices from {} (attempt {})",
            ids.len(),
            self.source.id(),
            attempt
        );

        let response = match self.source.fetch_simple_prices(&ids, VS_CURRENCY).await {
            Ok(response) => response,
            Err(e) => return self.on_failure(e, attempt),
        };

        let (quotes, skipped_entries) = response.quotes(VS_CURRENCY);
        for entry in &skipped_entries {
            warn!("Skipping {}: {}", entry.currency_id, entry.reason);
        }

        let mut skipped = skipped_entries.len();
        let mut rows = Vec::with_capacity(quotes.len());
        for quote in quotes {
            if !self.catalog.contains(&quote.currency_id) {
                warn!("Skipping unknown currency id: {}", quote.currency_id);
                skipped += 1;
                continue;
            }
            rows.push(NewObservation::new(quote.currency_id, quote.value));
        }

        let report = tokio::task::spawn_blocking(move || session.insert_observations(&rows))
            .await
            .map_err(Error::from)??;

        for failure in &report.failures {
            error!(
                "Error inserting price for {}: {}",
                failure.currency_id, failure.message
            );
        }
        info!("Successfully inserted {} price records", report.inserted);

        Ok(TickOutcome::Committed {
            inserted: report.inserted,
            skipped,
            failed: report.failures.len(),
        })
    }

    fn on_failure(&self, err: MarketDataError, attempt: u32) -> Result<TickOutcome, FetchError> {
        match self.policy.decide(err.retry_class(), attempt) {
            RetryDecision::Abandon => {
                warn!("Abandoning price fetch: {}", err);
                Ok(TickOutcome::Abandoned {
                    reason: err.to_string(),
                })
            }
            RetryDecision::Retry {
                next_attempt,
                delay,
            } => {
                warn!(
                    "Price fetch failed ({}), retrying in {}s (attempt {}/{})",
                    err,
                    delay.as_secs(),
                    next_attempt,
                    self.policy.max_retries
                );
                Ok(TickOutcome::RetryScheduled {
                    next_attempt,
                    delay,
                })
            }
            RetryDecision::Exhausted => Err(FetchError::RetriesExhausted {
                attempts: attempt + 1,
                last_error: err,
            }),
        }
    }
}
