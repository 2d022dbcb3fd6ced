//! Read-through price service.
//!
//! Serves the latest-prices snapshot from the cache, recomputing it from the
//! store on a miss. Concurrent misses may each recompute; the last write wins
//! and every writer computes the same value from the same rows.

use async_trait::async_trait;
use log::{debug, error, warn};
use std::sync::Arc;
use std::time::Duration;

use super::snapshot::PriceSnapshot;
use super::store::PriceStore;
use crate::cache::SnapshotCache;
use crate::catalog::CurrencyCatalog;
use crate::errors::{Error, Result};

/// Cache key of the latest-prices snapshot.
pub const SNAPSHOT_CACHE_KEY: &str = "all_prices";

/// Snapshot time-to-live.
pub const SNAPSHOT_TTL: Duration = Duration::from_secs(30);

#[async_trait]
pub trait PriceServiceTrait: Send + Sync {
    /// Current snapshot. Never fails: store problems become error markers.
    async fn get_prices(&self) -> PriceSnapshot;
}

pub struct PriceService {
    store: Arc<dyn PriceStore>,
    cache: Arc<dyn SnapshotCache>,
    catalog: Arc<CurrencyCatalog>,
    ttl: Duration,
}

impl PriceService {
    pub fn new(
        store: Arc<dyn PriceStore>,
        cache: Arc<dyn SnapshotCache>,
        catalog: Arc<CurrencyCatalog>,
    ) -> Self {
        Self {
            store,
            cache,
            catalog,
            ttl: SNAPSHOT_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    async fn cached_snapshot(&self) -> Option<PriceSnapshot> {
        match self.cache.get(SNAPSHOT_CACHE_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    warn!("Discarding undecodable cached snapshot: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Cache read failed, querying store directly: {}", e);
                None
            }
        }
    }

    async fn store_snapshot(&self, snapshot: &PriceSnapshot) {
        let raw = match serde_json::to_string(snapshot) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to encode snapshot for cache: {}", e);
                return;
            }
        };
        if let Err(e) = self.cache.set(SNAPSHOT_CACHE_KEY, &raw, self.ttl).await {
            warn!("Cache write failed: {}", e);
        }
    }

    async fn compute_snapshot(&self) -> PriceSnapshot {
        let store = self.store.clone();
        let ids = self.catalog.external_ids();
        let limit = self.catalog.len() as i64;

        let rows: Result<_> = tokio::task::spawn_blocking(move || {
            store.latest_observations(&ids, limit)
        })
        .await
        .map_err(Error::from)
        .and_then(|r| r);

        match rows {
            Ok(rows) => {
                if rows.is_empty() {
                    warn!("No price data found in database");
                }
                PriceSnapshot::from_observations(&self.catalog, &rows)
            }
            Err(e) if e.is_connectivity() => {
                error!("Database error in get_prices: {}", e);
                PriceSnapshot::database_error()
            }
            Err(e) => {
                error!("Unexpected error in get_prices: {}", e);
                PriceSnapshot::internal_error()
            }
        }
    }
}

#[async_trait]
impl PriceServiceTrait for PriceService {
    async fn get_prices(&self) -> PriceSnapshot {
        if let Some(snapshot) = self.cached_snapshot().await {
            debug!("Serving cached price snapshot");
            return snapshot;
        }

        let snapshot = self.compute_snapshot().await;
        if snapshot.is_cacheable() {
            self.store_snapshot(&snapshot).await;
        }
        snapshot
    }
}
