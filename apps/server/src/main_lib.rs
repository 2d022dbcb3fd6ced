use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use pricefeed_cache_redis::RedisCache;
use pricefeed_core::{
    cache::{MemoryCache, SnapshotCache},
    fetch::{FetchTask, RetryPolicy},
    prices::{PriceService, PriceServiceTrait, PriceStore},
    CurrencyCatalog,
};
use pricefeed_market_data::{CoinGeckoProvider, PriceSource};
use pricefeed_storage_postgres::{create_pool, run_migrations, PriceRepository};

use crate::config::{Config, LogFormat};
use crate::rate_limit::RateLimiter;
use crate::scheduler::start_fetch_scheduler;
use crate::task_queue::{spawn_workers, FetchQueue};

pub struct AppState {
    pub price_service: Arc<dyn PriceServiceTrait>,
    /// Probed directly by `/health`, bypassing the snapshot cache.
    pub store: Arc<dyn PriceStore>,
    pub cache: Arc<dyn SnapshotCache>,
    pub rate_limiter: Arc<RateLimiter>,
    pub fetch_task: Arc<FetchTask>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn PriceStore>,
        cache: Arc<dyn SnapshotCache>,
        source: Arc<dyn PriceSource>,
        catalog: Arc<CurrencyCatalog>,
        config: &Config,
    ) -> Self {
        let price_service = Arc::new(
            PriceService::new(store.clone(), cache.clone(), catalog.clone())
                .with_ttl(config.cache_ttl),
        );
        let policy = RetryPolicy {
            max_retries: config.fetch_max_retries,
            ..RetryPolicy::default()
        };
        let fetch_task =
            Arc::new(FetchTask::new(source, store.clone(), catalog).with_policy(policy));
        Self {
            price_service,
            store,
            cache,
            rate_limiter: Arc::new(RateLimiter::default()),
            fetch_task,
        }
    }
}

pub fn init_tracing(log_format: &LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init(),
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    tracing::info!(
        "Creating database connection pool for {}:{}/{}",
        config.db_host,
        config.db_port,
        config.db_name
    );
    let database_url = config.database_url();
    let pool_max = config.db_pool_max;
    let pool = tokio::task::spawn_blocking(move || -> pricefeed_core::Result<_> {
        let pool = create_pool(&database_url, pool_max)?;
        run_migrations(&pool)?;
        Ok(pool)
    })
    .await??;
    tracing::info!("Database connection pool created successfully");
    let store: Arc<dyn PriceStore> = Arc::new(PriceRepository::new(pool));

    let cache: Arc<dyn SnapshotCache> = if config.uses_memory_cache() {
        tracing::info!("Using in-process snapshot cache");
        Arc::new(MemoryCache::new())
    } else {
        Arc::new(RedisCache::new(&config.redis_url)?)
    };

    let source: Arc<dyn PriceSource> = Arc::new(CoinGeckoProvider::new(&config.price_api_url)?);
    let catalog = Arc::new(CurrencyCatalog::default());

    Ok(Arc::new(AppState::new(store, cache, source, catalog, config)))
}

/// Handles of the background fetch pipeline.
pub struct FetchRuntime {
    pub scheduler: JoinHandle<()>,
    pub workers: Vec<JoinHandle<()>>,
}

impl FetchRuntime {
    pub fn abort(&self) {
        self.scheduler.abort();
        for worker in &self.workers {
            worker.abort();
        }
    }
}

/// Starts the task-queue workers and the periodic scheduler feeding them.
pub fn start_fetching(state: &AppState, config: &Config) -> FetchRuntime {
    let (queue, rx) = FetchQueue::channel();
    let workers = spawn_workers(&queue, rx, state.fetch_task.clone(), config.fetch_workers);
    let scheduler = start_fetch_scheduler(queue, config.fetch_interval);
    FetchRuntime { scheduler, workers }
}
