use std::{net::SocketAddr, time::Duration};

use pricefeed_core::fetch::DEFAULT_MAX_RETRIES;
use pricefeed_core::prices::SNAPSHOT_TTL;
use pricefeed_market_data::provider::coingecko::DEFAULT_BASE_URL;
use pricefeed_storage_postgres::{database_url, MAX_POOL_SIZE};

/// Cache URL selecting the in-process cache instead of Redis.
pub const MEMORY_CACHE_URL: &str = "memory://";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_host: String,
    pub db_port: u16,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
    pub db_pool_max: u32,
    pub redis_url: String,
    pub price_api_url: String,
    pub fetch_interval: Duration,
    pub fetch_workers: usize,
    /// Retry cap for a single fetch tick.
    pub fetch_max_retries: u32,
    /// Expiry of the cached price snapshot.
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source. Unparseable values
    /// fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let parsed = |key: &str, default: u64| -> u64 {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        let listen_addr = var("PF_LISTEN_ADDR", "0.0.0.0:8080")
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 8080)));
        let db_port = lookup("DB_PORT")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(5432);
        let db_pool_max = (parsed("DB_POOL_MAX", MAX_POOL_SIZE as u64) as u32).clamp(1, MAX_POOL_SIZE);
        let fetch_max_retries = parsed("PF_FETCH_MAX_RETRIES", DEFAULT_MAX_RETRIES as u64) as u32;
        let cache_ttl = Duration::from_secs(parsed("PF_CACHE_TTL_SECS", SNAPSHOT_TTL.as_secs()).max(1));

        Self {
            listen_addr,
            db_host: var("DB_HOST", "localhost"),
            db_port,
            db_user: var("DB_USER", "postgres"),
            db_password: var("DB_PASSWORD", ""),
            db_name: var("DB_NAME", "pricefeed"),
            db_pool_max,
            redis_url: var("REDIS_URL", "redis://localhost:6379/0"),
            price_api_url: var("PF_PRICE_API_URL", DEFAULT_BASE_URL),
            fetch_interval: Duration::from_secs(parsed("PF_FETCH_INTERVAL_SECS", 30).max(1)),
            fetch_workers: parsed("PF_FETCH_WORKERS", 2).max(1) as usize,
            fetch_max_retries,
            cache_ttl,
            request_timeout: Duration::from_millis(parsed("PF_REQUEST_TIMEOUT_MS", 30000)),
            log_format: LogFormat::parse(&var("PF_LOG_FORMAT", "text")),
        }
    }

    pub fn database_url(&self) -> String {
        database_url(
            &self.db_host,
            self.db_port,
            &self.db_user,
            &self.db_password,
            &self.db_name,
        )
    }

    pub fn uses_memory_cache(&self) -> bool {
        self.redis_url == MEMORY_CACHE_URL
    }
}
