//! Redis implementation of the snapshot cache.
//!
//! The connection is established lazily on first use and then kept by a
//! [`ConnectionManager`], which reconnects on its own after a drop. A failed
//! first connection is retried on the next call, so the server can start
//! while Redis is down and report it through `/health`.

use async_trait::async_trait;
use log::{debug, info};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use std::future::Future;
use std::time::Duration;
use tokio::sync::OnceCell;

use pricefeed_core::cache::SnapshotCache;
use pricefeed_core::errors::CacheError;

/// Upper bound on any single cache round trip.
pub const OPERATION_TIMEOUT: Duration = Duration::from_secs(2);

pub struct RedisCache {
    client: Client,
    conn: OnceCell<ConnectionManager>,
    timeout: Duration,
}

impl RedisCache {
    /// Validates `url` without connecting.
    pub fn new(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url).map_err(|e| CacheError::ConnectionFailed(e.to_string()))?;
        Ok(Self {
            client,
            conn: OnceCell::new(),
            timeout: OPERATION_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        let manager = self
            .conn
            .get_or_try_init(|| async {
                let manager = self.bounded(ConnectionManager::new(self.client.clone())).await?;
                info!("Connected to Redis cache");
                Ok::<_, CacheError>(manager)
            })
            .await?;
        Ok(manager.clone())
    }

    async fn bounded<T>(
        &self,
        op: impl Future<Output = Result<T, RedisError>>,
    ) -> Result<T, CacheError> {
        match tokio::time::timeout(self.timeout, op).await {
            Ok(result) => result.map_err(map_redis_err),
            Err(_) => Err(CacheError::ConnectionFailed(format!(
                "timed out after {}ms",
                self.timeout.as_millis()
            ))),
        }
    }
}

fn map_redis_err(err: RedisError) -> CacheError {
    if err.is_connection_refusal()
        || err.is_connection_dropped()
        || err.is_io_error()
        || err.is_timeout()
    {
        CacheError::ConnectionFailed(err.to_string())
    } else {
        CacheError::CommandFailed(err.to_string())
    }
}

#[async_trait]
impl SnapshotCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = self.bounded(conn.get(key)).await?;
        debug!(
            "Redis GET {} -> {}",
            key,
            if value.is_some() { "hit" } else { "miss" }
        );
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        // SETEX rejects a zero expiry.
        let seconds = ttl.as_secs().max(1);
        self.bounded(conn.set_ex::<_, _, ()>(key, value, seconds))
            .await
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let pong: String = self
            .bounded(redis::cmd("PING").query_async(&mut conn))
            .await?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(CacheError::CommandFailed(format!(
                "unexpected PING reply: {}",
                pong
            )))
        }
    }
}
