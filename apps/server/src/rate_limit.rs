//! Per-client token bucket rate limiting.
//!
//! Each client address gets its own bucket. Buckets are created on demand and
//! dropped again once they have refilled completely, so the table only holds
//! clients seen within the last refill window.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::error::ApiError;

/// Bucket key for requests without a usable client address.
pub const UNKNOWN_CLIENT: &str = "unknown";

pub static X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub static X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Table size above which fully refilled buckets are pruned.
const PRUNE_THRESHOLD: usize = 1024;

/// Token bucket for a single client.
#[derive(Debug)]
struct TokenBucket {
    /// Current number of available tokens.
    tokens: f64,
    /// Last time the bucket was updated.
    last_update: Instant,
}

impl TokenBucket {
    fn full(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    /// Refill tokens based on elapsed time.
    fn refill(&mut self, config: &RateLimitConfig, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * config.rate_per_second()).min(config.burst_capacity);
        self.last_update = now;
    }

    /// Time until one token is available.
    fn time_until_available(&self, config: &RateLimitConfig) -> Duration {
        if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / config.rate_per_second())
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RateLimitConfig {
    /// Requests allowed per `period`.
    pub requests: u32,
    pub period: Duration,
    /// Maximum burst capacity.
    pub burst_capacity: f64,
}

impl RateLimitConfig {
    /// `requests` is raised to at least 1.
    pub fn per_second(requests: u32) -> Self {
        let requests = requests.max(1);
        Self {
            requests,
            period: Duration::from_secs(1),
            burst_capacity: requests as f64,
        }
    }

    /// Clamps fields so the refill rate is finite and positive and a full
    /// bucket holds at least one token.
    fn normalized(self) -> Self {
        let period = if self.period.is_zero() {
            Duration::from_secs(1)
        } else {
            self.period
        };
        let burst_capacity = if self.burst_capacity.is_finite() {
            self.burst_capacity.max(1.0)
        } else {
            1.0
        };
        Self {
            requests: self.requests.max(1),
            period,
            burst_capacity,
        }
    }

    fn rate_per_second(&self) -> f64 {
        self.requests as f64 / self.period.as_secs_f64()
    }
}

impl Default for RateLimitConfig {
    /// One request per second, no burst.
    fn default() -> Self {
        Self::per_second(1)
    }
}

/// Outcome of a rate limit check.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

pub struct RateLimiter {
    buckets: Mutex<HashMap<String, TokenBucket>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            config: config.normalized(),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Lock the buckets mutex, recovering from poison if necessary.
    fn lock_buckets(&self) -> MutexGuard<'_, HashMap<String, TokenBucket>> {
        self.buckets.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter buckets mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Takes one token from `client`'s bucket if available.
    pub fn check(&self, client: &str) -> RateDecision {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> RateDecision {
        let mut buckets = self.lock_buckets();
        if buckets.len() > PRUNE_THRESHOLD {
            self.prune(&mut buckets, now);
        }

        let bucket = buckets
            .entry(client.to_string())
            .or_insert_with(|| TokenBucket::full(self.config.burst_capacity));
        bucket.refill(&self.config, now);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            RateDecision::Allowed {
                remaining: bucket.tokens.floor() as u32,
            }
        } else {
            let retry_after = bucket.time_until_available(&self.config);
            debug!("Rate limit exceeded for {} (retry in {:?})", client, retry_after);
            RateDecision::Limited { retry_after }
        }
    }

    fn prune(&self, buckets: &mut HashMap<String, TokenBucket>, now: Instant) {
        buckets.retain(|_, bucket| {
            bucket.refill(&self.config, now);
            bucket.tokens < self.config.burst_capacity
        });
    }

    pub fn tracked_clients(&self) -> usize {
        self.lock_buckets().len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

/// Client address: the peer socket, then the first `X-Forwarded-For` entry.
pub fn client_key(request: &Request) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Middleware rejecting requests over the limit with a 429.
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_key(&request);
    match limiter.check(&client) {
        RateDecision::Allowed { remaining } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(
                X_RATELIMIT_LIMIT.clone(),
                HeaderValue::from(limiter.config().requests),
            );
            headers.insert(X_RATELIMIT_REMAINING.clone(), HeaderValue::from(remaining));
            response
        }
        RateDecision::Limited { retry_after } => {
            ApiError::TooManyRequests { retry_after }.into_response()
        }
    }
}
