//! Fakes and helpers shared by the router tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::Request;
use axum::Router;
use chrono::NaiveDate;

use pricefeed_core::cache::{MemoryCache, SnapshotCache};
use pricefeed_core::errors::{CacheError, DatabaseError, Result};
use pricefeed_core::prices::{
    InsertReport, NewObservation, Observation, PriceStore, PriceStoreSession,
};
use pricefeed_core::CurrencyCatalog;
use pricefeed_market_data::{MarketDataError, PriceSource, SimplePriceResponse};
use pricefeed_server::{api::app_router, config::Config, AppState};

#[derive(Default)]
struct StoreState {
    rows: Vec<Observation>,
    down: bool,
    open_sessions: usize,
}

#[derive(Clone, Default)]
pub struct FakeStore {
    state: Arc<Mutex<StoreState>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, currency_id: &str, value: f64) {
        let mut state = self.state.lock().unwrap();
        let id = state.rows.len() as i32 + 1;
        state.rows.push(Observation {
            id,
            currency_id: currency_id.to_string(),
            value,
            timestamp: NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_micro_opt(12, 0, 0, 123456)
                .unwrap(),
        });
    }

    pub fn set_down(&self, down: bool) {
        self.state.lock().unwrap().down = down;
    }

    pub fn row_count(&self) -> usize {
        self.state.lock().unwrap().rows.len()
    }

    pub fn open_sessions(&self) -> usize {
        self.state.lock().unwrap().open_sessions
    }

    fn check_up(&self) -> Result<()> {
        if self.state.lock().unwrap().down {
            Err(DatabaseError::ConnectionFailed("connection refused".to_string()).into())
        } else {
            Ok(())
        }
    }
}

impl PriceStore for FakeStore {
    fn open_session(&self) -> Result<Box<dyn PriceStoreSession>> {
        self.check_up()?;
        self.state.lock().unwrap().open_sessions += 1;
        Ok(Box::new(FakeSession {
            store: self.clone(),
        }))
    }

    fn latest_observations(
        &self,
        currency_ids: &[String],
        limit: i64,
    ) -> Result<Vec<Observation>> {
        self.check_up()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .rows
            .iter()
            .rev()
            .filter(|row| currency_ids.contains(&row.currency_id))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    fn ping(&self) -> Result<()> {
        self.check_up()
    }
}

struct FakeSession {
    store: FakeStore,
}

impl PriceStoreSession for FakeSession {
    fn insert_observations(&mut self, rows: &[NewObservation]) -> Result<InsertReport> {
        for row in rows {
            self.store.push(&row.currency_id, row.value);
        }
        Ok(InsertReport {
            inserted: rows.len(),
            failures: Vec::new(),
        })
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        if let Ok(mut state) = self.store.state.lock() {
            state.open_sessions -= 1;
        }
    }
}

/// Replays `(status, body)` replies; the last one repeats.
pub struct FakeSource {
    replies: Mutex<VecDeque<(u16, String)>>,
    calls: Mutex<usize>,
}

impl FakeSource {
    pub fn new(replies: Vec<(u16, &str)>) -> Self {
        Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|(status, body)| (status, body.to_string()))
                    .collect(),
            ),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl PriceSource for FakeSource {
    fn id(&self) -> &'static str {
        "FAKE"
    }

    async fn fetch_simple_prices(
        &self,
        _ids: &[String],
        _vs_currency: &str,
    ) -> std::result::Result<SimplePriceResponse, MarketDataError> {
        *self.calls.lock().unwrap() += 1;
        let (status, body) = {
            let mut replies = self.replies.lock().unwrap();
            if replies.len() > 1 {
                replies.pop_front().unwrap()
            } else {
                replies.front().cloned().unwrap_or((500, String::new()))
            }
        };
        SimplePriceResponse::parse(self.id(), status, &body)
    }
}

/// Cache that is never reachable.
pub struct DownCache;

#[async_trait]
impl SnapshotCache for DownCache {
    async fn get(&self, _key: &str) -> std::result::Result<Option<String>, CacheError> {
        Err(CacheError::ConnectionFailed("Connection refused (os error 111)".to_string()))
    }

    async fn set(
        &self,
        _key: &str,
        _value: &str,
        _ttl: Duration,
    ) -> std::result::Result<(), CacheError> {
        Err(CacheError::ConnectionFailed("Connection refused (os error 111)".to_string()))
    }

    async fn ping(&self) -> std::result::Result<(), CacheError> {
        Err(CacheError::ConnectionFailed("Connection refused (os error 111)".to_string()))
    }
}

pub fn test_config() -> Config {
    Config::from_lookup(|_| None)
}

/// Defaults overridden by `vars`.
pub fn config_with(vars: &[(&str, &str)]) -> Config {
    Config::from_lookup(|key| {
        vars.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    })
}

pub fn state_from(
    store: &FakeStore,
    cache: Arc<dyn SnapshotCache>,
    source: Arc<FakeSource>,
    config: &Config,
) -> Arc<AppState> {
    Arc::new(AppState::new(
        Arc::new(store.clone()),
        cache,
        source,
        Arc::new(CurrencyCatalog::default()),
        config,
    ))
}

pub fn state_with(store: &FakeStore, cache: Arc<dyn SnapshotCache>) -> Arc<AppState> {
    state_from(
        store,
        cache,
        Arc::new(FakeSource::new(vec![(503, "")])),
        &test_config(),
    )
}

pub fn router_with(store: &FakeStore) -> Router {
    app_router(state_with(store, Arc::new(MemoryCache::new())), &test_config())
}

pub fn get_from(uri: &str, peer: &str) -> Request<Body> {
    let addr: SocketAddr = peer.parse().unwrap();
    Request::builder()
        .uri(uri)
        .extension(ConnectInfo(addr))
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
