//! Hand-written fakes shared by the core unit tests.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pricefeed_market_data::{MarketDataError, PriceSource, SimplePriceResponse};

use crate::cache::SnapshotCache;
use crate::errors::{CacheError, DatabaseError, Error, Result};
use crate::prices::{
    InsertReport, NewObservation, Observation, PriceStore, PriceStoreSession, RowFailure,
};

pub fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_micro_opt(12, 0, 0, 0)
        .unwrap()
}

/// How `latest_observations` should fail, if at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryFailure {
    Connectivity,
    Query,
}

#[derive(Default)]
struct StoreState {
    rows: Vec<Observation>,
    next_id: i32,
    open_sessions: usize,
    sessions_opened: usize,
    queries: usize,
    fail_open: bool,
    fail_query: Option<QueryFailure>,
    reject_ids: Vec<String>,
    fail_commit: bool,
}

/// In-memory store that counts sessions and can be told to fail.
#[derive(Clone, Default)]
pub struct MockPriceStore {
    state: Arc<Mutex<StoreState>>,
}

impl MockPriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row stamped `t0() + offset_secs`.
    pub fn push(&self, currency_id: &str, value: f64, offset_secs: i64) {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.rows.push(Observation {
            id,
            currency_id: currency_id.to_string(),
            value,
            timestamp: t0() + ChronoDuration::seconds(offset_secs),
        });
    }

    pub fn rows(&self) -> Vec<Observation> {
        self.state.lock().unwrap().rows.clone()
    }

    pub fn open_sessions(&self) -> usize {
        self.state.lock().unwrap().open_sessions
    }

    pub fn sessions_opened(&self) -> usize {
        self.state.lock().unwrap().sessions_opened
    }

    pub fn queries(&self) -> usize {
        self.state.lock().unwrap().queries
    }

    pub fn fail_open(&self, fail: bool) {
        self.state.lock().unwrap().fail_open = fail;
    }

    pub fn fail_query(&self, failure: Option<QueryFailure>) {
        self.state.lock().unwrap().fail_query = failure;
    }

    pub fn reject(&self, currency_id: &str) {
        self.state
            .lock()
            .unwrap()
            .reject_ids
            .push(currency_id.to_string());
    }

    pub fn fail_commit(&self, fail: bool) {
        self.state.lock().unwrap().fail_commit = fail;
    }
}

impl PriceStore for MockPriceStore {
    fn open_session(&self) -> Result<Box<dyn PriceStoreSession>> {
        let mut state = self.state.lock().unwrap();
        if state.fail_open {
            return Err(DatabaseError::ConnectionFailed("pool timed out".to_string()).into());
        }
        state.open_sessions += 1;
        state.sessions_opened += 1;
        Ok(Box::new(MockSession {
            state: self.state.clone(),
        }))
    }

    fn latest_observations(
        &self,
        currency_ids: &[String],
        limit: i64,
    ) -> Result<Vec<Observation>> {
        let mut state = self.state.lock().unwrap();
        state.queries += 1;
        match state.fail_query {
            Some(QueryFailure::Connectivity) => {
                return Err(DatabaseError::ConnectionFailed("connection refused".into()).into())
            }
            Some(QueryFailure::Query) => {
                return Err(DatabaseError::QueryFailed("syntax error".into()).into())
            }
            None => {}
        }
        let mut rows: Vec<Observation> = state
            .rows
            .iter()
            .filter(|row| currency_ids.contains(&row.currency_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    fn ping(&self) -> Result<()> {
        match self.state.lock().unwrap().fail_query {
            Some(_) => Err(DatabaseError::ConnectionFailed("connection refused".into()).into()),
            None => Ok(()),
        }
    }
}

struct MockSession {
    state: Arc<Mutex<StoreState>>,
}

impl PriceStoreSession for MockSession {
    fn insert_observations(&mut self, rows: &[NewObservation]) -> Result<InsertReport> {
        let mut state = self.state.lock().unwrap();
        let mut report = InsertReport::default();
        let mut pending = Vec::new();
        for row in rows {
            if state.reject_ids.contains(&row.currency_id) {
                report.failures.push(RowFailure {
                    currency_id: row.currency_id.clone(),
                    message: "value out of range".to_string(),
                });
                continue;
            }
            pending.push(row.clone());
        }
        if state.fail_commit {
            return Err(Error::Database(DatabaseError::TransactionFailed(
                "commit failed".to_string(),
            )));
        }
        for row in pending {
            state.next_id += 1;
            let id = state.next_id;
            state.rows.push(Observation {
                id,
                currency_id: row.currency_id,
                value: row.value,
                timestamp: t0(),
            });
            report.inserted += 1;
        }
        Ok(report)
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.open_sessions -= 1;
        }
    }
}

/// A canned upstream reply, decoded through the real response parser.
#[derive(Clone, Debug)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn ok(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }
}

/// Price source replaying scripted replies; the last one repeats.
pub struct MockPriceSource {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<Vec<String>>>,
}

impl MockPriceSource {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<Vec<String>> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl PriceSource for MockPriceSource {
    fn id(&self) -> &'static str {
        "MOCK"
    }

    async fn fetch_simple_prices(
        &self,
        ids: &[String],
        _vs_currency: &str,
    ) -> std::result::Result<SimplePriceResponse, MarketDataError> {
        self.requests.lock().unwrap().push(ids.to_vec());
        let reply = {
            let mut replies = self.replies.lock().unwrap();
            if replies.len() > 1 {
                replies.pop_front().unwrap()
            } else {
                replies.front().cloned().unwrap_or_else(|| Reply::status(500))
            }
        };
        SimplePriceResponse::parse(self.id(), reply.status, &reply.body)
    }
}

/// Cache whose every operation fails.
pub struct BrokenCache;

#[async_trait]
impl SnapshotCache for BrokenCache {
    async fn get(&self, _key: &str) -> std::result::Result<Option<String>, CacheError> {
        Err(CacheError::ConnectionFailed("connection refused".to_string()))
    }

    async fn set(
        &self,
        _key: &str,
        _value: &str,
        _ttl: Duration,
    ) -> std::result::Result<(), CacheError> {
        Err(CacheError::ConnectionFailed("connection refused".to_string()))
    }

    async fn ping(&self) -> std::result::Result<(), CacheError> {
        Err(CacheError::ConnectionFailed("connection refused".to_string()))
    }
}
