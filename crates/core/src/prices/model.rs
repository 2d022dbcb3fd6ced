//! Domain models for price observations.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A persisted price observation.
///
/// `id` and `timestamp` are assigned by the store at insertion time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: i32,
    pub currency_id: String,
    pub value: f64,
    pub timestamp: NaiveDateTime,
}

/// Insert form of an observation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewObservation {
    pub currency_id: String,
    pub value: f64,
}

impl NewObservation {
    pub fn new(currency_id: impl Into<String>, value: f64) -> Self {
        Self {
            currency_id: currency_id.into(),
            value,
        }
    }
}

/// A row that could not be inserted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    pub currency_id: String,
    pub message: String,
}

/// Result of one batched insertion.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct InsertReport {
    /// Rows written and committed
    pub inserted: usize,
    /// Rows rejected individually; siblings are unaffected
    pub failures: Vec<RowFailure>,
}
