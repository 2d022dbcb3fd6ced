//! The served price snapshot.

use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Serialize};

use super::model::Observation;
use crate::catalog::CurrencyCatalog;

/// Timestamp rendering used in snapshots (microseconds, literal `Z`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

pub const NO_DATA_MESSAGE: &str = "No data found";
pub const DATABASE_ERROR_MESSAGE: &str = "Database connection error";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal error";

/// Latest price of one currency.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub timestamp: String,
    pub usd: f64,
}

/// Snapshot of latest prices, or a soft error marker.
///
/// Serialized as `{"data": {"btc": {...}}}` or `{"error": "..."}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceSnapshot {
    Prices { data: BTreeMap<String, PriceEntry> },
    Unavailable { error: String },
}

impl PriceSnapshot {
    pub fn no_data() -> Self {
        Self::Unavailable {
            error: NO_DATA_MESSAGE.to_string(),
        }
    }

    pub fn database_error() -> Self {
        Self::Unavailable {
            error: DATABASE_ERROR_MESSAGE.to_string(),
        }
    }

    pub fn internal_error() -> Self {
        Self::Unavailable {
            error: INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }

    /// Builds a snapshot from store rows ordered newest first.
    ///
    /// Rows whose currency is not in the catalog are dropped with a warning.
    /// When a currency appears more than once, the first (newest) row wins.
    pub fn from_observations(catalog: &CurrencyCatalog, rows: &[Observation]) -> Self {
        if rows.is_empty() {
            return Self::no_data();
        }

        let mut data = BTreeMap::new();
        for row in rows {
            match catalog.short_code(&row.currency_id) {
                Some(code) => {
                    data.entry(code.to_string()).or_insert_with(|| PriceEntry {
                        timestamp: row.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                        usd: row.value,
                    });
                }
                None => warn!("Unknown currency_id in database: {}", row.currency_id),
            }
        }

        Self::Prices { data }
    }

    /// Price data and the "no data" marker are cached; failure markers are not.
    pub fn is_cacheable(&self) -> bool {
        match self {
            Self::Prices { .. } => true,
            Self::Unavailable { error } => error == NO_DATA_MESSAGE,
        }
    }
}
