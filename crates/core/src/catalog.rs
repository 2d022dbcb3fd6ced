//! Currency catalog.
//!
//! Static mapping between the price API's currency identifiers and the short
//! codes served to clients. Fixed at startup, read-only afterwards.

use serde::Serialize;

/// One catalog entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CurrencyEntry {
    /// Identifier used by the price API (e.g. "bitcoin")
    pub external_id: String,
    /// Short code used in the served snapshot (e.g. "btc")
    pub short_code: String,
}

impl CurrencyEntry {
    pub fn new(external_id: impl Into<String>, short_code: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            short_code: short_code.into(),
        }
    }
}

/// Ordered set of tracked currencies.
///
/// Order matters only for the API query string; lookups are by id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrencyCatalog {
    entries: Vec<CurrencyEntry>,
}

impl CurrencyCatalog {
    /// Builds a catalog. Later duplicates of an external id are ignored.
    pub fn new(entries: Vec<CurrencyEntry>) -> Self {
        let mut unique: Vec<CurrencyEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            if !unique.iter().any(|e| e.external_id == entry.external_id) {
                unique.push(entry);
            }
        }
        Self { entries: unique }
    }

    pub fn entries(&self) -> &[CurrencyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Short code for an external id, if tracked.
    pub fn short_code(&self, external_id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.external_id == external_id)
            .map(|e| e.short_code.as_str())
    }

    pub fn contains(&self, external_id: &str) -> bool {
        self.short_code(external_id).is_some()
    }

    /// External ids in catalog order.
    pub fn external_ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.external_id.clone()).collect()
    }
}

impl Default for CurrencyCatalog {
    fn default() -> Self {
        Self::new(vec![
            CurrencyEntry::new("zenon-2", "znn"),
            CurrencyEntry::new("bitcoin", "btc"),
            CurrencyEntry::new("quasar-2", "qsr"),
            CurrencyEntry::new("ethereum", "eth"),
        ])
    }
}
