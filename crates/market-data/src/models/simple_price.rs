//! `simple/price` response decoding.
//!
//! The API answers either with a mapping of currency ids to payloads
//! (`{"bitcoin": {"usd": 65000.5}}`) or with an embedded error
//! (`{"status": {"error_code": 429, "error_message": "..."}}`).
//! [`SimplePriceResponse::parse`] performs the response-level checks in the
//! order the fetch task relies on; [`SimplePriceResponse::quotes`] performs the
//! per-entry checks.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::MarketDataError;

/// Maximum number of body characters kept in an error message.
const BODY_PREVIEW_CHARS: usize = 200;

/// One validated price point.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PriceQuote {
    /// External currency identifier (e.g. "bitcoin")
    pub currency_id: String,
    /// Price in the requested vs-currency
    pub value: f64,
}

/// Why an entry of an otherwise valid response was skipped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The payload for this id is not a mapping.
    InvalidFormat,
    /// The payload has no value for the vs-currency.
    MissingValue,
    /// The value is present but not a number.
    NonNumericValue,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFormat => write!(f, "invalid data format"),
            Self::MissingValue => write!(f, "no value found"),
            Self::NonNumericValue => write!(f, "value is not numeric"),
        }
    }
}

/// An entry that was dropped during per-entry validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    pub currency_id: String,
    pub reason: SkipReason,
}

/// A structurally valid `simple/price` response: a non-empty mapping.
#[derive(Clone, Debug, PartialEq)]
pub struct SimplePriceResponse {
    entries: Map<String, Value>,
}

impl SimplePriceResponse {
    /// Classifies a raw HTTP response.
    ///
    /// Checks run in this order:
    /// 1. status must be 200
    /// 2. body must decode as JSON
    /// 3. body must not carry `status.error_code`
    /// 4. body must be a non-empty object
    pub fn parse(provider: &str, status: u16, body: &str) -> Result<Self, MarketDataError> {
        if status != 200 {
            return Err(MarketDataError::HttpStatus {
                provider: provider.to_string(),
                status,
                body: body.chars().take(BODY_PREVIEW_CHARS).collect(),
            });
        }

        let value: Value =
            serde_json::from_str(body).map_err(|e| MarketDataError::InvalidJson {
                provider: provider.to_string(),
                message: e.to_string(),
            })?;

        if let Some((code, message)) = embedded_error(&value) {
            return Err(MarketDataError::Api {
                provider: provider.to_string(),
                code,
                message,
            });
        }

        match value {
            Value::Object(entries) if !entries.is_empty() => Ok(Self { entries }),
            Value::Object(_) => Err(MarketDataError::MalformedResponse {
                provider: provider.to_string(),
                message: "empty object".to_string(),
            }),
            other => Err(MarketDataError::MalformedResponse {
                provider: provider.to_string(),
                message: format!("expected object, got {}", json_type_name(&other)),
            }),
        }
    }

    /// Number of entries in the response, valid or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Splits the response into valid quotes and skipped entries.
    ///
    /// An entry is valid when its payload is an object holding a numeric value
    /// under `vs_currency`.
    pub fn quotes(&self, vs_currency: &str) -> (Vec<PriceQuote>, Vec<SkippedEntry>) {
        let mut quotes = Vec::with_capacity(self.entries.len());
        let mut skipped = Vec::new();

        for (currency_id, payload) in &self.entries {
            let reason = match payload {
                Value::Object(fields) => match fields.get(vs_currency) {
                    None | Some(Value::Null) => Some(SkipReason::MissingValue),
                    Some(value) => match value.as_f64() {
                        Some(number) => {
                            quotes.push(PriceQuote {
                                currency_id: currency_id.clone(),
                                value: number,
                            });
                            None
                        }
                        None => Some(SkipReason::NonNumericValue),
                    },
                },
                _ => Some(SkipReason::InvalidFormat),
            };

            if let Some(reason) = reason {
                skipped.push(SkippedEntry {
                    currency_id: currency_id.clone(),
                    reason,
                });
            }
        }

        (quotes, skipped)
    }
}

/// Extracts `status.error_code` / `status.error_message` when present.
fn embedded_error(value: &Value) -> Option<(i64, String)> {
    let status = value.get("status")?.as_object()?;
    let raw_code = status.get("error_code")?;
    let code = raw_code
        .as_i64()
        .or_else(|| raw_code.as_str().and_then(|s| s.trim().parse().ok()))
        .unwrap_or_default();
    let message = status
        .get("error_message")
        .and_then(Value::as_str)
        .unwrap_or("Unknown error")
        .to_string();
    Some((code, message))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
