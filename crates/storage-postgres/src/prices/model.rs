//! Database models for the `coingecko` table.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use pricefeed_core::prices::{NewObservation, Observation};

/// Database model for stored observations
#[derive(Queryable, Identifiable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::coingecko)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ObservationDB {
    pub id: i32,
    pub currency_id: String,
    pub currency_value: f64,
    pub timestamp: NaiveDateTime,
}

/// Insert form; `id` and `timestamp` come from column defaults.
#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::coingecko)]
pub struct NewObservationDB {
    pub currency_id: String,
    pub currency_value: f64,
}

impl From<ObservationDB> for Observation {
    fn from(db: ObservationDB) -> Self {
        Self {
            id: db.id,
            currency_id: db.currency_id,
            value: db.currency_value,
            timestamp: db.timestamp,
        }
    }
}

impl From<&NewObservation> for NewObservationDB {
    fn from(row: &NewObservation) -> Self {
        Self {
            currency_id: row.currency_id.clone(),
            currency_value: row.value,
        }
    }
}
