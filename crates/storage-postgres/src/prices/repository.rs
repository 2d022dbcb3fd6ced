use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel::sql_query;
use log::{debug, warn};
use std::sync::Arc;

use super::model::{NewObservationDB, ObservationDB};
use crate::db::{get_connection, DbConnection, DbPool};
use crate::errors::{IntoCore, StorageError};
use crate::schema::coingecko::dsl as coingecko_dsl;
use pricefeed_core::prices::{
    InsertReport, NewObservation, Observation, PriceStore, PriceStoreSession, RowFailure,
};
use pricefeed_core::Result;

pub struct PriceRepository {
    pool: Arc<DbPool>,
}

impl PriceRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl PriceStore for PriceRepository {
    fn open_session(&self) -> Result<Box<dyn PriceStoreSession>> {
        let conn = get_connection(&self.pool)?;
        Ok(Box::new(PgPriceSession { conn }))
    }

    fn latest_observations(
        &self,
        currency_ids: &[String],
        limit: i64,
    ) -> Result<Vec<Observation>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = coingecko_dsl::coingecko
            .filter(coingecko_dsl::currency_id.eq_any(currency_ids))
            .order((coingecko_dsl::timestamp.desc(), coingecko_dsl::id.desc()))
            .limit(limit)
            .select(ObservationDB::as_select())
            .load::<ObservationDB>(&mut conn)
            .into_core()?;

        Ok(rows.into_iter().map(Observation::from).collect())
    }

    fn ping(&self) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;
        sql_query("SELECT 1").execute(&mut conn).into_core()?;
        Ok(())
    }
}

/// One pooled connection leased for a batch of inserts.
pub struct PgPriceSession {
    conn: DbConnection,
}

impl PriceStoreSession for PgPriceSession {
    fn insert_observations(&mut self, rows: &[NewObservation]) -> Result<InsertReport> {
        let conn: &mut PgConnection = &mut self.conn;

        conn.transaction::<_, DieselError, _>(|conn| {
            let mut report = InsertReport::default();
            for row in rows {
                let db_row = NewObservationDB::from(row);
                // Savepoint per row so one failure leaves the outer transaction usable.
                let inserted = conn.transaction::<_, DieselError, _>(|conn| {
                    diesel::insert_into(coingecko_dsl::coingecko)
                        .values(&db_row)
                        .execute(conn)
                });
                match inserted {
                    Ok(_) => {
                        debug!("Inserted price for {}: {}", row.currency_id, row.value);
                        report.inserted += 1;
                    }
                    Err(e) => {
                        warn!("Insert failed for {}: {}", row.currency_id, e);
                        report.failures.push(RowFailure {
                            currency_id: row.currency_id.clone(),
                            message: e.to_string(),
                        });
                    }
                }
            }
            Ok(report)
        })
        .map_err(|e| StorageError::TransactionFailed(e).into())
    }
}
