//! Connection pool and migrations.

use log::{error, info};
use std::sync::Arc;
use std::time::Duration;

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::errors::{IntoCore, StorageError};
use pricefeed_core::Result;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Upper bound on pooled connections.
pub const MAX_POOL_SIZE: u32 = 5;

/// How long a checkout waits for a free connection.
pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

pub type DbPool = Pool<ConnectionManager<PgConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<PgConnection>>;

/// Builds a `postgres://` URL from its parts.
pub fn database_url(host: &str, port: u16, user: &str, password: &str, name: &str) -> String {
    if password.is_empty() {
        format!("postgres://{}@{}:{}/{}", user, host, port, name)
    } else {
        format!("postgres://{}:{}@{}:{}/{}", user, password, host, port, name)
    }
}

/// Creates the shared pool.
///
/// `max_size` is clamped to 1..=[`MAX_POOL_SIZE`]; one connection is kept
/// idle.
pub fn create_pool(database_url: &str, max_size: u32) -> Result<Arc<DbPool>> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(max_size.clamp(1, MAX_POOL_SIZE))
        .min_idle(Some(1))
        .connection_timeout(CONNECTION_TIMEOUT)
        .build(manager)
        .map_err(|e| StorageError::PoolBuildFailed(e.to_string()))?;
    Ok(Arc::new(pool))
}

/// Gets a connection from the pool.
pub fn get_connection(pool: &DbPool) -> Result<DbConnection> {
    pool.get().into_core()
}

pub fn run_migrations(pool: &DbPool) -> Result<()> {
    let mut connection = get_connection(pool)?;
    migrate(&mut connection)
}

/// Applies pending migrations on `connection`.
///
/// Also adopts a `coingecko` table left by an earlier deployment: rows with
/// NULL columns are removed and `currency_value` is widened to
/// `DOUBLE PRECISION`.
pub fn migrate(connection: &mut PgConnection) -> Result<()> {
    info!("Running database migrations");

    let applied = connection.run_pending_migrations(MIGRATIONS).map_err(|e| {
        error!("Database migration failed: {}", e);
        StorageError::MigrationFailed(e.to_string())
    })?;

    if applied.is_empty() {
        info!("No pending migrations to apply.");
    } else {
        info!("Applied the following migrations:");
        for migration_version in &applied {
            info!("  - {}", migration_version);
        }
    }

    Ok(())
}
