use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::main_lib::AppState;

pub const CHECK_OK: &str = "ok";

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub database: String,
    pub cache: String,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub checks: HealthChecks,
}

impl HealthReport {
    fn from_checks(database: Result<(), String>, cache: Result<(), String>) -> Self {
        let healthy = database.is_ok() && cache.is_ok();
        Self {
            status: if healthy { "healthy" } else { "unhealthy" },
            checks: HealthChecks {
                database: database.err().unwrap_or_else(|| CHECK_OK.to_string()),
                cache: cache.err().unwrap_or_else(|| CHECK_OK.to_string()),
            },
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Live store and cache probes. 503 when either fails.
pub async fn get_health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthReport>) {
    let store = state.store.clone();
    let database = match tokio::task::spawn_blocking(move || store.ping()).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    if let Err(reason) = &database {
        tracing::error!("Health check database error: {}", reason);
    }

    let cache = state.cache.ping().await.map_err(|e| e.to_string());
    if let Err(reason) = &cache {
        tracing::error!("Health check cache error: {}", reason);
    }

    let report = HealthReport::from_checks(database, cache);
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}
