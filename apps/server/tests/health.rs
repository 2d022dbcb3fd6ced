mod support;

use std::sync::Arc;

use axum::http::StatusCode;
use pricefeed_core::cache::MemoryCache;
use pricefeed_server::api::app_router;
use serde_json::json;
use tower::ServiceExt;

use support::{body_json, get_from, router_with, state_with, test_config, DownCache, FakeStore};

#[tokio::test]
async fn health_reports_ok() {
    let app = router_with(&FakeStore::new());

    let response = app
        .oneshot(get_from("/health", "192.0.2.1:40000"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"status": "healthy", "checks": {"database": "ok", "cache": "ok"}})
    );
}

#[tokio::test]
async fn health_reports_database_failure() {
    let store = FakeStore::new();
    store.set_down(true);
    let app = router_with(&store);

    let response = app
        .oneshot(get_from("/health", "192.0.2.1:40000"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["checks"]["cache"], "ok");
    let reason = body["checks"]["database"].as_str().unwrap();
    assert!(reason.contains("connection refused"), "reason: {}", reason);
}

#[tokio::test]
async fn health_reports_cache_failure() {
    let store = FakeStore::new();
    let app = app_router(state_with(&store, Arc::new(DownCache)), &test_config());

    let response = app
        .oneshot(get_from("/health", "192.0.2.1:40000"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["checks"]["database"], "ok");
    assert_ne!(body["checks"]["cache"], "ok");
}

#[tokio::test]
async fn health_is_not_rate_limited() {
    let app = app_router(
        state_with(&FakeStore::new(), Arc::new(MemoryCache::new())),
        &test_config(),
    );

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(get_from("/health", "192.0.2.1:40000"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
