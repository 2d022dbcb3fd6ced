use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    BoxError, Router,
};
use tower::{timeout::error::Elapsed, ServiceBuilder};
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{config::Config, error::ApiError, main_lib::AppState, rate_limit::rate_limit};

pub mod health;
pub mod price;

async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Turns a handler panic into the JSON 500 body.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    ApiError::Internal(detail).into_response()
}

async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        ApiError::RequestTimeout
    } else {
        ApiError::Internal(err.to_string())
    }
}

/// Wraps `router` in the shared middleware stack, outermost first.
pub fn with_middleware(router: Router, request_timeout: Duration) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(HandleErrorLayer::new(handle_middleware_error))
            .timeout(request_timeout)
            .layer(CatchPanicLayer::custom(handle_panic)),
    )
}

pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let limited = Router::new()
        .route("/price", get(price::get_price))
        .route_layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit,
        ));

    let router = Router::new()
        .merge(limited)
        .route("/health", get(health::get_health))
        .fallback(not_found)
        .with_state(state);

    with_middleware(router, config.request_timeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn ok() -> &'static str {
        "ok"
    }

    fn test_app(request_timeout: Duration) -> Router {
        async fn boom() -> &'static str {
            panic!("handler exploded")
        }

        async fn slow() -> &'static str {
            tokio::time::sleep(Duration::from_secs(60)).await;
            "late"
        }

        let router = Router::new()
            .route("/ok", get(ok))
            .route("/boom", get(boom))
            .route("/slow", get(slow));
        with_middleware(router, request_timeout)
    }

    #[tokio::test]
    async fn test_panic_becomes_json_500() {
        let response = test_app(Duration::from_secs(30))
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"error": "Internal Server Error", "code": 500})
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_json_408() {
        let response = test_app(Duration::from_secs(1))
            .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert!(response.headers().contains_key("x-request-id"));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"error": "Request Timeout", "code": 408})
        );
    }

    #[tokio::test]
    async fn test_request_id_is_generated_when_missing() {
        let response = test_app(Duration::from_secs(30))
            .oneshot(Request::builder().uri("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let id = response.headers()["x-request-id"].to_str().unwrap();
        assert!(!id.is_empty());
    }

    #[tokio::test]
    async fn test_client_request_id_is_echoed() {
        let response = test_app(Duration::from_secs(30))
            .oneshot(
                Request::builder()
                    .uri("/ok")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()["x-request-id"], "abc-123");
    }
}
