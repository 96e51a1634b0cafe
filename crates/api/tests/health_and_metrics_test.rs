use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tlsprobe_api::{create_api_routes, AppState};
use tlsprobe_application::Registry;
use tlsprobe_infrastructure::RustlsTlsHandshaker;
use tower::ServiceExt;

fn test_registry() -> Arc<Registry> {
    Arc::new(Registry::new(
        4,
        4,
        Arc::new(RustlsTlsHandshaker::new()),
        HashMap::new(),
    ))
}

#[tokio::test]
async fn health_is_500_before_ready_and_200_after() {
    let state = AppState::new(test_registry());
    let app = create_api_routes(state.clone());

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    state.mark_ready();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn metrics_endpoint_renders_openmetrics_text_with_no_checkers() {
    let state = AppState::new(test_registry());
    let app = create_api_routes(state);

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("application/openmetrics-text"));

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("# EOF"));
}
