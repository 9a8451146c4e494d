//! Black-box integration tests for the management HTTP surface — verifies
//! only externally visible HTTP behavior, following the same oneshot-request
//! style as the base crate's own health endpoint tests.

use axum::body::Body;
use axum::http::Request;
use hstp_node::activity::{ActivityManager, ActivityManagerConfig};
use hstp_node::activity::validator::ShaclValidator;
use hstp_node::rest_api::{self, ManagementState};
use std::sync::Arc;
use tower::ServiceExt;

fn test_state() -> ManagementState {
    ManagementState {
        activities: Arc::new(ActivityManager::new(Arc::new(ShaclValidator::new()), ActivityManagerConfig::default())),
    }
}

#[tokio::test]
async fn health_endpoint_reports_healthy() {
    let app = rest_api::create_app(test_state());
    let request = Request::builder().uri("/api/v1/health").method("GET").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), 200);

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn stats_endpoint_reports_zero_activities_for_a_fresh_manager() {
    let app = rest_api::create_app(test_state());
    let request = Request::builder().uri("/api/v1/stats").method("GET").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), 200);

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn get_activity_with_unknown_id_is_not_found() {
    let app = rest_api::create_app(test_state());
    let request = Request::builder()
        .uri("/api/v1/activities/11111111-1111-1111-1111-111111111111")
        .method("GET")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn get_activity_with_malformed_id_is_a_bad_request() {
    let app = rest_api::create_app(test_state());
    let request = Request::builder().uri("/api/v1/activities/not-a-uuid").method("GET").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn search_activities_rejects_an_invalid_status_filter() {
    let app = rest_api::create_app(test_state());
    let request = Request::builder()
        .uri("/api/v1/activities?status=not-a-status")
        .method("GET")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), 400);
}
