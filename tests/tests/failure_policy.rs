//! Store outage handling at the edge.
//!
//! The controller never picks between failing open and closed; these tests
//! verify the edge applies whichever policy the operator configured.

use axum::http::{header, StatusCode};
use axum_test::TestServer;
use integration_tests::{fixtures, setup::OutageContext};
use room_core::FailurePolicy;
use telemetry::metrics;

/// Fail closed: 503 with STORE_001 and a retry hint
#[tokio::test]
async fn test_closed_policy_rejects_with_503() {
    let ctx = OutageContext::new(FailurePolicy::Closed).await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");
    let before = metrics().fail_closed_requests.get();

    let response = server.get("/").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers()[header::RETRY_AFTER], "5");
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "STORE_001");
    assert!(fixtures::set_cookie(&response).is_none());
    assert!(metrics().fail_closed_requests.get() > before);
}

/// Fail open: the origin is reached without a decision
#[tokio::test]
async fn test_open_policy_forwards_to_origin() {
    let ctx = OutageContext::new(FailurePolicy::Open).await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");
    let before = metrics().fail_open_requests.get();

    let response = server.get("/landing").await;

    response.assert_status_ok();
    assert_eq!(response.text(), "GET /landing");
    assert!(fixtures::set_cookie(&response).is_none());
    assert!(metrics().fail_open_requests.get() > before);
}

/// Status polling under each policy
#[tokio::test]
async fn test_status_endpoint_during_outage() {
    let closed = OutageContext::new(FailurePolicy::Closed).await;
    let server = TestServer::new(closed.router.clone()).expect("Failed to create test server");
    let response = server.get("/waiting_room/status").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers()[header::RETRY_AFTER], "5");

    let open = OutageContext::new(FailurePolicy::Open).await;
    let server = TestServer::new(open.router.clone()).expect("Failed to create test server");
    let response = server.get("/waiting_room/status").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["state"], "bypassed");
}

/// Decisions resume as soon as the store is back
#[tokio::test]
async fn test_recovers_when_store_returns() {
    let ctx = OutageContext::new(FailurePolicy::Closed).await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    server
        .get("/")
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);

    ctx.store.set_should_fail(false);

    let response = server.get("/").await;
    response.assert_status_ok();
    let token = fixtures::parse_token(&fixtures::session_token(&response));
    assert_eq!(ctx.store.inner().active_tokens(), vec![token]);
}
