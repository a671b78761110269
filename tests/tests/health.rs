//! Tests for health check endpoints.

use axum::http::StatusCode;
use axum_test::TestServer;
use integration_tests::setup::{OutageContext, TestContext};
use room_core::FailurePolicy;

/// Test /health endpoint returns proper structure
#[tokio::test]
async fn test_health_endpoint_structure() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();

    for field in ["status", "store_connected", "active_sessions", "queue_depth"] {
        assert!(
            body.get(field).is_some(),
            "Response should have '{}' field",
            field
        );
    }
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store_connected"], true);
}

/// Readiness follows store reachability
#[tokio::test]
async fn test_ready_follows_store() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");
    server.get("/health/ready").await.assert_status_ok();

    let outage = OutageContext::new(FailurePolicy::Closed).await;
    let server = TestServer::new(outage.router.clone()).expect("Failed to create test server");
    server
        .get("/health/ready")
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);

    let body: serde_json::Value = server.get("/health").await.json();
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["store_connected"], false);
}

/// Test /health/live endpoint
#[tokio::test]
async fn test_live_endpoint() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    server.get("/health/live").await.assert_status_ok();
}

/// Probes are never gated, even with the room full
#[tokio::test]
async fn test_probes_bypass_gate() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    for _ in 0..5 {
        server.get("/").await;
    }

    server.get("/health/live").await.assert_status_ok();
    server.get("/health/ready").await.assert_status_ok();
}

/// Metrics snapshot counts decisions and stays reachable when full
#[tokio::test]
async fn test_metrics_snapshot_reports_decisions() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    for _ in 0..4 {
        server.get("/").await;
    }

    let response = server.get("/metrics").await;
    response.assert_status_ok();

    // Counters are process-wide, so other tests may have added to them
    let body: serde_json::Value = response.json();
    assert!(body["decisions"].as_u64().unwrap() >= 4);
    assert!(body["admitted_direct"].as_u64().unwrap() >= 3);
    assert!(body["sessions_queued"].as_u64().unwrap() >= 1);
    assert_eq!(body["decision_latency_buckets"].as_array().unwrap().len(), 11);
}
