//! End-to-end admission scenarios over HTTP.
//!
//! Every test drives the real router: gate middleware, admission controller,
//! in-process store and a stub origin behind the proxy.

use axum::http::{header, StatusCode};
use axum_test::TestServer;
use integration_tests::{fixtures, setup::TestContext};
use room_core::{AdmissionPolicy, RoomConfig};

/// First visit is let through with a fresh session cookie
#[tokio::test]
async fn test_first_visit_reaches_origin_with_cookie() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server.get("/").await;

    response.assert_status_ok();
    assert_eq!(response.text(), "GET /");

    let directive = fixtures::set_cookie(&response).expect("Session cookie should be set");
    assert!(directive.contains("HttpOnly"));
    assert!(directive.contains("Path=/"));
    assert_eq!(fixtures::cookie_max_age(&response), 120);
}

/// Max=3: three visitors admitted, the fourth redirected at rank 0
#[tokio::test]
async fn test_over_capacity_visitor_is_redirected() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    fixtures::admit_visitors(&server, 3).await;

    let response = server.get("/checkout").await;

    response.assert_status(StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/waiting_room.html");
    assert_eq!(response.headers()["x-queue-position"], "0");
    assert_eq!(fixtures::cookie_max_age(&response), 60);

    let token = fixtures::parse_token(&fixtures::session_token(&response));
    assert_eq!(ctx.store.queued_tokens(), vec![token]);
}

/// Queue ranks follow arrival order
#[tokio::test]
async fn test_queue_ranks_follow_arrival_order() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    fixtures::admit_visitors(&server, 3).await;

    for expected in 0..3 {
        let response = server.get("/").await;
        response.assert_status(StatusCode::FOUND);
        assert_eq!(
            response.headers()["x-queue-position"],
            expected.to_string().as_str()
        );
    }
}

/// Returning active session keeps its token and slot
#[tokio::test]
async fn test_returning_session_is_refreshed() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let tokens = fixtures::admit_visitors(&server, 3).await;

    let response = server
        .get("/account")
        .add_header("Cookie", &fixtures::cookie(&tokens[0]))
        .await;

    response.assert_status_ok();
    assert_eq!(response.text(), "GET /account");
    assert_eq!(fixtures::session_token(&response), tokens[0]);
    assert!(ctx.store.queued_tokens().is_empty());
}

/// A garbage cookie is a new session, not an error
#[tokio::test]
async fn test_garbage_cookie_starts_new_session() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server
        .get("/")
        .add_header("Cookie", "wr_session_id=../../etc/passwd")
        .await;

    response.assert_status_ok();
    let token = fixtures::session_token(&response);
    assert_ne!(token, "../../etc/passwd");
    fixtures::parse_token(&token);
}

/// The waiting page polls status and sees its rank
#[tokio::test]
async fn test_status_reports_queue_position() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    fixtures::admit_visitors(&server, 3).await;
    let queued = fixtures::session_token(&server.get("/").await);

    let response = server
        .get("/waiting_room/status")
        .add_header("Cookie", &fixtures::cookie(&queued))
        .await;

    response.assert_status_ok();
    assert_eq!(response.headers()[header::RETRY_AFTER], "5");

    let body: serde_json::Value = response.json();
    assert_eq!(body["state"], "queued");
    assert_eq!(body["position"], 0);
    assert_eq!(body["retry_after_secs"], 5);
}

/// Head of the line is promoted by its own poll once a slot frees
#[tokio::test]
async fn test_poll_promotes_after_slot_frees() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let active = fixtures::admit_visitors(&server, 3).await;
    let queued = fixtures::session_token(&server.get("/").await);

    // First active session times out
    assert!(ctx.store.evict_active(&fixtures::parse_token(&active[0])));

    let response = server
        .get("/waiting_room/status")
        .add_header("Cookie", &fixtures::cookie(&queued))
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["state"], "promoted");
    assert!(body.get("position").is_none());
    assert_eq!(fixtures::cookie_max_age(&response), 120);

    let response = server
        .get("/")
        .add_header("Cookie", &fixtures::cookie(&queued))
        .await;
    response.assert_status_ok();
}

/// A new arrival never cuts ahead of someone already waiting
#[tokio::test]
async fn test_new_arrival_queues_behind_waiting_session() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let active = fixtures::admit_visitors(&server, 3).await;
    let waiting = fixtures::session_token(&server.get("/").await);

    assert!(ctx.store.evict_active(&fixtures::parse_token(&active[0])));

    let newcomer = server.get("/").await;
    newcomer.assert_status(StatusCode::FOUND);
    assert_eq!(newcomer.headers()["x-queue-position"], "0");

    // The freed slot went to the session that was already waiting
    let response = server
        .get("/")
        .add_header("Cookie", &fixtures::cookie(&waiting))
        .await;
    response.assert_status_ok();
}

/// With direct race, a new arrival may take a free slot immediately
#[tokio::test]
async fn test_direct_race_admits_new_arrival() {
    let ctx = TestContext::with_config(RoomConfig {
        admission_policy: AdmissionPolicy::DirectRace,
        ..RoomConfig::with_capacity(1)
    })
    .await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let active = fixtures::admit_visitors(&server, 1).await;
    server.get("/").await.assert_status(StatusCode::FOUND);

    assert!(ctx.store.evict_active(&fixtures::parse_token(&active[0])));

    server.get("/").await.assert_status_ok();
    assert_eq!(ctx.store.queued_tokens().len(), 1);
}

/// The waiting page itself is never gated
#[tokio::test]
async fn test_waiting_page_served_when_full() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    fixtures::admit_visitors(&server, 3).await;

    let response = server.get("/waiting_room.html").await;
    response.assert_status_ok();
    assert!(response.text().contains("/waiting_room/status"));
    assert!(fixtures::set_cookie(&response).is_none());
}

/// Admitted requests keep their path, query and body
#[tokio::test]
async fn test_proxy_forwards_path_query_and_body() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server.get("/products?page=2").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "GET /products?page=2");

    let token = fixtures::session_token(&response);
    let response = server
        .post("/cart")
        .add_header("Cookie", &fixtures::cookie(&token))
        .text("item=42")
        .await;
    response.assert_status_ok();
    assert_eq!(response.text(), "POST /cart item=42");
}

/// Twenty arrivals against capacity 3: three admitted, the rest queued
#[tokio::test]
async fn test_arrivals_never_exceed_capacity() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let mut admitted = 0;
    let mut queued = 0;
    for _ in 0..20 {
        match server.get("/").await.status_code() {
            StatusCode::OK => admitted += 1,
            StatusCode::FOUND => queued += 1,
            other => panic!("unexpected status {}", other),
        }
    }

    assert_eq!(admitted, 3);
    assert_eq!(queued, 17);
    assert_eq!(ctx.store.active_tokens().len(), 3);
    assert_eq!(ctx.store.queued_tokens().len(), 17);
}
