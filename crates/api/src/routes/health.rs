//! Health check and metrics endpoints.

use axum::{extract::State, http::StatusCode, Json};
use state_store::health::check_connection;
use telemetry::{health, metrics, HealthStatus, MetricsSnapshot};

use crate::response::HealthResponse;
use crate::state::AppState;

/// Pings the store and records the result in the health registry.
async fn probe_store(state: &AppState) -> bool {
    let store = state.controller.queue().store();
    let connected = check_connection(store.as_ref()).await;

    if connected {
        health().store.set_healthy();
    } else {
        health().store.set_unhealthy("store ping failed");
    }
    connected
}

/// GET /health - Full health check.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let store_connected = probe_store(&state).await;
    let status = if store_connected {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy
    };

    Json(HealthResponse {
        status: format!("{:?}", status).to_lowercase(),
        store_connected,
        active_sessions: metrics().active_sessions.get(),
        queue_depth: metrics().queue_depth.get(),
    })
}

/// GET /health/ready - Readiness probe (store reachable, decisions possible).
pub async fn ready_handler(State(state): State<AppState>) -> StatusCode {
    if probe_store(&state).await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health/live - Liveness probe (service is running).
pub async fn live_handler() -> StatusCode {
    if health().is_alive() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /metrics - Counters, gauges and decision latency for this instance.
pub async fn metrics_handler() -> Json<MetricsSnapshot> {
    Json(metrics().snapshot())
}
