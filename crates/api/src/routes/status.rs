//! Queue status endpoint polled by the waiting page.
//!
//! Polling runs the full admission decision: it keeps the queue entry alive
//! and is what hands a free slot to the head of the line.

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use room_core::{FailurePolicy, GateRequest};
use telemetry::metrics;
use tracing::warn;

use crate::extractors::SessionCookie;
use crate::middleware::gate::attach_cookie;
use crate::response::{ApiError, StatusResponse};
use crate::state::AppState;

/// State reported when the store is down and the room fails open.
pub const BYPASSED_STATE: &str = "bypassed";

/// GET /waiting_room/status
pub async fn status_handler(
    State(state): State<AppState>,
    SessionCookie(token): SessionCookie,
) -> Result<Response, ApiError> {
    let retry_after_secs = state.room().retry_after_secs;

    let gate = match state.controller.gate(GateRequest::new(token)).await {
        Ok(gate) => gate,
        Err(e) if e.is_store_unavailable() => {
            return match state.failure_policy {
                FailurePolicy::Open => {
                    metrics().fail_open_requests.inc();
                    warn!(error = %e, "Store unavailable, status reports bypass");
                    Ok(no_store(Json(StatusResponse {
                        state: BYPASSED_STATE.to_string(),
                        position: None,
                        retry_after_secs: None,
                    })))
                }
                FailurePolicy::Closed => {
                    metrics().fail_closed_requests.inc();
                    Err(ApiError::from(e).with_retry_after(retry_after_secs))
                }
            };
        }
        Err(e) => return Err(e.into()),
    };

    let body = StatusResponse::from_admission(&gate.decision.admission, retry_after_secs);
    let retry_after = body.retry_after_secs;

    let mut response = no_store(Json(body));
    if let Some(secs) = retry_after {
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(secs));
    }
    attach_cookie(&mut response, &state.room().cookie_name, &gate.cookie);

    Ok(response)
}

fn no_store(body: impl IntoResponse) -> Response {
    let mut response = body.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
