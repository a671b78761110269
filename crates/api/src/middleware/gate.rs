//! Waiting room gate.
//!
//! Wraps any service. Every request is run through the admission controller
//! first: active sessions pass through, queued sessions are redirected to the
//! waiting page. Both get the session cookie set or refreshed.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use room_core::{session_cookie, CookieDirective, Error, FailurePolicy, GateOutcome, GateRequest};
use telemetry::metrics;
use tracing::{error, warn};

use crate::extractors::SessionCookie;
use crate::response::ApiError;
use crate::state::AppState;

/// Rank of a redirected session, for clients that want it without polling.
pub const QUEUE_POSITION_HEADER: &str = "x-queue-position";

/// Gate middleware. Install with `axum::middleware::from_fn_with_state`.
pub async fn gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let SessionCookie(token) =
        SessionCookie::from_headers(request.headers(), &state.room().cookie_name);

    let gate = match state.controller.gate(GateRequest::new(token)).await {
        Ok(gate) => gate,
        Err(e) if e.is_store_unavailable() => return on_store_failure(&state, e, request, next).await,
        Err(e) => {
            error!(error = %e, "Gate decision failed");
            return ApiError::from(e).into_response();
        }
    };

    let mut response = match gate.outcome {
        GateOutcome::Allow => next.run(request).await,
        GateOutcome::Redirect { location, position } => redirect(&location, position),
    };

    attach_cookie(&mut response, &state.room().cookie_name, &gate.cookie);
    response
}

/// Applies the operator's failure policy.
async fn on_store_failure(state: &AppState, err: Error, request: Request, next: Next) -> Response {
    match state.failure_policy {
        FailurePolicy::Open => {
            metrics().fail_open_requests.inc();
            warn!(error = %err, "Store unavailable, failing open");
            next.run(request).await
        }
        FailurePolicy::Closed => {
            metrics().fail_closed_requests.inc();
            warn!(error = %err, "Store unavailable, failing closed");
            ApiError::from(err)
                .with_retry_after(state.room().retry_after_secs)
                .into_response()
        }
    }
}

fn redirect(location: &str, position: u64) -> Response {
    let Ok(location) = HeaderValue::from_str(location) else {
        error!(location = %location, "Waiting page is not a valid header value");
        return ApiError::internal("Invalid waiting page location").into_response();
    };

    let mut response = StatusCode::FOUND.into_response();
    let headers = response.headers_mut();
    headers.insert(header::LOCATION, location);
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(QUEUE_POSITION_HEADER, HeaderValue::from(position));
    response
}

/// Appends the `Set-Cookie` directive for the session.
pub(crate) fn attach_cookie(response: &mut Response, cookie_name: &str, cookie: &CookieDirective) {
    let value = session_cookie(cookie_name, &cookie.token, cookie.max_age);
    match HeaderValue::from_str(&value) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(_) => error!(cookie_name = %cookie_name, "Cookie name is not a valid header value"),
    }
}
