//! Origin forwarding.
//!
//! Every path not owned by the waiting room is relayed to the origin once the
//! gate has let it through. Bodies are buffered; streaming is not needed for
//! the pages a waiting room sits in front of.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::Response,
};
use bytes::Bytes;
use tracing::{debug, warn};

use crate::response::ApiError;
use crate::state::AppState;

/// Maximum request body relayed upstream (10MB).
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Headers scoped to a single connection, never forwarded.
static HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::CONTENT_LENGTH,
];

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
    headers.remove("keep-alive");
}

/// Fallback handler: relays the request to `origin_url`.
pub async fn proxy_handler(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, ApiError> {
    let (parts, body) = request.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = state.origin.target(path_and_query)?;

    let body = to_bytes(body, MAX_BODY_BYTES).await.map_err(|e| {
        ApiError::with_code(StatusCode::PAYLOAD_TOO_LARGE, "ORIGIN_002", e.to_string())
    })?;

    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);
    if let Some(host) = headers.remove(header::HOST) {
        headers.insert("x-forwarded-host", host);
    }

    debug!(method = %parts.method, url = %url, "Forwarding to origin");

    let upstream = state
        .origin
        .http()
        .request(parts.method, url)
        .headers(headers)
        .body(body)
        .send()
        .await
        .map_err(|e| {
            warn!(error = %e, "Origin request failed");
            ApiError::bad_gateway("Origin unavailable")
        })?;

    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    strip_hop_by_hop(&mut headers);

    let body: Bytes = upstream.bytes().await.map_err(|e| {
        warn!(error = %e, "Failed to read origin response");
        ApiError::bad_gateway("Origin response interrupted")
    })?;

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}
