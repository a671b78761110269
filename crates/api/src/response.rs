//! Standardized API responses.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use room_core::Admission;

/// Body of `GET /waiting_room/status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// `refreshed`, `admitted`, `promoted` or `queued`
    pub state: String,
    /// 0-based rank, only while queued
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u64>,
    /// Suggested delay before the next poll, only while queued
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl StatusResponse {
    pub fn from_admission(admission: &Admission, retry_after_secs: u64) -> Self {
        Self {
            state: admission.as_str().to_string(),
            position: admission.position(),
            retry_after_secs: admission.position().map(|_| retry_after_secs),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub store_connected: bool,
    pub active_sessions: u64,
    pub queue_depth: u64,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

/// API error with a stable error code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ErrorResponse,
    pub retry_after: Option<u64>,
}

impl ApiError {
    pub fn with_code(status: StatusCode, code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            status,
            response: ErrorResponse::new(msg, code),
            retry_after: None,
        }
    }

    pub fn bad_gateway(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::BAD_GATEWAY, "ORIGIN_001", msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_001", msg)
    }

    pub fn with_retry_after(mut self, secs: u64) -> Self {
        self.retry_after = Some(secs);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.response)).into_response();

        if let Some(retry_after) = self.retry_after {
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}

impl From<room_core::Error> for ApiError {
    fn from(err: room_core::Error) -> Self {
        let code = err.code();
        let status =
            StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        ApiError::with_code(status, code.code(), err.to_string())
    }
}
