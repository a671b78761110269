//! Unified error types for the waiting room.
//!
//! Error codes:
//! - STORE_001: Shared state store unreachable or failed
//! - TOKEN_001: Session cookie present but not a valid token
//! - CONFIG_001: Capacity misconfigured (max active users must be >= 1)
//! - CONFIG_002: Any other invalid configuration
//! - INTERNAL_001: Internal errors

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Stable error codes exposed to the edge and to logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// STORE_001: Store unavailable
    StoreUnavailable,
    /// TOKEN_001: Malformed session token
    MalformedToken,
    /// CONFIG_001: Capacity misconfigured
    CapacityMisconfigured,
    /// CONFIG_002: Invalid configuration
    InvalidConfig,
    /// INTERNAL_001: Internal error
    Internal,
}

impl ErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::StoreUnavailable => "STORE_001",
            Self::MalformedToken => "TOKEN_001",
            Self::CapacityMisconfigured => "CONFIG_001",
            Self::InvalidConfig => "CONFIG_002",
            Self::Internal => "INTERNAL_001",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::StoreUnavailable => 503,
            Self::MalformedToken => 400,
            Self::CapacityMisconfigured => 500,
            Self::InvalidConfig => 500,
            Self::Internal => 500,
        }
    }
}

/// Unified error type for the waiting room.
#[derive(Debug, Error)]
pub enum Error {
    /// The shared store could not be reached or rejected the operation.
    ///
    /// Fatal to the current decision only. The edge decides whether to
    /// fail open or closed.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Cookie value present but not a token we issued.
    ///
    /// Never surfaced to clients: the controller treats it as "no token".
    #[error("malformed session token")]
    MalformedToken,

    /// `max_active_users` below 1. Startup-time fatal.
    #[error("capacity misconfigured: max_active_users must be >= 1, got {0}")]
    CapacityMisconfigured(i64),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the stable error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::StoreUnavailable(_) => ErrorCode::StoreUnavailable,
            Self::MalformedToken => ErrorCode::MalformedToken,
            Self::CapacityMisconfigured(_) => ErrorCode::CapacityMisconfigured,
            Self::Config(_) => ErrorCode::InvalidConfig,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        self.code().http_status()
    }

    /// Whether this error came from the shared store.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}
