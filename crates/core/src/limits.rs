//! Defaults and bounds for the waiting room.
//!
//! `TOKEN_PATTERN` and `TOKEN_LEN` gate cookie parsing. The `default_*` serde
//! helpers in `config` read the `DEFAULT_*` values.

// === Session Token ===

/// Session tokens are UUID v4 in simple form: 32 lowercase hex chars.
pub const TOKEN_PATTERN: &str = r"^[0-9a-f]{32}$";

/// Length of a rendered session token.
pub const TOKEN_LEN: usize = 32;

/// Cookie carrying the session token.
pub const DEFAULT_COOKIE_NAME: &str = "wr_session_id";

// === Capacity ===

/// Default ceiling on simultaneously active sessions.
pub const DEFAULT_MAX_ACTIVE_USERS: i64 = 100;

// === TTLs (seconds) ===

/// Sliding inactivity window for an active slot.
pub const DEFAULT_ACTIVE_TTL_SECS: u64 = 120;

/// How long a queued session survives without polling.
pub const DEFAULT_QUEUE_TTL_SECS: u64 = 60;

/// Upper bound on either TTL: one year. Keeps deadlines in epoch-ms range.
pub const MAX_TTL_SECS: u64 = 31_536_000;

// === Waiting Page ===

/// Redirect target for queued sessions.
pub const DEFAULT_WAITING_PAGE: &str = "/waiting_room.html";

/// Poll interval suggested to queued clients.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 5;
