//! Admission decisions and the edge contract.
//!
//! The edge hands the controller a [`GateRequest`] and receives a
//! [`GateResponse`]: either let the request through, or redirect it to the
//! waiting page, plus the cookie directive to attach either way.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::RoomConfig;
use crate::session::SessionToken;

/// Result of running one request through admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Admission {
    /// Already active; the sliding TTL was reset.
    Refreshed,
    /// Won a free slot on first contact.
    Admitted,
    /// Moved from the queue into the active set.
    Promoted,
    /// Waiting. `position` is the 0-based rank in the queue.
    Queued { position: u64 },
}

impl Admission {
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Queued { .. })
    }

    pub fn position(&self) -> Option<u64> {
        match self {
            Self::Queued { position } => Some(*position),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Refreshed => "refreshed",
            Self::Admitted => "admitted",
            Self::Promoted => "promoted",
            Self::Queued { .. } => "queued",
        }
    }
}

/// Decision for a single session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub token: SessionToken,
    /// True when the token was minted for this request.
    pub issued: bool,
    pub admission: Admission,
}

impl Decision {
    pub fn is_active(&self) -> bool {
        self.admission.is_active()
    }

    /// Cookie lifetime mirrors the TTL of the structure holding the token.
    pub fn cookie_max_age(&self, config: &RoomConfig) -> Duration {
        if self.is_active() {
            config.active_ttl()
        } else {
            config.queue_ttl()
        }
    }
}

/// Per-request input from the edge.
#[derive(Debug, Clone)]
pub struct GateRequest {
    pub token: Option<SessionToken>,
    pub now: DateTime<Utc>,
}

impl GateRequest {
    pub fn new(token: Option<SessionToken>) -> Self {
        Self {
            token,
            now: Utc::now(),
        }
    }

    pub fn at(token: Option<SessionToken>, now: DateTime<Utc>) -> Self {
        Self { token, now }
    }

    /// Request time in epoch milliseconds, the unit the store works in.
    pub fn now_ms(&self) -> i64 {
        self.now.timestamp_millis()
    }
}

/// What the edge should do with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Allow,
    Redirect { location: String, position: u64 },
}

/// Instruction to set or refresh the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieDirective {
    pub token: SessionToken,
    pub max_age: Duration,
}

/// Per-request output to the edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateResponse {
    pub outcome: GateOutcome,
    pub cookie: CookieDirective,
    pub decision: Decision,
}

impl GateResponse {
    /// Maps a decision onto the edge contract.
    pub fn from_decision(decision: Decision, config: &RoomConfig) -> Self {
        let outcome = match decision.admission {
            Admission::Queued { position } => GateOutcome::Redirect {
                location: config.waiting_page.clone(),
                position,
            },
            _ => GateOutcome::Allow,
        };

        let cookie = CookieDirective {
            token: decision.token.clone(),
            max_age: decision.cookie_max_age(config),
        };

        Self {
            outcome,
            cookie,
            decision,
        }
    }
}
