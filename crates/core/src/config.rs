//! Waiting room configuration.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use validator::Validate;

use crate::error::{Error, Result};
use crate::limits::{
    DEFAULT_ACTIVE_TTL_SECS, DEFAULT_COOKIE_NAME, DEFAULT_MAX_ACTIVE_USERS, DEFAULT_QUEUE_TTL_SECS,
    DEFAULT_RETRY_AFTER_SECS, DEFAULT_WAITING_PAGE, MAX_TTL_SECS,
};

/// Whether a brand-new arrival may race for a free slot while others wait.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionPolicy {
    /// Once the queue is non-empty every new arrival enqueues behind it.
    #[default]
    StrictFifo,
    /// New arrivals always try the active set first, even while others wait.
    DirectRace,
}

impl AdmissionPolicy {
    /// Whether direct admission must fail while the queue is non-empty.
    pub fn respects_queue(&self) -> bool {
        matches!(self, Self::StrictFifo)
    }
}

impl FromStr for AdmissionPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict_fifo" => Ok(Self::StrictFifo),
            "direct_race" => Ok(Self::DirectRace),
            other => Err(Error::config(format!("Unknown admission policy '{}'", other))),
        }
    }
}

/// What the edge does when the store cannot be reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Let the request through to the origin.
    Open,
    /// Reject the request with 503.
    #[default]
    Closed,
}

impl FromStr for FailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(Error::config(format!("Unknown failure policy '{}'", other))),
        }
    }
}

/// Admission and queueing parameters.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RoomConfig {
    /// Ceiling on simultaneously active sessions
    #[serde(default = "default_max_active_users")]
    pub max_active_users: i64,
    /// Sliding inactivity TTL for active sessions, in seconds
    #[serde(default = "default_active_ttl_secs")]
    #[validate(range(min = 1, max = 31536000))]
    pub active_ttl_secs: u64,
    /// Abandonment TTL for queued sessions, in seconds
    #[serde(default = "default_queue_ttl_secs")]
    #[validate(range(min = 1, max = 31536000))]
    pub queue_ttl_secs: u64,
    /// Where queued sessions are redirected
    #[serde(default = "default_waiting_page")]
    #[validate(length(min = 1))]
    pub waiting_page: String,
    /// Session cookie name
    #[serde(default = "default_cookie_name")]
    #[validate(length(min = 1, max = 64))]
    pub cookie_name: String,
    /// Poll interval suggested to queued clients, in seconds
    #[serde(default = "default_retry_after_secs")]
    pub retry_after_secs: u64,
    #[serde(default)]
    pub admission_policy: AdmissionPolicy,
    /// Run promotion on a timer as well as on polls. Disabled when unset.
    #[serde(default)]
    pub promotion_interval_secs: Option<u64>,
}

fn default_max_active_users() -> i64 {
    DEFAULT_MAX_ACTIVE_USERS
}

fn default_active_ttl_secs() -> u64 {
    DEFAULT_ACTIVE_TTL_SECS
}

fn default_queue_ttl_secs() -> u64 {
    DEFAULT_QUEUE_TTL_SECS
}

fn default_waiting_page() -> String {
    DEFAULT_WAITING_PAGE.to_string()
}

fn default_cookie_name() -> String {
    DEFAULT_COOKIE_NAME.to_string()
}

fn default_retry_after_secs() -> u64 {
    DEFAULT_RETRY_AFTER_SECS
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_active_users: default_max_active_users(),
            active_ttl_secs: default_active_ttl_secs(),
            queue_ttl_secs: default_queue_ttl_secs(),
            waiting_page: default_waiting_page(),
            cookie_name: default_cookie_name(),
            retry_after_secs: default_retry_after_secs(),
            admission_policy: AdmissionPolicy::default(),
            promotion_interval_secs: None,
        }
    }
}

impl RoomConfig {
    /// Creates a config with the given capacity and default TTLs.
    pub fn with_capacity(max_active_users: i64) -> Self {
        Self {
            max_active_users,
            ..Self::default()
        }
    }

    /// Checks the config before any request is served.
    ///
    /// A capacity below 1 is reported as `CapacityMisconfigured` so startup
    /// can tell it apart from other mistakes.
    pub fn validate_config(&self) -> Result<()> {
        if self.max_active_users < 1 {
            return Err(Error::CapacityMisconfigured(self.max_active_users));
        }
        self.validate()
            .map_err(|e| Error::config(e.to_string()))?;
        if self.promotion_interval_secs == Some(0) {
            return Err(Error::config("promotion_interval_secs must be >= 1"));
        }
        // A client polling at this pace must not be abandoned between polls
        if self.retry_after_secs >= self.queue_ttl_secs {
            return Err(Error::config(format!(
                "retry_after_secs ({}) must be below queue_ttl_secs ({})",
                self.retry_after_secs, self.queue_ttl_secs
            )));
        }
        Ok(())
    }

    /// Capacity as an unsigned count. Only meaningful after validation.
    pub fn capacity(&self) -> u64 {
        self.max_active_users.max(1) as u64
    }

    pub fn active_ttl(&self) -> Duration {
        Duration::from_secs(self.active_ttl_secs)
    }

    pub fn queue_ttl(&self) -> Duration {
        Duration::from_secs(self.queue_ttl_secs)
    }

    pub fn promotion_interval(&self) -> Option<Duration> {
        self.promotion_interval_secs.map(Duration::from_secs)
    }
}
