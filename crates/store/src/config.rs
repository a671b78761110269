//! Store configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which backend holds the shared state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Redis, shared by every gate instance.
    #[default]
    Redis,
    /// In-process state. Single instance only.
    Memory,
}

/// Shared store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Redis connection URL
    #[serde(default = "default_url")]
    pub url: String,
    /// Prefix for every key the waiting room owns
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Per-operation timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_key_prefix() -> String {
    "waiting_room".to_string()
}

fn default_timeout_ms() -> u64 {
    500
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: default_url(),
            key_prefix: default_key_prefix(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Key layout under the configured prefix.
///
/// The prefix is wrapped in a hash tag (`{prefix}`) so all four keys share a
/// cluster slot and the multi-key scripts run on Redis Cluster. A prefix that
/// already carries a tag is used as given.
#[derive(Debug, Clone)]
pub struct RoomKeys {
    /// ZSET token -> active slot expiry (epoch ms)
    pub active: String,
    /// ZSET token -> enqueue sequence number
    pub queue: String,
    /// ZSET token -> abandonment deadline (epoch ms)
    pub queue_deadlines: String,
    /// Counter feeding queue sequence numbers
    pub queue_seq: String,
}

impl RoomKeys {
    pub fn new(prefix: &str) -> Self {
        let prefix = if prefix.contains('{') && prefix.contains('}') {
            prefix.to_string()
        } else {
            format!("{{{}}}", prefix)
        };
        Self {
            active: format!("{}:active_users", prefix),
            queue: format!("{}:queue", prefix),
            queue_deadlines: format!("{}:queue_deadlines", prefix),
            queue_seq: format!("{}:queue_seq", prefix),
        }
    }

    /// Keys in the order every script expects them.
    pub fn as_array(&self) -> [&str; 4] {
        [
            &self.active,
            &self.queue,
            &self.queue_deadlines,
            &self.queue_seq,
        ]
    }
}
