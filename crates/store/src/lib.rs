//! Shared state store client for the waiting room.
//!
//! All cross-instance coordination happens here. Each [`RoomStore`] operation
//! is a single atomic round trip; callers hold no locks of their own.

pub mod config;
pub mod health;
pub mod memory;
pub mod redis_store;
pub mod scripts;

pub use config::*;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use async_trait::async_trait;
use room_core::{Result, SessionToken};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Capacity-checked admission parameters.
#[derive(Debug, Clone, Copy)]
pub struct AdmitRequest {
    /// Active set ceiling
    pub max_active: u64,
    /// Sliding TTL for the slot
    pub active_ttl: Duration,
    /// Fail while anyone else is queued
    pub respect_queue: bool,
    /// Caller time (epoch ms). Backends with a clock of their own ignore it.
    pub now_ms: i64,
}

/// Active and queued cardinalities at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Occupancy {
    pub active: u64,
    pub queued: u64,
}

impl Occupancy {
    /// Free slots against a ceiling; zero when full or over.
    pub fn free_slots(&self, max_active: u64) -> u64 {
        max_active.saturating_sub(self.active)
    }
}

/// Atomic primitives over the shared active set and queue.
///
/// Implementations must be safe under arbitrary concurrent use from many
/// stateless callers. Expired entries are evicted as part of every call.
///
/// Shared backends measure TTLs on their own clock and ignore `now_ms`;
/// only [`MemoryStore`], which has a single caller clock, honours it.
#[async_trait]
pub trait RoomStore: Send + Sync + 'static {
    /// Adds `token` to the active set if there is room.
    ///
    /// Returns `true` if the token holds a slot afterwards (an already-active
    /// token is refreshed). With `respect_queue`, fails while any other token
    /// is queued ahead. On success the token is removed from the queue.
    async fn try_admit(&self, token: &SessionToken, request: AdmitRequest) -> Result<bool>;

    /// Resets the TTL of an active token. `false` if it is not active.
    async fn refresh_active(
        &self,
        token: &SessionToken,
        active_ttl: Duration,
        now_ms: i64,
    ) -> Result<bool>;

    /// Appends `token` to the queue if absent and returns its 0-based rank.
    ///
    /// Idempotent: re-enqueueing never reorders. Ordering comes from a
    /// store-side sequence, so replicas with skewed clocks agree on it.
    /// Returns `None` if the token already holds an active slot.
    async fn enqueue(
        &self,
        token: &SessionToken,
        queue_ttl: Duration,
        now_ms: i64,
    ) -> Result<Option<u64>>;

    /// Rank of a queued token, extending its abandonment deadline.
    /// `None` if the token is not queued.
    async fn queue_position(
        &self,
        token: &SessionToken,
        queue_ttl: Duration,
        now_ms: i64,
    ) -> Result<Option<u64>>;

    /// Moves up to `limit` queue heads into the active set.
    ///
    /// Pop and admit are one atomic step, capped by free capacity, so a
    /// popped token is never lost and never handed to two callers.
    async fn promote_up_to(&self, limit: u64, request: AdmitRequest) -> Result<Vec<SessionToken>>;

    /// Current active and queued counts.
    async fn occupancy(&self, now_ms: i64) -> Result<Occupancy>;

    /// Checks the backend is reachable.
    async fn ping(&self) -> Result<()>;
}

/// Shared store handle.
pub type SharedStore = Arc<dyn RoomStore>;

/// Builds the configured backend.
pub async fn connect(config: &StoreConfig) -> Result<SharedStore> {
    match config.backend {
        StoreBackend::Redis => {
            let store = RedisStore::connect(config).await?;
            info!(url = %config.url, prefix = %config.key_prefix, "Connected to Redis store");
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            info!("Using in-process store (single instance only)");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
