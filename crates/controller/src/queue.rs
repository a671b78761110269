//! Queue manager.
//!
//! Thin typed layer over the store's ordered waiting line. Ranks are always
//! read from the store, never cached, because promotions move them.

use std::sync::Arc;

use room_core::{Result, RoomConfig, SessionToken};
use state_store::{AdmitRequest, Occupancy, SharedStore};
use telemetry::metrics;

/// Ordered waiting line shared by every gate instance.
#[derive(Clone)]
pub struct QueueManager {
    store: SharedStore,
    config: Arc<RoomConfig>,
}

impl QueueManager {
    pub fn new(store: SharedStore, config: Arc<RoomConfig>) -> Self {
        Self { store, config }
    }

    /// Adds a token at the back of the line, or returns its current rank.
    ///
    /// `None` means the token already holds an active slot.
    pub async fn enqueue(&self, token: &SessionToken, now_ms: i64) -> Result<Option<u64>> {
        self.store
            .enqueue(token, self.config.queue_ttl(), now_ms)
            .await
    }

    /// "My position": 0-based rank, or `None` if the token is not queued.
    ///
    /// Counts as a sign of life and pushes back the abandonment deadline.
    pub async fn position(&self, token: &SessionToken, now_ms: i64) -> Result<Option<u64>> {
        self.store
            .queue_position(token, self.config.queue_ttl(), now_ms)
            .await
    }

    /// "Promote next": moves up to `limit` heads of the line into the active set.
    pub async fn promote_next(&self, limit: u64, now_ms: i64) -> Result<Vec<SessionToken>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let request = AdmitRequest {
            max_active: self.config.capacity(),
            active_ttl: self.config.active_ttl(),
            respect_queue: false,
            now_ms,
        };
        let promoted = self.store.promote_up_to(limit, request).await?;
        metrics().sessions_promoted.inc_by(promoted.len() as u64);
        Ok(promoted)
    }

    /// Current occupancy. Also refreshes this instance's gauges.
    pub async fn occupancy(&self, now_ms: i64) -> Result<Occupancy> {
        let occupancy = self.store.occupancy(now_ms).await?;
        metrics().active_sessions.set(occupancy.active);
        metrics().queue_depth.set(occupancy.queued);
        Ok(occupancy)
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }
}
