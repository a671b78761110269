//! Promotion scheduler.
//!
//! Moves sessions from the queue into the active set as slots free. Runs
//! whenever a queued session polls, and optionally on a timer (see
//! [`crate::worker::PromotionWorker`]) so the line advances even when nobody
//! near the front is polling.

use tracing::debug;

use room_core::{Result, SessionToken};
use telemetry::metrics;

use crate::queue::QueueManager;

/// What a poll from a queued session resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionResult {
    /// The caller now holds an active slot.
    Promoted,
    /// Still waiting at this rank.
    Waiting { position: u64 },
    /// The caller is in neither structure any more (abandonment TTL elapsed).
    Gone,
}

/// Advances the queue against free capacity.
#[derive(Clone)]
pub struct PromotionScheduler {
    queue: QueueManager,
}

impl PromotionScheduler {
    pub fn new(queue: QueueManager) -> Self {
        Self { queue }
    }

    /// Re-evaluates capacity on behalf of a queued caller at `rank`.
    ///
    /// The free-slot count is an estimate; `promote_next` re-checks capacity
    /// atomically, so a stale estimate only costs a wasted round trip.
    pub async fn advance(
        &self,
        token: &SessionToken,
        rank: u64,
        now_ms: i64,
    ) -> Result<PromotionResult> {
        let occupancy = self.queue.occupancy(now_ms).await?;
        let free = occupancy.free_slots(self.queue.config().capacity());

        if free == 0 {
            return Ok(PromotionResult::Waiting { position: rank });
        }

        metrics().promotion_runs.inc();
        let promoted = self.queue.promote_next(free, now_ms).await?;
        if promoted.contains(token) {
            debug!(token = %token, promoted = promoted.len(), "Caller promoted");
            return Ok(PromotionResult::Promoted);
        }

        match self.queue.position(token, now_ms).await? {
            Some(position) => Ok(PromotionResult::Waiting { position }),
            None => self.resolve_missing(token, now_ms).await,
        }
    }

    /// Promotes as many heads as capacity allows, with no caller attached.
    pub async fn run_once(&self, now_ms: i64) -> Result<Vec<SessionToken>> {
        let occupancy = self.queue.occupancy(now_ms).await?;
        let free = occupancy.free_slots(self.queue.config().capacity());

        if free == 0 || occupancy.queued == 0 {
            return Ok(Vec::new());
        }

        metrics().promotion_runs.inc();
        self.queue.promote_next(free, now_ms).await
    }

    /// A caller that left the queue between our calls was either promoted
    /// by a concurrent promoter or abandoned.
    async fn resolve_missing(&self, token: &SessionToken, now_ms: i64) -> Result<PromotionResult> {
        let config = self.queue.config();
        let active = self
            .queue
            .store()
            .refresh_active(token, config.active_ttl(), now_ms)
            .await?;

        if active {
            Ok(PromotionResult::Promoted)
        } else {
            Ok(PromotionResult::Gone)
        }
    }
}
