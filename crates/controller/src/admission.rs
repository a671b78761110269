//! Admission controller.
//!
//! Per-token state machine: `Unknown -> {Active, Queued} -> Expired`, where
//! expiry is implicit (the token simply vanishes from the store). For each
//! request:
//!
//! 1. No token: issue one and treat the session as new.
//! 2. Active: refresh the sliding TTL and let it through.
//! 3. Queued: hand over to the [`PromotionScheduler`].
//! 4. New or unknown: race for a free slot; on failure join the back of the
//!    line and give the scheduler one chance to hand out spare capacity in
//!    FIFO order.
//!
//! The controller holds no mutable state of its own; every transition is one
//! of the store's atomic primitives.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use room_core::{
    Admission, Decision, GateRequest, GateResponse, Result, RoomConfig, SessionToken,
};
use state_store::{AdmitRequest, SharedStore};
use telemetry::metrics;

use crate::promotion::{PromotionResult, PromotionScheduler};
use crate::queue::QueueManager;

/// Decides Active vs Queued for every request.
#[derive(Clone)]
pub struct AdmissionController {
    store: SharedStore,
    config: Arc<RoomConfig>,
    queue: QueueManager,
    scheduler: PromotionScheduler,
}

impl AdmissionController {
    /// Creates a controller. Fails on invalid configuration, including
    /// `CapacityMisconfigured`, so a bad capacity never reaches a request.
    pub fn new(store: SharedStore, config: RoomConfig) -> Result<Self> {
        config.validate_config()?;

        let config = Arc::new(config);
        let queue = QueueManager::new(store.clone(), config.clone());
        let scheduler = PromotionScheduler::new(queue.clone());

        Ok(Self {
            store,
            config,
            queue,
            scheduler,
        })
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn queue(&self) -> &QueueManager {
        &self.queue
    }

    pub fn scheduler(&self) -> &PromotionScheduler {
        &self.scheduler
    }

    /// Edge callback: decision plus what to do with the request and cookie.
    pub async fn gate(&self, request: GateRequest) -> Result<GateResponse> {
        let decision = self.decide(request).await?;
        Ok(GateResponse::from_decision(decision, &self.config))
    }

    /// Runs one request through the state machine.
    ///
    /// Store failures are returned as `StoreUnavailable`; the caller owns the
    /// fail-open/fail-closed choice.
    pub async fn decide(&self, request: GateRequest) -> Result<Decision> {
        let start = Instant::now();
        metrics().decisions.inc();

        let now_ms = request.now_ms();
        let (token, issued) = match request.token {
            Some(token) => (token, false),
            None => {
                metrics().tokens_issued.inc();
                (SessionToken::issue(), true)
            }
        };

        let admission = match self.admit(&token, issued, now_ms).await {
            Ok(admission) => admission,
            Err(e) => {
                metrics().store_errors.inc();
                warn!(token = %token, error = %e, "Admission decision failed");
                return Err(e);
            }
        };

        match admission {
            Admission::Refreshed => metrics().active_refreshed.inc(),
            Admission::Admitted => metrics().admitted_direct.inc(),
            Admission::Promoted => metrics().admitted_promoted.inc(),
            Admission::Queued { .. } => metrics().sessions_queued.inc(),
        }

        let latency_ms = start.elapsed().as_millis() as u64;
        metrics().decision_latency_ms.observe(latency_ms);

        debug!(
            token = %token,
            issued = issued,
            state = admission.as_str(),
            position = ?admission.position(),
            latency_ms = latency_ms,
            "Admission decided"
        );

        Ok(Decision {
            token,
            issued,
            admission,
        })
    }

    async fn admit(&self, token: &SessionToken, issued: bool, now_ms: i64) -> Result<Admission> {
        // A freshly issued token cannot be in the store yet
        if !issued {
            if self
                .store
                .refresh_active(token, self.config.active_ttl(), now_ms)
                .await?
            {
                return Ok(Admission::Refreshed);
            }

            if let Some(rank) = self.queue.position(token, now_ms).await? {
                match self.scheduler.advance(token, rank, now_ms).await? {
                    PromotionResult::Promoted => return Ok(Admission::Promoted),
                    PromotionResult::Waiting { position } => {
                        return Ok(Admission::Queued { position })
                    }
                    // Abandoned between calls: start over as unknown
                    PromotionResult::Gone => {}
                }
            }
        }

        let request = AdmitRequest {
            max_active: self.config.capacity(),
            active_ttl: self.config.active_ttl(),
            respect_queue: self.config.admission_policy.respects_queue(),
            now_ms,
        };
        if self.store.try_admit(token, request).await? {
            return Ok(Admission::Admitted);
        }

        let Some(rank) = self.queue.enqueue(token, now_ms).await? else {
            // Became active concurrently
            return Ok(Admission::Refreshed);
        };

        match self.scheduler.advance(token, rank, now_ms).await? {
            PromotionResult::Promoted => Ok(Admission::Promoted),
            PromotionResult::Waiting { position } => Ok(Admission::Queued { position }),
            PromotionResult::Gone => Ok(Admission::Queued { position: rank }),
        }
    }
}
