//! Background promotion worker.

use std::time::Duration;

use chrono::Utc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::promotion::PromotionScheduler;

/// Periodically advances the queue so heads are promoted even when they are
/// not the ones polling.
pub struct PromotionWorker {
    scheduler: PromotionScheduler,
    interval: Duration,
}

impl PromotionWorker {
    pub fn new(scheduler: PromotionScheduler, interval: Duration) -> Self {
        Self {
            scheduler,
            interval,
        }
    }

    /// Spawns the worker loop.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        info!(interval_ms = self.interval.as_millis() as u64, "Promotion worker started");
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&self) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    /// One promotion pass. Errors are logged; the next tick retries.
    pub async fn tick(&self) -> usize {
        match self.scheduler.run_once(Utc::now().timestamp_millis()).await {
            Ok(promoted) => {
                if !promoted.is_empty() {
                    debug!(promoted = promoted.len(), "Promotion worker advanced queue");
                }
                promoted.len()
            }
            Err(e) => {
                error!("Promotion worker error: {}", e);
                0
            }
        }
    }
}
