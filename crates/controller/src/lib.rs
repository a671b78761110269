//! Waiting room admission control.
//!
//! - [`AdmissionController`]: per-request Active vs Queued decision
//! - [`QueueManager`]: ordered waiting line over the shared store
//! - [`PromotionScheduler`]: moves queue heads into free slots
//! - [`PromotionWorker`]: optional timer driving the scheduler

pub mod admission;
pub mod promotion;
pub mod queue;
pub mod worker;

pub use admission::AdmissionController;
pub use promotion::{PromotionResult, PromotionScheduler};
pub use queue::QueueManager;
pub use worker::PromotionWorker;
