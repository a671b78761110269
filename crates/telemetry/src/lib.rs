//! Internal telemetry for the waiting room.
//!
//! Structured logging setup, in-process metrics, and the health registry
//! behind the `/health` probes.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
