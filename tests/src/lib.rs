//! Integration test harness for the waiting room.
//!
//! HTTP scenarios run against the real router over the in-process store and
//! a stub origin. Redis scenarios need Docker and are ignored by default.

pub mod containers;
pub mod fixtures;
pub mod mocks;
pub mod setup;
