//! HTTP middleware.

pub mod gate;

pub use gate::gate;
