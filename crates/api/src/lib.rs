//! HTTP edge for the waiting room.
//!
//! Terminates requests, asks the admission controller for a decision, and
//! either forwards to the origin or redirects to the waiting page.

pub mod extractors;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::{AppState, OriginClient};
