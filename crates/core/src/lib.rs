//! Core types, configuration, and session identity for the waiting room.

pub mod config;
pub mod decision;
pub mod error;
pub mod limits;
pub mod session;

pub use config::*;
pub use decision::*;
pub use error::{Error, ErrorCode, Result};
pub use session::*;
