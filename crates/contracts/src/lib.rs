//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Every timestamp is integer milliseconds since session start (`TimestampMs`)
//! - Timeline, lap boundaries and frame timestamps share that clock

mod config;
mod entity_id;
mod error;
mod frame;
mod session_source;
mod telemetry;

pub use config::*;
pub use entity_id::EntityId;
pub use error::*;
pub use frame::*;
pub use session_source::{LocalSessionSource, SessionSource};
pub use telemetry::*;
