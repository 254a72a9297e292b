//! # Ingestion
//!
//! Acquisition collaborators producing raw session telemetry.
//!
//! Responsibilities:
//! - Read recorded sessions from disk (`FileSessionSource`)
//! - Generate deterministic synthetic sessions (`MockSessionSource`)
//! - Map source failures to request-level `ReplayError::Acquisition`
//! - Count loaded sessions and samples
//!
//! ## Usage Example
//!
//! ```ignore
//! use contracts::{SessionKey, SessionSource};
//! use ingestion::FileSessionSource;
//!
//! let source = FileSessionSource::new("data");
//! let session = source.load(&SessionKey::new(2023, "Monza", "R")).await?;
//! ```

mod error;
mod file;
mod mock;
mod stats;

// Re-exports
pub use contracts::{SessionData, SessionKey, SessionSource};
pub use error::{IngestionError, Result};
pub use file::{FileSessionSource, RecordedSession};
pub use mock::MockSessionSource;
pub use stats::{SourceStats, StatsSnapshot};
