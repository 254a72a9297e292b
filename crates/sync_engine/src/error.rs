//! Engine-local error types
//!
//! These never abort a replay; the engine turns them into `Degradation`s.

use contracts::EntityId;
use thiserror::Error;

/// Per-entity resampling failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlignmentError {
    /// A channel group had no samples left to resample from
    #[error("{channel} stream is empty")]
    EmptyStream { channel: &'static str },

    /// Produced rows do not cover the timeline
    #[error("aligned {actual} rows against a timeline of {expected}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Course outline extraction failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackPathError {
    /// No lap carries both a start time and a lap time
    #[error("no timed lap recorded")]
    NoTimedLap,

    /// The fastest lap has no position samples inside its time range
    #[error("no position samples for lap {lap_number} of '{entity}'")]
    NoPositions { entity: EntityId, lap_number: u32 },
}

/// Reason a single row is left out of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("position undefined")]
    MissingPosition,

    #[error("{0} undefined")]
    MissingChannel(&'static str),
}
