//! # Sync Engine
//!
//! Turns one acquired session into a uniform-step replay.
//!
//! Pipeline stages:
//! - Boundary scan: global time window over eligible entities
//! - Timeline: fixed-step timestamps spanning that window
//! - Alignment: nearest-sample resampling of each entity onto the timeline
//! - Derived metrics: cumulative distance, lap and tyre state
//! - Frame assembly: per-timestamp snapshots ordered by race position
//! - Track path: course outline from the fastest lap
//!
//! ## Example
//!
//! ```ignore
//! use sync_engine::{EngineConfig, ReplayEngine};
//!
//! let engine = ReplayEngine::new(EngineConfig::default());
//! let output = engine.run(session)?;
//! println!("{} frames", output.response.frames.len());
//! ```

mod aligner;
mod assembler;
mod boundary;
mod derived;
mod engine;
mod error;
mod timeline;
mod track_path;

pub use aligner::{
    AlignedRow, AlignedStream, NearestCursor, Timestamped, align_entity, sort_dedup_last_wins,
};
pub use assembler::{AlignedEntity, AssembledFrames, assemble_frames, render_state};
pub use boundary::{BoundaryScan, SessionWindow, scan_boundaries};
pub use derived::{accumulate_distance, annotate_laps};
pub use engine::{ReplayEngine, ReplayOutput};
pub use error::{AlignmentError, RowError, TrackPathError};
pub use timeline::Timeline;
pub use track_path::{ReferenceLap, extract_track_path, fastest_lap};

// Re-export contracts types
pub use contracts::{EngineConfig, RacePolicy, ReplayMeta, ReplayResponse};

#[cfg(test)]
pub(crate) mod test_support {
    use contracts::{
        EntityInfo, EntityTelemetry, LapEvent, MotionSample, PositionSample, TimestampMs,
        TyreCompound,
    };

    pub fn info(id: &str) -> EntityInfo {
        EntityInfo {
            id: id.into(),
            name: format!("Driver {id}"),
            team: "Test Team".into(),
            color: "3671C6".into(),
        }
    }

    pub fn entity(
        id: &str,
        motion: &[MotionSample],
        position: &[PositionSample],
        laps: &[LapEvent],
    ) -> EntityTelemetry {
        EntityTelemetry {
            info: info(id),
            motion: motion.to_vec(),
            position: position.to_vec(),
            laps: laps.to_vec(),
        }
    }

    pub fn motion(time_ms: TimestampMs, speed: f64) -> MotionSample {
        MotionSample {
            time_ms,
            speed: Some(speed),
            rpm: Some(10_500.0),
            gear: Some(7.0),
            throttle: Some(100.0),
            brake: Some(0.0),
            drs: Some(0),
        }
    }

    pub fn position(time_ms: TimestampMs, x: f64, y: f64) -> PositionSample {
        PositionSample { time_ms, x, y }
    }

    pub fn lap(lap_number: u32, lap_start_ms: Option<TimestampMs>) -> LapEvent {
        LapEvent {
            lap_number,
            lap_start_ms,
            lap_time_ms: None,
            compound: TyreCompound::Hard,
            tyre_age: 1,
        }
    }
}
