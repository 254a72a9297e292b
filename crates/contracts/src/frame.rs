//! Frame - Sync Engine output
//!
//! Public response schema consumed by the playback client, plus per-run
//! diagnostics that never enter the response body.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{EntityId, TimestampMs};

/// Render state of one competitor inside a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverState {
    pub id: EntityId,
    pub name: String,
    pub team: String,
    /// `#RRGGBB`
    pub color: String,
    pub x: f64,
    pub y: f64,
    pub speed: i64,
    pub rpm: i64,
    pub gear: i64,
    pub throttle: i64,
    /// 0 or 100
    pub brake: u8,
    pub drs: bool,
    /// Cumulative distance since timeline start (m); orders the field
    pub total_distance: f64,
    pub lap: u32,
    pub tyre_compound: String,
    pub tyre_age: u32,
}

/// One synthesized snapshot of the field at a shared timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Timeline value (ms)
    pub timestamp: TimestampMs,

    /// Race order, leader first
    pub drivers: Vec<DriverState>,

    /// Highest lap among `drivers`
    pub leader_lap: u32,

    /// Sector number ("1".."3") -> entity id
    pub sector_owners: BTreeMap<String, EntityId>,

    pub pitting_drivers: Vec<EntityId>,
}

/// Point of the static course outline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub x: f64,
    pub y: f64,
}

/// Successful response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayResponse {
    pub track_path: Vec<TrackPoint>,
    pub frames: Vec<Frame>,
}

/// Failure response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl<E: std::error::Error> From<&E> for ErrorBody {
    fn from(err: &E) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

/// A failure the pipeline recovered from locally.
///
/// None of these reach the caller except through missing entities, frames or
/// path points; they are collected in `ReplayMeta` so the loss is observable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// Entity had no lap, motion or position data and never entered the timeline
    EntitySkipped { entity: EntityId, reason: String },

    /// Entity stream could not be resampled; absent from every frame
    EntityAlignment { entity: EntityId, reason: String },

    /// Entity omitted from `rows` individual frames
    EntityRow {
        entity: EntityId,
        rows: usize,
        first_timestamp: TimestampMs,
        reason: String,
    },

    /// Lap event without a start time; prior annotation kept
    LapEventSkipped { entity: EntityId, lap_number: u32 },

    /// Course outline unavailable; `trackPath` emitted empty
    TrackPath { reason: String },
}

impl Degradation {
    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EntitySkipped { .. } => "entity_skipped",
            Self::EntityAlignment { .. } => "entity_alignment",
            Self::EntityRow { .. } => "entity_row",
            Self::LapEventSkipped { .. } => "lap_event_skipped",
            Self::TrackPath { .. } => "track_path",
        }
    }
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EntitySkipped { entity, reason } => {
                write!(f, "entity '{entity}' skipped: {reason}")
            }
            Self::EntityAlignment { entity, reason } => {
                write!(f, "entity '{entity}' alignment failed: {reason}")
            }
            Self::EntityRow {
                entity,
                rows,
                first_timestamp,
                reason,
            } => write!(
                f,
                "entity '{entity}' omitted from {rows} frames (first at {first_timestamp}ms): {reason}"
            ),
            Self::LapEventSkipped { entity, lap_number } => {
                write!(f, "entity '{entity}' lap {lap_number} has no start time")
            }
            Self::TrackPath { reason } => write!(f, "track path unavailable: {reason}"),
        }
    }
}

/// Run diagnostics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayMeta {
    /// First timeline point (ms)
    pub timeline_start: TimestampMs,

    /// Last timeline point (ms)
    pub timeline_end: TimestampMs,

    pub timeline_len: usize,

    pub step_ms: TimestampMs,

    /// Entities offered by acquisition
    pub entities_total: usize,

    /// Entities that produced an aligned stream
    pub entities_aligned: Vec<EntityId>,

    pub frames_emitted: usize,

    pub track_path_points: usize,

    pub degradations: Vec<Degradation>,
}

impl ReplayMeta {
    pub fn count_of(&self, kind: &str) -> usize {
        self.degradations.iter().filter(|d| d.kind() == kind).count()
    }
}
