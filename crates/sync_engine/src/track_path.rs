//! Track Path Extractor: course outline from the fastest recorded lap.

use contracts::{EntityId, EntityTelemetry, TimestampMs, TrackPoint};
use tracing::{debug, instrument};

use crate::error::TrackPathError;

/// Lap chosen as the course reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceLap {
    /// Index into the slice the lap was picked from
    pub entity_index: usize,
    pub entity: EntityId,
    pub lap_number: u32,
    pub start_ms: TimestampMs,
    pub lap_time_ms: TimestampMs,
}

impl ReferenceLap {
    #[inline]
    pub fn end_ms(&self) -> TimestampMs {
        self.start_ms.saturating_add(self.lap_time_ms)
    }
}

/// Fastest lap across all entities, among laps with both a start and a
/// positive lap time. Ties keep the first one found.
pub fn fastest_lap(entities: &[EntityTelemetry]) -> Option<ReferenceLap> {
    entities
        .iter()
        .enumerate()
        .flat_map(|(entity_index, entity)| {
            entity.laps.iter().filter_map(move |lap| {
                let start_ms = lap.lap_start_ms?;
                let lap_time_ms = lap.lap_time_ms.filter(|t| *t > 0)?;
                Some(ReferenceLap {
                    entity_index,
                    entity: entity.id().clone(),
                    lap_number: lap.lap_number,
                    start_ms,
                    lap_time_ms,
                })
            })
        })
        .fold(None, |best: Option<ReferenceLap>, lap| match best {
            Some(b) if b.lap_time_ms <= lap.lap_time_ms => Some(b),
            _ => Some(lap),
        })
}

/// Downsampled outline of the fastest lap: every `stride`-th position sample
/// inside the lap's time range, in time order, coordinates untouched.
#[instrument(name = "extract_track_path", skip(entities), fields(entities = entities.len()))]
pub fn extract_track_path(
    entities: &[EntityTelemetry],
    stride: usize,
) -> Result<Vec<TrackPoint>, TrackPathError> {
    let reference = fastest_lap(entities).ok_or(TrackPathError::NoTimedLap)?;
    let owner = &entities[reference.entity_index];

    let mut samples: Vec<_> = owner
        .position
        .iter()
        .filter(|s| (reference.start_ms..=reference.end_ms()).contains(&s.time_ms))
        .collect();
    if samples.is_empty() {
        return Err(TrackPathError::NoPositions {
            entity: reference.entity,
            lap_number: reference.lap_number,
        });
    }
    samples.sort_by_key(|s| s.time_ms);

    let path: Vec<TrackPoint> = samples
        .into_iter()
        .step_by(stride.max(1))
        .map(|s| TrackPoint { x: s.x, y: s.y })
        .collect();

    debug!(
        entity = %reference.entity,
        lap = reference.lap_number,
        lap_time_ms = reference.lap_time_ms,
        points = path.len(),
        "track path extracted"
    );
    Ok(path)
}
