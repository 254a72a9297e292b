//! Frame Assembler
//!
//! Walks the timeline once and builds one snapshot per visited index out of
//! every aligned entity's row at that index.

use std::collections::BTreeMap;

use contracts::{Degradation, DriverState, EntityInfo, Frame, RacePolicy, TimestampMs};
use metrics::histogram;
use tracing::{debug, instrument, warn};

use crate::aligner::{AlignedRow, AlignedStream};
use crate::error::RowError;
use crate::timeline::Timeline;

/// Sector keys reported in every frame
const SECTOR_KEYS: [&str; 3] = ["1", "2", "3"];

/// Aligned series plus the identity fields copied into render states
#[derive(Debug, Clone)]
pub struct AlignedEntity {
    pub info: EntityInfo,
    pub stream: AlignedStream,
}

/// Assembler output
#[derive(Debug, Clone, Default)]
pub struct AssembledFrames {
    pub frames: Vec<Frame>,
    /// One `EntityRow` entry per entity that lost at least one row
    pub degradations: Vec<Degradation>,
}

/// Per-entity tally of omitted rows
struct RowFailures {
    rows: usize,
    first_timestamp: TimestampMs,
    first_error: RowError,
}

/// Build frames at timeline indices `0, stride, 2*stride, ...`.
///
/// Indices where no entity has a valid row produce no frame, so the result can
/// be shorter than the number of visited indices. Timestamps are strictly
/// increasing.
#[instrument(
    name = "assemble_frames",
    skip_all,
    fields(entities = entities.len(), timeline = timeline.len(), stride)
)]
pub fn assemble_frames(
    timeline: &Timeline,
    entities: &[AlignedEntity],
    policy: &RacePolicy,
    stride: usize,
) -> AssembledFrames {
    let stride = stride.max(1);
    let mut frames = Vec::with_capacity(timeline.len().div_ceil(stride));
    let mut failures: Vec<Option<RowFailures>> = entities.iter().map(|_| None).collect();

    for index in (0..timeline.len()).step_by(stride) {
        let timestamp = timeline.value(index);
        let mut drivers = Vec::with_capacity(entities.len());

        for (slot, entity) in entities.iter().enumerate() {
            let Some(row) = entity.stream.row(index) else {
                continue;
            };
            match render_state(&entity.info, row, policy) {
                Ok(state) => drivers.push(state),
                Err(err) => {
                    let tally = failures[slot].get_or_insert(RowFailures {
                        rows: 0,
                        first_timestamp: timestamp,
                        first_error: err,
                    });
                    tally.rows += 1;
                }
            }
        }

        if drivers.is_empty() {
            continue;
        }

        histogram!("replay_frame_drivers").record(drivers.len() as f64);
        frames.push(build_frame(timestamp, drivers));
    }

    let degradations: Vec<Degradation> = entities
        .iter()
        .zip(failures)
        .filter_map(|(entity, tally)| {
            let tally = tally?;
            warn!(
                entity = %entity.info.id,
                rows = tally.rows,
                first_timestamp = tally.first_timestamp,
                reason = %tally.first_error,
                "entity omitted from frames"
            );
            Some(Degradation::EntityRow {
                entity: entity.info.id.clone(),
                rows: tally.rows,
                first_timestamp: tally.first_timestamp,
                reason: tally.first_error.to_string(),
            })
        })
        .collect();

    debug!(frames = frames.len(), degraded = degradations.len(), "frames assembled");
    AssembledFrames {
        frames,
        degradations,
    }
}

fn build_frame(timestamp: TimestampMs, mut drivers: Vec<DriverState>) -> Frame {
    drivers.sort_by(|a, b| {
        b.total_distance
            .total_cmp(&a.total_distance)
            .then_with(|| a.id.cmp(&b.id))
    });

    let leader_lap = drivers.iter().map(|d| d.lap).max().unwrap_or(0);
    let sector_owners: BTreeMap<String, _> = match drivers.first() {
        Some(leader) => SECTOR_KEYS
            .iter()
            .map(|k| (k.to_string(), leader.id.clone()))
            .collect(),
        None => BTreeMap::new(),
    };

    Frame {
        timestamp,
        drivers,
        leader_lap,
        sector_owners,
        pitting_drivers: Vec::new(),
    }
}

/// Convert one aligned row into the output render state.
///
/// Motion channels are truncated to integers; brake collapses to 0/100 and
/// DRS to an open flag under `policy`.
pub fn render_state(
    info: &EntityInfo,
    row: &AlignedRow,
    policy: &RacePolicy,
) -> Result<DriverState, RowError> {
    let (x, y) = row.position.ok_or(RowError::MissingPosition)?;

    Ok(DriverState {
        id: info.id.clone(),
        name: info.name.clone(),
        team: info.team.clone(),
        color: info.display_color(),
        x,
        y,
        speed: channel(row.speed, "speed")?,
        rpm: channel(row.rpm, "rpm")?,
        gear: channel(row.gear, "gear")?,
        throttle: channel(row.throttle, "throttle")?,
        brake: if row.brake.is_some_and(|b| b > 0.0) { 100 } else { 0 },
        drs: policy.is_drs_open(row.drs),
        total_distance: row.total_distance,
        lap: row.lap,
        tyre_compound: row.compound.to_string(),
        tyre_age: row.tyre_age,
    })
}

#[inline]
fn channel(value: Option<f64>, name: &'static str) -> Result<i64, RowError> {
    value
        .filter(|v| v.is_finite())
        .map(|v| v as i64)
        .ok_or(RowError::MissingChannel(name))
}
