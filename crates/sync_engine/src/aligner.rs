//! Nearest-sample resampling of raw streams onto the shared timeline.
//!
//! Each channel group is deduplicated, sorted, and then walked with a
//! forward-only cursor, since timeline points only move forward.

use contracts::{EntityId, MotionSample, PositionSample, TimestampMs, TyreCompound};
use tracing::{instrument, trace};

use crate::error::AlignmentError;
use crate::timeline::Timeline;

/// One timeline point of one entity.
///
/// Motion and position come from independently chosen raw samples. The
/// derived fields are filled in by `derived`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedRow {
    pub speed: Option<f64>,
    pub rpm: Option<f64>,
    pub gear: Option<f64>,
    pub throttle: Option<f64>,
    pub brake: Option<f64>,
    pub drs: Option<u16>,
    pub position: Option<(f64, f64)>,
    pub total_distance: f64,
    pub lap: u32,
    pub compound: TyreCompound,
    pub tyre_age: u32,
}

impl AlignedRow {
    fn from_samples(motion: &MotionSample, position: &PositionSample) -> Self {
        Self {
            speed: motion.speed,
            rpm: motion.rpm,
            gear: motion.gear,
            throttle: motion.throttle,
            brake: motion.brake,
            drs: motion.drs,
            position: Some((position.x, position.y)).filter(|(x, y)| x.is_finite() && y.is_finite()),
            total_distance: 0.0,
            lap: 1,
            compound: TyreCompound::default(),
            tyre_age: 1,
        }
    }
}

/// Resampled series of one entity, exactly one row per timeline point.
///
/// The row count is fixed at construction; only row contents can change
/// afterwards, so positional access across entities stays in lockstep.
#[derive(Debug, Clone)]
pub struct AlignedStream {
    entity: EntityId,
    rows: Box<[AlignedRow]>,
}

impl AlignedStream {
    /// Wrap `rows`, checking they cover `timeline` exactly.
    pub fn new(
        entity: EntityId,
        rows: Vec<AlignedRow>,
        timeline: &Timeline,
    ) -> Result<Self, AlignmentError> {
        if rows.len() != timeline.len() {
            return Err(AlignmentError::LengthMismatch {
                expected: timeline.len(),
                actual: rows.len(),
            });
        }
        Ok(Self {
            entity,
            rows: rows.into_boxed_slice(),
        })
    }

    #[inline]
    pub fn entity(&self) -> &EntityId {
        &self.entity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[inline]
    pub fn row(&self, index: usize) -> Option<&AlignedRow> {
        self.rows.get(index)
    }

    #[inline]
    pub fn rows(&self) -> &[AlignedRow] {
        &self.rows
    }

    #[inline]
    pub fn rows_mut(&mut self) -> &mut [AlignedRow] {
        &mut self.rows
    }
}

/// Anything carrying a session timestamp
pub trait Timestamped {
    fn time_ms(&self) -> TimestampMs;
}

impl Timestamped for MotionSample {
    #[inline]
    fn time_ms(&self) -> TimestampMs {
        self.time_ms
    }
}

impl Timestamped for PositionSample {
    #[inline]
    fn time_ms(&self) -> TimestampMs {
        self.time_ms
    }
}

/// Sort by timestamp and keep the last-written sample of each timestamp.
pub fn sort_dedup_last_wins<T: Timestamped>(mut samples: Vec<T>) -> Vec<T> {
    // Stable sort keeps arrival order inside each run of equal timestamps.
    samples.sort_by_key(Timestamped::time_ms);
    samples.reverse();
    samples.dedup_by_key(|s| s.time_ms());
    samples.reverse();
    samples
}

/// Forward-only nearest-neighbour lookup over sorted, deduplicated samples.
///
/// Queries must be non-decreasing. Ties go to the earlier sample.
pub struct NearestCursor<'a, T> {
    samples: &'a [T],
    idx: usize,
}

impl<'a, T: Timestamped> NearestCursor<'a, T> {
    /// `None` if `samples` is empty.
    pub fn new(samples: &'a [T]) -> Option<Self> {
        (!samples.is_empty()).then_some(Self { samples, idx: 0 })
    }

    pub fn nearest(&mut self, t: TimestampMs) -> &'a T {
        while let Some(next) = self.samples.get(self.idx + 1) {
            let current = self.samples[self.idx].time_ms().abs_diff(t);
            if next.time_ms().abs_diff(t) < current {
                self.idx += 1;
            } else {
                break;
            }
        }
        &self.samples[self.idx]
    }
}

/// Resample one entity onto `timeline`.
///
/// Takes the raw streams by value: they are released as soon as the aligned
/// rows exist.
#[instrument(
    name = "align_entity",
    level = "debug",
    skip(motion, position, timeline),
    fields(motion = motion.len(), position = position.len())
)]
pub fn align_entity(
    entity: &EntityId,
    motion: Vec<MotionSample>,
    position: Vec<PositionSample>,
    timeline: &Timeline,
) -> Result<AlignedStream, AlignmentError> {
    let motion = sort_dedup_last_wins(motion);
    let position = sort_dedup_last_wins(position);
    trace!(motion = motion.len(), position = position.len(), "deduplicated");

    let mut motion_cursor =
        NearestCursor::new(&motion).ok_or(AlignmentError::EmptyStream { channel: "motion" })?;
    let mut position_cursor = NearestCursor::new(&position)
        .ok_or(AlignmentError::EmptyStream { channel: "position" })?;

    let rows: Vec<AlignedRow> = timeline
        .iter()
        .map(|t| AlignedRow::from_samples(motion_cursor.nearest(t), position_cursor.nearest(t)))
        .collect();

    AlignedStream::new(entity.clone(), rows, timeline)
}
