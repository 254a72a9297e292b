//! Boundary scan: the global time window every entity is resampled onto.

use std::collections::HashSet;

use contracts::{Degradation, EntityTelemetry, ReplayError, SessionKey, TimestampMs};
use tracing::{debug, instrument, warn};

/// Global window `[min_ms, max_ms]` over all eligible entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    pub min_ms: TimestampMs,
    pub max_ms: TimestampMs,
}

/// Result of scanning every entity's raw streams
#[derive(Debug, Clone)]
pub struct BoundaryScan {
    pub window: SessionWindow,
    /// Indices (into the scanned slice) of entities that passed filtering
    pub eligible: Vec<usize>,
    /// Entities filtered out, with the reason
    pub skipped: Vec<Degradation>,
}

impl BoundaryScan {
    pub fn is_eligible(&self, index: usize) -> bool {
        self.eligible.binary_search(&index).is_ok()
    }
}

/// Determine the global window.
///
/// An entity is eligible when it has at least one lap event and non-empty
/// motion and position streams. Its extent is taken from the motion stream;
/// the window is the smallest entity minimum to the largest entity maximum.
///
/// # Errors
/// `ReplayError::NoData` when no entity is eligible.
#[instrument(name = "boundary_scan", skip_all, fields(session = %key, entities = entities.len()))]
pub fn scan_boundaries(
    key: &SessionKey,
    entities: &[EntityTelemetry],
) -> Result<BoundaryScan, ReplayError> {
    let mut window: Option<SessionWindow> = None;
    let mut eligible = Vec::with_capacity(entities.len());
    let mut skipped = Vec::new();
    let mut seen = HashSet::with_capacity(entities.len());

    for (index, entity) in entities.iter().enumerate() {
        let reason = if !seen.insert(entity.id().clone()) {
            Some("duplicate entity id")
        } else if entity.laps.is_empty() {
            Some("no lap recorded")
        } else if entity.motion.is_empty() {
            Some("motion stream empty")
        } else if entity.position.is_empty() {
            Some("position stream empty")
        } else {
            None
        };

        if let Some(reason) = reason {
            warn!(entity = %entity.id(), reason, "entity skipped at boundary scan");
            skipped.push(Degradation::EntitySkipped {
                entity: entity.id().clone(),
                reason: reason.to_string(),
            });
            continue;
        }

        let (t_min, t_max) = motion_extent(entity);
        debug!(entity = %entity.id(), t_min, t_max, "entity extent");

        window = Some(match window {
            None => SessionWindow {
                min_ms: t_min,
                max_ms: t_max,
            },
            Some(w) => SessionWindow {
                min_ms: w.min_ms.min(t_min),
                max_ms: w.max_ms.max(t_max),
            },
        });
        eligible.push(index);
    }

    let window = window.ok_or_else(|| ReplayError::no_data(key))?;

    debug!(
        min_ms = window.min_ms,
        max_ms = window.max_ms,
        eligible = eligible.len(),
        skipped = skipped.len(),
        "boundary scan complete"
    );

    Ok(BoundaryScan {
        window,
        eligible,
        skipped,
    })
}

fn motion_extent(entity: &EntityTelemetry) -> (TimestampMs, TimestampMs) {
    entity
        .motion
        .iter()
        .fold((TimestampMs::MAX, TimestampMs::MIN), |(lo, hi), s| {
            (lo.min(s.time_ms), hi.max(s.time_ms))
        })
}
