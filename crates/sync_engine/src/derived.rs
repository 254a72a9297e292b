//! Derived race-state fields: cumulative distance and lap/tyre annotation.

use contracts::{Degradation, LapEvent, TyreCompound};
use tracing::{trace, warn};

use crate::aligner::AlignedStream;
use crate::timeline::Timeline;

/// Integrate speed (km/h) over the timeline into metres travelled.
///
/// Row 0 is 0. Row `i` adds the speed held at row `i - 1` over one step, so
/// missing, non-finite or negative speeds add nothing and the total never
/// decreases.
pub fn accumulate_distance(stream: &mut AlignedStream, timeline: &Timeline) {
    let dt = timeline.step_seconds();
    let mut total = 0.0;
    let mut prev_speed: Option<f64> = None;

    for row in stream.rows_mut() {
        let kmh = prev_speed.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(0.0);
        total += kmh / 3.6 * dt;
        row.total_distance = total;
        prev_speed = row.speed;
    }
}

/// Forward-fill lap number, compound and tyre age from lap-start events.
///
/// Every row starts at lap 1 on `default_compound` with age 1. Events are
/// applied in ascending start order, each one covering the rows from its own
/// start up to the next event's start. Events without a start time are
/// skipped and reported.
pub fn annotate_laps(
    stream: &mut AlignedStream,
    laps: &[LapEvent],
    timeline: &Timeline,
    default_compound: TyreCompound,
) -> Vec<Degradation> {
    let mut skipped = Vec::new();
    let mut timed: Vec<(i64, &LapEvent)> = Vec::with_capacity(laps.len());

    for lap in laps {
        match lap.lap_start_ms {
            Some(start) => timed.push((start, lap)),
            None => {
                warn!(
                    entity = %stream.entity(),
                    lap_number = lap.lap_number,
                    "lap event without start time skipped"
                );
                skipped.push(Degradation::LapEventSkipped {
                    entity: stream.entity().clone(),
                    lap_number: lap.lap_number,
                });
            }
        }
    }
    timed.sort_by_key(|(start, lap)| (*start, lap.lap_number));

    let rows = stream.rows_mut();
    for row in rows.iter_mut() {
        row.lap = 1;
        row.compound = default_compound;
        row.tyre_age = 1;
    }

    for (k, (start, lap)) in timed.iter().enumerate() {
        let from = timeline.first_index_at_or_after(*start);
        let to = timed
            .get(k + 1)
            .map_or(rows.len(), |(next, _)| timeline.first_index_at_or_after(*next));
        if from >= to {
            continue;
        }
        trace!(lap = lap.lap_number, from, to, "lap segment");
        for row in &mut rows[from..to] {
            row.lap = lap.lap_number;
            row.compound = lap.compound;
            row.tyre_age = lap.tyre_age;
        }
    }

    skipped
}
