//! Mock session source
//!
//! Generates a deterministic synthetic field for runs without recordings.
//! Entities lap an elliptical course at constant, slightly different speeds;
//! motion and position are sampled at independent jittered rates.

use std::f64::consts::PI;
use std::sync::Arc;

use contracts::{
    EntityInfo, EntityTelemetry, LapEvent, MockSourceSettings, MotionSample, PositionSample,
    ReplayError, SessionData, SessionKey, SessionSource, TimestampMs, TyreCompound,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument};

use crate::stats::SourceStats;

const SOURCE_NAME: &str = "mock";

/// Course semi-axes (m)
const SEMI_MAJOR: f64 = 900.0;
const SEMI_MINOR: f64 = 520.0;

/// Sampling intervals (ms), inclusive jitter bounds
const MOTION_INTERVAL: (TimestampMs, TimestampMs) = (200, 300);
const POSITION_INTERVAL: (TimestampMs, TimestampMs) = (150, 260);

/// Slowest base pace in a large field (km/h)
const MIN_PACE_KMH: f64 = 120.0;

/// Probability of re-sending a sample with an identical timestamp
const DUPLICATE_PROBABILITY: f64 = 0.03;

/// DRS codes emitted, open and closed
const DRS_CODES: [u16; 5] = [0, 8, 10, 12, 14];

const ROSTER: [(&str, &str, &str, &str); 10] = [
    ("VER", "Verstappen", "Red Bull Racing", "3671C6"),
    ("LEC", "Leclerc", "Ferrari", "E8002D"),
    ("NOR", "Norris", "McLaren", "FF8000"),
    ("HAM", "Hamilton", "Mercedes", "27F4D2"),
    ("ALO", "Alonso", "Aston Martin", "229971"),
    ("GAS", "Gasly", "Alpine", "0093CC"),
    ("ALB", "Albon", "Williams", "64C4FF"),
    ("TSU", "Tsunoda", "RB", "6692FF"),
    ("BOT", "Bottas", "Kick Sauber", "52E252"),
    ("HUL", "Hulkenberg", "Haas F1 Team", "B6BABD"),
];

/// Synthetic field generator
#[derive(Debug, Clone)]
pub struct MockSessionSource {
    settings: MockSourceSettings,
    stats: Arc<SourceStats>,
}

impl MockSessionSource {
    pub fn new(settings: MockSourceSettings) -> Self {
        Self {
            settings,
            stats: Arc::new(SourceStats::new()),
        }
    }

    pub fn settings(&self) -> &MockSourceSettings {
        &self.settings
    }

    pub fn stats(&self) -> Arc<SourceStats> {
        self.stats.clone()
    }

    /// Generate the session for `key`.
    ///
    /// Identical settings and key always produce identical data.
    pub fn generate(&self, key: &SessionKey) -> SessionData {
        let mut rng = StdRng::seed_from_u64(self.settings.seed ^ u64::from(key.year));
        let course = course_length();
        let with_position = self
            .settings
            .entities
            .saturating_sub(self.settings.without_position);

        let entities = (0..self.settings.entities)
            .map(|index| {
                let plan = EntityPlan {
                    info: roster_entry(index),
                    speed_kmh: (230.0 - index as f64 * 2.5).max(MIN_PACE_KMH)
                        + rng.random_range(-1.5..1.5),
                    start_ms: rng.random_range(0..1500),
                    grid_offset_m: index as f64 * 8.0,
                    laps: self.settings.laps.max(1),
                    with_position: index < with_position,
                };
                plan.generate(&mut rng, course)
            })
            .collect();

        SessionData {
            key: key.clone(),
            entities,
        }
    }
}

impl SessionSource for MockSessionSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    #[instrument(name = "mock_source_load", skip(self), fields(entities = self.settings.entities))]
    async fn load(&self, key: &SessionKey) -> Result<SessionData, ReplayError> {
        let data = self.generate(key);
        debug!(
            motion = data.total_motion_samples(),
            position = data.total_position_samples(),
            "mock session generated"
        );
        self.stats.record_loaded(SOURCE_NAME, &data);
        Ok(data)
    }
}

fn roster_entry(index: usize) -> EntityInfo {
    match ROSTER.get(index) {
        Some((id, name, team, color)) => EntityInfo {
            id: (*id).into(),
            name: (*name).to_string(),
            team: (*team).to_string(),
            color: (*color).to_string(),
        },
        None => EntityInfo {
            id: format!("E{index:02}").into(),
            name: format!("Entity {index}"),
            team: "Privateer".to_string(),
            color: "888888".to_string(),
        },
    }
}

/// Ramanujan's approximation of the ellipse perimeter
fn course_length() -> f64 {
    let (a, b) = (SEMI_MAJOR, SEMI_MINOR);
    PI * (3.0 * (a + b) - ((3.0 * a + b) * (a + 3.0 * b)).sqrt())
}

fn course_point(distance: f64, course: f64) -> (f64, f64) {
    let theta = 2.0 * PI * (distance / course);
    (SEMI_MAJOR * theta.cos(), SEMI_MINOR * theta.sin())
}

struct EntityPlan {
    info: EntityInfo,
    speed_kmh: f64,
    start_ms: TimestampMs,
    grid_offset_m: f64,
    laps: u32,
    with_position: bool,
}

impl EntityPlan {
    fn lap_time_ms(&self, course: f64) -> TimestampMs {
        (course / (self.speed_kmh / 3.6) * 1000.0).round() as TimestampMs
    }

    fn generate(self, rng: &mut StdRng, course: f64) -> EntityTelemetry {
        let lap_time = self.lap_time_ms(course);
        let end_ms = self.start_ms + lap_time * TimestampMs::from(self.laps);
        let metres_per_ms = self.speed_kmh / 3.6 / 1000.0;

        let mut motion = Vec::new();
        let mut t = self.start_ms;
        while t <= end_ms {
            let speed = self.speed_kmh + rng.random_range(-3.0..3.0);
            let sample = MotionSample {
                time_ms: t,
                speed: Some(speed),
                rpm: Some(speed * 48.0 + rng.random_range(-150.0..150.0)),
                gear: Some((speed / 40.0).clamp(1.0, 8.0).floor()),
                throttle: Some(rng.random_range(85.0..100.0)),
                brake: Some(if rng.random_bool(0.1) { 1.0 } else { 0.0 }),
                drs: Some(DRS_CODES[rng.random_range(0..DRS_CODES.len())]),
            };
            motion.push(sample);
            if rng.random_bool(DUPLICATE_PROBABILITY) {
                motion.push(MotionSample {
                    speed: Some(speed + 0.5),
                    ..sample
                });
            }
            t += rng.random_range(MOTION_INTERVAL.0..=MOTION_INTERVAL.1);
        }

        let mut position = Vec::new();
        if self.with_position {
            let mut t = self.start_ms;
            while t <= end_ms {
                let travelled = self.grid_offset_m + (t - self.start_ms) as f64 * metres_per_ms;
                let (x, y) = course_point(travelled, course);
                position.push(PositionSample { time_ms: t, x, y });
                if rng.random_bool(DUPLICATE_PROBABILITY) {
                    position.push(PositionSample { time_ms: t, x, y });
                }
                t += rng.random_range(POSITION_INTERVAL.0..=POSITION_INTERVAL.1);
            }
        }

        let pit_after = (self.laps / 2).max(1);
        let laps = (1..=self.laps)
            .map(|n| {
                let (compound, tyre_age) = if n <= pit_after {
                    (TyreCompound::Medium, n)
                } else {
                    (TyreCompound::Hard, n - pit_after)
                };
                LapEvent {
                    lap_number: n,
                    lap_start_ms: Some(self.start_ms + lap_time * TimestampMs::from(n - 1)),
                    lap_time_ms: Some(lap_time + rng.random_range(-40..40)),
                    compound,
                    tyre_age,
                }
            })
            .collect();

        EntityTelemetry {
            info: self.info,
            motion,
            position,
            laps,
        }
    }
}
