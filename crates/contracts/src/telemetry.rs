//! Raw acquisition data - Ingestion output
//!
//! Per-entity telemetry as delivered by a `SessionSource`. Samples are
//! irregular and unsynchronised, both across entities and between the motion
//! and position channel groups of one entity.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::EntityId;

/// Milliseconds since session start. Every timestamp in the workspace uses this unit.
pub type TimestampMs = i64;

/// Motion channels of one telemetry sample.
///
/// Every channel is optional: a gap in the provider feed decodes as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionSample {
    /// Session time (ms)
    pub time_ms: TimestampMs,

    /// Speed (km/h)
    #[serde(default)]
    pub speed: Option<f64>,

    /// Engine speed (rev/min)
    #[serde(default)]
    pub rpm: Option<f64>,

    /// Selected gear
    #[serde(default)]
    pub gear: Option<f64>,

    /// Throttle pedal (0-100)
    #[serde(default)]
    pub throttle: Option<f64>,

    /// Brake pedal; any positive value means applied
    #[serde(default)]
    pub brake: Option<f64>,

    /// Raw DRS state code; anything that is not a whole `u16` decodes as `None`
    #[serde(default, deserialize_with = "lenient::code")]
    pub drs: Option<u16>,
}

/// Position channels of one telemetry sample (course coordinates).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub time_ms: TimestampMs,
    pub x: f64,
    pub y: f64,
}

/// Tyre compound label carried by lap events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TyreCompound {
    #[default]
    Soft,
    Medium,
    Hard,
    Intermediate,
    Wet,
    #[serde(other)]
    Unknown,
}

impl TyreCompound {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Soft => "SOFT",
            Self::Medium => "MEDIUM",
            Self::Hard => "HARD",
            Self::Intermediate => "INTERMEDIATE",
            Self::Wet => "WET",
            Self::Unknown => "UNKNOWN",
        }
    }

    fn unknown() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for TyreCompound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_tyre_age() -> u32 {
    1
}

/// Provider dumps encode integer channels as either JSON integers or floats.
mod lenient {
    use serde::de::{Deserializer, Error, IgnoredAny};
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawNumber {
        Int(i64),
        Float(f64),
        Text(String),
        Other(IgnoredAny),
    }

    impl RawNumber {
        fn whole<T: TryFrom<i64>>(self) -> Option<T> {
            let value = match self {
                Self::Int(v) => v,
                Self::Float(v) => float_to_whole(v)?,
                Self::Text(s) => {
                    let s = s.trim();
                    match s.parse::<i64>() {
                        Ok(v) => v,
                        Err(_) => float_to_whole(s.parse::<f64>().ok()?)?,
                    }
                }
                Self::Other(_) => return None,
            };
            T::try_from(value).ok()
        }
    }

    // 2^53: beyond this an f64 no longer holds every integer
    fn float_to_whole(v: f64) -> Option<i64> {
        (v.is_finite() && v.fract() == 0.0 && v.abs() <= 9_007_199_254_740_992.0).then_some(v as i64)
    }

    /// Optional code; out-of-range or fractional values become `None`.
    pub fn code<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<i64>,
    {
        Ok(Option::<RawNumber>::deserialize(deserializer)?.and_then(RawNumber::whole))
    }

    /// Required count; accepts whole-valued floats such as `3.0`.
    pub fn count<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<i64>,
    {
        RawNumber::deserialize(deserializer)?
            .whole()
            .ok_or_else(|| D::Error::custom("expected a non-negative whole number"))
    }
}

/// Start-of-lap record carrying tyre state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapEvent {
    /// Lap number (1-based)
    #[serde(deserialize_with = "lenient::count")]
    pub lap_number: u32,

    /// Session time the lap started; `None` when the provider has no timing for it
    #[serde(default)]
    pub lap_start_ms: Option<TimestampMs>,

    /// Lap duration, used to pick the reference lap for the course outline
    #[serde(default)]
    pub lap_time_ms: Option<TimestampMs>,

    #[serde(default = "TyreCompound::unknown")]
    pub compound: TyreCompound,

    /// Laps driven on this tyre set
    #[serde(default = "default_tyre_age", deserialize_with = "lenient::count")]
    pub tyre_age: u32,
}

/// Static display data of a competitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityInfo {
    /// Short code (e.g. "VER")
    pub id: EntityId,

    /// Display name
    pub name: String,

    /// Team name
    pub team: String,

    /// Team colour, `RRGGBB` with or without leading '#'
    pub color: String,
}

impl EntityInfo {
    /// Colour normalised to `#RRGGBB`.
    pub fn display_color(&self) -> String {
        if self.color.starts_with('#') {
            self.color.clone()
        } else {
            format!("#{}", self.color)
        }
    }
}

/// Complete raw input of a single competitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityTelemetry {
    pub info: EntityInfo,

    #[serde(default)]
    pub motion: Vec<MotionSample>,

    #[serde(default)]
    pub position: Vec<PositionSample>,

    #[serde(default)]
    pub laps: Vec<LapEvent>,
}

impl EntityTelemetry {
    #[inline]
    pub fn id(&self) -> &EntityId {
        &self.info.id
    }
}

fn default_session_kind() -> String {
    "R".to_string()
}

/// Event identifier: season, event name and session kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub year: u16,

    /// Event name or round (e.g. "Monza")
    pub event: String,

    /// Session kind ("R" = race)
    #[serde(default = "default_session_kind")]
    pub session: String,
}

impl SessionKey {
    pub fn new(year: u16, event: impl Into<String>, session: impl Into<String>) -> Self {
        Self {
            year,
            event: event.into(),
            session: session.into(),
        }
    }

    /// File-system friendly stem, e.g. `monza_r`
    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.event, self.session)
            .to_lowercase()
            .replace(char::is_whitespace, "_")
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} [{}]", self.year, self.event, self.session)
    }
}

/// Everything a `SessionSource` returns for one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub key: SessionKey,

    #[serde(default)]
    pub entities: Vec<EntityTelemetry>,
}

impl SessionData {
    pub fn total_motion_samples(&self) -> usize {
        self.entities.iter().map(|e| e.motion.len()).sum()
    }

    pub fn total_position_samples(&self) -> usize {
        self.entities.iter().map(|e| e.position.len()).sum()
    }
}
