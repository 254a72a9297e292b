//! ReplayConfig - Config Loader output
//!
//! Describes one replay build: which session to acquire, where to acquire it
//! from, the sampling policy of the engine, and where the response goes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use validator::Validate;

use crate::{SessionKey, TimestampMs, TyreCompound};

/// DRS codes reported while the flap is open.
pub const DEFAULT_DRS_ACTIVE_CODES: [u16; 3] = [10, 12, 14];

/// Compound assumed before an entity's first lap event.
pub const DEFAULT_TYRE_COMPOUND: TyreCompound = TyreCompound::Soft;

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete replay configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReplayConfig {
    #[serde(default)]
    pub version: ConfigVersion,

    /// Event to replay
    #[validate(nested)]
    pub session: SessionSettings,

    /// Acquisition collaborator
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    #[validate(nested)]
    pub timeline: TimelineConfig,

    #[serde(default)]
    #[validate(nested)]
    pub frames: FrameConfig,

    #[serde(default)]
    #[validate(nested)]
    pub track_path: TrackPathConfig,

    #[serde(default)]
    pub policy: RacePolicy,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Event identifier as written in config files
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SessionSettings {
    #[validate(range(min = 1950, max = 2100))]
    pub year: u16,

    #[validate(length(min = 1))]
    pub event: String,

    #[serde(default = "default_session_kind")]
    pub session: String,
}

fn default_session_kind() -> String {
    "R".to_string()
}

impl SessionSettings {
    pub fn key(&self) -> SessionKey {
        SessionKey::new(self.year, self.event.clone(), self.session.clone())
    }
}

/// Acquisition source kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Recorded sessions on disk
    #[default]
    File,
    /// Synthetic generated field
    Mock,
}

/// Acquisition source configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,

    /// Root directory of recorded sessions (`kind = "file"`)
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Synthetic field parameters (`kind = "mock"`)
    #[serde(default)]
    pub mock: MockSourceSettings,
}

/// Largest synthetic field the mock source generates
pub const MAX_MOCK_ENTITIES: usize = 40;

/// Synthetic field parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MockSourceSettings {
    pub entities: usize,
    pub laps: u32,
    pub seed: u64,
    /// Entities (from the end of the field) generated without position samples
    pub without_position: usize,
}

impl Default for MockSourceSettings {
    fn default() -> Self {
        Self {
            entities: 6,
            laps: 3,
            seed: 7,
            without_position: 0,
        }
    }
}

/// Timeline Generator parameters
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TimelineConfig {
    /// Fixed step Δ (ms)
    #[validate(range(min = 1))]
    pub step_ms: TimestampMs,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self { step_ms: 250 }
    }
}

/// Frame Assembler parameters
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FrameConfig {
    /// Emit a frame every `stride` timeline points
    #[validate(range(min = 1))]
    pub stride: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self { stride: 1 }
    }
}

/// Track Path Extractor parameters
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TrackPathConfig {
    /// Keep every `stride`-th position sample of the reference lap
    #[validate(range(min = 1))]
    pub stride: usize,
}

impl Default for TrackPathConfig {
    fn default() -> Self {
        Self { stride: 4 }
    }
}

/// Labelling policy applied while assembling frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RacePolicy {
    /// Raw DRS codes that mean "open"
    #[serde(default = "default_drs_codes")]
    pub drs_active_codes: Vec<u16>,

    /// Compound shown before the first lap event
    #[serde(default = "default_compound")]
    pub default_compound: TyreCompound,
}

fn default_drs_codes() -> Vec<u16> {
    DEFAULT_DRS_ACTIVE_CODES.to_vec()
}

fn default_compound() -> TyreCompound {
    DEFAULT_TYRE_COMPOUND
}

impl Default for RacePolicy {
    fn default() -> Self {
        Self {
            drs_active_codes: default_drs_codes(),
            default_compound: DEFAULT_TYRE_COMPOUND,
        }
    }
}

impl RacePolicy {
    /// True iff `code` is one of the configured active codes; missing codes are closed.
    #[inline]
    pub fn is_drs_open(&self, code: Option<u16>) -> bool {
        code.is_some_and(|c| self.drs_active_codes.contains(&c))
    }

    /// Codes listed more than once
    pub fn duplicate_drs_codes(&self) -> Vec<u16> {
        let mut seen = BTreeSet::new();
        let mut dups = BTreeSet::new();
        for code in &self.drs_active_codes {
            if !seen.insert(*code) {
                dups.insert(*code);
            }
        }
        dups.into_iter().collect()
    }
}

/// Response destination
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output file; stdout when absent
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default)]
    pub pretty: bool,
}

/// Engine configuration, the subset of `ReplayConfig` the pipeline reads.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub step_ms: TimestampMs,
    pub frame_stride: usize,
    pub track_path_stride: usize,
    pub policy: RacePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            step_ms: TimelineConfig::default().step_ms,
            frame_stride: FrameConfig::default().stride,
            track_path_stride: TrackPathConfig::default().stride,
            policy: RacePolicy::default(),
        }
    }
}

impl ReplayConfig {
    /// Build the engine configuration
    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig {
            step_ms: self.timeline.step_ms,
            frame_stride: self.frames.stride,
            track_path_stride: self.track_path.stride,
            policy: self.policy.clone(),
        }
    }
}
