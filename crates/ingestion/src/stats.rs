//! Acquisition counters shared by a source and its observers

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::SessionData;

/// Running totals of one source
#[derive(Debug, Default)]
pub struct SourceStats {
    /// Sessions produced
    pub sessions_loaded: AtomicU64,

    /// Failed load attempts
    pub load_failures: AtomicU64,

    /// Motion samples handed out
    pub motion_samples: AtomicU64,

    /// Position samples handed out
    pub position_samples: AtomicU64,
}

impl SourceStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a produced session, mirrored into `metrics`
    pub fn record_loaded(&self, source: &'static str, data: &SessionData) {
        let motion = data.total_motion_samples() as u64;
        let position = data.total_position_samples() as u64;
        self.sessions_loaded.fetch_add(1, Ordering::Relaxed);
        self.motion_samples.fetch_add(motion, Ordering::Relaxed);
        self.position_samples.fetch_add(position, Ordering::Relaxed);

        metrics::counter!("replay_sessions_loaded_total", "source" => source).increment(1);
        metrics::counter!("replay_samples_loaded_total", "source" => source, "stream" => "motion")
            .increment(motion);
        metrics::counter!("replay_samples_loaded_total", "source" => source, "stream" => "position")
            .increment(position);
    }

    /// Record a failed load, mirrored into `metrics`
    pub fn record_failure(&self, source: &'static str, kind: &'static str) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("replay_load_failures_total", "source" => source, "kind" => kind)
            .increment(1);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            sessions_loaded: self.sessions_loaded.load(Ordering::Relaxed),
            load_failures: self.load_failures.load(Ordering::Relaxed),
            motion_samples: self.motion_samples.load(Ordering::Relaxed),
            position_samples: self.position_samples.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`SourceStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub sessions_loaded: u64,
    pub load_failures: u64,
    pub motion_samples: u64,
    pub position_samples: u64,
}
