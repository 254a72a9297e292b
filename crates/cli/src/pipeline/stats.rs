//! Pipeline statistics and metrics.

use std::time::Duration;

use contracts::ReplayMeta;
use observability::ReplayMetricsAggregator;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Entities returned by acquisition
    pub entities_loaded: usize,

    /// Raw samples returned by acquisition
    pub motion_samples: usize,
    pub position_samples: usize,

    /// Stage timings
    pub acquire_duration: Duration,
    pub build_duration: Duration,
    pub write_duration: Duration,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Size of the written response
    pub bytes_written: usize,

    /// Engine bookkeeping of the run
    pub meta: ReplayMeta,

    /// Per-frame aggregates
    pub replay_metrics: ReplayMetricsAggregator,
}

impl PipelineStats {
    /// Frames built per second of engine time
    pub fn frames_per_second(&self) -> f64 {
        let secs = self.build_duration.as_secs_f64();
        if secs > 0.0 {
            self.meta.frames_emitted as f64 / secs
        } else {
            0.0
        }
    }

    /// Print detailed summary to stderr; stdout may carry the response
    pub fn print_summary(&self) {
        eprintln!("\n=== Pipeline Statistics ===\n");

        eprintln!("Overview");
        eprintln!("  Duration: {:.3}s", self.duration.as_secs_f64());
        eprintln!(
            "  Acquire / build / write: {:.1}ms / {:.1}ms / {:.1}ms",
            self.acquire_duration.as_secs_f64() * 1000.0,
            self.build_duration.as_secs_f64() * 1000.0,
            self.write_duration.as_secs_f64() * 1000.0
        );
        eprintln!(
            "  Samples: {} motion, {} position",
            self.motion_samples, self.position_samples
        );
        eprintln!(
            "  Timeline: {}..{}ms, step {}ms, {} points",
            self.meta.timeline_start,
            self.meta.timeline_end,
            self.meta.step_ms,
            self.meta.timeline_len
        );
        eprintln!(
            "  Frames: {} ({:.0}/s)",
            self.meta.frames_emitted,
            self.frames_per_second()
        );
        eprintln!("  Track path points: {}", self.meta.track_path_points);
        eprintln!("  Response bytes: {}", self.bytes_written);

        eprintln!();
        eprint!("{}", self.replay_metrics.summary());
        eprintln!();
    }
}
