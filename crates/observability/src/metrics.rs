//! Replay metrics
//!
//! Exports run-level metrics from `ReplayMeta` and aggregates per-frame
//! statistics into a printable summary.

use std::collections::BTreeMap;

use contracts::{Frame, ReplayMeta};
use metrics::{counter, gauge, histogram};

/// Record the metrics of one finished replay run.
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_replay_metrics;
///
/// let output = engine.run(session)?;
/// record_replay_metrics(&output.meta);
/// ```
pub fn record_replay_metrics(meta: &ReplayMeta) {
    counter!("replay_runs_total", "status" => "ok").increment(1);

    gauge!("replay_timeline_len").set(meta.timeline_len as f64);
    gauge!("replay_timeline_span_ms").set((meta.timeline_end - meta.timeline_start) as f64);
    gauge!("replay_step_ms").set(meta.step_ms as f64);

    let aligned = meta.entities_aligned.len();
    gauge!("replay_entities_total").set(meta.entities_total as f64);
    gauge!("replay_entities_aligned").set(aligned as f64);
    let dropped = meta.entities_total.saturating_sub(aligned);
    if dropped > 0 {
        counter!("replay_entities_dropped_total").increment(dropped as u64);
    }

    counter!("replay_frames_emitted_total").increment(meta.frames_emitted as u64);
    histogram!("replay_frames_per_run").record(meta.frames_emitted as f64);
    gauge!("replay_track_path_points").set(meta.track_path_points as f64);
    if meta.track_path_points == 0 {
        counter!("replay_track_path_empty_total").increment(1);
    }
    gauge!("replay_degradations_current").set(meta.degradations.len() as f64);
}

/// Record a request that ended in an error response
pub fn record_replay_failure(reason: &'static str) {
    counter!("replay_runs_total", "status" => "error", "reason" => reason).increment(1);
}

/// Record how long one request stage took
pub fn record_stage_latency_ms(stage: &'static str, latency_ms: f64) {
    histogram!("replay_request_latency_ms", "stage" => stage).record(latency_ms);
}

/// Record the size of a written response
pub fn record_response_written(bytes: usize) {
    histogram!("replay_response_bytes").record(bytes as f64);
}

/// Replay metrics aggregator
///
/// Aggregates in memory, for statistics and summary output.
#[derive(Debug, Clone, Default)]
pub struct ReplayMetricsAggregator {
    /// Runs observed
    pub total_runs: u64,

    /// Frames observed
    pub total_frames: u64,

    /// Entities seen in input / kept through alignment
    pub entities_total: u64,
    pub entities_aligned: u64,

    /// Drivers per frame
    pub drivers_stats: RunningStats,

    /// Gap between consecutive frame timestamps (ms)
    pub frame_gap_stats: RunningStats,

    /// Distance between first and last driver of a frame (m)
    pub field_spread_stats: RunningStats,

    /// Recovered failures by kind
    pub degradation_counts: BTreeMap<String, u64>,
}

impl ReplayMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in one run's bookkeeping
    pub fn update(&mut self, meta: &ReplayMeta) {
        self.total_runs += 1;
        self.entities_total += meta.entities_total as u64;
        self.entities_aligned += meta.entities_aligned.len() as u64;
        for degradation in &meta.degradations {
            *self
                .degradation_counts
                .entry(degradation.kind().to_string())
                .or_insert(0) += 1;
        }
    }

    /// Fold in the frames of one run
    pub fn observe_frames(&mut self, frames: &[Frame]) {
        let mut previous: Option<i64> = None;
        for frame in frames {
            self.total_frames += 1;
            self.drivers_stats.push(frame.drivers.len() as f64);

            if let Some(prev) = previous {
                self.frame_gap_stats.push((frame.timestamp - prev) as f64);
            }
            previous = Some(frame.timestamp);

            if let (Some(first), Some(last)) = (frame.drivers.first(), frame.drivers.last()) {
                self.field_spread_stats
                    .push(first.total_distance - last.total_distance);
            }
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_runs: self.total_runs,
            total_frames: self.total_frames,
            entities_total: self.entities_total,
            entities_aligned: self.entities_aligned,
            alignment_rate: if self.entities_total > 0 {
                self.entities_aligned as f64 / self.entities_total as f64 * 100.0
            } else {
                0.0
            },
            drivers_per_frame: StatsSummary::from(&self.drivers_stats),
            frame_gap_ms: StatsSummary::from(&self.frame_gap_stats),
            field_spread_m: StatsSummary::from(&self.field_spread_stats),
            degradation_counts: self.degradation_counts.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_runs: u64,
    pub total_frames: u64,
    pub entities_total: u64,
    pub entities_aligned: u64,
    pub alignment_rate: f64,
    pub drivers_per_frame: StatsSummary,
    pub frame_gap_ms: StatsSummary,
    pub field_spread_m: StatsSummary,
    pub degradation_counts: BTreeMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Replay Summary ===")?;
        writeln!(f, "Runs: {}", self.total_runs)?;
        writeln!(f, "Frames: {}", self.total_frames)?;
        writeln!(
            f,
            "Entities aligned: {}/{} ({:.2}%)",
            self.entities_aligned, self.entities_total, self.alignment_rate
        )?;
        writeln!(f, "Drivers per frame: {}", self.drivers_per_frame)?;
        writeln!(f, "Frame gap (ms): {}", self.frame_gap_ms)?;
        writeln!(f, "Field spread (m): {}", self.field_spread_m)?;

        if !self.degradation_counts.is_empty() {
            writeln!(f, "Recovered failures:")?;
            for (kind, count) in &self.degradation_counts {
                writeln!(f, "  {kind}: {count}")?;
            }
        }

        Ok(())
    }
}

/// Summary of one `RunningStats`
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.2}, max={:.2}, mean={:.2}, std={:.2} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean/variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.mean }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Degradation, DriverState};

    fn driver(id: &str, distance: f64) -> DriverState {
        DriverState {
            id: id.into(),
            name: id.into(),
            team: "Team".into(),
            color: "#FFFFFF".into(),
            x: 0.0,
            y: 0.0,
            speed: 200,
            rpm: 11000,
            gear: 7,
            throttle: 100,
            brake: 0,
            drs: false,
            total_distance: distance,
            lap: 1,
            tyre_compound: "SOFT".into(),
            tyre_age: 1,
        }
    }

    fn frame(timestamp: i64, drivers: Vec<DriverState>) -> Frame {
        Frame {
            timestamp,
            drivers,
            leader_lap: 1,
            sector_owners: BTreeMap::new(),
            pitting_drivers: Vec::new(),
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = ReplayMetricsAggregator::new();
        let meta = ReplayMeta {
            entities_total: 3,
            entities_aligned: vec!["VER".into(), "LEC".into()],
            degradations: vec![
                Degradation::EntitySkipped {
                    entity: "HAM".into(),
                    reason: "position stream empty".into(),
                },
                Degradation::TrackPath {
                    reason: "no timed lap recorded".into(),
                },
            ],
            ..Default::default()
        };
        aggregator.update(&meta);
        aggregator.observe_frames(&[
            frame(0, vec![driver("VER", 30.0), driver("LEC", 10.0)]),
            frame(250, vec![driver("VER", 40.0)]),
        ]);

        assert_eq!(aggregator.total_runs, 1);
        assert_eq!(aggregator.total_frames, 2);
        assert_eq!(aggregator.degradation_counts.get("entity_skipped"), Some(&1));
        assert!((aggregator.drivers_stats.mean() - 1.5).abs() < 1e-10);
        assert!((aggregator.frame_gap_stats.mean() - 250.0).abs() < 1e-10);
        assert!((aggregator.field_spread_stats.max() - 20.0).abs() < 1e-10);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = ReplayMetricsAggregator::new();
        aggregator.update(&ReplayMeta {
            entities_total: 4,
            entities_aligned: vec!["VER".into(), "LEC".into()],
            ..Default::default()
        });
        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Runs: 1"));
        assert!(output.contains("2/4 (50.00%)"));
        assert!(output.contains("Frame gap (ms): N/A"));
    }
}
