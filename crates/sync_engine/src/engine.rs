//! Replay engine: drives one session through every pipeline stage.

use std::time::Instant;

use contracts::{
    Degradation, EngineConfig, EntityId, ReplayError, ReplayMeta, ReplayResponse, SessionData,
};
use tracing::{debug, info, instrument, warn};

use crate::aligner::align_entity;
use crate::assembler::{AlignedEntity, assemble_frames};
use crate::boundary::scan_boundaries;
use crate::derived::{accumulate_distance, annotate_laps};
use crate::timeline::Timeline;
use crate::track_path::extract_track_path;

/// Response plus run bookkeeping
#[derive(Debug, Clone)]
pub struct ReplayOutput {
    pub response: ReplayResponse,
    pub meta: ReplayMeta,
}

/// Frame synthesis pipeline
///
/// Stateless between runs; one engine can serve any number of sessions.
#[derive(Debug, Clone, Default)]
pub struct ReplayEngine {
    config: EngineConfig,
}

impl ReplayEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build the replay response for one acquired session.
    ///
    /// Consumes `data`: each entity's raw streams are dropped as soon as its
    /// aligned series exists. Only a missing time window is fatal; every
    /// other failure is logged, counted and reported in `meta.degradations`.
    ///
    /// # Errors
    /// - `ReplayError::NoData` if no entity has laps plus motion and position
    /// - `ReplayError::ConfigValidation` if the step cannot form a timeline
    #[instrument(
        name = "replay_engine_run",
        skip_all,
        fields(session = %data.key, entities = data.entities.len(), step_ms = self.config.step_ms)
    )]
    pub fn run(&self, data: SessionData) -> Result<ReplayOutput, ReplayError> {
        let started = Instant::now();
        let SessionData { key, entities } = data;
        let entities_total = entities.len();

        let scan = scan_boundaries(&key, &entities)?;
        let timeline = Timeline::new(scan.window.min_ms, scan.window.max_ms, self.config.step_ms)
            .ok_or_else(|| {
                ReplayError::config_validation(
                    "timeline.step_ms",
                    format!("cannot build a timeline with step {}", self.config.step_ms),
                )
            })?;
        debug!(
            start = timeline.start(),
            end = timeline.end(),
            len = timeline.len(),
            "timeline generated"
        );
        record_stage("boundary", started);

        let mut degradations = scan.skipped.clone();

        let stage = Instant::now();
        let track_path = match extract_track_path(&entities, self.config.track_path_stride) {
            Ok(path) => path,
            Err(err) => {
                warn!(error = %err, "track path unavailable, emitting empty path");
                degradations.push(Degradation::TrackPath {
                    reason: err.to_string(),
                });
                Vec::new()
            }
        };
        record_stage("track_path", stage);

        let stage = Instant::now();
        let mut aligned = Vec::with_capacity(scan.eligible.len());
        for (index, entity) in entities.into_iter().enumerate() {
            if !scan.is_eligible(index) {
                continue;
            }
            let id = entity.id().clone();
            let mut stream = match align_entity(&id, entity.motion, entity.position, &timeline) {
                Ok(stream) => stream,
                Err(err) => {
                    warn!(entity = %id, error = %err, "entity dropped during alignment");
                    degradations.push(Degradation::EntityAlignment {
                        entity: id,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            accumulate_distance(&mut stream, &timeline);
            degradations.extend(annotate_laps(
                &mut stream,
                &entity.laps,
                &timeline,
                self.config.policy.default_compound,
            ));

            aligned.push(AlignedEntity {
                info: entity.info,
                stream,
            });
        }
        record_stage("align", stage);

        let stage = Instant::now();
        let assembled = assemble_frames(
            &timeline,
            &aligned,
            &self.config.policy,
            self.config.frame_stride,
        );
        degradations.extend(assembled.degradations);
        record_stage("assemble", stage);

        for degradation in &degradations {
            metrics::counter!("replay_degradations_total", "kind" => degradation.kind())
                .increment(1);
        }

        let entities_aligned: Vec<EntityId> =
            aligned.iter().map(|e| e.info.id.clone()).collect();
        let meta = ReplayMeta {
            timeline_start: timeline.start(),
            timeline_end: timeline.end(),
            timeline_len: timeline.len(),
            step_ms: timeline.step_ms(),
            entities_total,
            entities_aligned,
            frames_emitted: assembled.frames.len(),
            track_path_points: track_path.len(),
            degradations,
        };

        info!(
            frames = meta.frames_emitted,
            aligned = meta.entities_aligned.len(),
            degraded = meta.degradations.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "replay built"
        );

        Ok(ReplayOutput {
            response: ReplayResponse {
                track_path,
                frames: assembled.frames,
            },
            meta,
        })
    }
}

fn record_stage(stage: &'static str, since: Instant) {
    metrics::histogram!("replay_stage_seconds", "stage" => stage)
        .record(since.elapsed().as_secs_f64());
}
