//! Pipeline orchestrator - acquisition, replay build and response output.
//!
//! The source is chosen by `source.kind`: recorded files or the synthetic
//! generator. Both go through the same `SessionSource` seam.

use std::path::Path;
use std::time::{Duration, Instant};

use contracts::{ErrorBody, ReplayConfig, ReplayError, SessionData, SessionKey, SourceKind};
use ingestion::{FileSessionSource, MockSessionSource, SessionSource};
use serde::Serialize;
use sync_engine::{ReplayEngine, ReplayOutput};
use tracing::{error, info, warn};

use super::PipelineStats;
use crate::error::{CliError, Result};

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated replay configuration
    pub replay: ReplayConfig,

    /// Acquisition timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run one replay request to completion.
    ///
    /// Request-level failures are written as an error body to the configured
    /// output before being returned.
    pub async fn run(self) -> Result<PipelineStats> {
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port).map_err(|e| CliError::Metrics {
                message: format!("{e:#}"),
            })?;
            info!(port, "Metrics endpoint available");
        }

        let started = Instant::now();
        let result = self.execute().await;

        match result {
            Ok(mut stats) => {
                stats.duration = started.elapsed();
                Ok(stats)
            }
            Err(err) => {
                observability::record_replay_failure(err.reason());
                if let CliError::Replay(replay_err) = &err {
                    if replay_err.is_request_failure() {
                        let body = ErrorBody::from(replay_err);
                        if let Err(write_err) = self.write_document(&body) {
                            error!(error = %write_err, "Failed to write error response");
                        }
                    }
                }
                Err(err)
            }
        }
    }

    async fn execute(&self) -> Result<PipelineStats> {
        let replay = &self.config.replay;
        let mut stats = PipelineStats::default();

        let stage = Instant::now();
        let data = load_session(replay, self.config.timeout).await?;
        stats.entities_loaded = data.entities.len();
        stats.motion_samples = data.total_motion_samples();
        stats.position_samples = data.total_position_samples();
        stats.acquire_duration = stage.elapsed();
        observability::record_stage_latency_ms("acquire", millis(stats.acquire_duration));

        let stage = Instant::now();
        let engine = ReplayEngine::new(replay.to_engine_config());
        let output = tokio::task::spawn_blocking(move || engine.run(data))
            .await
            .map_err(|e| CliError::Worker {
                message: e.to_string(),
            })??;
        stats.build_duration = stage.elapsed();
        observability::record_stage_latency_ms("build", millis(stats.build_duration));

        let ReplayOutput { response, meta } = output;
        observability::record_replay_metrics(&meta);
        for degradation in &meta.degradations {
            warn!(%degradation, "Recovered failure");
        }
        stats.replay_metrics.update(&meta);
        stats.replay_metrics.observe_frames(&response.frames);

        let stage = Instant::now();
        stats.bytes_written = self.write_document(&response)?;
        stats.write_duration = stage.elapsed();
        observability::record_stage_latency_ms("write", millis(stats.write_duration));
        observability::record_response_written(stats.bytes_written);

        stats.meta = meta;
        Ok(stats)
    }

    /// Serialize `document` to the configured destination, returning bytes written
    fn write_document<T: Serialize>(&self, document: &T) -> Result<usize> {
        let output = &self.config.replay.output;
        let mut body = if output.pretty {
            serde_json::to_vec_pretty(document)
        } else {
            serde_json::to_vec(document)
        }
        .map_err(|e| ReplayError::Serialize(e.to_string()))?;
        body.push(b'\n');

        match &output.path {
            Some(path) => write_file(path, &body)?,
            None => {
                use std::io::Write;
                let mut stdout = std::io::stdout().lock();
                stdout
                    .write_all(&body)
                    .and_then(|()| stdout.flush())
                    .map_err(|e| CliError::output("stdout", e))?;
            }
        }
        Ok(body.len())
    }
}

/// Acquire the configured session from the configured source
pub async fn load_session(replay: &ReplayConfig, timeout: Option<Duration>) -> Result<SessionData> {
    let key = replay.session.key();
    match replay.source.kind {
        SourceKind::File => {
            let root = replay.source.path.clone().ok_or_else(|| {
                ReplayError::config_validation("source.path", "a file source requires a root path")
            })?;
            acquire(&FileSessionSource::new(root), &key, timeout).await
        }
        SourceKind::Mock => {
            let source = MockSessionSource::new(replay.source.mock.clone());
            acquire(&source, &key, timeout).await
        }
    }
}

async fn acquire<S: SessionSource>(
    source: &S,
    key: &SessionKey,
    timeout: Option<Duration>,
) -> Result<SessionData> {
    info!(source = source.name(), session = %key, "Acquiring session");
    let load = source.load(key);
    let data = match timeout {
        Some(limit) => tokio::time::timeout(limit, load).await.map_err(|_| {
            ReplayError::acquisition(key, format!("no response within {}s", limit.as_secs()))
        })??,
        None => load.await?,
    };
    info!(
        source = source.name(),
        entities = data.entities.len(),
        motion = data.total_motion_samples(),
        position = data.total_position_samples(),
        "Session acquired"
    );
    Ok(data)
}

fn write_file(path: &Path, body: &[u8]) -> Result<()> {
    let target = path.display().to_string();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CliError::output(&target, e))?;
    }
    std::fs::write(path, body).map_err(|e| CliError::output(&target, e))?;
    info!(path = %target, bytes = body.len(), "Response written");
    Ok(())
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
