//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};
use contracts::ReplayConfig;

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(&args.config).into());
    }

    let overrides = args.overrides();
    if !overrides.is_empty() {
        info!(?overrides, "Applying command-line overrides");
    }
    let replay = config_loader::ConfigLoader::load_with_overrides(&args.config, overrides)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    for warning in config_loader::warnings(&replay) {
        warn!(%warning, "Configuration warning");
    }

    info!(
        session = %replay.session.key(),
        source = ?replay.source.kind,
        step_ms = replay.timeline.step_ms,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&replay);
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        replay,
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    });

    info!("Starting pipeline...");

    tokio::select! {
        result = pipeline.run() => {
            let stats = result.context("Pipeline execution failed")?;
            info!(
                frames = stats.meta.frames_emitted,
                entities = stats.meta.entities_aligned.len(),
                degradations = stats.meta.degradations.len(),
                duration_secs = stats.duration.as_secs_f64(),
                "Pipeline completed successfully"
            );
            stats.print_summary();
        }
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, abandoning replay");
        }
    }

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM; a handler that cannot be installed never fires
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(replay: &ReplayConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Session: {}", replay.session.key());

    println!("\nSource:");
    println!("  Kind: {:?}", replay.source.kind);
    if let Some(ref path) = replay.source.path {
        println!("  Path: {}", path.display());
    }
    let mock = &replay.source.mock;
    if replay.source.kind == contracts::SourceKind::Mock {
        println!(
            "  Mock: {} entities, {} laps, seed {}",
            mock.entities, mock.laps, mock.seed
        );
    }

    println!("\nEngine:");
    println!("  Step: {}ms", replay.timeline.step_ms);
    println!("  Frame stride: {}", replay.frames.stride);
    println!("  Track path stride: {}", replay.track_path.stride);
    println!("  DRS open codes: {:?}", replay.policy.drs_active_codes);
    println!("  Default compound: {}", replay.policy.default_compound.as_str());

    println!("\nOutput:");
    match replay.output.path {
        Some(ref path) => println!("  File: {}", path.display()),
        None => println!("  stdout"),
    }
    println!("  Pretty: {}", replay.output.pretty);

    println!();
}
