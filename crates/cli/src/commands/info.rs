//! `info` command implementation.
//!
//! Acquires the configured session and reports what each entity brings to
//! a replay, without building one. `--list` enumerates recordings instead.

use anyhow::{Context, Result};
use contracts::{EntityTelemetry, ReplayConfig, SessionData, SourceKind, TimestampMs};
use ingestion::FileSessionSource;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;
use crate::pipeline::load_session;

/// Session info for JSON output
#[derive(Serialize)]
struct SessionInfo {
    session: String,
    source: String,
    entities: Vec<EntityInfo>,
}

#[derive(Serialize)]
struct EntityInfo {
    id: String,
    name: String,
    team: String,
    motion_samples: usize,
    position_samples: usize,
    lap_events: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_ms: Option<TimestampMs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_ms: Option<TimestampMs>,
    /// Whether the entity can enter the timeline
    eligible: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    laps: Vec<LapInfo>,
}

#[derive(Serialize)]
struct LapInfo {
    lap_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_ms: Option<TimestampMs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lap_time_ms: Option<TimestampMs>,
    compound: String,
    tyre_age: u32,
}

#[derive(Serialize)]
struct RecordingInfo {
    year: u16,
    stem: String,
    path: String,
}

/// Execute the `info` command
pub async fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading session info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(&args.config).into());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.list {
        return list_recordings(&config, args.json).await;
    }

    let data = load_session(&config, None)
        .await
        .context("Failed to acquire session")?;
    let info = build_session_info(&config, &data, args.laps);

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize session info")?;
        println!("{json}");
    } else {
        print_session_info(&info);
    }

    Ok(())
}

async fn list_recordings(config: &ReplayConfig, json: bool) -> Result<()> {
    let root = match (config.source.kind, &config.source.path) {
        (SourceKind::File, Some(root)) => root,
        _ => anyhow::bail!("--list requires a file source with a root path"),
    };

    let recordings: Vec<RecordingInfo> = FileSessionSource::new(root)
        .list_sessions()
        .await
        .with_context(|| format!("Failed to list recordings under {}", root.display()))?
        .into_iter()
        .map(|r| RecordingInfo {
            year: r.year,
            stem: r.stem,
            path: r.path.display().to_string(),
        })
        .collect();

    if json {
        let json = serde_json::to_string_pretty(&recordings)
            .context("Failed to serialize recording list")?;
        println!("{json}");
    } else {
        println!("\n=== Recordings under {} ===\n", root.display());
        if recordings.is_empty() {
            println!("  (none)");
        }
        for recording in &recordings {
            println!("  {} {}", recording.year, recording.stem);
        }
        println!();
    }
    Ok(())
}

fn build_session_info(config: &ReplayConfig, data: &SessionData, with_laps: bool) -> SessionInfo {
    SessionInfo {
        session: data.key.to_string(),
        source: format!("{:?}", config.source.kind).to_lowercase(),
        entities: data
            .entities
            .iter()
            .map(|e| entity_info(e, with_laps))
            .collect(),
    }
}

fn entity_info(entity: &EntityTelemetry, with_laps: bool) -> EntityInfo {
    let times = || entity.motion.iter().map(|m| m.time_ms);
    let laps = if with_laps {
        entity
            .laps
            .iter()
            .map(|lap| LapInfo {
                lap_number: lap.lap_number,
                start_ms: lap.lap_start_ms,
                lap_time_ms: lap.lap_time_ms,
                compound: lap.compound.as_str().to_string(),
                tyre_age: lap.tyre_age,
            })
            .collect()
    } else {
        Vec::new()
    };

    EntityInfo {
        id: entity.info.id.to_string(),
        name: entity.info.name.clone(),
        team: entity.info.team.clone(),
        motion_samples: entity.motion.len(),
        position_samples: entity.position.len(),
        lap_events: entity.laps.len(),
        first_ms: times().min(),
        last_ms: times().max(),
        eligible: !entity.laps.is_empty()
            && !entity.motion.is_empty()
            && !entity.position.is_empty(),
        laps,
    }
}

fn print_session_info(info: &SessionInfo) {
    println!("\n=== Session: {} ({}) ===\n", info.session, info.source);

    for entity in &info.entities {
        let extent = match (entity.first_ms, entity.last_ms) {
            (Some(first), Some(last)) => format!("{first}..{last}ms"),
            _ => "no motion".to_string(),
        };
        println!(
            "  {} {:<14} {:<18} motion={:<6} position={:<6} laps={:<3} {}{}",
            entity.id,
            entity.name,
            entity.team,
            entity.motion_samples,
            entity.position_samples,
            entity.lap_events,
            extent,
            if entity.eligible { "" } else { "  [skipped]" }
        );
        for lap in &entity.laps {
            println!(
                "      lap {:>3}  start={:<10} time={:<8} {} age {}",
                lap.lap_number,
                lap.start_ms.map_or_else(|| "-".to_string(), |t| t.to_string()),
                lap.lap_time_ms.map_or_else(|| "-".to_string(), |t| t.to_string()),
                lap.compound,
                lap.tyre_age
            );
        }
    }

    let eligible = info.entities.iter().filter(|e| e.eligible).count();
    println!("\n  {eligible}/{} entities eligible\n", info.entities.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::{ConfigFormat, ConfigLoader};
    use ingestion::MockSessionSource;

    #[test]
    fn test_entity_info_from_mock() {
        let config = ConfigLoader::load_from_str(
            r#"
            [session]
            year = 2023
            event = "Monza"

            [source]
            kind = "mock"

            [source.mock]
            entities = 3
            laps = 2
            without_position = 1
            "#,
            ConfigFormat::Toml,
        )
        .unwrap();
        let data = MockSessionSource::new(config.source.mock.clone()).generate(&config.session.key());
        let info = build_session_info(&config, &data, true);

        assert_eq!(info.source, "mock");
        assert_eq!(info.entities.len(), 3);
        assert!(info.entities[0].eligible);
        assert!(!info.entities[2].eligible);
        assert_eq!(info.entities[0].laps.len(), 2);
        assert_eq!(info.entities[0].laps[0].compound, "MEDIUM");
        assert!(info.entities[0].first_ms <= info.entities[0].last_ms);
    }
}
