//! # Integration Tests
//!
//! Integration and end-to-end tests.
//!
//! Covers:
//! - Response schema snapshots
//! - Engine scenarios on hand-built sessions
//! - Mock and file source end-to-end runs

#[cfg(test)]
mod support {
    use contracts::{
        EntityInfo, EntityTelemetry, LapEvent, MotionSample, PositionSample, SessionData,
        SessionKey, TimestampMs, TyreCompound,
    };

    pub fn key() -> SessionKey {
        SessionKey::new(2023, "Monza", "R")
    }

    pub fn session(entities: Vec<EntityTelemetry>) -> SessionData {
        SessionData {
            key: key(),
            entities,
        }
    }

    pub fn motion(time_ms: TimestampMs, speed: f64, drs: u16) -> MotionSample {
        MotionSample {
            time_ms,
            speed: Some(speed),
            rpm: Some(10500.0),
            gear: Some(7.0),
            throttle: Some(99.6),
            brake: Some(0.0),
            drs: Some(drs),
        }
    }

    pub fn position(time_ms: TimestampMs, x: f64, y: f64) -> PositionSample {
        PositionSample { time_ms, x, y }
    }

    pub fn lap(
        lap_number: u32,
        start: TimestampMs,
        compound: TyreCompound,
        tyre_age: u32,
    ) -> LapEvent {
        LapEvent {
            lap_number,
            lap_start_ms: Some(start),
            lap_time_ms: None,
            compound,
            tyre_age,
        }
    }

    pub fn entity(
        id: &str,
        motion: Vec<MotionSample>,
        position: Vec<PositionSample>,
        laps: Vec<LapEvent>,
    ) -> EntityTelemetry {
        EntityTelemetry {
            info: EntityInfo {
                id: id.into(),
                name: format!("Driver {id}"),
                team: "Team".to_string(),
                color: "112233".to_string(),
            },
            motion,
            position,
            laps,
        }
    }

    /// Constant-speed entity sampled every `every` ms over `[0, end]`
    pub fn cruising(id: &str, speed: f64, end: TimestampMs, every: usize) -> EntityTelemetry {
        let times: Vec<TimestampMs> = (0..=end).step_by(every).collect();
        entity(
            id,
            times.iter().map(|&t| motion(t, speed, 0)).collect(),
            times
                .iter()
                .map(|&t| position(t, t as f64 / 100.0, 0.0))
                .collect(),
            vec![lap(1, 0, TyreCompound::Medium, 1)],
        )
    }
}

#[cfg(test)]
mod contract_tests {
    use std::collections::BTreeMap;

    use contracts::{DriverState, ErrorBody, Frame, ReplayError, ReplayResponse, TrackPoint};
    use serde_json::{json, Value};

    #[test]
    fn test_response_wire_shape() {
        let response = ReplayResponse {
            track_path: vec![TrackPoint { x: 1.5, y: -2.0 }],
            frames: vec![Frame {
                timestamp: 250,
                drivers: vec![DriverState {
                    id: "VER".into(),
                    name: "Verstappen".into(),
                    team: "Red Bull Racing".into(),
                    color: "#3671C6".into(),
                    x: 1.5,
                    y: -2.0,
                    speed: 312,
                    rpm: 11800,
                    gear: 8,
                    throttle: 100,
                    brake: 0,
                    drs: true,
                    total_distance: 86.6,
                    lap: 3,
                    tyre_compound: "HARD".into(),
                    tyre_age: 12,
                }],
                leader_lap: 3,
                sector_owners: BTreeMap::from([
                    ("1".to_string(), "VER".into()),
                    ("2".to_string(), "VER".into()),
                    ("3".to_string(), "VER".into()),
                ]),
                pitting_drivers: Vec::new(),
            }],
        };

        let value: Value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["trackPath"], json!([{ "x": 1.5, "y": -2.0 }]));

        let frame = &value["frames"][0];
        assert_eq!(frame["timestamp"], 250);
        assert_eq!(frame["leaderLap"], 3);
        assert_eq!(frame["sectorOwners"], json!({ "1": "VER", "2": "VER", "3": "VER" }));
        assert_eq!(frame["pittingDrivers"], json!([]));

        let driver = &frame["drivers"][0];
        for key in [
            "id",
            "name",
            "team",
            "color",
            "x",
            "y",
            "speed",
            "rpm",
            "gear",
            "throttle",
            "brake",
            "drs",
            "totalDistance",
            "lap",
            "tyreCompound",
            "tyreAge",
        ] {
            assert!(driver.get(key).is_some(), "missing driver key {key}");
        }
        assert_eq!(driver.as_object().unwrap().len(), 16);
        assert_eq!(driver["tyreCompound"], "HARD");
        assert_eq!(driver["drs"], true);
    }

    #[test]
    fn test_error_body_shape() {
        let err = ReplayError::acquisition("2023 Monza [R]", "provider unavailable");
        let value = serde_json::to_value(ErrorBody::from(&err)).unwrap();
        assert_eq!(
            value,
            json!({ "error": "failed to load session 2023 Monza [R]: provider unavailable" })
        );
    }
}

#[cfg(test)]
mod engine_scenarios {
    use contracts::{EngineConfig, ReplayError, TyreCompound};
    use sync_engine::{align_entity, annotate_laps, ReplayEngine, Timeline};

    use crate::support::*;

    fn engine(step_ms: i64) -> ReplayEngine {
        ReplayEngine::new(EngineConfig {
            step_ms,
            ..Default::default()
        })
    }

    #[test]
    fn test_entity_without_positions_absent_from_frames() {
        let a = entity(
            "VER",
            vec![motion(0, 100.0, 0), motion(1000, 100.0, 0)],
            vec![position(0, 0.0, 0.0), position(1000, 27.8, 0.0)],
            vec![lap(1, 0, TyreCompound::Soft, 1)],
        );
        let b = entity(
            "HAM",
            vec![motion(0, 150.0, 0), motion(1000, 150.0, 0)],
            Vec::new(),
            vec![lap(1, 0, TyreCompound::Soft, 1)],
        );

        let output = engine(500).run(session(vec![a, b])).unwrap();
        let frames = &output.response.frames;

        assert_eq!(output.meta.timeline_len, 3);
        assert_eq!(
            frames.iter().map(|f| f.timestamp).collect::<Vec<_>>(),
            vec![0, 500, 1000]
        );
        for frame in frames {
            assert_eq!(frame.drivers.len(), 1);
            assert_eq!(frame.drivers[0].id, "VER");
            assert!(frame.drivers.iter().all(|d| d.id != "HAM"));
        }
        let last = &frames[2].drivers[0];
        assert!((last.total_distance - 100.0 / 3.6).abs() < 0.05);
        assert_eq!(output.meta.count_of("entity_skipped"), 1);
    }

    #[test]
    fn test_aligned_stream_length_matches_timeline() {
        let timeline = Timeline::new(0, 1000, 500).unwrap();
        let stream = align_entity(
            &"VER".into(),
            vec![motion(0, 100.0, 0), motion(1000, 100.0, 0)],
            vec![position(0, 0.0, 0.0), position(1000, 27.8, 0.0)],
            &timeline,
        )
        .unwrap();
        assert_eq!(stream.len(), timeline.len());
        assert_eq!(stream.len(), 3);
    }

    #[test]
    fn test_no_usable_entity_is_no_data() {
        let only_motion = entity(
            "VER",
            vec![motion(0, 100.0, 0)],
            Vec::new(),
            vec![lap(1, 0, TyreCompound::Soft, 1)],
        );
        let err = engine(250).run(session(vec![only_motion])).unwrap_err();
        assert!(matches!(err, ReplayError::NoData { .. }));

        let err = engine(250).run(session(Vec::new())).unwrap_err();
        assert!(matches!(err, ReplayError::NoData { .. }));
        assert_eq!(
            err.to_string(),
            "no usable telemetry found for session 2023 Monza [R]"
        );
    }

    #[test]
    fn test_lap_event_applies_from_its_start() {
        let timeline = Timeline::new(0, 600, 200).unwrap();
        assert_eq!(timeline.iter().collect::<Vec<_>>(), vec![0, 200, 400, 600]);

        let mut stream = align_entity(
            &"VER".into(),
            vec![motion(0, 200.0, 0), motion(600, 200.0, 0)],
            vec![position(0, 0.0, 0.0), position(600, 30.0, 0.0)],
            &timeline,
        )
        .unwrap();
        let skipped = annotate_laps(
            &mut stream,
            &[lap(2, 400, TyreCompound::Hard, 2)],
            &timeline,
            TyreCompound::Soft,
        );
        assert!(skipped.is_empty());

        let state: Vec<_> = stream
            .rows()
            .iter()
            .map(|r| (r.lap, r.compound, r.tyre_age))
            .collect();
        assert_eq!(
            state,
            vec![
                (1, TyreCompound::Soft, 1),
                (1, TyreCompound::Soft, 1),
                (2, TyreCompound::Hard, 2),
                (2, TyreCompound::Hard, 2),
            ]
        );
    }

    #[test]
    fn test_drivers_ordered_by_distance_with_leader_lap() {
        let mut fast = cruising("NOR", 300.0, 2000, 250);
        fast.laps.push(lap(2, 1000, TyreCompound::Medium, 2));
        let slow = cruising("ALB", 150.0, 2000, 250);

        let output = engine(500).run(session(vec![slow, fast])).unwrap();
        let frames = &output.response.frames;
        assert_eq!(frames.len(), 5);

        // Equal distance at the first point; ties go by id
        let first: Vec<_> = frames[0].drivers.iter().map(|d| d.id.to_string()).collect();
        assert_eq!(first, vec!["ALB", "NOR"]);
        assert_eq!(frames[0].leader_lap, 1);

        for frame in &frames[1..] {
            assert_eq!(frame.drivers[0].id, "NOR");
            assert!(frame.drivers[0].total_distance > frame.drivers[1].total_distance);
            assert_eq!(frame.sector_owners["1"], "NOR");
            assert!(frame.pitting_drivers.is_empty());
        }
        assert_eq!(frames[1].leader_lap, 1);
        assert_eq!(frames[2].leader_lap, 2);
        assert_eq!(frames[4].leader_lap, 2);
        assert_eq!(frames[4].drivers[1].lap, 1);
    }

    #[test]
    fn test_drs_flag_follows_active_codes() {
        let codes = [8u16, 10, 12, 14, 0, 11];
        let motion: Vec<_> = codes
            .iter()
            .enumerate()
            .map(|(i, &code)| motion(i as i64 * 1000, 120.0, code))
            .collect();
        let position: Vec<_> = (0..codes.len())
            .map(|i| position(i as i64 * 1000, i as f64, 0.0))
            .collect();
        let data = session(vec![entity(
            "LEC",
            motion,
            position,
            vec![lap(1, 0, TyreCompound::Soft, 1)],
        )]);

        let output = engine(1000).run(data).unwrap();
        let drs: Vec<bool> = output
            .response
            .frames
            .iter()
            .map(|f| f.drivers[0].drs)
            .collect();
        assert_eq!(drs, vec![false, true, true, true, false, false]);
    }

    #[test]
    fn test_invalid_step_is_config_error() {
        let data = session(vec![cruising("VER", 200.0, 1000, 250)]);
        let err = engine(0).run(data).unwrap_err();
        assert!(matches!(err, ReplayError::ConfigValidation { .. }));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashSet;
    use std::path::Path;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{MockSourceSettings, ReplayResponse, SessionData, SessionSource};
    use ingestion::{FileSessionSource, MockSessionSource};
    use observability::ReplayMetricsAggregator;
    use sync_engine::ReplayEngine;
    use tempfile::tempdir;

    use crate::support::*;

    fn mock_source(entities: usize, without_position: usize) -> MockSessionSource {
        MockSessionSource::new(MockSourceSettings {
            entities,
            laps: 2,
            seed: 2024,
            without_position,
        })
    }

    /// End-to-end: MockSessionSource -> ReplayEngine -> response
    #[tokio::test]
    async fn test_e2e_mock_pipeline() {
        let source = mock_source(5, 1);
        let data = source.load(&key()).await.unwrap();
        let missing = data.entities[4].info.id.clone();
        let output = ReplayEngine::default().run(data).unwrap();

        let response = &output.response;
        assert!(!response.frames.is_empty());
        assert!(!response.track_path.is_empty());
        assert_eq!(output.meta.entities_total, 5);
        assert_eq!(output.meta.entities_aligned.len(), 4);
        assert_eq!(output.meta.frames_emitted, response.frames.len());

        for pair in response.frames.windows(2) {
            assert!(pair[1].timestamp > pair[0].timestamp);
            assert_eq!((pair[1].timestamp - pair[0].timestamp) % 250, 0);
        }

        for frame in &response.frames {
            let ids: HashSet<_> = frame.drivers.iter().map(|d| d.id.clone()).collect();
            assert_eq!(ids.len(), frame.drivers.len());
            assert!(!ids.contains(&missing));
            assert_eq!(
                frame.leader_lap,
                frame.drivers.iter().map(|d| d.lap).max().unwrap()
            );
            for pair in frame.drivers.windows(2) {
                assert!(pair[0].total_distance >= pair[1].total_distance);
            }
            for driver in &frame.drivers {
                assert!(driver.brake == 0 || driver.brake == 100);
                assert!(driver.color.starts_with('#'));
            }
        }

        let mut aggregator = ReplayMetricsAggregator::new();
        aggregator.update(&output.meta);
        aggregator.observe_frames(&response.frames);
        let summary = aggregator.summary();
        assert_eq!(summary.total_frames, response.frames.len() as u64);
        assert!((summary.alignment_rate - 80.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_mock_entity_without_position_never_rendered() {
        let source = mock_source(4, 1);
        let data = source.load(&key()).await.unwrap();
        let missing = data.entities[3].info.id.clone();
        assert!(data.entities[3].position.is_empty());

        let output = ReplayEngine::default().run(data).unwrap();
        assert!(!output.meta.entities_aligned.contains(&missing));
        for frame in &output.response.frames {
            assert!(frame.drivers.iter().all(|d| d.id != missing));
        }
    }

    #[tokio::test]
    async fn test_e2e_config_driven_run() {
        let config = ConfigLoader::load_from_str(
            r#"
            [session]
            year = 2023
            event = "Monza"

            [source]
            kind = "mock"

            [source.mock]
            entities = 3
            laps = 1

            [timeline]
            step_ms = 1000

            [frames]
            stride = 2

            [policy]
            drs_active_codes = [8]
            "#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let source = MockSessionSource::new(config.source.mock.clone());
        let data = source.load(&config.session.key()).await.unwrap();
        let output = ReplayEngine::new(config.to_engine_config())
            .run(data)
            .unwrap();

        assert_eq!(output.meta.step_ms, 1000);
        for pair in output.response.frames.windows(2) {
            assert_eq!(pair[1].timestamp - pair[0].timestamp, 2000);
        }
    }

    fn write_recording(root: &Path, data: &SessionData) {
        let dir = root.join(data.key.year.to_string());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(format!("{}.json", data.key.file_stem())),
            serde_json::to_vec(data).unwrap(),
        )
        .unwrap();
    }

    /// Recording written to disk replays identically to the in-memory session
    #[tokio::test]
    async fn test_e2e_file_source_matches_in_memory() {
        let dir = tempdir().unwrap();
        let generated = mock_source(3, 0).generate(&key());
        write_recording(dir.path(), &generated);

        let source = FileSessionSource::new(dir.path());
        let loaded = source.load(&key()).await.unwrap();
        assert_eq!(loaded.entities.len(), 3);

        let engine = ReplayEngine::default();
        let from_file = engine.run(loaded).unwrap().response;
        let in_memory = engine.run(generated).unwrap().response;
        assert_eq!(from_file.frames.len(), in_memory.frames.len());
        assert_eq!(from_file.track_path.len(), in_memory.track_path.len());
        for (a, b) in from_file.frames.iter().zip(&in_memory.frames) {
            assert_eq!(a.timestamp, b.timestamp);
            assert_eq!(a.drivers.len(), b.drivers.len());
            for (x, y) in a.drivers.iter().zip(&b.drivers) {
                assert_eq!(x.id, y.id);
                assert!((x.total_distance - y.total_distance).abs() < 1e-6);
            }
        }

        let json = serde_json::to_string(&from_file).unwrap();
        let parsed: ReplayResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.frames.len(), from_file.frames.len());

        let listed = source.list_sessions().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].stem, "monza_r");
    }

    #[tokio::test]
    async fn test_file_source_missing_session() {
        let dir = tempdir().unwrap();
        let source = FileSessionSource::new(dir.path());
        let err = source.load(&key()).await.unwrap_err();
        assert!(err.is_request_failure());
        assert_eq!(source.stats().snapshot().load_failures, 1);
    }
}
