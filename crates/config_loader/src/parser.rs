//! Config parsing
//!
//! TOML is the primary format; JSON is accepted as well.

use contracts::{ReplayConfig, ReplayError};

/// Config file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (recommended)
    Toml,
    Json,
}

impl ConfigFormat {
    /// Infer format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn parse_toml(content: &str) -> Result<ReplayConfig, ReplayError> {
    toml::from_str(content).map_err(|e| ReplayError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

pub fn parse_json(content: &str) -> Result<ReplayConfig, ReplayError> {
    serde_json::from_str(content).map_err(|e| ReplayError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse according to `format`
pub fn parse(content: &str, format: ConfigFormat) -> Result<ReplayConfig, ReplayError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{SourceKind, TyreCompound};

    #[test]
    fn test_parse_toml_minimal_uses_defaults() {
        let content = r#"
[session]
year = 2023
event = "Monza"
"#;
        let config = parse_toml(content).unwrap();
        assert_eq!(config.session.year, 2023);
        assert_eq!(config.session.session, "R");
        assert_eq!(config.source.kind, SourceKind::File);
        assert_eq!(config.timeline.step_ms, 250);
        assert_eq!(config.frames.stride, 1);
        assert_eq!(config.track_path.stride, 4);
        assert_eq!(config.policy.drs_active_codes, vec![10, 12, 14]);
        assert_eq!(config.policy.default_compound, TyreCompound::Soft);
        assert!(config.output.path.is_none());
    }

    #[test]
    fn test_parse_toml_full() {
        let content = r#"
[session]
year = 2024
event = "Abu Dhabi"
session = "Q"

[source]
kind = "mock"

[source.mock]
entities = 4
laps = 2
seed = 99

[timeline]
step_ms = 500

[frames]
stride = 2

[track_path]
stride = 8

[policy]
drs_active_codes = [10, 14]
default_compound = "MEDIUM"

[output]
path = "out/replay.json"
pretty = true
"#;
        let config = parse_toml(content).unwrap();
        assert_eq!(config.session.session, "Q");
        assert_eq!(config.source.kind, SourceKind::Mock);
        assert_eq!(config.source.mock.entities, 4);
        assert_eq!(config.source.mock.seed, 99);
        assert_eq!(config.timeline.step_ms, 500);
        assert_eq!(config.frames.stride, 2);
        assert_eq!(config.track_path.stride, 8);
        assert_eq!(config.policy.default_compound, TyreCompound::Medium);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "session": { "year": 2023, "event": "Monza" },
            "source": { "kind": "file", "path": "data" },
            "timeline": { "step_ms": 100 }
        }"#;
        let config = parse_json(content).unwrap();
        assert_eq!(config.timeline.step_ms, 100);
        assert_eq!(config.source.path.as_deref(), Some(std::path::Path::new("data")));
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let err = parse_toml("invalid toml [[[").unwrap_err();
        assert!(matches!(err, ReplayError::ConfigParse { .. }));
    }

    #[test]
    fn test_missing_session_is_parse_error() {
        let err = parse_toml("[timeline]\nstep_ms = 250\n").unwrap_err();
        assert!(err.to_string().contains("session"), "got: {err}");
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
