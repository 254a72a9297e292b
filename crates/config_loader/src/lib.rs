//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Apply command-line overrides
//! - Validate configuration legality
//! - Generate `ReplayConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("replay.toml")).unwrap();
//! println!("Session: {}", config.session.key());
//! ```

mod parser;
mod validator;

pub use contracts::ReplayConfig;
pub use parser::ConfigFormat;
pub use validator::warnings;

use contracts::{ReplayError, TimestampMs};
use std::path::{Path, PathBuf};

/// Values that replace file settings before validation
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub year: Option<u16>,
    pub event: Option<String>,
    pub session: Option<String>,
    pub step_ms: Option<TimestampMs>,
    pub output: Option<PathBuf>,
}

impl ConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.year.is_none()
            && self.event.is_none()
            && self.session.is_none()
            && self.step_ms.is_none()
            && self.output.is_none()
    }

    /// Write every present override into `config`
    pub fn apply(self, config: &mut ReplayConfig) {
        if let Some(year) = self.year {
            config.session.year = year;
        }
        if let Some(event) = self.event {
            config.session.event = event;
        }
        if let Some(session) = self.session {
            config.session.session = session;
        }
        if let Some(step_ms) = self.step_ms {
            config.timeline.step_ms = step_ms;
        }
        if let Some(output) = self.output {
            config.output.path = Some(output);
        }
    }
}

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<ReplayConfig, ReplayError> {
        Self::load_with_overrides(path, ConfigOverrides::default())
    }

    /// Load from file, apply `overrides`, then validate the merged result
    pub fn load_with_overrides(
        path: &Path,
        overrides: ConfigOverrides,
    ) -> Result<ReplayConfig, ReplayError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        let mut config = parser::parse(&content, format)?;
        overrides.apply(&mut config);
        validator::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<ReplayConfig, ReplayError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Serialize ReplayConfig to TOML string
    pub fn to_toml(config: &ReplayConfig) -> Result<String, ReplayError> {
        toml::to_string_pretty(config)
            .map_err(|e| ReplayError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize ReplayConfig to JSON string
    pub fn to_json(config: &ReplayConfig) -> Result<String, ReplayError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ReplayError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ReplayError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ReplayError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext)
            .ok_or_else(|| ReplayError::config_parse(format!("unsupported config format: .{ext}")))
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ReplayError> {
        Ok(std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL_TOML: &str = r#"
[session]
year = 2023
event = "Monza"

[source]
kind = "file"
path = "data"

[timeline]
step_ms = 250

[track_path]
stride = 4
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.session.event, "Monza");
        assert_eq!(config.session.key().to_string(), "2023 Monza [R]");
    }

    #[test]
    fn test_round_trip_toml() {
        let config = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&config).unwrap();
        let again = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(config.session.key(), again.session.key());
        assert_eq!(config.timeline.step_ms, again.timeline.step_ms);
        assert_eq!(config.policy, again.policy);
    }

    #[test]
    fn test_round_trip_json() {
        let config = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&config).unwrap();
        let again = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(config.session.key(), again.session.key());
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = MINIMAL_TOML.replace("step_ms = 250", "step_ms = 0");
        let err = ConfigLoader::load_from_str(&content, ConfigFormat::Toml).unwrap_err();
        assert!(err.to_string().contains("timeline.step_ms"), "got: {err}");
    }

    #[test]
    fn test_overrides_are_validated() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(MINIMAL_TOML.as_bytes()).unwrap();

        let overrides = ConfigOverrides {
            year: Some(2024),
            event: Some("Abu Dhabi".into()),
            step_ms: Some(100),
            output: Some("replay.json".into()),
            ..Default::default()
        };
        assert!(!overrides.is_empty());
        let config = ConfigLoader::load_with_overrides(file.path(), overrides).unwrap();
        assert_eq!(config.session.key().to_string(), "2024 Abu Dhabi [R]");
        assert_eq!(config.timeline.step_ms, 100);
        assert_eq!(config.output.path, Some(PathBuf::from("replay.json")));

        let bad = ConfigOverrides {
            step_ms: Some(0),
            ..Default::default()
        };
        assert!(ConfigLoader::load_with_overrides(file.path(), bad).is_err());
    }

    #[test]
    fn test_unknown_extension() {
        let err = ConfigLoader::load_from_path(Path::new("replay.yaml")).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"), "got: {err}");
    }
}
