//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::ReplayConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    session: String,
    source: String,
    step_ms: i64,
    frame_stride: usize,
    output: String,
}

impl From<&ReplayConfig> for ConfigSummary {
    fn from(config: &ReplayConfig) -> Self {
        Self {
            version: format!("{:?}", config.version),
            session: config.session.key().to_string(),
            source: format!("{:?}", config.source.kind).to_lowercase(),
            step_ms: config.timeline.step_ms,
            frame_stride: config.frames.stride,
            output: config
                .output
                .path
                .as_ref()
                .map_or_else(|| "stdout".to_string(), |p| p.display().to_string()),
        }
    }
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{json}");
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: Vec::new(),
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => ValidationResult {
            valid: true,
            config_path,
            error: None,
            warnings: config_loader::warnings(&config),
            summary: Some(ConfigSummary::from(&config)),
        },
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: Vec::new(),
            summary: None,
        },
    }
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Session: {}", summary.session);
            println!("  Source: {}", summary.source);
            println!("  Step: {}ms", summary.step_ms);
            println!("  Frame stride: {}", summary.frame_stride);
            println!("  Output: {}", summary.output);
        }

        if !result.warnings.is_empty() {
            println!("\n⚠ Warnings:");
            for warning in &result.warnings {
                println!("  - {warning}");
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_file(body: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_valid_config_with_warning() {
        let file = config_file(
            r#"
            [session]
            year = 2023
            event = "Monza"

            [source]
            kind = "mock"

            [policy]
            drs_active_codes = []
            "#,
        );
        let result = validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        });
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
        let summary = result.summary.unwrap();
        assert_eq!(summary.session, "2023 Monza [R]");
        assert_eq!(summary.source, "mock");
        assert_eq!(summary.output, "stdout");
    }

    #[test]
    fn test_invalid_step() {
        let file = config_file(
            r#"
            [session]
            year = 2023
            event = "Monza"

            [source]
            kind = "mock"

            [timeline]
            step_ms = 0
            "#,
        );
        let result = validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: false,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("timeline.step_ms"));
    }

    #[test]
    fn test_missing_file() {
        let result = validate_config(&ValidateArgs {
            config: "/nonexistent/replay.toml".into(),
            json: false,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().starts_with("File not found"));
    }
}
