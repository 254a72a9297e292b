//! Config validation
//!
//! Rules:
//! - field ranges declared on the config types (`validator` derive)
//! - a file source needs a root path; a mock field is between 1 and `MAX_MOCK_ENTITIES`
//! - DRS active codes are unique
//!
//! Softer findings are reported by [`warnings`] and never fail a load.

use contracts::{ReplayConfig, ReplayError, SourceKind, MAX_MOCK_ENTITIES};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Step above which playback becomes visibly coarse
const COARSE_STEP_MS: i64 = 1000;

/// Validate a parsed `ReplayConfig`
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &ReplayConfig) -> Result<(), ReplayError> {
    validate_fields(config)?;
    validate_source(config)?;
    validate_policy(config)?;
    Ok(())
}

/// Non-fatal findings worth showing to the user
pub fn warnings(config: &ReplayConfig) -> Vec<String> {
    let mut out = Vec::new();

    if config.source.kind == SourceKind::Mock && config.source.path.is_some() {
        out.push("source.path is ignored for the mock source".to_string());
    }
    if config.policy.drs_active_codes.is_empty() {
        out.push("policy.drs_active_codes is empty, DRS will never be reported open".to_string());
    }
    if config.timeline.step_ms > COARSE_STEP_MS {
        out.push(format!(
            "timeline.step_ms = {} is coarser than {COARSE_STEP_MS}ms",
            config.timeline.step_ms
        ));
    }
    if config.output.pretty && config.output.path.is_none() {
        out.push("output.pretty with stdout output can be very large".to_string());
    }
    out
}

/// Declarative range/length checks
fn validate_fields(config: &ReplayConfig) -> Result<(), ReplayError> {
    config.validate().map_err(|errors| {
        let mut flat = Vec::new();
        flatten(&errors, "", &mut flat);
        flat.sort();
        let (field, message) = flat
            .into_iter()
            .next()
            .unwrap_or_else(|| ("config".to_string(), errors.to_string()));
        ReplayError::config_validation(field, message)
    })
}

fn flatten(errors: &ValidationErrors, prefix: &str, out: &mut Vec<(String, String)>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                for err in list {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed '{}' check", err.code));
                    out.push((path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    flatten(inner, &format!("{path}[{idx}]"), out);
                }
            }
        }
    }
}

fn validate_source(config: &ReplayConfig) -> Result<(), ReplayError> {
    if config.source.kind == SourceKind::File && config.source.path.is_none() {
        return Err(ReplayError::config_validation(
            "source.path",
            "a file source requires a root path",
        ));
    }
    if config.source.kind == SourceKind::Mock && config.source.mock.entities == 0 {
        return Err(ReplayError::config_validation(
            "source.mock.entities",
            "mock source needs at least one entity",
        ));
    }
    if config.source.kind == SourceKind::Mock && config.source.mock.entities > MAX_MOCK_ENTITIES {
        return Err(ReplayError::config_validation(
            "source.mock.entities",
            format!("mock source supports at most {MAX_MOCK_ENTITIES} entities"),
        ));
    }
    Ok(())
}

fn validate_policy(config: &ReplayConfig) -> Result<(), ReplayError> {
    let dups = config.policy.duplicate_drs_codes();
    if !dups.is_empty() {
        return Err(ReplayError::config_validation(
            "policy.drs_active_codes",
            format!("duplicate DRS codes: {dups:?}"),
        ));
    }
    Ok(())
}
