//! Layered error definitions
//!
//! Categorized by source: config / acquisition / pipeline / output

use thiserror::Error;

/// Unified error type
///
/// Only request-level failures live here. Failures the pipeline recovers from
/// are reported as [`crate::Degradation`] instead.
#[derive(Debug, Error)]
pub enum ReplayError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Acquisition Errors =====
    /// The acquisition collaborator could not produce data for the session
    #[error("failed to load session {session}: {message}")]
    Acquisition { session: String, message: String },

    // ===== Pipeline Errors =====
    /// Acquisition succeeded but no entity yields a valid time window
    #[error("no usable telemetry found for session {session}")]
    NoData { session: String },

    // ===== Output Errors =====
    /// Response serialization error
    #[error("serialize error: {0}")]
    Serialize(String),

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ReplayError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create acquisition error
    pub fn acquisition(session: impl ToString, message: impl Into<String>) -> Self {
        Self::Acquisition {
            session: session.to_string(),
            message: message.into(),
        }
    }

    /// Create no-data error
    pub fn no_data(session: impl ToString) -> Self {
        Self::NoData {
            session: session.to_string(),
        }
    }

    /// Whether this error aborts a replay request (as opposed to a config problem)
    pub fn is_request_failure(&self) -> bool {
        matches!(self, Self::Acquisition { .. } | Self::NoData { .. })
    }
}
