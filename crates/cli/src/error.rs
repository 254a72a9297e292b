//! Error types for CLI operations.

use std::path::PathBuf;

use contracts::ReplayError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// Request-level replay failure
    #[error(transparent)]
    Replay(#[from] ReplayError),

    /// Blocking worker panicked or was cancelled
    #[error("Replay worker failed: {message}")]
    Worker { message: String },

    /// Prometheus exporter could not be installed
    #[error("Failed to start metrics exporter: {message}")]
    Metrics { message: String },

    /// Response could not be written
    #[error("Failed to write output to {target}: {source}")]
    Output {
        target: String,
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn output(target: impl Into<String>, source: std::io::Error) -> Self {
        Self::Output {
            target: target.into(),
            source,
        }
    }

    /// Metric label for a failed run
    pub fn reason(&self) -> &'static str {
        match self {
            Self::ConfigNotFound { .. } => "config",
            Self::Replay(ReplayError::Acquisition { .. }) => "acquisition",
            Self::Replay(ReplayError::NoData { .. }) => "no_data",
            Self::Replay(_) => "replay",
            Self::Worker { .. } => "worker",
            Self::Metrics { .. } => "metrics",
            Self::Output { .. } => "output",
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
