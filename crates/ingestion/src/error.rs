//! Ingestion error types

use std::path::PathBuf;

use contracts::{ReplayError, SessionKey};
use thiserror::Error;

/// Source-level acquisition failure
#[derive(Debug, Error)]
pub enum IngestionError {
    /// No recording exists for the session
    #[error("no recording at {}", path.display())]
    NotFound { path: PathBuf },

    /// The recording exists but could not be read
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The recording is not a valid session document
    #[error("malformed recording {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The source root cannot be listed
    #[error("cannot list sessions under {}: {source}", path.display())]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IngestionError {
    /// Request-level error for `key`
    pub fn into_replay_error(self, key: &SessionKey) -> ReplayError {
        ReplayError::acquisition(key, self.to_string())
    }

    /// Short label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Read { .. } => "read",
            Self::Malformed { .. } => "malformed",
            Self::List { .. } => "list",
        }
    }
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_to_acquisition() {
        let key = SessionKey::new(2023, "Monza", "R");
        let err = IngestionError::NotFound {
            path: PathBuf::from("data/2023/monza_r.json"),
        };
        assert_eq!(err.kind(), "not_found");
        let replay = err.into_replay_error(&key);
        assert!(matches!(replay, ReplayError::Acquisition { .. }));
        assert_eq!(
            replay.to_string(),
            "failed to load session 2023 Monza [R]: no recording at data/2023/monza_r.json"
        );
    }
}
