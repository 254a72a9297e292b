//! Recorded sessions on disk
//!
//! Layout: `<root>/<year>/<event>_<session>.json`, event and session
//! lower-cased with whitespace replaced by `_`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use contracts::{ReplayError, SessionData, SessionKey, SessionSource};
use tracing::{debug, instrument, warn};

use crate::error::{IngestionError, Result};
use crate::stats::SourceStats;

const SOURCE_NAME: &str = "file";

/// One recording found under the root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSession {
    pub year: u16,
    /// File stem, e.g. `monza_r`
    pub stem: String,
    pub path: PathBuf,
}

/// Reads session documents written as JSON `SessionData`
#[derive(Debug, Clone)]
pub struct FileSessionSource {
    root: PathBuf,
    stats: Arc<SourceStats>,
}

impl FileSessionSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            stats: Arc::new(SourceStats::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn stats(&self) -> Arc<SourceStats> {
        self.stats.clone()
    }

    /// Where the recording of `key` is expected
    pub fn path_for(&self, key: &SessionKey) -> PathBuf {
        self.root
            .join(key.year.to_string())
            .join(format!("{}.json", key.file_stem()))
    }

    /// Read and parse the recording of `key`
    pub async fn read_session(&self, key: &SessionKey) -> Result<SessionData> {
        let path = self.path_for(key);
        let bytes = tokio::fs::read(&path).await.map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                IngestionError::NotFound { path: path.clone() }
            } else {
                IngestionError::Read {
                    path: path.clone(),
                    source,
                }
            }
        })?;

        let mut data: SessionData = serde_json::from_slice(&bytes)
            .map_err(|source| IngestionError::Malformed { path: path.clone(), source })?;

        if data.key != *key {
            warn!(
                path = %path.display(),
                recorded = %data.key,
                requested = %key,
                "recording key differs from requested session"
            );
            data.key = key.clone();
        }
        debug!(path = %path.display(), bytes = bytes.len(), "recording read");
        Ok(data)
    }

    /// Every `<year>/<stem>.json` under the root, sorted by year then stem
    pub async fn list_sessions(&self) -> Result<Vec<RecordedSession>> {
        let list_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| IngestionError::List { path, source }
        };

        let mut found = Vec::new();
        let mut years = tokio::fs::read_dir(&self.root)
            .await
            .map_err(list_err(&self.root))?;
        while let Some(year_dir) = years.next_entry().await.map_err(list_err(&self.root))? {
            let Some(year) = year_dir
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<u16>().ok())
            else {
                continue;
            };
            let year_path = year_dir.path();
            if !year_path.is_dir() {
                continue;
            }

            let mut files = tokio::fs::read_dir(&year_path)
                .await
                .map_err(list_err(&year_path))?;
            while let Some(file) = files.next_entry().await.map_err(list_err(&year_path))? {
                let path = file.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    found.push(RecordedSession {
                        year,
                        stem: stem.to_string(),
                        path: path.clone(),
                    });
                }
            }
        }

        found.sort_by(|a, b| a.year.cmp(&b.year).then_with(|| a.stem.cmp(&b.stem)));
        Ok(found)
    }
}

impl SessionSource for FileSessionSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    #[instrument(name = "file_source_load", skip(self), fields(root = %self.root.display()))]
    async fn load(&self, key: &SessionKey) -> std::result::Result<SessionData, ReplayError> {
        match self.read_session(key).await {
            Ok(data) => {
                self.stats.record_loaded(SOURCE_NAME, &data);
                Ok(data)
            }
            Err(err) => {
                self.stats.record_failure(SOURCE_NAME, err.kind());
                Err(err.into_replay_error(key))
            }
        }
    }
}
