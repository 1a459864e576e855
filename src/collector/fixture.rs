//! Lock source backed by a JSON file, for offline analysis of captured state.
//!
//! The file holds one [`CollectedData`] object:
//!
//! ```json
//! { "Locks": [{ "HolderId": 1, "Mode": "ExclusiveLock", "Granted": true,
//!               "ObjectKind": "relation", "ObjectName": "projects" }],
//!   "Activity": [{ "HolderId": 1, "DurationSecs": 12.5, "Query": "..." }] }
//! ```
//!
//! Missing collections default to empty.

use std::fs;
use std::path::{Path, PathBuf};

use crate::collector::{CollectError, CollectedData, LockSource};
use crate::model::{ActivitySample, IndexStat, LockRecord, RowLockRecord};

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("cannot read fixture {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid fixture {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct FixtureSource {
    data: CollectedData,
}

impl FixtureSource {
    /// Reads and parses the fixture file once.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content).map_err(|source| FixtureError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let data: CollectedData = serde_json::from_str(content)?;
        Ok(Self { data })
    }
}

impl LockSource for FixtureSource {
    fn locks(&mut self) -> Result<Vec<LockRecord>, CollectError> {
        Ok(self.data.locks.clone())
    }

    fn row_locks(&mut self) -> Result<Vec<RowLockRecord>, CollectError> {
        Ok(self.data.row_locks.clone())
    }

    fn activity(&mut self) -> Result<Vec<ActivitySample>, CollectError> {
        Ok(self.data.activity.clone())
    }

    fn indexes(&mut self) -> Result<Vec<IndexStat>, CollectError> {
        Ok(self.data.indexes.clone())
    }
}
