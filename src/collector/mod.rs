//! Lock state collection.
//!
//! The collector runs four independent read-only queries through a
//! [`LockSource`] and maps the rows into [`crate::model`] types:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                  collect()                   │
//! │  locks (fatal) │ row locks │ activity │ idx  │
//! └───────────────────────┬──────────────────────┘
//!                         │
//!                  ┌──────▼──────┐
//!                  │ LockSource  │ (trait)
//!                  └──────┬──────┘
//!          ┌──────────────┼──────────────┐
//!   ┌──────▼───────┐ ┌────▼───────┐ ┌────▼──────────┐
//!   │PostgresSource│ │ MockSource │ │ FixtureSource │
//!   └──────────────┘ └────────────┘ └───────────────┘
//! ```
//!
//! Only the lock table query is fatal. Failures of the secondary queries
//! are logged and degrade to empty collections. Nothing is retried.

pub mod fixture;
pub mod mock;
mod pg_source;
mod queries;

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{ActivitySample, IndexStat, LockRecord, RowLockRecord};

pub use fixture::{FixtureError, FixtureSource};
pub use mock::MockSource;
pub use pg_source::{PostgresSource, SslMode};
pub use queries::ActivityFilter;

/// Error type for lock state collection.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// Required environment variable not set.
    #[error("PostgreSQL: {0} not set")]
    EnvNotSet(String),
    /// Connection could not be established.
    #[error("PostgreSQL: {0}")]
    Connection(String),
    /// TLS connector could not be built.
    #[error("TLS: {0}")]
    Tls(String),
    /// A query failed (permission denied, statement timeout, ...).
    #[error("PostgreSQL query error ({query}): {message}")]
    Query {
        query: &'static str,
        message: String,
    },
}

/// Read-only access to the introspection views.
///
/// Each method executes exactly one query. Implementations must not retry.
pub trait LockSource {
    fn locks(&mut self) -> Result<Vec<LockRecord>, CollectError>;
    fn row_locks(&mut self) -> Result<Vec<RowLockRecord>, CollectError>;
    fn activity(&mut self) -> Result<Vec<ActivitySample>, CollectError>;
    fn indexes(&mut self) -> Result<Vec<IndexStat>, CollectError>;
}

/// Raw rows gathered by one collection pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CollectedData {
    pub locks: Vec<LockRecord>,
    pub row_locks: Vec<RowLockRecord>,
    pub activity: Vec<ActivitySample>,
    pub indexes: Vec<IndexStat>,
}

/// Per-query timing of the last collection pass, for debug logging.
#[derive(Debug, Clone, Default)]
pub struct CollectorTiming {
    pub locks: Duration,
    pub row_locks: Duration,
    pub activity: Duration,
    pub indexes: Duration,
}

impl CollectorTiming {
    pub fn total(&self) -> Duration {
        self.locks + self.row_locks + self.activity + self.indexes
    }
}

/// Runs every query once against `source`.
///
/// Returns an error only when the lock table query fails; there is nothing
/// to analyze without it.
pub fn collect(source: &mut dyn LockSource) -> Result<CollectedData, CollectError> {
    let mut timing = CollectorTiming::default();

    let start = Instant::now();
    let locks = source.locks()?;
    timing.locks = start.elapsed();

    let start = Instant::now();
    let row_locks = degrade("row_locks", source.row_locks());
    timing.row_locks = start.elapsed();

    let start = Instant::now();
    let activity = degrade("activity", source.activity());
    timing.activity = start.elapsed();

    let start = Instant::now();
    let indexes = degrade("indexes", source.indexes());
    timing.indexes = start.elapsed();

    debug!(
        locks = locks.len(),
        row_locks = row_locks.len(),
        sessions = activity.len(),
        indexes = indexes.len(),
        total_ms = timing.total().as_millis() as u64,
        "collection finished"
    );

    Ok(CollectedData {
        locks,
        row_locks,
        activity,
        indexes,
    })
}

fn degrade<T>(query: &'static str, result: Result<Vec<T>, CollectError>) -> Vec<T> {
    match result {
        Ok(rows) => rows,
        Err(e) => {
            warn!(query, error = %e, "secondary query failed, continuing without it");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_returns_all_collections() {
        let mut source = MockSource::two_session_contention();
        let data = collect(&mut source).unwrap();
        assert_eq!(data.locks.len(), 2);
        assert_eq!(data.activity.len(), 2);
        assert!(!data.indexes.is_empty());
    }

    #[test]
    fn lock_query_failure_is_fatal() {
        let mut source = MockSource::two_session_contention().fail_on("locks");
        let err = collect(&mut source).unwrap_err();
        assert!(matches!(err, CollectError::Query { query: "locks", .. }));
    }

    #[test]
    fn secondary_failures_degrade_to_empty() {
        let mut source = MockSource::two_session_contention()
            .fail_on("row_locks")
            .fail_on("activity")
            .fail_on("indexes");
        let data = collect(&mut source).unwrap();
        assert_eq!(data.locks.len(), 2);
        assert!(data.row_locks.is_empty());
        assert!(data.activity.is_empty());
        assert!(data.indexes.is_empty());
    }

    #[test]
    fn one_secondary_failure_does_not_affect_others() {
        let mut source = MockSource::two_session_contention().fail_on("indexes");
        let data = collect(&mut source).unwrap();
        assert!(data.indexes.is_empty());
        assert_eq!(data.activity.len(), 2);
    }

    #[test]
    fn each_query_runs_exactly_once() {
        let mut source = MockSource::two_session_contention().fail_on("row_locks");
        collect(&mut source).unwrap();
        assert_eq!(source.calls(), &["locks", "row_locks", "activity", "indexes"]);
    }

    #[test]
    fn fatal_failure_skips_secondary_queries() {
        let mut source = MockSource::quiet().fail_on("locks");
        assert!(collect(&mut source).is_err());
        assert_eq!(source.calls(), &["locks"]);
    }
}
