//! In-memory lock source for testing the pipeline without PostgreSQL.
//!
//! `MockSource` serves canned rows and can be told to fail individual
//! queries, so the collector's failure isolation can be exercised.
//! Pre-built scenarios cover the common contention shapes.

use std::collections::HashSet;

use crate::collector::{CollectError, CollectedData, LockSource};
use crate::model::{ActivitySample, IndexStat, LockRecord, RowLockRecord};

#[derive(Debug, Clone, Default)]
pub struct MockSource {
    data: CollectedData,
    failing: HashSet<&'static str>,
    calls: Vec<&'static str>,
}

impl MockSource {
    pub fn new(data: CollectedData) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    /// Makes the named query (`locks`, `row_locks`, `activity`, `indexes`) fail.
    pub fn fail_on(mut self, query: &'static str) -> Self {
        self.failing.insert(query);
        self
    }

    /// Queries executed so far, in order.
    pub fn calls(&self) -> &[&'static str] {
        &self.calls
    }

    fn serve<T>(&mut self, query: &'static str, rows: Vec<T>) -> Result<Vec<T>, CollectError> {
        self.calls.push(query);
        if self.failing.contains(query) {
            return Err(CollectError::Query {
                query,
                message: "ERROR: permission denied".to_string(),
            });
        }
        Ok(rows)
    }
}

impl LockSource for MockSource {
    fn locks(&mut self) -> Result<Vec<LockRecord>, CollectError> {
        let rows = self.data.locks.clone();
        self.serve("locks", rows)
    }

    fn row_locks(&mut self) -> Result<Vec<RowLockRecord>, CollectError> {
        let rows = self.data.row_locks.clone();
        self.serve("row_locks", rows)
    }

    fn activity(&mut self) -> Result<Vec<ActivitySample>, CollectError> {
        let rows = self.data.activity.clone();
        self.serve("activity", rows)
    }

    fn indexes(&mut self) -> Result<Vec<IndexStat>, CollectError> {
        let rows = self.data.indexes.clone();
        self.serve("indexes", rows)
    }
}

// ============================================================
// Scenarios
// ============================================================

fn sample(holder_id: i32, duration_secs: f64, query: &str) -> ActivitySample {
    ActivitySample {
        holder_id,
        duration_secs,
        query: query.to_string(),
        wait_event_type: None,
        wait_event: None,
    }
}

fn index(name: &str, table: &str, size: &str) -> IndexStat {
    IndexStat {
        name: name.to_string(),
        table: table.to_string(),
        size_label: size.to_string(),
    }
}

fn default_indexes() -> Vec<IndexStat> {
    vec![
        index("projects_pkey", "projects", "16 kB"),
        index("idx_models_project_id", "models", "8192 bytes"),
    ]
}

impl MockSource {
    /// Idle database: no locks, a couple of indexes.
    pub fn quiet() -> Self {
        Self::new(CollectedData {
            indexes: default_indexes(),
            ..CollectedData::default()
        })
    }

    /// Session 1 holds an exclusive lock on `projects`, session 2 waits for it.
    pub fn two_session_contention() -> Self {
        let mut waiting = sample(2, 3.2, "UPDATE files SET content = $1 WHERE id = $2");
        waiting.wait_event_type = Some("Lock".to_string());
        waiting.wait_event = Some("relation".to_string());

        Self::new(CollectedData {
            locks: vec![
                LockRecord::relation(1, "ExclusiveLock", true, "projects"),
                LockRecord::relation(2, "ShareLock", false, "projects"),
            ],
            row_locks: vec![RowLockRecord {
                holder_id: 1,
                table: "projects".to_string(),
                page: "0".to_string(),
                tuple: "3".to_string(),
                mode: "ExclusiveLock".to_string(),
                granted: true,
            }],
            activity: vec![
                sample(1, 12.5, "UPDATE models SET state = 'ready' WHERE id = $1"),
                waiting,
            ],
            indexes: default_indexes(),
        })
    }

    /// Three sessions sharing `models`, all granted.
    pub fn hot_table() -> Self {
        Self::new(CollectedData {
            locks: (3..=5)
                .map(|pid| LockRecord::relation(pid, "RowExclusiveLock", true, "models"))
                .collect(),
            activity: (3..=5)
                .map(|pid| sample(pid, 0.4, "INSERT INTO blocks (model_id, type) VALUES ($1, $2)"))
                .collect(),
            indexes: default_indexes(),
            ..CollectedData::default()
        })
    }

    /// Many granted locks across tables plus one long-running session.
    pub fn busy_database() -> Self {
        let tables = ["projects", "models", "files", "blocks", "parameters", "events"];
        let mut locks: Vec<LockRecord> = tables
            .iter()
            .enumerate()
            .map(|(i, t)| LockRecord::relation(100 + i as i32, "AccessShareLock", true, t))
            .collect();
        for pid in 100..106 {
            let vxid = format!("{}/{}", pid - 97, pid);
            locks.push(LockRecord {
                holder_id: pid,
                mode: "ExclusiveLock".to_string(),
                granted: true,
                object_kind: "virtualxid".to_string(),
                object_name: format!("virtualxid:{vxid}"),
                virtual_xid: Some(vxid),
                ..LockRecord::default()
            });
        }

        Self::new(CollectedData {
            locks,
            activity: vec![
                sample(100, 42.0, "SELECT count(*) FROM events"),
                sample(101, 1.5, "SELECT * FROM models WHERE id = $1"),
            ],
            indexes: default_indexes(),
            ..CollectedData::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serves_rows_and_records_calls() {
        let mut source = MockSource::two_session_contention();
        assert_eq!(source.locks().unwrap().len(), 2);
        assert_eq!(source.indexes().unwrap().len(), 2);
        assert_eq!(source.calls(), &["locks", "indexes"]);
    }

    #[test]
    fn failing_query_returns_query_error() {
        let mut source = MockSource::quiet().fail_on("activity");
        let err = source.activity().unwrap_err();
        assert!(err.to_string().contains("activity"));
        assert!(source.locks().is_ok());
    }

    #[test]
    fn busy_database_exceeds_lock_threshold() {
        let mut source = MockSource::busy_database();
        assert!(source.locks().unwrap().len() > 10);
    }
}
