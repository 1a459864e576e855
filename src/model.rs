//! Canonical value types for one point-in-time lock observation.
//!
//! Raw types (`LockRecord`, `RowLockRecord`, `ActivitySample`, `IndexStat`)
//! mirror rows of the PostgreSQL introspection views. Derived types are
//! produced by [`crate::analysis`] and never carry data that cannot be
//! recomputed from the raw ones.
//!
//! All types serialize with PascalCase field names; JSON consumers rely on
//! these names (`Summary.TotalLocks`, `Locks[].HolderId`, ...).

use std::collections::BTreeSet;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

// ============================================================
// Raw observations
// ============================================================

/// One row of `pg_locks` at capture time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LockRecord {
    /// Backend PID holding or requesting the lock.
    pub holder_id: i32,
    pub mode: String,
    pub granted: bool,
    /// Lock target classification (`relation`, `transactionid`, `virtualxid`, ...).
    pub object_kind: String,
    /// Relation name for relation locks, empty otherwise.
    pub object_name: String,
    pub page: Option<String>,
    pub tuple: Option<String>,
    pub virtual_xid: Option<String>,
    pub transaction_id: Option<String>,
}

impl LockRecord {
    /// Shorthand for a relation-level lock, mostly useful in fixtures.
    pub fn relation(holder_id: i32, mode: &str, granted: bool, object_name: &str) -> Self {
        Self {
            holder_id,
            mode: mode.to_string(),
            granted,
            object_kind: "relation".to_string(),
            object_name: object_name.to_string(),
            ..Self::default()
        }
    }
}

/// Page/tuple-level lock.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RowLockRecord {
    pub holder_id: i32,
    pub table: String,
    pub page: String,
    pub tuple: String,
    pub mode: String,
    pub granted: bool,
}

/// One active session from `pg_stat_activity`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ActivitySample {
    pub holder_id: i32,
    /// Seconds since `query_start`.
    pub duration_secs: f64,
    pub query: String,
    pub wait_event_type: Option<String>,
    pub wait_event: Option<String>,
}

/// Index catalog entry, included for context only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct IndexStat {
    pub name: String,
    pub table: String,
    /// Human-readable size as returned by `pg_size_pretty`.
    pub size_label: String,
}

// ============================================================
// Derived findings
// ============================================================

/// A holder whose lock request was not granted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlockedTransaction {
    pub holder_id: i32,
    /// `None` when no activity sample matched the holder.
    pub duration_secs: Option<f64>,
    pub query: String,
    pub wait_event: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LongTransaction {
    pub holder_id: i32,
    pub duration_secs: f64,
    pub query: String,
}

/// Two or more distinct holders referencing the same object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectConflict {
    pub object_name: String,
    pub holder_ids: BTreeSet<i32>,
    /// Localization key of the fixed recommendation.
    pub recommendation: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    LockConflict,
}

/// Same-object pair from different holders with differing grant status.
///
/// `record_a` is always the granted record and `record_b` the waiting one,
/// so a pair has a single representation regardless of input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeadlockCandidate {
    pub record_a: LockRecord,
    pub record_b: LockRecord,
    pub conflict_kind: ConflictKind,
    pub recommendation: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionCategory {
    Blocking,
    LongRunning,
    Contention,
    Deadlock,
    General,
    Healthy,
}

/// Remediation hint produced by an advisor.
///
/// `id` doubles as the localization key of the hint's text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Suggestion {
    pub id: &'static str,
    pub category: SuggestionCategory,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReportSummary {
    pub total_locks: usize,
    pub blocked_count: usize,
    pub long_count: usize,
    pub deadlock_count: usize,
    pub conflict_count: usize,
    /// `deadlock_count + blocked_count`.
    pub critical_issues: usize,
    /// `long_count + conflict_count`.
    pub warnings: usize,
    pub recommendation_count: usize,
}

// ============================================================
// Aggregate root
// ============================================================

/// One immutable, point-in-time report.
///
/// Built once by [`crate::report::assemble`] and only ever read afterwards;
/// the next polling tick builds a new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReportSnapshot {
    pub captured_at: DateTime<Local>,
    pub locks: Vec<LockRecord>,
    pub row_locks: Vec<RowLockRecord>,
    pub activity: Vec<ActivitySample>,
    pub deadlocks: Vec<DeadlockCandidate>,
    pub blocked_transactions: Vec<BlockedTransaction>,
    pub long_transactions: Vec<LongTransaction>,
    pub object_conflicts: Vec<ObjectConflict>,
    pub index_stats: Vec<IndexStat>,
    pub suggestions: Vec<Suggestion>,
    pub summary: ReportSummary,
}

impl ReportSnapshot {
    /// Snapshot with no data at all, stamped `captured_at`.
    pub fn empty(captured_at: DateTime<Local>) -> Self {
        Self {
            captured_at,
            locks: Vec::new(),
            row_locks: Vec::new(),
            activity: Vec::new(),
            deadlocks: Vec::new(),
            blocked_transactions: Vec::new(),
            long_transactions: Vec::new(),
            object_conflicts: Vec::new(),
            index_stats: Vec::new(),
            suggestions: Vec::new(),
            summary: ReportSummary::default(),
        }
    }
}
