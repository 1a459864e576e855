//! Report assembly: collector output → analysis → summary → advice.

use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::analysis::advisor::{AdvisorContext, advise};
use crate::analysis::summary::summarize;
use crate::analysis::{Analysis, analyze};
use crate::collector::{CollectError, CollectedData, LockSource, collect};
use crate::model::ReportSnapshot;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("lock collection failed: {0}")]
    Collect(#[from] CollectError),
}

/// Builds an immutable snapshot from one collection pass.
///
/// Pure: identical inputs always produce identical snapshots.
pub fn assemble(captured_at: DateTime<Local>, collected: CollectedData) -> ReportSnapshot {
    let CollectedData {
        locks,
        row_locks,
        activity,
        indexes,
    } = collected;

    let analysis = analyze(&locks, &activity);

    let mut summary = summarize(locks.len(), &analysis);
    let suggestions = advise(&AdvisorContext {
        analysis: &analysis,
        summary: &summary,
    });
    summary.recommendation_count = suggestions.len();

    debug!(
        locks = summary.total_locks,
        critical = summary.critical_issues,
        warnings = summary.warnings,
        suggestions = summary.recommendation_count,
        "report assembled"
    );

    let Analysis {
        deadlocks,
        blocked,
        long_running,
        conflicts,
    } = analysis;

    ReportSnapshot {
        captured_at,
        locks,
        row_locks,
        activity,
        deadlocks,
        blocked_transactions: blocked,
        long_transactions: long_running,
        object_conflicts: conflicts,
        index_stats: indexes,
        suggestions,
        summary,
    }
}

/// Collects from `source` and assembles a snapshot stamped with the current time.
///
/// A failure of the lock table query aborts the report; no partial snapshot
/// is returned.
pub fn generate_report(source: &mut dyn LockSource) -> Result<ReportSnapshot, ReportError> {
    let captured_at = Local::now();
    let collected = collect(source)?;
    let snapshot = assemble(captured_at, collected);
    info!(
        locks = snapshot.summary.total_locks,
        blocked = snapshot.summary.blocked_count,
        deadlocks = snapshot.summary.deadlock_count,
        "lock report generated"
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockSource;
    use crate::model::SuggestionCategory;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn total_locks_matches_lock_count() {
        for mut source in [
            MockSource::quiet(),
            MockSource::two_session_contention(),
            MockSource::hot_table(),
            MockSource::busy_database(),
        ] {
            let snapshot = generate_report(&mut source).unwrap();
            assert_eq!(snapshot.summary.total_locks, snapshot.locks.len());
            assert_eq!(
                snapshot.summary.critical_issues,
                snapshot.deadlocks.len() + snapshot.blocked_transactions.len()
            );
            assert_eq!(
                snapshot.summary.recommendation_count,
                snapshot.suggestions.len()
            );
        }
    }

    #[test]
    fn derived_collections_recompute_from_raw_fields() {
        let mut source = MockSource::two_session_contention();
        let snapshot = generate_report(&mut source).unwrap();

        let again = analyze(&snapshot.locks, &snapshot.activity);
        assert_eq!(again.deadlocks, snapshot.deadlocks);
        assert_eq!(again.blocked, snapshot.blocked_transactions);
        assert_eq!(again.long_running, snapshot.long_transactions);
        assert_eq!(again.conflicts, snapshot.object_conflicts);
    }

    #[test]
    fn assemble_is_deterministic() {
        let data = crate::collector::collect(&mut MockSource::busy_database()).unwrap();
        assert_eq!(
            assemble(fixed_time(), data.clone()),
            assemble(fixed_time(), data)
        );
    }

    #[test]
    fn projects_contention_example() {
        let snapshot = generate_report(&mut MockSource::two_session_contention()).unwrap();

        assert_eq!(snapshot.summary.total_locks, 2);
        assert_eq!(snapshot.deadlocks.len(), 1);
        assert_eq!(snapshot.deadlocks[0].record_a.holder_id, 1);
        assert_eq!(snapshot.deadlocks[0].record_b.holder_id, 2);
        assert_eq!(snapshot.blocked_transactions.len(), 1);
        assert_eq!(snapshot.blocked_transactions[0].holder_id, 2);
        assert_eq!(snapshot.object_conflicts.len(), 1);
        assert!(snapshot.summary.critical_issues >= 2);
        assert_eq!(snapshot.row_locks.len(), 1);
        assert!(!snapshot.index_stats.is_empty());
    }

    #[test]
    fn hot_table_example() {
        let snapshot = generate_report(&mut MockSource::hot_table()).unwrap();

        assert_eq!(snapshot.object_conflicts.len(), 1);
        let ids: Vec<i32> = snapshot.object_conflicts[0].holder_ids.iter().copied().collect();
        assert_eq!(ids, vec![3, 4, 5]);
        assert!(snapshot.deadlocks.is_empty());
        assert!(snapshot.blocked_transactions.is_empty());
        assert!(
            snapshot
                .suggestions
                .iter()
                .any(|s| s.category == SuggestionCategory::Contention)
        );
    }

    #[test]
    fn lock_query_failure_yields_no_snapshot() {
        let mut source = MockSource::two_session_contention().fail_on("locks");
        let err = generate_report(&mut source).unwrap_err();
        assert!(matches!(err, ReportError::Collect(CollectError::Query { .. })));
    }

    #[test]
    fn empty_collection_still_has_a_suggestion() {
        let snapshot = assemble(fixed_time(), CollectedData::default());
        assert_eq!(
            snapshot.summary,
            crate::model::ReportSummary {
                recommendation_count: 1,
                ..Default::default()
            }
        );
        assert_eq!(snapshot.suggestions.len(), 1);
        assert_eq!(snapshot.captured_at, fixed_time());
    }
}
