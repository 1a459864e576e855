use crate::analysis::Analysis;
use crate::model::ReportSummary;

/// Scalar rollup of one analysis.
///
/// `recommendation_count` is left at zero; the assembler sets it once the
/// advisors have run.
pub fn summarize(total_locks: usize, analysis: &Analysis) -> ReportSummary {
    let blocked_count = analysis.blocked.len();
    let long_count = analysis.long_running.len();
    let deadlock_count = analysis.deadlocks.len();
    let conflict_count = analysis.conflicts.len();

    ReportSummary {
        total_locks,
        blocked_count,
        long_count,
        deadlock_count,
        conflict_count,
        critical_issues: deadlock_count + blocked_count,
        warnings: long_count + conflict_count,
        recommendation_count: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::model::{ActivitySample, LockRecord};

    #[test]
    fn critical_and_warning_rollups() {
        let locks = vec![
            LockRecord::relation(1, "ExclusiveLock", true, "projects"),
            LockRecord::relation(2, "ShareLock", false, "projects"),
        ];
        let activity = vec![ActivitySample {
            holder_id: 1,
            duration_secs: 12.5,
            ..ActivitySample::default()
        }];

        let summary = summarize(locks.len(), &analyze(&locks, &activity));
        assert_eq!(summary.total_locks, 2);
        assert_eq!(summary.blocked_count, 1);
        assert_eq!(summary.deadlock_count, 1);
        assert_eq!(summary.critical_issues, 2);
        assert_eq!(summary.long_count, 1);
        assert_eq!(summary.conflict_count, 1);
        assert_eq!(summary.warnings, 2);
        assert_eq!(summary.recommendation_count, 0);
    }

    #[test]
    fn empty_analysis_is_all_zero() {
        assert_eq!(summarize(0, &Analysis::default()), ReportSummary::default());
    }
}
