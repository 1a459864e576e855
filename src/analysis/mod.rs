//! Contention analysis over one collected observation.
//!
//! Every stage is a pure function of the raw collections, so the derived
//! findings of a [`crate::model::ReportSnapshot`] can always be recomputed
//! from its own `locks` and `activity` fields.

pub mod advisor;
mod blocked;
mod conflicts;
mod deadlocks;
mod long_running;
pub mod summary;

use crate::model::{
    ActivitySample, BlockedTransaction, DeadlockCandidate, LockRecord, LongTransaction,
    ObjectConflict,
};

pub use blocked::find_blocked_transactions;
pub use conflicts::find_object_conflicts;
pub use deadlocks::find_deadlock_candidates;
pub use long_running::find_long_transactions;

// ============================================================
// Thresholds
// ============================================================

/// A session is "long" once its current query has run strictly longer than this.
pub const LONG_TRANSACTION_THRESHOLD_SECS: f64 = 5.0;

/// Total lock count above which the general lock-volume hints fire.
pub const LOCK_VOLUME_THRESHOLD: usize = 10;

/// Wait event reported for a blocked holder with no matching activity sample.
pub const DEFAULT_WAIT_EVENT: &str = "lock";

/// Localization key of the fixed object-conflict recommendation.
pub const CONFLICT_RECOMMENDATION: &str = "conflict_recommendation";

/// Localization key of the fixed deadlock-candidate recommendation.
pub const DEADLOCK_RECOMMENDATION: &str = "deadlock_recommendation";

// ============================================================
// Analysis result
// ============================================================

/// All derived findings of one observation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analysis {
    pub deadlocks: Vec<DeadlockCandidate>,
    pub blocked: Vec<BlockedTransaction>,
    pub long_running: Vec<LongTransaction>,
    pub conflicts: Vec<ObjectConflict>,
}

/// Runs every analyzer stage on the raw collections.
pub fn analyze(locks: &[LockRecord], activity: &[ActivitySample]) -> Analysis {
    Analysis {
        deadlocks: find_deadlock_candidates(locks),
        blocked: find_blocked_transactions(locks, activity),
        long_running: find_long_transactions(activity),
        conflicts: find_object_conflicts(locks),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{LockSource, MockSource};

    #[test]
    fn two_session_contention_yields_every_finding() {
        let mut source = MockSource::two_session_contention();
        let locks = source.locks().unwrap();
        let activity = source.activity().unwrap();

        let analysis = analyze(&locks, &activity);

        assert_eq!(analysis.deadlocks.len(), 1);
        assert_eq!(analysis.blocked.len(), 1);
        assert_eq!(analysis.blocked[0].holder_id, 2);
        assert_eq!(analysis.long_running.len(), 1);
        assert_eq!(analysis.long_running[0].holder_id, 1);
        assert_eq!(analysis.conflicts.len(), 1);
        assert_eq!(analysis.conflicts[0].object_name, "projects");
    }

    #[test]
    fn empty_input_yields_empty_analysis() {
        assert_eq!(analyze(&[], &[]), Analysis::default());
    }
}
