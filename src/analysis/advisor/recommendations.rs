use crate::analysis::LOCK_VOLUME_THRESHOLD;
use crate::analysis::advisor::{Advisor, AdvisorContext};
use crate::model::{Suggestion, SuggestionCategory};

// ============================================================
// Helpers
// ============================================================

fn pair(category: SuggestionCategory, first: &'static str, second: &'static str) -> Vec<Suggestion> {
    vec![
        Suggestion {
            id: first,
            category,
        },
        Suggestion {
            id: second,
            category,
        },
    ]
}

// ============================================================
// 1. BlockedTransactionAdvisor
// ============================================================

pub struct BlockedTransactionAdvisor;

impl Advisor for BlockedTransactionAdvisor {
    fn id(&self) -> &'static str {
        "blocked_transactions"
    }

    fn evaluate(&self, ctx: &AdvisorContext) -> Vec<Suggestion> {
        if ctx.analysis.blocked.is_empty() {
            return Vec::new();
        }
        pair(
            SuggestionCategory::Blocking,
            "suggestion_add_timeouts",
            "suggestion_check_lock_order",
        )
    }
}

// ============================================================
// 2. LongTransactionAdvisor
// ============================================================

pub struct LongTransactionAdvisor;

impl Advisor for LongTransactionAdvisor {
    fn id(&self) -> &'static str {
        "long_transactions"
    }

    fn evaluate(&self, ctx: &AdvisorContext) -> Vec<Suggestion> {
        if ctx.analysis.long_running.is_empty() {
            return Vec::new();
        }
        pair(
            SuggestionCategory::LongRunning,
            "suggestion_split_transactions",
            "suggestion_optimize_queries",
        )
    }
}

// ============================================================
// 3. ObjectConflictAdvisor
// ============================================================

pub struct ObjectConflictAdvisor;

impl Advisor for ObjectConflictAdvisor {
    fn id(&self) -> &'static str {
        "object_conflicts"
    }

    fn evaluate(&self, ctx: &AdvisorContext) -> Vec<Suggestion> {
        if ctx.analysis.conflicts.is_empty() {
            return Vec::new();
        }
        pair(
            SuggestionCategory::Contention,
            "suggestion_review_lock_strategy",
            "suggestion_lower_isolation",
        )
    }
}

// ============================================================
// 4. DeadlockAdvisor
// ============================================================

pub struct DeadlockAdvisor;

impl Advisor for DeadlockAdvisor {
    fn id(&self) -> &'static str {
        "deadlocks"
    }

    fn evaluate(&self, ctx: &AdvisorContext) -> Vec<Suggestion> {
        if ctx.analysis.deadlocks.is_empty() {
            return Vec::new();
        }
        pair(
            SuggestionCategory::Deadlock,
            "suggestion_retry_backoff",
            "suggestion_access_order",
        )
    }
}

// ============================================================
// 5. LockVolumeAdvisor
// ============================================================

pub struct LockVolumeAdvisor;

impl Advisor for LockVolumeAdvisor {
    fn id(&self) -> &'static str {
        "lock_volume"
    }

    fn evaluate(&self, ctx: &AdvisorContext) -> Vec<Suggestion> {
        if ctx.summary.total_locks <= LOCK_VOLUME_THRESHOLD {
            return Vec::new();
        }
        pair(
            SuggestionCategory::General,
            "suggestion_review_patterns",
            "suggestion_monitor_waits",
        )
    }
}
