pub mod recommendations;

use crate::analysis::Analysis;
use crate::model::{ReportSummary, Suggestion, SuggestionCategory};

/// Suggestion emitted when no advisor fires.
pub const HEALTHY_SUGGESTION: &str = "suggestion_no_critical_issues";

/// Inputs shared by every advisor.
pub struct AdvisorContext<'a> {
    pub analysis: &'a Analysis,
    pub summary: &'a ReportSummary,
}

pub trait Advisor: Send + Sync {
    fn id(&self) -> &'static str;
    fn evaluate(&self, ctx: &AdvisorContext) -> Vec<Suggestion>;
}

pub fn all_advisors() -> Vec<Box<dyn Advisor>> {
    vec![
        Box::new(recommendations::BlockedTransactionAdvisor),
        Box::new(recommendations::LongTransactionAdvisor),
        Box::new(recommendations::ObjectConflictAdvisor),
        Box::new(recommendations::DeadlockAdvisor),
        Box::new(recommendations::LockVolumeAdvisor),
    ]
}

/// Evaluates every advisor in table order. Never returns an empty list.
pub fn advise(ctx: &AdvisorContext) -> Vec<Suggestion> {
    let mut suggestions: Vec<Suggestion> = all_advisors()
        .iter()
        .flat_map(|a| a.evaluate(ctx))
        .collect();

    if suggestions.is_empty() {
        suggestions.push(Suggestion {
            id: HEALTHY_SUGGESTION,
            category: SuggestionCategory::Healthy,
        });
    }
    suggestions
}
