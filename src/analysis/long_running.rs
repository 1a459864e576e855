use crate::analysis::LONG_TRANSACTION_THRESHOLD_SECS;
use crate::model::{ActivitySample, LongTransaction};

/// Sessions running longer than [`LONG_TRANSACTION_THRESHOLD_SECS`], longest first.
pub fn find_long_transactions(activity: &[ActivitySample]) -> Vec<LongTransaction> {
    let mut long: Vec<LongTransaction> = activity
        .iter()
        .filter(|s| s.duration_secs > LONG_TRANSACTION_THRESHOLD_SECS)
        .map(|s| LongTransaction {
            holder_id: s.holder_id,
            duration_secs: s.duration_secs,
            query: s.query.clone(),
        })
        .collect();
    long.sort_by(|a, b| b.duration_secs.total_cmp(&a.duration_secs));
    long
}
