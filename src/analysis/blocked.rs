use std::collections::HashMap;

use crate::analysis::DEFAULT_WAIT_EVENT;
use crate::model::{ActivitySample, BlockedTransaction, LockRecord};

/// One candidate per ungranted lock record, in input order.
///
/// Duration, query and wait event come from the activity sample of the same
/// holder. A holder missing from `activity` gets an unknown duration, an
/// empty query and the generic `"lock"` wait event.
pub fn find_blocked_transactions(
    locks: &[LockRecord],
    activity: &[ActivitySample],
) -> Vec<BlockedTransaction> {
    let mut by_holder: HashMap<i32, &ActivitySample> = HashMap::with_capacity(activity.len());
    for sample in activity {
        by_holder.entry(sample.holder_id).or_insert(sample);
    }

    locks
        .iter()
        .filter(|l| !l.granted)
        .map(|l| match by_holder.get(&l.holder_id) {
            Some(sample) => BlockedTransaction {
                holder_id: l.holder_id,
                duration_secs: Some(sample.duration_secs),
                query: sample.query.clone(),
                wait_event: sample
                    .wait_event
                    .clone()
                    .unwrap_or_else(|| DEFAULT_WAIT_EVENT.to_string()),
            },
            None => BlockedTransaction {
                holder_id: l.holder_id,
                duration_secs: None,
                query: String::new(),
                wait_event: DEFAULT_WAIT_EVENT.to_string(),
            },
        })
        .collect()
}
