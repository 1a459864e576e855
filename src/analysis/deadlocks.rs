use crate::analysis::DEADLOCK_RECOMMENDATION;
use crate::model::{ConflictKind, DeadlockCandidate, LockRecord};

/// Pairs of records from different holders on the same object where one is
/// granted and the other is waiting.
///
/// This is a pairwise heuristic, not a wait-for cycle search: it flags every
/// holder/waiter pair, so a single waiter behind several holders yields one
/// candidate per holder. Quadratic in the number of lock records.
pub fn find_deadlock_candidates(locks: &[LockRecord]) -> Vec<DeadlockCandidate> {
    let mut candidates = Vec::new();

    for (i, a) in locks.iter().enumerate() {
        for b in &locks[i + 1..] {
            if a.holder_id == b.holder_id
                || a.granted == b.granted
                || a.object_name != b.object_name
            {
                continue;
            }
            let (granted, waiting) = if a.granted { (a, b) } else { (b, a) };
            candidates.push(DeadlockCandidate {
                record_a: granted.clone(),
                record_b: waiting.clone(),
                conflict_kind: ConflictKind::LockConflict,
                recommendation: DEADLOCK_RECOMMENDATION,
            });
        }
    }

    candidates.sort_by(|x, y| {
        (&x.record_a.object_name, x.record_a.holder_id, x.record_b.holder_id)
            .cmp(&(&y.record_a.object_name, y.record_a.holder_id, y.record_b.holder_id))
            .then_with(|| x.record_a.mode.cmp(&y.record_a.mode))
            .then_with(|| x.record_b.mode.cmp(&y.record_b.mode))
    });
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projects_pair() -> Vec<LockRecord> {
        vec![
            LockRecord::relation(1, "ExclusiveLock", true, "projects"),
            LockRecord::relation(2, "ShareLock", false, "projects"),
        ]
    }

    #[test]
    fn granted_and_waiting_pair_is_a_candidate() {
        let candidates = find_deadlock_candidates(&projects_pair());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].record_a.holder_id, 1);
        assert!(candidates[0].record_a.granted);
        assert_eq!(candidates[0].record_b.holder_id, 2);
        assert_eq!(candidates[0].conflict_kind, ConflictKind::LockConflict);
    }

    #[test]
    fn detection_is_symmetric() {
        let mut reversed = projects_pair();
        reversed.reverse();
        assert_eq!(
            find_deadlock_candidates(&projects_pair()),
            find_deadlock_candidates(&reversed)
        );
    }

    #[test]
    fn same_holder_never_pairs_with_itself() {
        let locks = vec![
            LockRecord::relation(1, "ExclusiveLock", true, "projects"),
            LockRecord::relation(1, "ShareLock", false, "projects"),
        ];
        assert!(find_deadlock_candidates(&locks).is_empty());
    }

    #[test]
    fn equal_grant_status_is_not_a_candidate() {
        let locks: Vec<LockRecord> = (3..=5)
            .map(|pid| LockRecord::relation(pid, "RowExclusiveLock", true, "models"))
            .collect();
        assert!(find_deadlock_candidates(&locks).is_empty());
    }

    #[test]
    fn different_objects_do_not_pair() {
        let locks = vec![
            LockRecord::relation(1, "ExclusiveLock", true, "projects"),
            LockRecord::relation(2, "ShareLock", false, "models"),
        ];
        assert!(find_deadlock_candidates(&locks).is_empty());
    }

    #[test]
    fn waiter_behind_two_holders_yields_two_sorted_candidates() {
        let locks = vec![
            LockRecord::relation(9, "ShareLock", false, "files"),
            LockRecord::relation(5, "RowExclusiveLock", true, "files"),
            LockRecord::relation(3, "RowExclusiveLock", true, "files"),
        ];
        let pairs: Vec<(i32, i32)> = find_deadlock_candidates(&locks)
            .iter()
            .map(|c| (c.record_a.holder_id, c.record_b.holder_id))
            .collect();
        assert_eq!(pairs, vec![(3, 9), (5, 9)]);
    }

    fn xid_lock(holder_id: i32, mode: &str, granted: bool, xid: &str) -> LockRecord {
        LockRecord {
            holder_id,
            mode: mode.to_string(),
            granted,
            object_kind: "transactionid".to_string(),
            object_name: format!("transactionid:{xid}"),
            transaction_id: Some(xid.to_string()),
            ..LockRecord::default()
        }
    }

    #[test]
    fn waiter_on_transaction_id_pairs_with_its_holder() {
        let locks = vec![
            xid_lock(1, "ExclusiveLock", true, "900"),
            xid_lock(2, "ShareLock", false, "900"),
            xid_lock(3, "ExclusiveLock", true, "901"),
        ];
        let candidates = find_deadlock_candidates(&locks);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].record_a.holder_id, 1);
        assert_eq!(candidates[0].record_b.holder_id, 2);
        assert_eq!(candidates[0].record_a.transaction_id.as_deref(), Some("900"));
    }

    #[test]
    fn equal_empty_object_names_still_pair() {
        let locks = vec![
            LockRecord {
                holder_id: 1,
                mode: "ExclusiveLock".to_string(),
                granted: true,
                object_kind: "transactionid".to_string(),
                ..LockRecord::default()
            },
            LockRecord {
                holder_id: 2,
                mode: "ShareLock".to_string(),
                granted: false,
                object_kind: "transactionid".to_string(),
                ..LockRecord::default()
            },
        ];
        assert_eq!(find_deadlock_candidates(&locks).len(), 1);
    }
}
