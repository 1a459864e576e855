use std::collections::{BTreeMap, BTreeSet};

use crate::analysis::CONFLICT_RECOMMENDATION;
use crate::model::{LockRecord, ObjectConflict};

/// Objects referenced by at least two distinct holders, ordered by name.
///
/// Records with an empty object name are ignored.
pub fn find_object_conflicts(locks: &[LockRecord]) -> Vec<ObjectConflict> {
    let mut holders: BTreeMap<&str, BTreeSet<i32>> = BTreeMap::new();
    for lock in locks.iter().filter(|l| !l.object_name.is_empty()) {
        holders
            .entry(lock.object_name.as_str())
            .or_default()
            .insert(lock.holder_id);
    }

    holders
        .into_iter()
        .filter(|(_, ids)| ids.len() >= 2)
        .map(|(name, holder_ids)| ObjectConflict {
            object_name: name.to_string(),
            holder_ids,
            recommendation: CONFLICT_RECOMMENDATION,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_holders_on_models() {
        let locks: Vec<LockRecord> = (3..=5)
            .map(|pid| LockRecord::relation(pid, "RowExclusiveLock", true, "models"))
            .collect();

        let conflicts = find_object_conflicts(&locks);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].object_name, "models");
        assert_eq!(conflicts[0].holder_ids.iter().copied().collect::<Vec<_>>(), vec![3, 4, 5]);
        assert_eq!(conflicts[0].recommendation, CONFLICT_RECOMMENDATION);
    }

    #[test]
    fn same_holder_twice_is_not_a_conflict() {
        let locks = vec![
            LockRecord::relation(1, "AccessShareLock", true, "projects"),
            LockRecord::relation(1, "RowExclusiveLock", true, "projects"),
        ];
        assert!(find_object_conflicts(&locks).is_empty());
    }

    #[test]
    fn unnamed_objects_never_group() {
        let locks = vec![
            LockRecord {
                holder_id: 1,
                object_kind: "virtualxid".to_string(),
                ..LockRecord::default()
            },
            LockRecord {
                holder_id: 2,
                object_kind: "virtualxid".to_string(),
                ..LockRecord::default()
            },
        ];
        assert!(find_object_conflicts(&locks).is_empty());
    }

    #[test]
    fn every_conflict_has_two_distinct_holders_and_is_ordered() {
        let locks = vec![
            LockRecord::relation(1, "ShareLock", true, "zeta"),
            LockRecord::relation(2, "ShareLock", true, "zeta"),
            LockRecord::relation(2, "ShareLock", true, "alpha"),
            LockRecord::relation(3, "ShareLock", true, "alpha"),
            LockRecord::relation(4, "ShareLock", true, "solo"),
        ];
        let conflicts = find_object_conflicts(&locks);
        let names: Vec<&str> = conflicts.iter().map(|c| c.object_name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert!(conflicts.iter().all(|c| c.holder_ids.len() >= 2));
    }
}
