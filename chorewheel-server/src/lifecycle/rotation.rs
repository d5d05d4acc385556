//! Pure selection policy for which child a chore is offered to.

use std::collections::HashSet;

/// Family-wide round-robin used by the initial assign of a rotation cycle.
/// `last_index` is the persisted cursor (-1 before any assignment);
/// advancing it must happen in the same transaction as the assignment it
/// accompanies.
pub fn next_round_robin(last_index: i32, child_count: usize) -> usize {
    (last_index + 1).rem_euclid(child_count as i32) as usize
}

/// Next child to offer during a decline cascade: the lowest-id child who
/// holds no offer yet in the current cycle. `children` must be sorted by
/// ascending id; `offered` is the set of children already holding a pending,
/// accepted, or declined offer. Returns `None` when the cycle is exhausted
/// and the chore must fall back to its first assignee.
pub fn next_unoffered(children: &[i32], offered: &HashSet<i32>) -> Option<i32> {
    children.iter().copied().find(|id| !offered.contains(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robin_starts_at_zero_for_fresh_family() {
        assert_eq!(next_round_robin(-1, 3), 0);
    }

    #[test]
    fn round_robin_wraps() {
        assert_eq!(next_round_robin(0, 3), 1);
        assert_eq!(next_round_robin(2, 3), 0);
        assert_eq!(next_round_robin(5, 3), 0);
    }

    #[test]
    fn round_robin_visits_every_child_once_per_lap() {
        let mut last = -1;
        let mut seen = Vec::new();
        for _ in 0..4 {
            let idx = next_round_robin(last, 4);
            seen.push(idx);
            last = idx as i32;
        }
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn unoffered_picks_lowest_id() {
        let offered: HashSet<i32> = [11].into_iter().collect();
        assert_eq!(next_unoffered(&[7, 11, 20], &offered), Some(7));
        let offered: HashSet<i32> = [7, 11].into_iter().collect();
        assert_eq!(next_unoffered(&[7, 11, 20], &offered), Some(20));
    }

    #[test]
    fn unoffered_detects_exhausted_cycle() {
        let offered: HashSet<i32> = [7, 11, 20].into_iter().collect();
        assert_eq!(next_unoffered(&[7, 11, 20], &offered), None);
        assert_eq!(next_unoffered(&[], &HashSet::new()), None);
    }
}
