//! Property-based invariant tests for the contiguous allocator
//! (spec.md §4.1), mirroring the proptest style of the teacher
//! workspace's `nebula-value` property suites.

use hbm_residency_sim::allocator::ContiguousAllocator;
use proptest::prelude::*;

const CAPACITY: u64 = 500;

/// A sequence of (id index, size) alloc ops and a parallel bitmask of
/// which ones to free again before compacting, used to build arbitrary
/// allocator states without ever exceeding capacity.
fn arb_ops() -> impl Strategy<Value = Vec<(usize, u64, bool)>> {
    prop::collection::vec((0usize..12, 1u64..60, any::<bool>()), 1..20)
}

fn build(ops: &[(usize, u64, bool)]) -> ContiguousAllocator {
    let mut a = ContiguousAllocator::new(CAPACITY);
    for &(idx, size, free_after) in ops {
        let id = format!("obj{idx}");
        a.alloc(&id, size);
        if free_after {
            a.free(&id);
        }
    }
    a
}

proptest! {
    #[test]
    fn used_plus_free_equals_capacity(ops in arb_ops()) {
        let a = build(&ops);
        prop_assert_eq!(a.used() + a.free_bytes(), CAPACITY);
    }

    #[test]
    fn blocks_never_overlap(ops in arb_ops()) {
        let a = build(&ops);
        let blocks = a.blocks_by_start();
        for pair in blocks.windows(2) {
            let (_, prev) = &pair[0];
            let (_, next) = &pair[1];
            prop_assert!(prev.start + prev.size <= next.start);
        }
    }

    #[test]
    fn all_blocks_within_capacity(ops in arb_ops()) {
        let a = build(&ops);
        for (_, b) in a.blocks_by_start() {
            prop_assert!(b.start + b.size <= CAPACITY);
        }
    }

    #[test]
    fn largest_free_extent_matches_extents_free_max(ops in arb_ops()) {
        let a = build(&ops);
        let expected = a.extents_free().into_iter().map(|(_, s)| s).max().unwrap_or(0);
        prop_assert_eq!(a.largest_free_extent(), expected);
    }

    #[test]
    fn compact_preserves_resident_set_and_total_size(ops in arb_ops(), reserve in 0u64..200) {
        let mut a = build(&ops);
        let before: std::collections::BTreeSet<(String, u64)> =
            a.blocks_by_start().into_iter().map(|(id, b)| (id, b.size)).collect();
        let used_before = a.used();
        a.compact(reserve.min(CAPACITY));
        let after: std::collections::BTreeSet<(String, u64)> =
            a.blocks_by_start().into_iter().map(|(id, b)| (id, b.size)).collect();
        prop_assert_eq!(before, after);
        prop_assert_eq!(a.used(), used_before);
    }

    #[test]
    fn compact_is_idempotent(ops in arb_ops(), reserve in 0u64..200) {
        let mut a = build(&ops);
        let reserve = reserve.min(CAPACITY);
        a.compact(reserve);
        let snapshot = a.blocks_by_start();
        let moved_again = a.compact(reserve);
        prop_assert_eq!(moved_again, 0);
        prop_assert_eq!(a.blocks_by_start(), snapshot);
    }

    #[test]
    fn compact_never_moves_more_bytes_than_resident(ops in arb_ops(), reserve in 0u64..200) {
        let mut a = build(&ops);
        let used = a.used();
        let moved = a.compact(reserve.min(CAPACITY));
        prop_assert!(moved <= used);
    }

    #[test]
    fn compact_achieves_reserve_when_feasible(ops in arb_ops(), reserve in 0u64..100) {
        let mut a = build(&ops);
        let used = a.used();
        let reserve = reserve.min(CAPACITY);
        a.compact(reserve);
        if used + reserve <= CAPACITY {
            prop_assert!(a.largest_free_extent() >= reserve);
        }
    }
}
