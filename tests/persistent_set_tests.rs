//! Integration tests for the persistent set and its transient mode.
//!
//! These pin the persistence contract end to end: no aliasing between
//! versions, identity-preserving no-ops, the canonical empty form, and the
//! transient round trip.

use lazers::persistent::{PersistentHashSet, TransientHashSet};
use rstest::rstest;

#[rstest]
fn test_insert_insert_duplicate_scenario() {
    // Inserting 1, 2, 1 yields membership {1, 2}.
    let set = PersistentHashSet::new().insert(1).insert(2).insert(1);
    assert_eq!(set.len(), 2);
    assert!(set.contains(&1));
    assert!(set.contains(&2));
    assert!(!set.contains(&3));
}

#[rstest]
fn test_transient_delete_scenario() {
    // Removing through a transient and freezing equals building the
    // remainder directly.
    let set: PersistentHashSet<i32> = [3, 1, 2].into_iter().collect();
    let mut transient = set.transient();
    transient.remove(&1);
    transient.remove(&2);
    let result = transient.persistent();
    let expected: PersistentHashSet<i32> = [3].into_iter().collect();
    assert_eq!(result, expected);
}

#[rstest]
fn test_persistent_no_aliasing() {
    let original: PersistentHashSet<i32> = [1, 2].into_iter().collect();
    let extended = original.insert(3);
    assert!(!original.contains(&3));
    assert!(extended.contains(&3));
    let shrunk = original.remove(&1);
    assert!(original.contains(&1));
    assert!(!shrunk.contains(&1));
}

#[rstest]
fn test_no_op_insert_preserves_identity() {
    let set: PersistentHashSet<i32> = [1, 2, 3].into_iter().collect();
    let same = set.insert(2);
    assert!(set.ptr_eq(&same));
    assert_eq!(set, same);
}

#[rstest]
fn test_transient_roundtrip_equals_original() {
    let set: PersistentHashSet<i32> = (0..50).collect();
    let roundtripped = set.transient().persistent();
    assert_eq!(roundtripped, set);
    // No element was touched, so even the identity is preserved.
    assert!(roundtripped.ptr_eq(&set));
}

#[rstest]
fn test_transient_batch_then_freeze() {
    let set: PersistentHashSet<i32> = (0..10).collect();
    let mut transient = set.transient();
    for value in 10..100 {
        transient.insert(value);
    }
    for value in 0..5 {
        transient.remove(&value);
    }
    let frozen = transient.persistent();
    assert_eq!(frozen.len(), 95);
    assert_eq!(set.len(), 10, "the frozen sibling never observes edits");
    assert!(set.contains(&0));
}

#[rstest]
fn test_empty_sets_are_canonical() {
    let empty: PersistentHashSet<i32> = PersistentHashSet::new();
    let other: PersistentHashSet<i32> = PersistentHashSet::new();
    assert_eq!(empty, other);
    // Removing the last element restores the canonical empty form.
    let drained: PersistentHashSet<i32> = [7].into_iter().collect::<PersistentHashSet<_>>()
        .remove(&7);
    assert_eq!(drained, empty);
    assert!(drained.is_empty());
}

#[rstest]
fn test_merge_returns_persistent_result() {
    let set: PersistentHashSet<i32> = [1].into_iter().collect();
    let merged = set.merge([2, 3, 3, 1]);
    assert_eq!(merged.len(), 3);
    assert_eq!(set.len(), 1);
}

#[rstest]
fn test_transient_merge_stays_transient() {
    let mut transient: TransientHashSet<i32> = TransientHashSet::new();
    transient.merge([1, 2, 2, 3]);
    transient.merge([3, 4]);
    assert_eq!(transient.len(), 4);
    let frozen = transient.persistent();
    assert_eq!(frozen.len(), 4);
}

#[rstest]
fn test_fork_gives_independent_sessions() {
    let base: PersistentHashSet<i32> = [0].into_iter().collect();
    let mut first = base.transient();
    let mut second = first.fork();
    first.insert(1);
    second.insert(2);
    second.remove(&0);
    let first = first.persistent();
    let second = second.persistent();
    assert_eq!(first.len(), 2);
    assert!(first.contains(&0) && first.contains(&1));
    assert_eq!(second.len(), 1);
    assert!(second.contains(&2) && !second.contains(&0));
    assert!(base.contains(&0));
}

#[rstest]
fn test_large_membership() {
    let set: PersistentHashSet<i32> = (0..2000).collect();
    assert_eq!(set.len(), 2000);
    for value in 0..2000 {
        assert!(set.contains(&value));
    }
    assert!(!set.contains(&2000));
    let mut drained = set.clone();
    for value in 0..2000 {
        drained = drained.remove(&value);
    }
    assert!(drained.is_empty());
    assert_eq!(set.len(), 2000);
}

#[rstest]
fn test_borrowed_lookup_forms() {
    let set: PersistentHashSet<String> = ["alpha".to_string(), "beta".to_string()]
        .into_iter()
        .collect();
    assert!(set.contains("alpha"));
    assert!(!set.contains("gamma"));
    let without = set.remove("beta");
    assert_eq!(without.len(), 1);
}
