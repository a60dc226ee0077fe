//! Integration tests for the lazy sequence framework.
//!
//! These exercise whole pipelines end to end: laziness, single
//! materialization, index bookkeeping under reversal and slicing, and the
//! conversions into the persistent collections.

use std::cell::Cell;
use std::rc::Rc;

use lazers::persistent::{PersistentHashSet, PersistentVector};
use lazers::sequence::{IndexedSequence, KeyedSequence, Step};
use rstest::rstest;

/// A counting source: every observed access goes through the mapper.
fn counting_digits(calls: &Rc<Cell<usize>>) -> IndexedSequence<i32> {
    let counter = Rc::clone(calls);
    IndexedSequence::from_values([1, 2, 3, 4, 5]).map(move |value, _| {
        counter.set(counter.get() + 1);
        *value
    })
}

#[rstest]
fn test_chains_perform_zero_accesses_until_consumed() {
    let calls = Rc::new(Cell::new(0));
    let pipeline = counting_digits(&calls)
        .filter(|value, _| value % 2 == 1, false)
        .slice(0, Some(2), false)
        .reverse(false);
    assert_eq!(calls.get(), 0, "construction must not traverse");
    let _ = pipeline.to_vec();
    assert!(calls.get() > 0);
}

#[rstest]
fn test_cache_result_runs_upstream_exactly_once() {
    let calls = Rc::new(Cell::new(0));
    let cached = counting_digits(&calls).cache_result().cache_result();
    assert_eq!(calls.get(), 5);
    assert_eq!(cached.to_vec(), vec![1, 2, 3, 4, 5]);
    assert_eq!(cached.reverse(false).to_vec(), vec![5, 4, 3, 2, 1]);
    assert_eq!(calls.get(), 5, "consumption after caching must replay");
}

#[rstest]
fn test_filter_map_reports_renumbered_indices() {
    // Spec scenario: [1,2,3,4,5] filtered to evens, values times ten,
    // indices renumbered from zero.
    let pipeline = IndexedSequence::from_values([1, 2, 3, 4, 5])
        .filter(|value, _| value % 2 == 0, false)
        .map(|value, _| value * 10);
    let mut pairs = Vec::new();
    pipeline.for_each(|value, index| pairs.push((index, *value)));
    assert_eq!(pairs, vec![(0, 20), (1, 40)]);
}

#[rstest]
fn test_slice_then_reverse() {
    let result = IndexedSequence::from_values([1, 2, 3, 4, 5])
        .slice(1, Some(4), false)
        .reverse(false)
        .to_vec();
    assert_eq!(result, vec![4, 3, 2]);
}

#[rstest]
fn test_concat_has_known_summed_length() {
    let combined = IndexedSequence::from_values([1, 2, 3])
        .concat([IndexedSequence::from_values([4, 5])]);
    assert_eq!(combined.len(), Some(5));
    assert_eq!(combined.to_vec(), vec![1, 2, 3, 4, 5]);
}

#[rstest]
fn test_take_while_reports_truncated_length() {
    let taken = IndexedSequence::from_values([1, 2, 3, 4])
        .take_while(|value, _| *value < 3, false);
    assert_eq!(taken.to_vec(), vec![1, 2]);
    assert_eq!(taken.count(), 2);
    assert_eq!(taken.cache_result().len(), Some(2));
}

#[rstest]
fn test_early_stop_counts_only_continued_visits() {
    let sequence = IndexedSequence::from_values([10, 20, 30, 40]);
    let mut seen = 0;
    let continued = sequence.for_each_while(|_, _| {
        seen += 1;
        if seen == 3 { Step::Stop } else { Step::Continue }
    });
    assert_eq!(seen, 3);
    assert_eq!(continued, 2);
}

#[rstest]
fn test_keyed_pipeline_over_field_pairs() {
    let ages = KeyedSequence::from_pairs([("ada", 36), ("grace", 85), ("alan", 41)]);
    let of_age = ages.filter(|age, _| *age > 40);
    assert_eq!(of_age.to_pairs(), vec![("grace", 85), ("alan", 41)]);
    assert_eq!(ages.get(&"ada"), Some(36));
    assert_eq!(
        ages.flip().get(&85),
        Some("grace"),
        "flip exchanges keys and values"
    );
    assert_eq!(ages.keys().to_vec(), vec!["ada", "grace", "alan"]);
}

#[rstest]
fn test_keyed_negative_slice_falls_back_through_entries() {
    let pairs = KeyedSequence::from_pairs([("a", 1), ("b", 2), ("c", 3), ("d", 4)]);
    let unknown_length = pairs.filter(|_, _| true);
    assert_eq!(unknown_length.len(), None);
    assert_eq!(
        unknown_length.slice(-2, None).to_pairs(),
        vec![("c", 3), ("d", 4)]
    );
    assert_eq!(
        unknown_length.slice(1, Some(-1)).to_pairs(),
        vec![("b", 2), ("c", 3)]
    );
}

#[rstest]
fn test_sequence_to_persistent_conversions() {
    let sequence = IndexedSequence::from_values([3, 1, 2, 3]);
    let vector = sequence.to_vector();
    assert_eq!(vector, PersistentVector::new().merge([3, 1, 2, 3]));
    let set = sequence.to_hash_set();
    assert_eq!(set.len(), 3);
    assert!(set.contains(&3));

    let keyed = KeyedSequence::from_pairs([("a", 1), ("b", 2)]);
    let map = keyed.to_hash_map();
    assert_eq!(map.get("a"), Some(&1));
    assert_eq!(map.len(), 2);
}

#[rstest]
fn test_set_reexposes_entries_through_the_protocol() {
    let set: PersistentHashSet<i32> = [1, 2, 3, 4].into_iter().collect();
    // A set is a producer again: wrap it with ordinary combinators.
    let doubled_evens = set
        .seq()
        .filter(|value, _| value % 2 == 0)
        .map(|value, _| value * 2);
    let mut values = doubled_evens.to_values();
    values.sort_unstable();
    assert_eq!(values, vec![4, 8]);

    // And a sequence materializes back into a set.
    let roundtripped = set.seq().to_hash_set();
    assert_eq!(roundtripped, set);
}

#[rstest]
fn test_last_and_reduce_right_observe_original_indices() {
    let sequence = IndexedSequence::from_values([10, 20, 30]);
    assert_eq!(sequence.last(), Some(30));
    let order = sequence.reduce_right(Vec::new(), |mut order, value, index| {
        order.push((index, *value));
        order
    });
    assert_eq!(order, vec![(2, 30), (1, 20), (0, 10)]);
}

#[rstest]
fn test_equality_shortcuts_and_deep_comparison() {
    let left = IndexedSequence::from_values([1, 2, 3]);
    let right = IndexedSequence::from_values([1, 2, 3]);
    assert_eq!(left, right);
    assert_ne!(left, left.take(2));
    // Unknown lengths force pairwise comparison.
    assert_eq!(
        left.filter(|_, _| true, false),
        right.filter(|_, _| true, false)
    );
}

#[rstest]
fn test_join_renderings() {
    let sequence = IndexedSequence::from_values([1, 2, 3]);
    assert_eq!(sequence.join("|"), "1|2|3");
    let keyed = KeyedSequence::from_pairs([("a", 1), ("b", 2)]);
    assert_eq!(keyed.join(", "), "1, 2");
}
