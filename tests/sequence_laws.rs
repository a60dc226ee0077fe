//! Property-based and enumerated laws for the lazy sequence framework.
//!
//! The reversal/slice/take/skip bookkeeping has many interacting branches,
//! so beyond the targeted unit tests this suite checks pipelines against a
//! strict `Vec` model: every composition of renumbering combinators must
//! produce the model's values with dense indices, and double reversal must
//! be the identity. Nested combinator cases are enumerated exhaustively
//! over a fixed op set rather than sampled.

use lazers::sequence::IndexedSequence;
use proptest::prelude::*;

// =============================================================================
// Model
// =============================================================================

/// Renumbering combinators under test, applied both to a lazy sequence and
/// to a plain vector model.
#[derive(Clone, Copy, Debug)]
enum Op {
    Reverse,
    Slice(isize, isize),
    SliceOpen(isize),
    Take(usize),
    Skip(usize),
    FilterEven,
    MapAddTen,
}

const OPS: [Op; 8] = [
    Op::Reverse,
    Op::Slice(1, 5),
    Op::Slice(-4, -1),
    Op::SliceOpen(2),
    Op::Take(3),
    Op::Skip(2),
    Op::FilterEven,
    Op::MapAddTen,
];

fn apply_sequence(sequence: &IndexedSequence<i64>, op: Op) -> IndexedSequence<i64> {
    match op {
        Op::Reverse => sequence.reverse(false),
        Op::Slice(begin, end) => sequence.slice(begin, Some(end), false),
        Op::SliceOpen(begin) => sequence.slice(begin, None, false),
        Op::Take(amount) => sequence.take(amount),
        Op::Skip(amount) => sequence.skip(amount, false),
        Op::FilterEven => sequence.filter(|value, _| value % 2 == 0, false),
        Op::MapAddTen => sequence.map(|value, _| value + 10),
    }
}

fn resolve(offset: isize, length: usize) -> usize {
    if offset < 0 {
        length.saturating_sub(offset.unsigned_abs())
    } else {
        length.min(offset.unsigned_abs())
    }
}

fn apply_model(values: &[i64], op: Op) -> Vec<i64> {
    match op {
        Op::Reverse => values.iter().rev().copied().collect(),
        Op::Slice(begin, end) => {
            let begin = resolve(begin, values.len());
            let end = resolve(end, values.len());
            if end > begin {
                values[begin..end].to_vec()
            } else {
                Vec::new()
            }
        }
        Op::SliceOpen(begin) => {
            let begin = resolve(begin, values.len());
            values[begin..].to_vec()
        }
        Op::Take(amount) => values.iter().take(amount).copied().collect(),
        Op::Skip(amount) => values.iter().skip(amount).copied().collect(),
        Op::FilterEven => values.iter().filter(|value| *value % 2 == 0).copied().collect(),
        Op::MapAddTen => values.iter().map(|value| value + 10).collect(),
    }
}

fn pairs_of(sequence: &IndexedSequence<i64>) -> Vec<(usize, i64)> {
    let mut pairs = Vec::new();
    sequence.for_each(|value, index| pairs.push((index, *value)));
    pairs
}

fn assert_matches_model(sequence: &IndexedSequence<i64>, model: &[i64], context: &str) {
    assert_eq!(sequence.to_vec(), model, "values diverge for {context}");
    let expected: Vec<(usize, i64)> = model.iter().copied().enumerate().collect();
    assert_eq!(
        pairs_of(sequence),
        expected,
        "indices diverge for {context}"
    );
}

// =============================================================================
// Exhaustive nested-combinator enumeration
// =============================================================================

#[test]
fn nested_combinator_pairs_match_the_model() {
    let base: Vec<i64> = (0..8).collect();
    for first in OPS {
        for second in OPS {
            let sequence = apply_sequence(
                &apply_sequence(&IndexedSequence::from_values(base.clone()), first),
                second,
            );
            let model = apply_model(&apply_model(&base, first), second);
            assert_matches_model(&sequence, &model, &format!("{first:?} then {second:?}"));
        }
    }
}

#[test]
fn nested_combinator_triples_match_the_model() {
    let base: Vec<i64> = (0..8).collect();
    for first in OPS {
        for second in OPS {
            for third in OPS {
                let sequence = apply_sequence(
                    &apply_sequence(
                        &apply_sequence(&IndexedSequence::from_values(base.clone()), first),
                        second,
                    ),
                    third,
                );
                let model =
                    apply_model(&apply_model(&apply_model(&base, first), second), third);
                assert_matches_model(
                    &sequence,
                    &model,
                    &format!("{first:?} then {second:?} then {third:?}"),
                );
            }
        }
    }
}

#[test]
fn nested_combinators_survive_double_reversal() {
    let base: Vec<i64> = (0..8).collect();
    for first in OPS {
        for second in OPS {
            let chain = apply_sequence(
                &apply_sequence(&IndexedSequence::from_values(base.clone()), first),
                second,
            );
            // Interpose a map so the reversal shortcut cannot elide the
            // composition being verified.
            let roundtripped = chain
                .reverse(false)
                .map(|value, _| *value)
                .reverse(false);
            assert_eq!(
                pairs_of(&roundtripped),
                pairs_of(&chain),
                "double reversal diverges after {first:?} then {second:?}"
            );
        }
    }
}

// =============================================================================
// Property-based laws
// =============================================================================

fn arbitrary_values() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(-100i64..100, 0..40)
}

proptest! {
    #[test]
    fn prop_double_reverse_is_identity(values in arbitrary_values(), maintain in any::<bool>()) {
        let sequence = IndexedSequence::from_values(values);
        let roundtripped = sequence
            .reverse(maintain)
            .map(|value, _| *value)
            .reverse(maintain);
        prop_assert_eq!(pairs_of(&roundtripped), pairs_of(&sequence));
    }

    #[test]
    fn prop_slice_matches_model(
        values in arbitrary_values(),
        begin in -45isize..45,
        end in -45isize..45,
    ) {
        let sequence = IndexedSequence::from_values(values.clone());
        let sliced = sequence.slice(begin, Some(end), false);
        let resolved_begin = resolve(begin, values.len());
        let resolved_end = resolve(end, values.len());
        let model: Vec<i64> = if resolved_end > resolved_begin {
            values[resolved_begin..resolved_end].to_vec()
        } else {
            Vec::new()
        };
        prop_assert_eq!(sliced.to_vec(), model);
    }

    #[test]
    fn prop_take_skip_partition(values in arbitrary_values(), amount in 0usize..50) {
        let sequence = IndexedSequence::from_values(values.clone());
        let mut recombined = sequence.take(amount).to_vec();
        recombined.extend(sequence.skip(amount, false).to_vec());
        prop_assert_eq!(recombined, values);
    }

    #[test]
    fn prop_concat_values_and_length(left in arbitrary_values(), right in arbitrary_values()) {
        let combined = IndexedSequence::from_values(left.clone())
            .concat([IndexedSequence::from_values(right.clone())]);
        prop_assert_eq!(combined.len(), Some(left.len() + right.len()));
        let mut expected = left;
        expected.extend(right);
        prop_assert_eq!(combined.to_vec(), expected);
    }

    #[test]
    fn prop_take_while_reports_prefix_length(values in arbitrary_values(), bound in -100i64..100) {
        let sequence = IndexedSequence::from_values(values.clone());
        let taken = sequence.take_while(move |value, _| *value < bound, false);
        let expected: Vec<i64> = values.iter().copied().take_while(|value| *value < bound).collect();
        prop_assert_eq!(taken.count(), expected.len());
        prop_assert_eq!(taken.to_vec(), expected);
    }

    #[test]
    fn prop_skip_while_reports_suffix_length(values in arbitrary_values(), bound in -100i64..100) {
        let sequence = IndexedSequence::from_values(values.clone());
        let skipped = sequence.skip_while(move |value, _| *value < bound, false);
        let expected: Vec<i64> = values.iter().copied().skip_while(|value| *value < bound).collect();
        prop_assert_eq!(skipped.count(), expected.len());
        prop_assert_eq!(skipped.to_vec(), expected);
    }

    #[test]
    fn prop_cached_chain_replays_identically(values in arbitrary_values()) {
        let sequence = IndexedSequence::from_values(values)
            .filter(|value, _| value % 3 != 0, false)
            .map(|value, _| value * 2);
        let uncached = pairs_of(&sequence);
        let cached = sequence.cache_result();
        prop_assert_eq!(pairs_of(&cached), uncached.clone());
        let reversed_model: Vec<(usize, i64)> = uncached
            .iter()
            .rev()
            .enumerate()
            .map(|(position, (_, value))| (position, *value))
            .collect();
        prop_assert_eq!(pairs_of(&cached.reverse(false)), reversed_model);
    }
}
