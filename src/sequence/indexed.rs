//! Indexed lazy sequences.
//!
//! [`IndexedSequence`] specializes the sequence abstraction for a dense
//! integer index space. It adds the index-aware operations (reversal with
//! or without renumbering, bounded slicing, index search) and the
//! index-flip bookkeeping that makes virtual reversal correct without
//! eager materialization.
//!
//! The internal traversal carries a `flip` flag alongside the direction:
//! renumbering producers report the visit position when it is off and the
//! mirrored position when it is on, so a reversal wrapper can either
//! renumber from zero (`maintain_indices = false`) or preserve the original
//! numbering (`maintain_indices = true`) by toggling the flag. Composition
//! is XOR, which makes double reversal the identity.
//!
//! # Examples
//!
//! ```rust
//! use lazers::sequence::IndexedSequence;
//!
//! let sequence = IndexedSequence::from_values([1, 2, 3, 4, 5]);
//! let window = sequence.slice(1, Some(4), false).reverse(false);
//! assert_eq!(window.to_vec(), vec![4, 3, 2]);
//! ```

use std::fmt;
use std::hash::Hash;
use std::iter::FromIterator;
use std::rc::Rc;

use super::keyed::{keyed_from_entries, keyed_view, KeyedSequence};
use super::iterate::{
    cache_indexed, iterate_indexed, iterate_keyed, resolve_begin, resolve_end, whole_slice,
    IndexedCore, IndexedVisitor, KeyedCore, Meta, Step,
};
use crate::persistent::{PersistentHashSet, PersistentVector};

// =============================================================================
// IndexedSequence Definition
// =============================================================================

/// A lazy sequence of values with a dense integer index space.
///
/// # Examples
///
/// ```rust
/// use lazers::sequence::IndexedSequence;
///
/// let sequence = IndexedSequence::from_values([1, 2, 3, 4, 5]);
/// let result: Vec<i32> = sequence
///     .filter(|value, _| value % 2 == 0, false)
///     .map(|value, _| value * 10)
///     .to_vec();
/// assert_eq!(result, vec![20, 40]);
/// ```
pub struct IndexedSequence<V> {
    node: Rc<dyn IndexedCore<V>>,
}

impl<V> Clone for IndexedSequence<V> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
        }
    }
}

impl<V: Clone + 'static> IndexedSequence<V> {
    pub(crate) fn from_node(node: Rc<dyn IndexedCore<V>>) -> Self {
        Self { node }
    }

    pub(crate) fn node(&self) -> &Rc<dyn IndexedCore<V>> {
        &self.node
    }

    /// Creates a sequence over an ordered list of values.
    ///
    /// This is the ordered-list leaf producer: it owns the raw data and
    /// serves traversals directly in either direction.
    #[must_use]
    pub fn from_values<I: IntoIterator<Item = V>>(values: I) -> Self {
        let values: Vec<V> = values.into_iter().collect();
        let meta = Meta::new(Some(values.len()));
        Self::from_node(Rc::new(ListNode { meta, values }))
    }

    /// Returns the known length, or `None` if it has not been determined.
    #[inline]
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        self.node.meta().length()
    }

    // -------------------------------------------------------------------------
    // Lazy combinators
    // -------------------------------------------------------------------------

    /// Returns a sequence with every value transformed. Indices are
    /// preserved.
    #[must_use]
    pub fn map<U, F>(&self, mapper: F) -> IndexedSequence<U>
    where
        U: Clone + 'static,
        F: Fn(&V, usize) -> U + 'static,
    {
        IndexedSequence::from_node(Rc::new(MapNode {
            meta: Meta::new(self.len()),
            parent: Rc::clone(&self.node),
            mapper: Box::new(mapper),
        }))
    }

    /// Returns a sequence of the values satisfying the predicate.
    ///
    /// With `maintain_indices` each kept value reports its original index
    /// and the length stays the parent's; otherwise kept values are
    /// renumbered from zero and the length becomes unknown.
    #[must_use]
    pub fn filter<F>(&self, predicate: F, maintain_indices: bool) -> Self
    where
        F: Fn(&V, usize) -> bool + 'static,
    {
        let length = if maintain_indices { self.len() } else { None };
        Self::from_node(Rc::new(FilterNode {
            meta: Meta::new(length),
            parent: Rc::clone(&self.node),
            predicate: Box::new(predicate),
            maintain: maintain_indices,
        }))
    }

    /// Returns a sequence traversing this one in the opposite order.
    ///
    /// With `maintain_indices` every value keeps its original index (the
    /// numbering runs against the new traversal order); otherwise indices
    /// are renumbered from zero in the new order. Reversing a reversal with
    /// the same flag returns the original sequence.
    #[must_use]
    pub fn reverse(&self, maintain_indices: bool) -> Self {
        if let Some(parent) = self.node.unreversed(maintain_indices) {
            return Self::from_node(parent);
        }
        Self::from_node(Rc::new(ReversedNode {
            meta: Meta::new(self.len()),
            parent: Rc::clone(&self.node),
            maintain: maintain_indices,
        }))
    }

    /// Returns the window `[begin, end)` of this sequence.
    ///
    /// Negative offsets count from the end; an absent end means "to the
    /// end". The whole-sequence window returns `self` unchanged. With
    /// `maintain_indices` values keep their original indices instead of
    /// being renumbered from the window start.
    #[must_use]
    pub fn slice(&self, begin: isize, end: Option<isize>, maintain_indices: bool) -> Self {
        if whole_slice(begin, end, self.len()) {
            return self.clone();
        }
        let length = self.len().map(|len| {
            if maintain_indices {
                len
            } else {
                let resolved_begin = resolve_begin(begin, Some(len)).unwrap_or(len);
                let resolved_end = resolve_end(end, Some(len)).unwrap_or(len);
                resolved_end.saturating_sub(resolved_begin)
            }
        });
        Self::from_node(Rc::new(SliceNode {
            meta: Meta::new(length),
            parent: Rc::clone(&self.node),
            begin,
            end,
            maintain: maintain_indices,
        }))
    }

    /// Concatenates this sequence with the given sequences.
    ///
    /// The running index of an entry is the cumulative count of entries
    /// yielded by earlier operands plus its index within its own operand.
    #[must_use]
    pub fn concat<I>(&self, others: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let mut sources: Vec<Rc<dyn IndexedCore<V>>> = vec![Rc::clone(&self.node)];
        sources.extend(others.into_iter().map(|sequence| sequence.node));
        let length = sources
            .iter()
            .try_fold(0usize, |sum, source| {
                source.meta().length().map(|len| sum + len)
            });
        Self::from_node(Rc::new(ConcatNode {
            meta: Meta::new(length),
            sources,
        }))
    }

    /// Returns the first `amount` values. Indices are preserved.
    #[must_use]
    pub fn take(&self, amount: usize) -> Self {
        let length = self.len().map(|len| len.min(amount));
        Self::from_node(Rc::new(TakeNode {
            meta: Meta::new(length),
            parent: Rc::clone(&self.node),
            amount,
        }))
    }

    /// Returns the last `amount` values.
    #[must_use]
    pub fn take_last(&self, amount: usize, maintain_indices: bool) -> Self {
        self.reverse(maintain_indices)
            .take(amount)
            .reverse(maintain_indices)
    }

    /// Returns the leading values satisfying the predicate.
    ///
    /// The traversal count reports the number of leading values that
    /// satisfied the predicate even though the predicate runs lazily.
    #[must_use]
    pub fn take_while<F>(&self, predicate: F, maintain_indices: bool) -> Self
    where
        F: Fn(&V, usize) -> bool + 'static,
    {
        let length = if maintain_indices { self.len() } else { None };
        Self::from_node(Rc::new(TakeWhileNode {
            meta: Meta::new(length),
            parent: Rc::clone(&self.node),
            predicate: Box::new(predicate),
            maintain: maintain_indices,
        }))
    }

    /// Returns the leading values until the predicate first holds.
    #[must_use]
    pub fn take_until<F>(&self, predicate: F, maintain_indices: bool) -> Self
    where
        F: Fn(&V, usize) -> bool + 'static,
    {
        self.take_while(move |value, index| !predicate(value, index), maintain_indices)
    }

    /// Skips the first `amount` values.
    #[must_use]
    pub fn skip(&self, amount: usize, maintain_indices: bool) -> Self {
        let length = self.len().map(|len| len.saturating_sub(amount));
        Self::from_node(Rc::new(SkipNode {
            meta: Meta::new(length),
            parent: Rc::clone(&self.node),
            amount,
            maintain: maintain_indices,
        }))
    }

    /// Skips the last `amount` values.
    #[must_use]
    pub fn skip_last(&self, amount: usize, maintain_indices: bool) -> Self {
        self.reverse(maintain_indices)
            .skip(amount, false)
            .reverse(maintain_indices)
    }

    /// Skips the leading values satisfying the predicate.
    ///
    /// The traversal count reports the number of values remaining after the
    /// skip boundary, adjusted for whether indices are renumbered or
    /// preserved.
    #[must_use]
    pub fn skip_while<F>(&self, predicate: F, maintain_indices: bool) -> Self
    where
        F: Fn(&V, usize) -> bool + 'static,
    {
        let length = if maintain_indices { self.len() } else { None };
        Self::from_node(Rc::new(SkipWhileNode {
            meta: Meta::new(length),
            parent: Rc::clone(&self.node),
            predicate: Box::new(predicate),
            maintain: maintain_indices,
        }))
    }

    /// Skips the leading values until the predicate first holds.
    #[must_use]
    pub fn skip_until<F>(&self, predicate: F, maintain_indices: bool) -> Self
    where
        F: Fn(&V, usize) -> bool + 'static,
    {
        self.skip_while(move |value, index| !predicate(value, index), maintain_indices)
    }

    /// Replaces `remove_count` values starting at `index` with the given
    /// values. A splice that removes and inserts nothing returns `self`.
    #[must_use]
    pub fn splice(&self, index: usize, remove_count: usize, values: Vec<V>) -> Self {
        if remove_count == 0 && values.is_empty() {
            return self.clone();
        }
        let tail_begin = isize::try_from(index + remove_count).unwrap_or(isize::MAX);
        let head_end = isize::try_from(index).unwrap_or(isize::MAX);
        let tail = self.slice(tail_begin, None, false);
        self.slice(0, Some(head_end), false)
            .concat([Self::from_values(values), tail])
    }

    /// Returns this sequence's values renumbered densely from zero.
    #[must_use]
    pub fn values(&self) -> Self {
        reindex_keyed(Rc::clone(self.as_keyed().node()), None)
    }

    /// Exposes this sequence as a keyed sequence over `usize` keys, giving
    /// access to the keyed combinator surface.
    #[must_use]
    pub fn as_keyed(&self) -> KeyedSequence<usize, V> {
        keyed_view(Rc::clone(&self.node), self.len())
    }

    /// Returns an indexed sequence of `(index, value)` entries.
    #[must_use]
    pub fn entries(&self) -> IndexedSequence<(usize, V)> {
        self.as_keyed().entries()
    }

    /// Materializes the sequence into its node-local cache, exactly once.
    #[must_use]
    pub fn cache_result(&self) -> Self {
        cache_indexed(&*self.node);
        self.clone()
    }

    // -------------------------------------------------------------------------
    // Terminal consumers
    // -------------------------------------------------------------------------

    /// Calls `side_effect` once per value with its reported index. Returns
    /// the number of values visited.
    pub fn for_each<F: FnMut(&V, usize)>(&self, mut side_effect: F) -> usize {
        iterate_indexed(
            &*self.node,
            &mut |value, index| {
                side_effect(value, index);
                Step::Continue
            },
            false,
            false,
        )
    }

    /// Calls `visitor` once per value until it returns [`Step::Stop`].
    /// Returns the number of visits that continued.
    pub fn for_each_while<F: FnMut(&V, usize) -> Step>(&self, mut visitor: F) -> usize {
        iterate_indexed(
            &*self.node,
            &mut |value, index| visitor(value, index),
            false,
            false,
        )
    }

    /// Traverses the sequence and returns the number of values.
    #[must_use]
    pub fn count(&self) -> usize {
        self.for_each(|_, _| {})
    }

    /// Folds the values into an accumulated value.
    pub fn reduce<A, F>(&self, initial: A, mut reducer: F) -> A
    where
        F: FnMut(A, &V, usize) -> A,
    {
        let mut accumulated = Some(initial);
        self.for_each(|value, index| {
            let folded = reducer(
                accumulated.take().expect("accumulator is always present"),
                value,
                index,
            );
            accumulated = Some(folded);
        });
        accumulated.expect("accumulator is always present")
    }

    /// Folds the values in reverse order with their original indices.
    pub fn reduce_right<A, F>(&self, initial: A, reducer: F) -> A
    where
        F: FnMut(A, &V, usize) -> A,
    {
        self.reverse(true).reduce(initial, reducer)
    }

    /// Returns `true` if the predicate holds for every value.
    pub fn every<F: FnMut(&V, usize) -> bool>(&self, mut predicate: F) -> bool {
        let mut holds = true;
        self.for_each_while(|value, index| {
            if predicate(value, index) {
                Step::Continue
            } else {
                holds = false;
                Step::Stop
            }
        });
        holds
    }

    /// Returns `true` if the predicate holds for any value.
    pub fn some<F: FnMut(&V, usize) -> bool>(&self, mut predicate: F) -> bool {
        !self.every(move |value, index| !predicate(value, index))
    }

    /// Returns the first value satisfying the predicate.
    pub fn find<F: FnMut(&V, usize) -> bool>(&self, mut predicate: F) -> Option<V> {
        let mut found = None;
        self.for_each_while(|value, index| {
            if predicate(value, index) {
                found = Some(value.clone());
                Step::Stop
            } else {
                Step::Continue
            }
        });
        found
    }

    /// Returns the last value satisfying the predicate.
    pub fn find_last<F: FnMut(&V, usize) -> bool>(&self, predicate: F) -> Option<V> {
        self.reverse(true).find(predicate)
    }

    /// Returns the reported index of the first value satisfying the
    /// predicate, or `None` when no value does.
    pub fn find_index<F: FnMut(&V, usize) -> bool>(&self, mut predicate: F) -> Option<usize> {
        let mut found = None;
        self.for_each_while(|value, index| {
            if predicate(value, index) {
                found = Some(index);
                Step::Stop
            } else {
                Step::Continue
            }
        });
        found
    }

    /// Returns the original index of the last value satisfying the
    /// predicate.
    pub fn find_last_index<F: FnMut(&V, usize) -> bool>(&self, predicate: F) -> Option<usize> {
        self.reverse(true).find_index(predicate)
    }

    /// Returns the index of the first occurrence of `search`, or `None`.
    pub fn index_of(&self, search: &V) -> Option<usize>
    where
        V: PartialEq,
    {
        self.find_index(|value, _| value == search)
    }

    /// Returns the index of the last occurrence of `search`, or `None`.
    pub fn last_index_of(&self, search: &V) -> Option<usize>
    where
        V: PartialEq,
    {
        self.reverse(true).index_of(search)
    }

    /// Returns the value reported at `index`, if any.
    pub fn get(&self, index: usize) -> Option<V> {
        let mut found = None;
        self.for_each_while(|value, candidate| {
            if candidate == index {
                found = Some(value.clone());
                Step::Stop
            } else {
                Step::Continue
            }
        });
        found
    }

    /// Returns the first value.
    #[must_use]
    pub fn first(&self) -> Option<V> {
        let mut found = None;
        self.for_each_while(|value, _| {
            found = Some(value.clone());
            Step::Stop
        });
        found
    }

    /// Returns the last value.
    #[must_use]
    pub fn last(&self) -> Option<V> {
        self.reverse(true).first()
    }

    /// Joins the displayed values with `separator`, inserting one separator
    /// per index gap and padding up to the known length, so a sequence with
    /// preserved sparse indices keeps its positions in the rendering.
    #[must_use]
    pub fn join(&self, separator: &str) -> String
    where
        V: fmt::Display,
    {
        let mut joined = String::new();
        let mut previous = 0usize;
        self.for_each(|value, index| {
            for _ in 0..index.saturating_sub(previous) {
                joined.push_str(separator);
            }
            previous = index;
            joined.push_str(&value.to_string());
        });
        if let Some(length) = self.len() {
            if length > 0 {
                for _ in 0..(length - 1).saturating_sub(previous) {
                    joined.push_str(separator);
                }
            }
        }
        joined
    }

    /// Structural equality over `(index, value)` entries, with the same
    /// short-circuits as [`KeyedSequence::equals`].
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool
    where
        V: PartialEq,
    {
        if Rc::ptr_eq(&self.node, &other.node) {
            return true;
        }
        if let (Some(left), Some(right)) = (self.len(), other.len()) {
            if left != right {
                return false;
            }
        }
        let mut entries: Vec<(usize, V)> = Vec::new();
        self.for_each(|value, index| entries.push((index, value.clone())));
        let mut matched = 0usize;
        let mut equal = true;
        other.for_each_while(|value, index| match entries.get(matched) {
            Some((expected_index, expected_value))
                if *expected_index == index && expected_value == value =>
            {
                matched += 1;
                Step::Continue
            }
            _ => {
                equal = false;
                Step::Stop
            }
        });
        equal && matched == entries.len()
    }

    // -------------------------------------------------------------------------
    // Conversions
    // -------------------------------------------------------------------------

    /// Collects the values in traversal order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<V> {
        let mut values = Vec::new();
        self.for_each(|value, _| values.push(value.clone()));
        values
    }

    /// Materializes the values into a persistent vector.
    #[must_use]
    pub fn to_vector(&self) -> PersistentVector<V> {
        PersistentVector::new().merge(self.to_vec())
    }

    /// Materializes the values into a persistent hash set.
    #[must_use]
    pub fn to_hash_set(&self) -> PersistentHashSet<V>
    where
        V: Hash + Eq,
    {
        self.to_vec().into_iter().collect()
    }
}

impl<K: Clone + 'static, V: Clone + 'static> IndexedSequence<(K, V)> {
    /// Reconstitutes a keyed sequence from a sequence of `(key, value)`
    /// entries, the inverse of [`KeyedSequence::entries`].
    #[must_use]
    pub fn from_entries(&self) -> KeyedSequence<K, V> {
        keyed_from_entries(Rc::clone(&self.node), self.len())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<V: Clone + 'static> FromIterator<V> for IndexedSequence<V> {
    fn from_iter<I: IntoIterator<Item = V>>(iterable: I) -> Self {
        Self::from_values(iterable)
    }
}

impl<V: Clone + 'static> From<Vec<V>> for IndexedSequence<V> {
    fn from(values: Vec<V>) -> Self {
        Self::from_values(values)
    }
}

impl<V: Clone + PartialEq + 'static> PartialEq for IndexedSequence<V> {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl<V: Clone + fmt::Debug + 'static> fmt::Debug for IndexedSequence<V> {
    /// Renders `Seq [value, ...]` (empty: `Seq []`). Rendering traverses
    /// the sequence; this is a diagnostic form, not a parsed one.
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.to_vec();
        if values.is_empty() {
            return write!(formatter, "Seq []");
        }
        write!(formatter, "Seq [ ")?;
        for (position, value) in values.iter().enumerate() {
            if position > 0 {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{value:?}")?;
        }
        write!(formatter, " ]")
    }
}

// =============================================================================
// Leaf Producer
// =============================================================================

/// The ordered-list leaf: an owned vector of values.
struct ListNode<V> {
    meta: Meta<usize, V>,
    values: Vec<V>,
}

impl<V: Clone + 'static> IndexedCore<V> for ListNode<V> {
    fn meta(&self) -> &Meta<usize, V> {
        &self.meta
    }

    fn is_materialized(&self) -> bool {
        true
    }

    fn iterate_raw(
        &self,
        visitor: &mut IndexedVisitor<'_, V>,
        reverse: bool,
        flip: bool,
    ) -> usize {
        let last = self.values.len().saturating_sub(1);
        let mut visited = 0;
        if reverse {
            for (index, value) in self.values.iter().enumerate().rev() {
                let reported = if flip { index } else { last - index };
                if visitor(value, reported).is_stop() {
                    return visited;
                }
                visited += 1;
            }
        } else {
            for (index, value) in self.values.iter().enumerate() {
                let reported = if flip { last - index } else { index };
                if visitor(value, reported).is_stop() {
                    return visited;
                }
                visited += 1;
            }
        }
        visited
    }
}

// =============================================================================
// Value Reindexing
// =============================================================================

/// Re-enumerates a keyed parent's values as `0..n`, ignoring parent keys.
///
/// A flipped traversal needs the total count to mirror indices, so it
/// forces a one-time self-materialization when the length is unknown.
struct ValuesNode<K, V> {
    meta: Meta<usize, V>,
    parent: Rc<dyn KeyedCore<K, V>>,
}

impl<K: Clone + 'static, V: Clone + 'static> IndexedCore<V> for ValuesNode<K, V> {
    fn meta(&self) -> &Meta<usize, V> {
        &self.meta
    }

    fn iterate_raw(
        &self,
        visitor: &mut IndexedVisitor<'_, V>,
        reverse: bool,
        flip: bool,
    ) -> usize {
        if flip && self.meta.length().is_none() {
            cache_indexed(self);
            return iterate_indexed(self, visitor, reverse, flip);
        }
        let last = self.meta.length().map_or(0, |len| len.saturating_sub(1));
        let mut iterations = 0usize;
        iterate_keyed(
            &*self.parent,
            &mut |value, _| {
                let reported = if flip {
                    last.saturating_sub(iterations)
                } else {
                    iterations
                };
                if visitor(value, reported).is_stop() {
                    return Step::Stop;
                }
                iterations += 1;
                Step::Continue
            },
            reverse,
        );
        iterations
    }
}

pub(crate) fn reindex_keyed<K, V>(
    parent: Rc<dyn KeyedCore<K, V>>,
    length: Option<usize>,
) -> IndexedSequence<V>
where
    K: Clone + 'static,
    V: Clone + 'static,
{
    IndexedSequence::from_node(Rc::new(ValuesNode {
        meta: Meta::new(length),
        parent,
    }))
}

// =============================================================================
// Transformation Nodes
// =============================================================================

struct MapNode<V, U> {
    meta: Meta<usize, U>,
    parent: Rc<dyn IndexedCore<V>>,
    mapper: Box<dyn Fn(&V, usize) -> U>,
}

impl<V: Clone + 'static, U: Clone + 'static> IndexedCore<U> for MapNode<V, U> {
    fn meta(&self) -> &Meta<usize, U> {
        &self.meta
    }

    fn reversed_indices(&self) -> bool {
        self.parent.reversed_indices()
    }

    fn iterate_raw(
        &self,
        visitor: &mut IndexedVisitor<'_, U>,
        reverse: bool,
        flip: bool,
    ) -> usize {
        iterate_indexed(
            &*self.parent,
            &mut |value, index| {
                let mapped = (self.mapper)(value, index);
                visitor(&mapped, index)
            },
            reverse,
            flip,
        )
    }
}

struct FilterNode<V> {
    meta: Meta<usize, V>,
    parent: Rc<dyn IndexedCore<V>>,
    predicate: Box<dyn Fn(&V, usize) -> bool>,
    maintain: bool,
}

impl<V: Clone + 'static> IndexedCore<V> for FilterNode<V> {
    fn meta(&self) -> &Meta<usize, V> {
        &self.meta
    }

    fn reversed_indices(&self) -> bool {
        self.parent.reversed_indices()
    }

    fn iterate_raw(
        &self,
        visitor: &mut IndexedVisitor<'_, V>,
        reverse: bool,
        flip: bool,
    ) -> usize {
        if flip && !self.maintain {
            // Renumbering under mirrored indices needs the filtered count.
            cache_indexed(self);
            return iterate_indexed(self, visitor, reverse, flip);
        }
        let mut iterations = 0usize;
        let parent_count = iterate_indexed(
            &*self.parent,
            &mut |value, index| {
                if (self.predicate)(value, index) {
                    let reported = if self.maintain { index } else { iterations };
                    if visitor(value, reported).is_stop() {
                        return Step::Stop;
                    }
                    iterations += 1;
                }
                Step::Continue
            },
            reverse,
            flip,
        );
        if self.maintain { parent_count } else { iterations }
    }
}

struct ReversedNode<V> {
    meta: Meta<usize, V>,
    parent: Rc<dyn IndexedCore<V>>,
    maintain: bool,
}

impl<V: Clone + 'static> IndexedCore<V> for ReversedNode<V> {
    fn meta(&self) -> &Meta<usize, V> {
        &self.meta
    }

    fn reversed_indices(&self) -> bool {
        self.maintain ^ self.parent.reversed_indices()
    }

    fn unreversed(&self, maintain_indices: bool) -> Option<Rc<dyn IndexedCore<V>>> {
        (maintain_indices == self.maintain).then(|| Rc::clone(&self.parent))
    }

    fn iterate_raw(
        &self,
        visitor: &mut IndexedVisitor<'_, V>,
        reverse: bool,
        flip: bool,
    ) -> usize {
        iterate_indexed(&*self.parent, visitor, !reverse, flip ^ self.maintain)
    }
}

struct SliceNode<V> {
    meta: Meta<usize, V>,
    parent: Rc<dyn IndexedCore<V>>,
    begin: isize,
    end: Option<isize>,
    maintain: bool,
}

impl<V: Clone + 'static> IndexedCore<V> for SliceNode<V> {
    fn meta(&self) -> &Meta<usize, V> {
        &self.meta
    }

    fn reversed_indices(&self) -> bool {
        self.parent.reversed_indices()
    }

    fn iterate_raw(
        &self,
        visitor: &mut IndexedVisitor<'_, V>,
        reverse: bool,
        flip: bool,
    ) -> usize {
        if reverse {
            cache_indexed(self);
            return iterate_indexed(self, visitor, reverse, flip);
        }
        let reversed = self.parent.reversed_indices() ^ flip;
        let negative_bounds = self.begin < 0 || self.end.is_some_and(|end| end < 0);
        if (negative_bounds || reversed) && self.parent.meta().length().is_none() {
            cache_indexed(&*self.parent);
        }
        let parent_length = self.parent.meta().length();
        let resolved_begin = resolve_begin(self.begin, parent_length);
        let resolved_end = resolve_end(self.end, parent_length);
        let (begin, end) = if reversed {
            // The parent reports mirrored indices, so mirror the window.
            let len = parent_length.unwrap_or(0);
            let window_begin = resolved_begin.unwrap_or(0).min(len);
            let window_end = resolved_end.unwrap_or(len).min(len);
            (len - window_end, Some(len - window_begin))
        } else {
            (resolved_begin.unwrap_or(0), resolved_end)
        };
        let mut visited = 0usize;
        iterate_indexed(
            &*self.parent,
            &mut |value, index| {
                let inside = index >= begin && end.is_none_or(|end| index < end);
                if !inside {
                    return Step::Continue;
                }
                let reported = if self.maintain {
                    index
                } else {
                    index.saturating_sub(begin)
                };
                if visitor(value, reported).is_stop() {
                    return Step::Stop;
                }
                visited += 1;
                Step::Continue
            },
            false,
            flip,
        );
        visited
    }
}

struct ConcatNode<V> {
    meta: Meta<usize, V>,
    sources: Vec<Rc<dyn IndexedCore<V>>>,
}

impl<V: Clone + 'static> IndexedCore<V> for ConcatNode<V> {
    fn meta(&self) -> &Meta<usize, V> {
        &self.meta
    }

    fn iterate_raw(
        &self,
        visitor: &mut IndexedVisitor<'_, V>,
        reverse: bool,
        flip: bool,
    ) -> usize {
        if flip && self.meta.length().is_none() {
            // Mirroring the running index needs the total length.
            cache_indexed(self);
            return iterate_indexed(self, visitor, reverse, flip);
        }
        let last = self.meta.length().map_or(0, |len| len.saturating_sub(1));
        let mut iterations = 0usize;
        let mut stopped = false;
        let count = self.sources.len();
        for position in 0..count {
            let source = &self.sources[if reverse { count - 1 - position } else { position }];
            let base = iterations;
            iterations += iterate_indexed(
                &**source,
                &mut |value, index| {
                    let running = base + index;
                    let reported = if flip { last.saturating_sub(running) } else { running };
                    if visitor(value, reported).is_stop() {
                        stopped = true;
                        return Step::Stop;
                    }
                    Step::Continue
                },
                reverse,
                false,
            );
            if stopped {
                break;
            }
        }
        iterations
    }
}

struct TakeNode<V> {
    meta: Meta<usize, V>,
    parent: Rc<dyn IndexedCore<V>>,
    amount: usize,
}

impl<V: Clone + 'static> IndexedCore<V> for TakeNode<V> {
    fn meta(&self) -> &Meta<usize, V> {
        &self.meta
    }

    fn reversed_indices(&self) -> bool {
        self.parent.reversed_indices()
    }

    fn iterate_raw(
        &self,
        visitor: &mut IndexedVisitor<'_, V>,
        reverse: bool,
        flip: bool,
    ) -> usize {
        if reverse || flip {
            cache_indexed(self);
            return iterate_indexed(self, visitor, reverse, flip);
        }
        let mut taken = 0usize;
        iterate_indexed(
            &*self.parent,
            &mut |value, index| {
                if taken >= self.amount || visitor(value, index).is_stop() {
                    return Step::Stop;
                }
                taken += 1;
                Step::Continue
            },
            false,
            false,
        );
        taken
    }
}

struct TakeWhileNode<V> {
    meta: Meta<usize, V>,
    parent: Rc<dyn IndexedCore<V>>,
    predicate: Box<dyn Fn(&V, usize) -> bool>,
    maintain: bool,
}

impl<V: Clone + 'static> IndexedCore<V> for TakeWhileNode<V> {
    fn meta(&self) -> &Meta<usize, V> {
        &self.meta
    }

    fn reversed_indices(&self) -> bool {
        self.parent.reversed_indices()
    }

    fn iterate_raw(
        &self,
        visitor: &mut IndexedVisitor<'_, V>,
        reverse: bool,
        flip: bool,
    ) -> usize {
        if reverse || flip {
            cache_indexed(self);
            return iterate_indexed(self, visitor, reverse, flip);
        }
        let mut last_index = 0usize;
        let mut any_taken = false;
        let mut did_finish = true;
        let parent_count = iterate_indexed(
            &*self.parent,
            &mut |value, index| {
                if (self.predicate)(value, index) {
                    if visitor(value, index).is_stop() {
                        did_finish = false;
                        return Step::Stop;
                    }
                    last_index = index;
                    any_taken = true;
                    Step::Continue
                } else {
                    did_finish = false;
                    Step::Stop
                }
            },
            false,
            false,
        );
        if self.maintain {
            self.meta.length().unwrap_or(parent_count)
        } else if did_finish {
            parent_count
        } else if any_taken {
            last_index + 1
        } else {
            0
        }
    }
}

struct SkipNode<V> {
    meta: Meta<usize, V>,
    parent: Rc<dyn IndexedCore<V>>,
    amount: usize,
    maintain: bool,
}

impl<V: Clone + 'static> IndexedCore<V> for SkipNode<V> {
    fn meta(&self) -> &Meta<usize, V> {
        &self.meta
    }

    fn reversed_indices(&self) -> bool {
        self.parent.reversed_indices()
    }

    fn iterate_raw(
        &self,
        visitor: &mut IndexedVisitor<'_, V>,
        reverse: bool,
        flip: bool,
    ) -> usize {
        if reverse || flip {
            cache_indexed(self);
            return iterate_indexed(self, visitor, reverse, flip);
        }
        let mut skipped = 0usize;
        let mut boundary: Option<usize> = None;
        let mut visited = 0usize;
        iterate_indexed(
            &*self.parent,
            &mut |value, index| {
                if skipped < self.amount {
                    skipped += 1;
                    return Step::Continue;
                }
                let base = *boundary.get_or_insert(index);
                let reported = if self.maintain {
                    index
                } else {
                    index.saturating_sub(base)
                };
                if visitor(value, reported).is_stop() {
                    return Step::Stop;
                }
                visited += 1;
                Step::Continue
            },
            false,
            false,
        );
        visited
    }
}

struct SkipWhileNode<V> {
    meta: Meta<usize, V>,
    parent: Rc<dyn IndexedCore<V>>,
    predicate: Box<dyn Fn(&V, usize) -> bool>,
    maintain: bool,
}

impl<V: Clone + 'static> IndexedCore<V> for SkipWhileNode<V> {
    fn meta(&self) -> &Meta<usize, V> {
        &self.meta
    }

    fn reversed_indices(&self) -> bool {
        self.parent.reversed_indices()
    }

    fn iterate_raw(
        &self,
        visitor: &mut IndexedVisitor<'_, V>,
        reverse: bool,
        flip: bool,
    ) -> usize {
        if reverse {
            cache_indexed(self);
            return iterate_indexed(self, visitor, reverse, flip);
        }
        let reversed = self.parent.reversed_indices() ^ flip;
        let mut skipping = true;
        let mut boundary_found = false;
        let mut offset = 0usize;
        let length = iterate_indexed(
            &*self.parent,
            &mut |value, index| {
                if skipping {
                    skipping = (self.predicate)(value, index);
                    if skipping {
                        return Step::Continue;
                    }
                    boundary_found = true;
                    offset = index;
                }
                let reported = if flip || self.maintain {
                    index
                } else {
                    index.saturating_sub(offset)
                };
                visitor(value, reported)
            },
            false,
            flip,
        );
        if self.maintain {
            length
        } else if !boundary_found {
            0
        } else if reversed {
            offset + 1
        } else {
            length.saturating_sub(offset)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
