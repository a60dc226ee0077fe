//! Keyed lazy sequences.
//!
//! [`KeyedSequence`] is the base sequence abstraction: a cheaply cloneable
//! handle on an immutable chain of transformation nodes over `(key, value)`
//! entries. Combinators build new nodes in O(1) without traversing;
//! terminal consumers drive exactly one traversal through the whole chain.
//!
//! # Examples
//!
//! ```rust
//! use lazers::sequence::KeyedSequence;
//!
//! let sequence = KeyedSequence::from_pairs([("a", 1), ("b", 2), ("c", 3)]);
//! let doubled = sequence.map(|value, _| value * 2);
//!
//! // Nothing has been traversed yet; consumption runs the chain once.
//! assert_eq!(doubled.to_pairs(), vec![("a", 2), ("b", 4), ("c", 6)]);
//! ```

use std::fmt;
use std::hash::Hash;
use std::iter::FromIterator;
use std::rc::Rc;

use super::indexed::{reindex_keyed, IndexedSequence};
use super::iterate::{
    cache_keyed, iterate_indexed, iterate_keyed, resolve_begin, resolve_end, whole_slice,
    IndexedCore, KeyedCore, KeyedVisitor, Meta, Step,
};
use crate::persistent::{PersistentHashMap, PersistentHashSet, PersistentVector};

// =============================================================================
// KeyedSequence Definition
// =============================================================================

/// A lazy sequence of `(key, value)` entries.
///
/// Every combinator returns a new sequence sharing the receiver's node as
/// its parent; parents are never mutated by children. A sequence's length
/// is `None` until it is known from construction or learned by
/// materialization ([`cache_result`](Self::cache_result)).
///
/// # Examples
///
/// ```rust
/// use lazers::sequence::KeyedSequence;
///
/// let sequence = KeyedSequence::from_pairs([("one", 1), ("two", 2)]);
/// assert_eq!(sequence.len(), Some(2));
/// assert_eq!(sequence.get(&"two"), Some(2));
/// ```
pub struct KeyedSequence<K, V> {
    node: Rc<dyn KeyedCore<K, V>>,
}

impl<K, V> Clone for KeyedSequence<K, V> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
        }
    }
}

impl<K: Clone + 'static, V: Clone + 'static> KeyedSequence<K, V> {
    pub(crate) fn from_node(node: Rc<dyn KeyedCore<K, V>>) -> Self {
        Self { node }
    }

    pub(crate) fn node(&self) -> &Rc<dyn KeyedCore<K, V>> {
        &self.node
    }

    /// Creates a sequence over an ordered collection of field/value pairs.
    ///
    /// This is the field-map leaf producer: it owns the raw data and serves
    /// traversals directly in either direction.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazers::sequence::KeyedSequence;
    ///
    /// let sequence = KeyedSequence::from_pairs([("a", 1), ("b", 2)]);
    /// assert_eq!(sequence.to_values(), vec![1, 2]);
    /// ```
    #[must_use]
    pub fn from_pairs<I: IntoIterator<Item = (K, V)>>(pairs: I) -> Self {
        let pairs: Vec<(K, V)> = pairs.into_iter().collect();
        let meta = Meta::new(Some(pairs.len()));
        Self::from_node(Rc::new(PairsNode { meta, pairs }))
    }

    /// Returns the known length, or `None` if it has not been determined.
    ///
    /// Constructing a sequence never traverses it, so the length of a
    /// filtered or predicate-truncated sequence stays unknown until a
    /// terminal consumer or [`cache_result`](Self::cache_result) runs.
    #[inline]
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        self.node.meta().length()
    }

    // -------------------------------------------------------------------------
    // Lazy combinators
    // -------------------------------------------------------------------------

    /// Returns a sequence with every value transformed. Keys are preserved.
    #[must_use]
    pub fn map<U, F>(&self, mapper: F) -> KeyedSequence<K, U>
    where
        U: Clone + 'static,
        F: Fn(&V, &K) -> U + 'static,
    {
        KeyedSequence::from_node(Rc::new(MapNode {
            meta: Meta::new(self.len()),
            parent: Rc::clone(&self.node),
            mapper: Box::new(mapper),
        }))
    }

    /// Returns a sequence containing only entries that satisfy the
    /// predicate. Keys are preserved; the length becomes unknown.
    #[must_use]
    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&V, &K) -> bool + 'static,
    {
        Self::from_node(Rc::new(FilterNode {
            meta: Meta::new(None),
            parent: Rc::clone(&self.node),
            predicate: Box::new(predicate),
        }))
    }

    /// Returns a sequence traversing this one in the opposite order.
    ///
    /// Reversing a reversal returns the original sequence.
    #[must_use]
    pub fn reverse(&self) -> Self {
        if let Some(parent) = self.node.unreversed() {
            return Self::from_node(parent);
        }
        Self::from_node(Rc::new(ReversedNode {
            meta: Meta::new(self.len()),
            parent: Rc::clone(&self.node),
        }))
    }

    /// Returns a sequence with keys and values exchanged.
    #[must_use]
    pub fn flip(&self) -> KeyedSequence<V, K> {
        KeyedSequence::from_node(Rc::new(FlipNode {
            meta: Meta::new(self.len()),
            parent: Rc::clone(&self.node),
        }))
    }

    /// Returns an indexed sequence over this sequence's keys.
    #[must_use]
    pub fn keys(&self) -> IndexedSequence<K> {
        self.map(|_, key| key.clone()).values()
    }

    /// Returns an indexed sequence over this sequence's values, re-numbered
    /// from zero in traversal order.
    #[must_use]
    pub fn values(&self) -> IndexedSequence<V> {
        reindex_keyed(Rc::clone(&self.node), self.len())
    }

    /// Returns an indexed sequence of `(key, value)` entries.
    ///
    /// Together with
    /// [`IndexedSequence::from_entries`](IndexedSequence::from_entries) this
    /// is the bridge used when keyed operations need index arithmetic, such
    /// as slicing with negative bounds.
    #[must_use]
    pub fn entries(&self) -> IndexedSequence<(K, V)> {
        self.map(|value, key| (key.clone(), value.clone())).values()
    }

    /// Concatenates this sequence with the given sequences.
    ///
    /// The combined length is known if and only if every operand's length
    /// is known. Traversal visits operands in order (reverse order under a
    /// reversed traversal) and an early stop propagates across operand
    /// boundaries; the reported count is cumulative across operands.
    #[must_use]
    pub fn concat<I>(&self, others: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let mut sources: Vec<Rc<dyn KeyedCore<K, V>>> = vec![Rc::clone(&self.node)];
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

    /// Returns the first `amount` entries.
    #[must_use]
    pub fn take(&self, amount: usize) -> Self {
        let length = self.len().map(|len| len.min(amount));
        Self::from_node(Rc::new(TakeNode {
            meta: Meta::new(length),
            parent: Rc::clone(&self.node),
            amount,
        }))
    }

    /// Returns the leading entries satisfying the predicate.
    #[must_use]
    pub fn take_while<F>(&self, predicate: F) -> Self
    where
        F: Fn(&V, &K) -> bool + 'static,
    {
        Self::from_node(Rc::new(TakeWhileNode {
            meta: Meta::new(None),
            parent: Rc::clone(&self.node),
            predicate: Box::new(predicate),
        }))
    }

    /// Returns the leading entries until the predicate first holds.
    #[must_use]
    pub fn take_until<F>(&self, predicate: F) -> Self
    where
        F: Fn(&V, &K) -> bool + 'static,
    {
        self.take_while(move |value, key| !predicate(value, key))
    }

    /// Skips the first `amount` entries.
    #[must_use]
    pub fn skip(&self, amount: usize) -> Self {
        let length = self.len().map(|len| len.saturating_sub(amount));
        Self::from_node(Rc::new(SkipNode {
            meta: Meta::new(length),
            parent: Rc::clone(&self.node),
            amount,
        }))
    }

    /// Skips the leading entries satisfying the predicate.
    #[must_use]
    pub fn skip_while<F>(&self, predicate: F) -> Self
    where
        F: Fn(&V, &K) -> bool + 'static,
    {
        Self::from_node(Rc::new(SkipWhileNode {
            meta: Meta::new(None),
            parent: Rc::clone(&self.node),
            predicate: Box::new(predicate),
        }))
    }

    /// Skips the leading entries until the predicate first holds.
    #[must_use]
    pub fn skip_until<F>(&self, predicate: F) -> Self
    where
        F: Fn(&V, &K) -> bool + 'static,
    {
        self.skip_while(move |value, key| !predicate(value, key))
    }

    /// Returns the window `[begin, end)` of this sequence.
    ///
    /// Negative offsets count from the end. When an offset cannot be
    /// resolved because the length is unknown, the sequence is materialized
    /// through its indexed entry view, sliced there, and reconstituted.
    #[must_use]
    pub fn slice(&self, begin: isize, end: Option<isize>) -> Self {
        if whole_slice(begin, end, self.len()) {
            return self.clone();
        }
        if let Some(resolved_begin) = resolve_begin(begin, self.len()) {
            match end {
                None => return self.skip(resolved_begin),
                Some(_) => {
                    if let Some(resolved_end) = resolve_end(end, self.len()) {
                        return self
                            .skip(resolved_begin)
                            .take(resolved_end.saturating_sub(resolved_begin));
                    }
                }
            }
        }
        self.entries().slice(begin, end, false).from_entries()
    }

    /// Materializes the sequence into its node-local cache, exactly once.
    ///
    /// Subsequent traversals replay the cache instead of re-running the
    /// upstream chain. If the length was unknown it becomes known as the
    /// materialized count. Calling this again is a no-op.
    #[must_use]
    pub fn cache_result(&self) -> Self {
        cache_keyed(&*self.node);
        self.clone()
    }

    // -------------------------------------------------------------------------
    // Terminal consumers
    // -------------------------------------------------------------------------

    /// Calls `side_effect` once per entry. Returns the number of entries
    /// visited.
    pub fn for_each<F: FnMut(&V, &K)>(&self, mut side_effect: F) -> usize {
        iterate_keyed(
            &*self.node,
            &mut |value, key| {
                side_effect(value, key);
                Step::Continue
            },
            false,
        )
    }

    /// Calls `visitor` once per entry until it returns [`Step::Stop`].
    /// Returns the number of visits that continued.
    pub fn for_each_while<F: FnMut(&V, &K) -> Step>(&self, mut visitor: F) -> usize {
        iterate_keyed(&*self.node, &mut |value, key| visitor(value, key), false)
    }

    /// Traverses the sequence and returns the number of entries.
    #[must_use]
    pub fn count(&self) -> usize {
        self.for_each(|_, _| {})
    }

    /// Folds the entries into an accumulated value.
    pub fn reduce<A, F>(&self, initial: A, mut reducer: F) -> A
    where
        F: FnMut(A, &V, &K) -> A,
    {
        let mut accumulated = Some(initial);
        self.for_each(|value, key| {
            let folded = reducer(
                accumulated.take().expect("accumulator is always present"),
                value,
                key,
            );
            accumulated = Some(folded);
        });
        accumulated.expect("accumulator is always present")
    }

    /// Folds the entries in reverse order.
    pub fn reduce_right<A, F>(&self, initial: A, reducer: F) -> A
    where
        F: FnMut(A, &V, &K) -> A,
    {
        self.reverse().reduce(initial, reducer)
    }

    /// Returns `true` if the predicate holds for every entry.
    pub fn every<F: FnMut(&V, &K) -> bool>(&self, mut predicate: F) -> bool {
        let mut holds = true;
        self.for_each_while(|value, key| {
            if predicate(value, key) {
                Step::Continue
            } else {
                holds = false;
                Step::Stop
            }
        });
        holds
    }

    /// Returns `true` if the predicate holds for any entry.
    pub fn some<F: FnMut(&V, &K) -> bool>(&self, mut predicate: F) -> bool {
        !self.every(move |value, key| !predicate(value, key))
    }

    /// Returns the first value whose entry satisfies the predicate.
    pub fn find<F: FnMut(&V, &K) -> bool>(&self, mut predicate: F) -> Option<V> {
        let mut found = None;
        self.for_each_while(|value, key| {
            if predicate(value, key) {
                found = Some(value.clone());
                Step::Stop
            } else {
                Step::Continue
            }
        });
        found
    }

    /// Returns the key of the first entry satisfying the predicate.
    pub fn find_key<F: FnMut(&V, &K) -> bool>(&self, mut predicate: F) -> Option<K> {
        let mut found = None;
        self.for_each_while(|value, key| {
            if predicate(value, key) {
                found = Some(key.clone());
                Step::Stop
            } else {
                Step::Continue
            }
        });
        found
    }

    /// Returns the last value whose entry satisfies the predicate.
    pub fn find_last<F: FnMut(&V, &K) -> bool>(&self, predicate: F) -> Option<V> {
        self.reverse().find(predicate)
    }

    /// Returns the key of the last entry satisfying the predicate.
    pub fn find_last_key<F: FnMut(&V, &K) -> bool>(&self, predicate: F) -> Option<K> {
        self.reverse().find_key(predicate)
    }

    /// Returns the value stored under `key`, if any.
    ///
    /// Absence is an ordinary result, not an error: callers supply their
    /// own fallback with `unwrap_or` and friends.
    pub fn get(&self, key: &K) -> Option<V>
    where
        K: PartialEq,
    {
        self.find(|_, candidate| candidate == key)
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
        self.reverse().first()
    }

    /// Joins the displayed values with `separator`.
    #[must_use]
    pub fn join(&self, separator: &str) -> String
    where
        V: fmt::Display,
    {
        let mut joined = String::new();
        let mut first = true;
        self.for_each(|value, _| {
            if first {
                first = false;
            } else {
                joined.push_str(separator);
            }
            joined.push_str(&value.to_string());
        });
        joined
    }

    /// Structural equality: identity-equal sequences are equal without
    /// traversal; sequences with different known lengths are unequal
    /// without traversal; otherwise entries are compared pairwise, stopping
    /// at the first mismatch.
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool
    where
        K: PartialEq,
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
        let entries = self.to_pairs();
        let mut matched = 0usize;
        let mut equal = true;
        other.for_each_while(|value, key| match entries.get(matched) {
            Some((expected_key, expected_value))
                if expected_key == key && expected_value == value =>
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

    /// Collects the entries into a vector of pairs, the field-map leaf
    /// producer shape.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(K, V)> {
        let mut pairs = Vec::new();
        self.for_each(|value, key| pairs.push((key.clone(), value.clone())));
        pairs
    }

    /// Collects the values into a vector, the ordered-list leaf producer
    /// shape.
    #[must_use]
    pub fn to_values(&self) -> Vec<V> {
        let mut values = Vec::new();
        self.for_each(|value, _| values.push(value.clone()));
        values
    }

    /// Materializes the entries into a persistent hash map.
    #[must_use]
    pub fn to_hash_map(&self) -> PersistentHashMap<K, V>
    where
        K: Hash + Eq,
    {
        self.to_pairs().into_iter().collect()
    }

    /// Materializes the values into a persistent hash set.
    #[must_use]
    pub fn to_hash_set(&self) -> PersistentHashSet<V>
    where
        V: Hash + Eq,
    {
        self.to_values().into_iter().collect()
    }

    /// Materializes the values into a persistent vector.
    #[must_use]
    pub fn to_vector(&self) -> PersistentVector<V> {
        PersistentVector::new().merge(self.to_values())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<K: Clone + 'static, V: Clone + 'static> FromIterator<(K, V)> for KeyedSequence<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iterable: I) -> Self {
        Self::from_pairs(iterable)
    }
}

impl<K: Clone + 'static, V: Clone + 'static> From<Vec<(K, V)>> for KeyedSequence<K, V> {
    fn from(pairs: Vec<(K, V)>) -> Self {
        Self::from_pairs(pairs)
    }
}

impl<K, V> PartialEq for KeyedSequence<K, V>
where
    K: Clone + PartialEq + 'static,
    V: Clone + PartialEq + 'static,
{
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl<K, V> fmt::Debug for KeyedSequence<K, V>
where
    K: Clone + fmt::Debug + 'static,
    V: Clone + fmt::Debug + 'static,
{
    /// Renders `Seq { key: value, ... }` (empty: `Seq {}`). Rendering
    /// traverses the sequence; this is a diagnostic form, not a parsed one.
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs = self.to_pairs();
        if pairs.is_empty() {
            return write!(formatter, "Seq {{}}");
        }
        write!(formatter, "Seq {{ ")?;
        for (position, (key, value)) in pairs.iter().enumerate() {
            if position > 0 {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{key:?}: {value:?}")?;
        }
        write!(formatter, " }}")
    }
}

// =============================================================================
// Leaf Producer
// =============================================================================

/// The field-map leaf: an ordered collection of owned pairs.
struct PairsNode<K, V> {
    meta: Meta<K, V>,
    pairs: Vec<(K, V)>,
}

impl<K: Clone + 'static, V: Clone + 'static> KeyedCore<K, V> for PairsNode<K, V> {
    fn meta(&self) -> &Meta<K, V> {
        &self.meta
    }

    fn is_materialized(&self) -> bool {
        true
    }

    fn iterate_raw(&self, visitor: &mut KeyedVisitor<'_, K, V>, reverse: bool) -> usize {
        let mut visited = 0;
        if reverse {
            for (key, value) in self.pairs.iter().rev() {
                if visitor(value, key).is_stop() {
                    return visited;
                }
                visited += 1;
            }
        } else {
            for (key, value) in &self.pairs {
                if visitor(value, key).is_stop() {
                    return visited;
                }
                visited += 1;
            }
        }
        visited
    }
}

// =============================================================================
// Transformation Nodes
// =============================================================================

struct MapNode<K, V, U> {
    meta: Meta<K, U>,
    parent: Rc<dyn KeyedCore<K, V>>,
    mapper: Box<dyn Fn(&V, &K) -> U>,
}

impl<K, V, U> KeyedCore<K, U> for MapNode<K, V, U>
where
    K: Clone + 'static,
    V: Clone + 'static,
    U: Clone + 'static,
{
    fn meta(&self) -> &Meta<K, U> {
        &self.meta
    }

    fn iterate_raw(&self, visitor: &mut KeyedVisitor<'_, K, U>, reverse: bool) -> usize {
        iterate_keyed(
            &*self.parent,
            &mut |value, key| {
                let mapped = (self.mapper)(value, key);
                visitor(&mapped, key)
            },
            reverse,
        )
    }
}

struct FilterNode<K, V> {
    meta: Meta<K, V>,
    parent: Rc<dyn KeyedCore<K, V>>,
    predicate: Box<dyn Fn(&V, &K) -> bool>,
}

impl<K: Clone + 'static, V: Clone + 'static> KeyedCore<K, V> for FilterNode<K, V> {
    fn meta(&self) -> &Meta<K, V> {
        &self.meta
    }

    fn iterate_raw(&self, visitor: &mut KeyedVisitor<'_, K, V>, reverse: bool) -> usize {
        let mut visited = 0usize;
        iterate_keyed(
            &*self.parent,
            &mut |value, key| {
                if (self.predicate)(value, key) {
                    if visitor(value, key).is_stop() {
                        return Step::Stop;
                    }
                    visited += 1;
                }
                Step::Continue
            },
            reverse,
        );
        visited
    }
}

struct ReversedNode<K, V> {
    meta: Meta<K, V>,
    parent: Rc<dyn KeyedCore<K, V>>,
}

impl<K: Clone + 'static, V: Clone + 'static> KeyedCore<K, V> for ReversedNode<K, V> {
    fn meta(&self) -> &Meta<K, V> {
        &self.meta
    }

    fn iterate_raw(&self, visitor: &mut KeyedVisitor<'_, K, V>, reverse: bool) -> usize {
        iterate_keyed(&*self.parent, visitor, !reverse)
    }

    fn unreversed(&self) -> Option<Rc<dyn KeyedCore<K, V>>> {
        Some(Rc::clone(&self.parent))
    }
}

struct FlipNode<K, V> {
    meta: Meta<V, K>,
    parent: Rc<dyn KeyedCore<K, V>>,
}

impl<K: Clone + 'static, V: Clone + 'static> KeyedCore<V, K> for FlipNode<K, V> {
    fn meta(&self) -> &Meta<V, K> {
        &self.meta
    }

    fn iterate_raw(&self, visitor: &mut KeyedVisitor<'_, V, K>, reverse: bool) -> usize {
        iterate_keyed(
            &*self.parent,
            &mut |value, key| visitor(key, value),
            reverse,
        )
    }
}

struct ConcatNode<K, V> {
    meta: Meta<K, V>,
    sources: Vec<Rc<dyn KeyedCore<K, V>>>,
}

impl<K: Clone + 'static, V: Clone + 'static> KeyedCore<K, V> for ConcatNode<K, V> {
    fn meta(&self) -> &Meta<K, V> {
        &self.meta
    }

    fn iterate_raw(&self, visitor: &mut KeyedVisitor<'_, K, V>, reverse: bool) -> usize {
        let mut iterations = 0usize;
        let mut stopped = false;
        let count = self.sources.len();
        for position in 0..count {
            let source = &self.sources[if reverse { count - 1 - position } else { position }];
            iterations += iterate_keyed(
                &**source,
                &mut |value, key| {
                    if visitor(value, key).is_stop() {
                        stopped = true;
                        return Step::Stop;
                    }
                    Step::Continue
                },
                reverse,
            );
            if stopped {
                break;
            }
        }
        iterations
    }
}

struct TakeNode<K, V> {
    meta: Meta<K, V>,
    parent: Rc<dyn KeyedCore<K, V>>,
    amount: usize,
}

impl<K: Clone + 'static, V: Clone + 'static> KeyedCore<K, V> for TakeNode<K, V> {
    fn meta(&self) -> &Meta<K, V> {
        &self.meta
    }

    fn iterate_raw(&self, visitor: &mut KeyedVisitor<'_, K, V>, reverse: bool) -> usize {
        if reverse {
            cache_keyed(self);
            return iterate_keyed(self, visitor, reverse);
        }
        let mut taken = 0usize;
        iterate_keyed(
            &*self.parent,
            &mut |value, key| {
                if taken >= self.amount || visitor(value, key).is_stop() {
                    return Step::Stop;
                }
                taken += 1;
                Step::Continue
            },
            false,
        );
        taken
    }
}

struct TakeWhileNode<K, V> {
    meta: Meta<K, V>,
    parent: Rc<dyn KeyedCore<K, V>>,
    predicate: Box<dyn Fn(&V, &K) -> bool>,
}

impl<K: Clone + 'static, V: Clone + 'static> KeyedCore<K, V> for TakeWhileNode<K, V> {
    fn meta(&self) -> &Meta<K, V> {
        &self.meta
    }

    fn iterate_raw(&self, visitor: &mut KeyedVisitor<'_, K, V>, reverse: bool) -> usize {
        if reverse {
            cache_keyed(self);
            return iterate_keyed(self, visitor, reverse);
        }
        let mut taken = 0usize;
        iterate_keyed(
            &*self.parent,
            &mut |value, key| {
                if !(self.predicate)(value, key) || visitor(value, key).is_stop() {
                    return Step::Stop;
                }
                taken += 1;
                Step::Continue
            },
            false,
        );
        taken
    }
}

struct SkipNode<K, V> {
    meta: Meta<K, V>,
    parent: Rc<dyn KeyedCore<K, V>>,
    amount: usize,
}

impl<K: Clone + 'static, V: Clone + 'static> KeyedCore<K, V> for SkipNode<K, V> {
    fn meta(&self) -> &Meta<K, V> {
        &self.meta
    }

    fn iterate_raw(&self, visitor: &mut KeyedVisitor<'_, K, V>, reverse: bool) -> usize {
        if reverse {
            cache_keyed(self);
            return iterate_keyed(self, visitor, reverse);
        }
        let mut skipped = 0usize;
        let mut visited = 0usize;
        iterate_keyed(
            &*self.parent,
            &mut |value, key| {
                if skipped < self.amount {
                    skipped += 1;
                    return Step::Continue;
                }
                if visitor(value, key).is_stop() {
                    return Step::Stop;
                }
                visited += 1;
                Step::Continue
            },
            false,
        );
        visited
    }
}

struct SkipWhileNode<K, V> {
    meta: Meta<K, V>,
    parent: Rc<dyn KeyedCore<K, V>>,
    predicate: Box<dyn Fn(&V, &K) -> bool>,
}

impl<K: Clone + 'static, V: Clone + 'static> KeyedCore<K, V> for SkipWhileNode<K, V> {
    fn meta(&self) -> &Meta<K, V> {
        &self.meta
    }

    fn iterate_raw(&self, visitor: &mut KeyedVisitor<'_, K, V>, reverse: bool) -> usize {
        if reverse {
            cache_keyed(self);
            return iterate_keyed(self, visitor, reverse);
        }
        let mut skipping = true;
        let mut visited = 0usize;
        iterate_keyed(
            &*self.parent,
            &mut |value, key| {
                if skipping {
                    skipping = (self.predicate)(value, key);
                    if skipping {
                        return Step::Continue;
                    }
                }
                if visitor(value, key).is_stop() {
                    return Step::Stop;
                }
                visited += 1;
                Step::Continue
            },
            false,
        );
        visited
    }
}

// =============================================================================
// Bridges from the indexed world
// =============================================================================

/// Reconstitutes a keyed sequence from an indexed sequence of entries.
struct FromEntriesNode<K, V> {
    meta: Meta<K, V>,
    parent: Rc<dyn IndexedCore<(K, V)>>,
}

impl<K: Clone + 'static, V: Clone + 'static> KeyedCore<K, V> for FromEntriesNode<K, V> {
    fn meta(&self) -> &Meta<K, V> {
        &self.meta
    }

    fn iterate_raw(&self, visitor: &mut KeyedVisitor<'_, K, V>, reverse: bool) -> usize {
        iterate_indexed(
            &*self.parent,
            &mut |entry: &(K, V), _| visitor(&entry.1, &entry.0),
            reverse,
            false,
        )
    }
}

pub(crate) fn keyed_from_entries<K, V>(
    parent: Rc<dyn IndexedCore<(K, V)>>,
    length: Option<usize>,
) -> KeyedSequence<K, V>
where
    K: Clone + 'static,
    V: Clone + 'static,
{
    KeyedSequence::from_node(Rc::new(FromEntriesNode {
        meta: Meta::new(length),
        parent,
    }))
}

/// Exposes an indexed sequence as a keyed sequence over `usize` keys.
struct KeyedViewNode<V> {
    meta: Meta<usize, V>,
    parent: Rc<dyn IndexedCore<V>>,
}

impl<V: Clone + 'static> KeyedCore<usize, V> for KeyedViewNode<V> {
    fn meta(&self) -> &Meta<usize, V> {
        &self.meta
    }

    fn iterate_raw(&self, visitor: &mut KeyedVisitor<'_, usize, V>, reverse: bool) -> usize {
        iterate_indexed(
            &*self.parent,
            &mut |value, index| visitor(value, &index),
            reverse,
            false,
        )
    }
}

pub(crate) fn keyed_view<V: Clone + 'static>(
    parent: Rc<dyn IndexedCore<V>>,
    length: Option<usize>,
) -> KeyedSequence<usize, V> {
    KeyedSequence::from_node(Rc::new(KeyedViewNode {
        meta: Meta::new(length),
        parent,
    }))
}

// =============================================================================
// Tests
// =============================================================================
