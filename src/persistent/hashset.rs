//! Persistent (immutable) hash set.
//!
//! [`PersistentHashSet`] is a value container over [`PersistentHashMap`]:
//! membership of an element maps to a binding from the element to the unit
//! sentinel, and every set operation delegates presence, insertion and
//! removal to the backing map.
//!
//! # Persistent and transient operation
//!
//! The set has two faces. The persistent face is immutable and freely
//! aliased: updates return new sets sharing structure with the original,
//! and updates that change nothing return a set sharing the original's
//! root, observable through [`ptr_eq`](PersistentHashSet::ptr_eq). The
//! transient face ([`TransientHashSet`]) batches many edits through
//! in-place mutation and is converted back with
//! [`persistent`](TransientHashSet::persistent), which consumes it.
//!
//! # Examples
//!
//! ```rust
//! use lazers::persistent::PersistentHashSet;
//!
//! let set = PersistentHashSet::new().insert(1).insert(2).insert(1);
//! assert_eq!(set.len(), 2);
//! assert!(set.contains(&1));
//! assert!(!set.contains(&3));
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::iter::FromIterator;
use std::marker::PhantomData;
use std::rc::Rc;

use super::{PersistentHashMap, PersistentHashMapIterator, TransientHashMap};
use crate::sequence::iterate::{KeyedCore, KeyedVisitor, Meta};
use crate::sequence::KeyedSequence;

// =============================================================================
// PersistentHashSet Definition
// =============================================================================

/// A persistent (immutable) hash set backed by [`PersistentHashMap`].
///
/// # Time Complexity
///
/// | Operation  | Complexity |
/// |------------|------------|
/// | `new`      | O(1)       |
/// | `contains` | O(log32 N) |
/// | `insert`   | O(log32 N) |
/// | `remove`   | O(log32 N) |
/// | `len`      | O(1)       |
/// | `merge`    | O(M log32 (N + M)) |
///
/// # Examples
///
/// ```rust
/// use lazers::persistent::PersistentHashSet;
///
/// let set = PersistentHashSet::singleton(42);
/// assert!(set.contains(&42));
/// assert!(!set.contains(&0));
/// ```
#[derive(Clone)]
pub struct PersistentHashSet<T> {
    inner: PersistentHashMap<T, ()>,
}

impl<T> PersistentHashSet<T> {
    /// Creates a new empty set.
    ///
    /// The empty set is structurally canonical: every empty set compares
    /// equal, and removing the last element of any set restores this form.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: PersistentHashMap::new(),
        }
    }

    /// Returns the number of elements in the set.
    ///
    /// Always equal to the length of the backing map.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the set contains no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns `true` if both sets share the same backing root.
    ///
    /// Identity probe for the no-op contract: inserting a present element
    /// or removing an absent one returns a set for which this holds.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.inner.ptr_eq(&other.inner)
    }
}

impl<T: Clone + Hash + Eq> PersistentHashSet<T> {
    /// Creates a set containing a single element.
    #[inline]
    #[must_use]
    pub fn singleton(element: T) -> Self {
        Self::new().insert(element)
    }

    /// Returns `true` if the set contains the element.
    ///
    /// The element may be any borrowed form of the set's element type,
    /// with matching `Hash` and `Eq`.
    #[must_use]
    pub fn contains<Q>(&self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.contains_key(element)
    }

    /// Returns a set also containing `element`.
    ///
    /// When the element is already present the receiver's root is shared
    /// unchanged, so callers can detect the no-op by identity
    /// ([`ptr_eq`](Self::ptr_eq)) instead of comparing contents.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazers::persistent::PersistentHashSet;
    ///
    /// let set = PersistentHashSet::new().insert(1);
    /// let same = set.insert(1);
    /// assert!(set.ptr_eq(&same));
    /// ```
    #[must_use]
    pub fn insert(&self, element: T) -> Self {
        if self.contains(&element) {
            return self.clone();
        }
        Self {
            inner: self.inner.insert(element, ()),
        }
    }

    /// Returns a set without `element`.
    ///
    /// Removing an absent element shares the receiver's root; removing the
    /// last element restores the canonical empty set.
    #[must_use]
    pub fn remove<Q>(&self, element: &Q) -> Self
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        Self {
            inner: self.inner.remove(element),
        }
    }

    /// Returns a set additionally containing every given value.
    ///
    /// The elements are accumulated through a scratch transient, so the
    /// whole batch costs one logical copy; the result is persistent.
    #[must_use]
    pub fn merge<I: IntoIterator<Item = T>>(&self, values: I) -> Self {
        let mut transient = self.transient();
        for value in values {
            transient.insert(value);
        }
        transient.persistent()
    }

    /// Returns the union of two sets.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        self.merge(other.iter().cloned())
    }

    /// Returns the set of elements present in both sets.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        let (smaller, larger) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        let mut transient = TransientHashSet::new();
        for element in smaller.iter() {
            if larger.contains(element) {
                transient.insert(element.clone());
            }
        }
        transient.persistent()
    }

    /// Returns the set of elements present in `self` but not in `other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        let mut transient = TransientHashSet::new();
        for element in self.iter() {
            if !other.contains(element) {
                transient.insert(element.clone());
            }
        }
        transient.persistent()
    }

    /// Returns the set of elements present in exactly one of the two sets.
    #[must_use]
    pub fn symmetric_difference(&self, other: &Self) -> Self {
        let mut transient = TransientHashSet::new();
        for element in self.iter() {
            if !other.contains(element) {
                transient.insert(element.clone());
            }
        }
        for element in other.iter() {
            if !self.contains(element) {
                transient.insert(element.clone());
            }
        }
        transient.persistent()
    }

    /// Returns `true` if every element of `self` is in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.iter().all(|element| other.contains(element))
    }

    /// Returns `true` if every element of `other` is in `self`.
    #[must_use]
    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }

    /// Returns `true` if the sets share no element.
    #[must_use]
    pub fn is_disjoint(&self, other: &Self) -> bool {
        let (smaller, larger) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        smaller.iter().all(|element| !larger.contains(element))
    }

    /// Switches into transient mode for batched updates.
    ///
    /// O(1): the transient starts out sharing this set's structure and
    /// copies nodes on first write, so this set is never affected.
    #[must_use]
    pub fn transient(&self) -> TransientHashSet<T> {
        TransientHashSet {
            inner: self.inner.transient(),
            _marker: PhantomData,
        }
    }

    /// Returns an iterator over the elements in internal order.
    #[must_use]
    pub fn iter(&self) -> PersistentHashSetIterator<'_, T> {
        PersistentHashSetIterator {
            inner: self.inner.iter(),
        }
    }
}

impl<T: Clone + Hash + Eq + 'static> PersistentHashSet<T> {
    /// Exposes the set's members through the lazy sequence framework.
    ///
    /// A set has no values beyond membership, so each member appears as
    /// both the value and the key of its entry. The sequence holds an O(1)
    /// snapshot of this set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazers::persistent::PersistentHashSet;
    ///
    /// let set: PersistentHashSet<i32> = [1, 2, 3].into_iter().collect();
    /// let total = set.seq().reduce(0, |sum, value, _| sum + value);
    /// assert_eq!(total, 6);
    /// ```
    #[must_use]
    pub fn seq(&self) -> KeyedSequence<T, T> {
        KeyedSequence::from_node(Rc::new(SetSeqNode {
            meta: Meta::new(Some(self.len())),
            set: self.clone(),
        }))
    }
}

/// Iteration-protocol adapter over a set snapshot.
struct SetSeqNode<T> {
    meta: Meta<T, T>,
    set: PersistentHashSet<T>,
}

impl<T: Clone + Hash + Eq + 'static> KeyedCore<T, T> for SetSeqNode<T> {
    fn meta(&self) -> &Meta<T, T> {
        &self.meta
    }

    fn is_materialized(&self) -> bool {
        true
    }

    fn iterate_raw(&self, visitor: &mut KeyedVisitor<'_, T, T>, reverse: bool) -> usize {
        let mut visited = 0;
        if reverse {
            let elements: Vec<&T> = self.set.iter().collect();
            for element in elements.into_iter().rev() {
                if visitor(element, element).is_stop() {
                    return visited;
                }
                visited += 1;
            }
        } else {
            for element in self.set.iter() {
                if visitor(element, element).is_stop() {
                    return visited;
                }
                visited += 1;
            }
        }
        visited
    }
}

// =============================================================================
// Iterators
// =============================================================================

/// Borrowing iterator over a [`PersistentHashSet`].
pub struct PersistentHashSetIterator<'a, T> {
    inner: PersistentHashMapIterator<'a, T, ()>,
}

impl<'a, T> Iterator for PersistentHashSetIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(element, _)| element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for PersistentHashSetIterator<'_, T> {}

/// Owning iterator over a [`PersistentHashSet`].
pub struct PersistentHashSetIntoIterator<T> {
    elements: std::vec::IntoIter<T>,
}

impl<T> Iterator for PersistentHashSetIntoIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.elements.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.elements.size_hint()
    }
}

impl<T> ExactSizeIterator for PersistentHashSetIntoIterator<T> {}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<T> Default for PersistentHashSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Hash + Eq> FromIterator<T> for PersistentHashSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iterable: I) -> Self {
        let mut transient = TransientHashSet::new();
        for element in iterable {
            transient.insert(element);
        }
        transient.persistent()
    }
}

impl<T: Clone + Hash + Eq> IntoIterator for PersistentHashSet<T> {
    type Item = T;
    type IntoIter = PersistentHashSetIntoIterator<T>;

    fn into_iter(self) -> Self::IntoIter {
        let elements: Vec<T> = self.iter().cloned().collect();
        PersistentHashSetIntoIterator {
            elements: elements.into_iter(),
        }
    }
}

impl<'a, T: Clone + Hash + Eq> IntoIterator for &'a PersistentHashSet<T> {
    type Item = &'a T;
    type IntoIter = PersistentHashSetIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Clone + Hash + Eq> PartialEq for PersistentHashSet<T> {
    /// Two sets are equal when both are empty or their backing maps are
    /// equal by the map's own equality contract.
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T: Clone + Hash + Eq> Eq for PersistentHashSet<T> {}

impl<T: Clone + Hash + Eq + fmt::Debug> fmt::Debug for PersistentHashSet<T> {
    /// Renders `Set {element, ...}` (empty: `Set {}`), a diagnostic form.
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "Set ")?;
        formatter.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Clone + Hash + Eq + fmt::Display> fmt::Display for PersistentHashSet<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{{")?;
        for (position, element) in self.iter().enumerate() {
            if position > 0 {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{element}")?;
        }
        write!(formatter, "}}")
    }
}

// =============================================================================
// TransientHashSet Definition
// =============================================================================

/// A transient (temporarily mutable) hash set for efficient batch updates.
///
/// # Design
///
/// - Wraps [`TransientHashMap<T, ()>`](TransientHashMap) and inherits its
///   uniqueness-based in-place mutation.
/// - `PhantomData<Rc<()>>` ensures `!Send` and `!Sync`.
/// - `Clone`/`Copy` are intentionally not implemented (linear-type
///   semantics); an independent mutable session is obtained with
///   [`fork`](Self::fork).
///
/// # Transient-Persistent Pattern
///
/// ```rust
/// use lazers::persistent::PersistentHashSet;
///
/// let persistent: PersistentHashSet<i32> = [1, 2, 3].into_iter().collect();
///
/// let mut transient = persistent.transient();
/// transient.insert(4);
/// transient.remove(&1);
///
/// let updated = transient.persistent();
/// assert_eq!(updated.len(), 3);
/// assert!(!updated.contains(&1));
/// assert!(updated.contains(&4));
/// assert_eq!(persistent.len(), 3); // The frozen original never moved.
/// ```
pub struct TransientHashSet<T> {
    inner: TransientHashMap<T, ()>,
    /// Marker to ensure `!Send` and `!Sync`.
    _marker: PhantomData<Rc<()>>,
}

static_assertions::assert_not_impl_any!(TransientHashSet<i32>: Send, Sync);
static_assertions::assert_not_impl_any!(TransientHashSet<String>: Send, Sync);

impl<T> TransientHashSet<T> {
    /// Returns the number of elements in the set.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the set contains no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<T: Clone + Hash + Eq> TransientHashSet<T> {
    /// Creates a new empty transient set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: TransientHashMap::new(),
            _marker: PhantomData,
        }
    }

    /// Returns `true` if the set contains the element.
    #[must_use]
    pub fn contains<Q>(&self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.contains_key(element)
    }

    /// Inserts an element in place.
    ///
    /// Returns `true` if the element was newly inserted, `false` if it was
    /// already present.
    pub fn insert(&mut self, element: T) -> bool {
        self.inner.insert(element, ()).is_none()
    }

    /// Removes an element in place.
    ///
    /// Returns `true` if the element was present.
    pub fn remove<Q>(&mut self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.remove(element).is_some()
    }

    /// Adds every given value in place; the set stays transient.
    pub fn merge<I: IntoIterator<Item = T>>(&mut self, values: I) {
        for value in values {
            self.insert(value);
        }
    }

    /// Freezes the transient into a persistent set.
    ///
    /// Consumes the transient: once frozen, in-place mutation through this
    /// handle is impossible by construction.
    #[must_use]
    pub fn persistent(self) -> PersistentHashSet<T> {
        PersistentHashSet {
            inner: self.inner.persistent(),
        }
    }

    /// Begins an independent batch-mutation session over the current state.
    ///
    /// The two transients share structure until either writes; neither can
    /// observe the other's subsequent mutations.
    #[must_use]
    pub fn fork(&self) -> Self {
        Self {
            inner: self.inner.fork(),
            _marker: PhantomData,
        }
    }
}

impl<T: Clone + Hash + Eq> Default for TransientHashSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Hash + Eq> Extend<T> for TransientHashSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iterable: I) {
        self.merge(iterable);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_new_set_is_empty() {
        let set: PersistentHashSet<i32> = PersistentHashSet::new();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert!(!set.contains(&1));
    }

    #[rstest]
    fn test_empty_sets_are_canonical() {
        let first: PersistentHashSet<i32> = PersistentHashSet::new();
        let second: PersistentHashSet<i32> = PersistentHashSet::new();
        assert_eq!(first, second);
        let emptied = PersistentHashSet::singleton(1).remove(&1);
        assert_eq!(emptied, first);
        assert!(emptied.is_empty());
    }

    #[rstest]
    fn test_duplicate_insert_returns_same_root() {
        let set = PersistentHashSet::new().insert(1).insert(2);
        let same = set.insert(1);
        assert!(set.ptr_eq(&same));
        assert_eq!(same.len(), 2);
    }

    #[rstest]
    fn test_remove_absent_returns_same_root() {
        let set = PersistentHashSet::new().insert(1);
        let same = set.remove(&9);
        assert!(set.ptr_eq(&same));
    }

    #[rstest]
    fn test_insert_preserves_original() {
        let original = PersistentHashSet::new().insert(1);
        let extended = original.insert(2);
        assert_eq!(original.len(), 1);
        assert!(!original.contains(&2));
        assert_eq!(extended.len(), 2);
        assert!(extended.contains(&1));
        assert!(extended.contains(&2));
    }

    #[rstest]
    fn test_merge_accumulates_through_a_scratch_transient() {
        let set = PersistentHashSet::new().insert(1);
        let merged = set.merge([2, 3, 2, 1]);
        assert_eq!(merged.len(), 3);
        assert_eq!(set.len(), 1);
    }

    #[rstest]
    fn test_set_algebra() {
        let left: PersistentHashSet<i32> = [1, 2, 3].into_iter().collect();
        let right: PersistentHashSet<i32> = [2, 3, 4].into_iter().collect();

        assert_eq!(left.union(&right).len(), 4);
        assert_eq!(left.intersection(&right).len(), 2);
        assert_eq!(left.difference(&right), PersistentHashSet::singleton(1));
        let expected: PersistentHashSet<i32> = [1, 4].into_iter().collect();
        assert_eq!(left.symmetric_difference(&right), expected);
        assert!(left.intersection(&right).is_subset(&left));
        assert!(left.is_superset(&left.intersection(&right)));
        assert!(!left.is_disjoint(&right));
        assert!(left.difference(&right).is_disjoint(&right));
    }

    #[rstest]
    fn test_transient_roundtrip_preserves_identity_when_untouched() {
        let set: PersistentHashSet<i32> = [1, 2, 3].into_iter().collect();
        let roundtripped = set.transient().persistent();
        assert!(set.ptr_eq(&roundtripped));
        assert_eq!(set, roundtripped);
    }

    #[rstest]
    fn test_transient_never_disturbs_the_frozen_original() {
        let set: PersistentHashSet<i32> = [1, 2, 3].into_iter().collect();
        let mut transient = set.transient();
        transient.remove(&1);
        transient.insert(9);
        let updated = transient.persistent();
        assert!(set.contains(&1));
        assert!(!set.contains(&9));
        assert!(!updated.contains(&1));
        assert!(updated.contains(&9));
    }

    #[rstest]
    fn test_transient_fork_sessions_are_independent() {
        let mut first = PersistentHashSet::singleton(0).transient();
        let mut second = first.fork();
        first.insert(1);
        second.insert(2);
        let first = first.persistent();
        let second = second.persistent();
        assert!(first.contains(&1) && !first.contains(&2));
        assert!(second.contains(&2) && !second.contains(&1));
    }

    #[rstest]
    fn test_seq_exposes_member_as_value_and_key() {
        let set: PersistentHashSet<i32> = [1, 2, 3].into_iter().collect();
        let mut entries = set.seq().to_pairs();
        entries.sort_unstable();
        assert_eq!(entries, vec![(1, 1), (2, 2), (3, 3)]);
        let even = set.seq().filter(|value, _| value % 2 == 0);
        assert_eq!(even.to_values(), vec![2]);
    }

    #[rstest]
    fn test_display_and_debug() {
        let empty: PersistentHashSet<i32> = PersistentHashSet::new();
        assert_eq!(format!("{empty}"), "{}");
        assert_eq!(format!("{empty:?}"), "Set {}");
        let single = PersistentHashSet::singleton(7);
        assert_eq!(format!("{single}"), "{7}");
        assert_eq!(format!("{single:?}"), "Set {7}");
    }
}
