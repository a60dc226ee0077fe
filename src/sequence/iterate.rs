//! Iteration protocol shared by every sequence node.
//!
//! A producer accepts a visitor and a direction flag, calls the visitor once
//! per entry in order (or reverse order), and stops early when the visitor
//! signals termination. Everything else in the sequence framework is built
//! on this contract: combinators wrap a parent node and reinterpret its
//! traversal, terminal consumers drive exactly one traversal top to bottom.
//!
//! Two node capabilities carry the protocol:
//!
//! - [`KeyedCore`]: traversal over `(value, key)` pairs with arbitrary keys.
//! - [`IndexedCore`]: traversal over `(value, index)` pairs with a dense
//!   integer index space and an extra `flip` argument controlling whether
//!   indices are reported in visit order or mirrored from the far end.
//!
//! Each node owns a [`Meta`] record holding its optional known length and a
//! write-once materialized cache. The cache is the universal escape hatch:
//! a node asked to traverse in a direction it cannot serve incrementally
//! materializes itself once and replays from the cache.

use std::cell::{Cell, RefCell};

// =============================================================================
// Visitor Contract
// =============================================================================

/// Continuation signal returned by a traversal visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Keep traversing.
    Continue,
    /// Terminate the traversal immediately.
    Stop,
}

impl Step {
    /// Returns `true` if this signal terminates the traversal.
    #[inline]
    #[must_use]
    pub const fn is_stop(self) -> bool {
        matches!(self, Self::Stop)
    }
}

/// Visitor over keyed entries. Receives `(value, key)`.
pub(crate) type KeyedVisitor<'a, K, V> = dyn FnMut(&V, &K) -> Step + 'a;

/// Visitor over indexed entries. Receives `(value, index)`.
pub(crate) type IndexedVisitor<'a, V> = dyn FnMut(&V, usize) -> Step + 'a;

// =============================================================================
// Node Metadata
// =============================================================================

/// Per-node bookkeeping: optional known length and the write-once cache.
///
/// The length is `None` until it is either known from construction or
/// learned by materialization. The cache is populated at most once and never
/// invalidated; nodes are logically immutable after construction except for
/// this record.
pub(crate) struct Meta<K, V> {
    length: Cell<Option<usize>>,
    cache: RefCell<Option<Vec<(K, V)>>>,
}

impl<K, V> Meta<K, V> {
    pub(crate) fn new(length: Option<usize>) -> Self {
        Self {
            length: Cell::new(length),
            cache: RefCell::new(None),
        }
    }

    pub(crate) fn length(&self) -> Option<usize> {
        self.length.get()
    }

    pub(crate) fn is_cached(&self) -> bool {
        self.cache.borrow().is_some()
    }
}

// =============================================================================
// Node Capabilities
// =============================================================================

/// A producer of `(value, key)` entries.
pub(crate) trait KeyedCore<K, V> {
    /// Length and cache bookkeeping for this node.
    fn meta(&self) -> &Meta<K, V>;

    /// Traverses without consulting the cache.
    ///
    /// Returns the number of visits that answered [`Step::Continue`].
    fn iterate_raw(&self, visitor: &mut KeyedVisitor<'_, K, V>, reverse: bool) -> usize;

    /// Producers that already hold their entries never self-cache.
    fn is_materialized(&self) -> bool {
        false
    }

    /// A reversal node exposes its parent so that reversing a reversal
    /// returns the original node instead of wrapping twice.
    fn unreversed(&self) -> Option<std::rc::Rc<dyn KeyedCore<K, V>>> {
        None
    }
}

/// A producer of `(value, index)` entries over a dense integer index space.
pub(crate) trait IndexedCore<V> {
    /// Length and cache bookkeeping for this node.
    fn meta(&self) -> &Meta<usize, V>;

    /// Traverses without consulting the cache.
    ///
    /// `flip` mirrors reported indices from the far end: a renumbering
    /// producer reports the visit position when `flip` is `false` and
    /// `length - 1 - position` when `flip` is `true` (which preserves
    /// original indices under a reversed traversal). Returns the number of
    /// visits that answered [`Step::Continue`].
    fn iterate_raw(&self, visitor: &mut IndexedVisitor<'_, V>, reverse: bool, flip: bool)
    -> usize;

    /// Whether indices reported by this node run against visit order.
    ///
    /// The effective direction of index numbering is the XOR of these flags
    /// accumulated along the chain; composition is idempotent by XOR, never
    /// by counting.
    fn reversed_indices(&self) -> bool {
        false
    }

    /// Producers that already hold their entries never self-cache.
    fn is_materialized(&self) -> bool {
        false
    }

    /// A reversal node with a matching `maintain_indices` flag exposes its
    /// parent so double reversal is the identity.
    fn unreversed(&self, maintain_indices: bool) -> Option<std::rc::Rc<dyn IndexedCore<V>>> {
        let _ = maintain_indices;
        None
    }
}

// =============================================================================
// Cache-Aware Traversal Drivers
// =============================================================================

/// Traverses a keyed node, replaying from its cache when one is populated.
pub(crate) fn iterate_keyed<K, V>(
    node: &dyn KeyedCore<K, V>,
    visitor: &mut KeyedVisitor<'_, K, V>,
    reverse: bool,
) -> usize {
    let cache = node.meta().cache.borrow();
    if let Some(entries) = cache.as_ref() {
        let mut visited = 0;
        if reverse {
            for (key, value) in entries.iter().rev() {
                if visitor(value, key).is_stop() {
                    return visited;
                }
                visited += 1;
            }
        } else {
            for (key, value) in entries.iter() {
                if visitor(value, key).is_stop() {
                    return visited;
                }
                visited += 1;
            }
        }
        return visited;
    }
    drop(cache);
    node.iterate_raw(visitor, reverse)
}

/// Traverses an indexed node, replaying from its cache when one is populated.
///
/// Cached entries remember the index reported when the cache was populated
/// (a forward, unflipped traversal); replay re-derives the reported index
/// from the requested direction and flip state.
pub(crate) fn iterate_indexed<V>(
    node: &dyn IndexedCore<V>,
    visitor: &mut IndexedVisitor<'_, V>,
    reverse: bool,
    flip: bool,
) -> usize {
    let cache = node.meta().cache.borrow();
    if let Some(entries) = cache.as_ref() {
        let last = node
            .meta()
            .length()
            .unwrap_or(entries.len())
            .saturating_sub(1);
        let mut visited = 0;
        if reverse {
            for (index, value) in entries.iter().rev() {
                let reported = if flip { *index } else { last.saturating_sub(*index) };
                if visitor(value, reported).is_stop() {
                    return visited;
                }
                visited += 1;
            }
        } else {
            for (index, value) in entries.iter() {
                let reported = if flip { last.saturating_sub(*index) } else { *index };
                if visitor(value, reported).is_stop() {
                    return visited;
                }
                visited += 1;
            }
        }
        return visited;
    }
    drop(cache);
    node.iterate_raw(visitor, reverse, flip)
}

/// Materializes a keyed node into its cache. No-op when already cached or
/// when the producer holds its entries directly.
///
/// An unknown length becomes known as the materialized count.
pub(crate) fn cache_keyed<K: Clone, V: Clone>(node: &dyn KeyedCore<K, V>) {
    if node.is_materialized() || node.meta().is_cached() {
        return;
    }
    let mut entries = Vec::new();
    let count = node.iterate_raw(
        &mut |value, key| {
            entries.push((key.clone(), value.clone()));
            Step::Continue
        },
        false,
    );
    let meta = node.meta();
    if meta.length().is_none() {
        meta.length.set(Some(count));
    }
    *meta.cache.borrow_mut() = Some(entries);
}

/// Materializes an indexed node into its cache. See [`cache_keyed`].
pub(crate) fn cache_indexed<V: Clone>(node: &dyn IndexedCore<V>) {
    if node.is_materialized() || node.meta().is_cached() {
        return;
    }
    let mut entries = Vec::new();
    let count = node.iterate_raw(
        &mut |value, index| {
            entries.push((index, value.clone()));
            Step::Continue
        },
        false,
        false,
    );
    let meta = node.meta();
    if meta.length().is_none() {
        meta.length.set(Some(count));
    }
    *meta.cache.borrow_mut() = Some(entries);
}

// =============================================================================
// Index Resolution
// =============================================================================

/// Resolves a possibly negative begin offset against an optional length.
///
/// Returns `None` when the offset is negative and the length is unknown:
/// the caller must materialize first. Non-negative offsets clamp to the
/// length when it is known.
pub(crate) fn resolve_begin(begin: isize, length: Option<usize>) -> Option<usize> {
    if begin < 0 {
        length.map(|len| len.saturating_sub(begin.unsigned_abs()))
    } else {
        let begin = begin.unsigned_abs();
        Some(length.map_or(begin, |len| len.min(begin)))
    }
}

/// Resolves a possibly negative or absent end offset against an optional
/// length.
///
/// An absent end means "to the end": it resolves to the length when known
/// and stays indeterminate (`None`) otherwise. Negative offsets against an
/// unknown length are indeterminate.
pub(crate) fn resolve_end(end: Option<isize>, length: Option<usize>) -> Option<usize> {
    match end {
        None => length,
        Some(end) if end < 0 => length.map(|len| len.saturating_sub(end.unsigned_abs())),
        Some(end) => {
            let end = end.unsigned_abs();
            Some(length.map_or(end, |len| len.min(end)))
        }
    }
}

/// Whether a requested window covers the whole sequence, making a slice a
/// no-op that should return the sequence unchanged.
pub(crate) fn whole_slice(begin: isize, end: Option<isize>, length: Option<usize>) -> bool {
    let begin_whole = begin == 0
        || length.is_some_and(|len| isize::try_from(len).is_ok_and(|len| begin <= -len));
    let end_whole = match end {
        None => true,
        Some(end) => {
            length.is_some_and(|len| isize::try_from(len).is_ok_and(|len| end >= len))
        }
    };
    begin_whole && end_whole
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, Some(5), Some(0))]
    #[case(3, Some(5), Some(3))]
    #[case(7, Some(5), Some(5))]
    #[case(-2, Some(5), Some(3))]
    #[case(-9, Some(5), Some(0))]
    #[case(3, None, Some(3))]
    #[case(-2, None, None)]
    fn test_resolve_begin(
        #[case] begin: isize,
        #[case] length: Option<usize>,
        #[case] expected: Option<usize>,
    ) {
        assert_eq!(resolve_begin(begin, length), expected);
    }

    #[rstest]
    #[case(None, Some(5), Some(5))]
    #[case(Some(3), Some(5), Some(3))]
    #[case(Some(9), Some(5), Some(5))]
    #[case(Some(-1), Some(5), Some(4))]
    #[case(Some(-9), Some(5), Some(0))]
    #[case(None, None, None)]
    #[case(Some(4), None, Some(4))]
    #[case(Some(-1), None, None)]
    fn test_resolve_end(
        #[case] end: Option<isize>,
        #[case] length: Option<usize>,
        #[case] expected: Option<usize>,
    ) {
        assert_eq!(resolve_end(end, length), expected);
    }

    #[rstest]
    fn test_whole_slice_detection() {
        assert!(whole_slice(0, None, None));
        assert!(whole_slice(0, Some(5), Some(5)));
        assert!(whole_slice(-5, None, Some(5)));
        assert!(!whole_slice(1, None, Some(5)));
        assert!(!whole_slice(0, Some(4), Some(5)));
        assert!(!whole_slice(-4, None, Some(5)));
        assert!(!whole_slice(0, Some(4), None));
    }
}
