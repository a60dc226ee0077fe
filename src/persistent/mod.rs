//! Persistent (immutable) data structures.
//!
//! This module provides immutable containers that use structural sharing
//! to make incremental "mutation" cheap: every update returns a new
//! version that shares unchanged substructure with the old one.
//!
//! - [`PersistentHashMap`]: persistent hash map (HAMT), the associative
//!   store the set delegates to.
//! - [`PersistentHashSet`]: persistent hash set over the map.
//! - [`PersistentVector`]: persistent vector (32-way branching trie), the
//!   materialization target for sequence conversions.
//!
//! # Transient mutation
//!
//! The map and the set each pair with a transient counterpart
//! ([`TransientHashMap`], [`TransientHashSet`]) for batching many edits
//! into one logical copy. A transient is obtained from a persistent value
//! in O(1), mutated in place through `&mut self`, and frozen back with a
//! consuming `persistent()` call, after which the handle is gone and the
//! persistent contract holds again.
//!
//! # Structural Sharing
//!
//! ```rust
//! use lazers::persistent::PersistentHashSet;
//!
//! let set = PersistentHashSet::new().insert(1).insert(2);
//! let extended = set.insert(3);
//! assert_eq!(set.len(), 2);      // Original unchanged
//! assert_eq!(extended.len(), 3); // New version
//! ```

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`, which is
/// thread-safe but has slightly higher overhead.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

mod hashmap;
mod hashset;
mod vector;

pub use hashmap::PersistentHashMap;
pub use hashmap::PersistentHashMapIntoIterator;
pub use hashmap::PersistentHashMapIterator;
pub use hashmap::TransientHashMap;
pub use hashset::PersistentHashSet;
pub use hashset::PersistentHashSetIntoIterator;
pub use hashset::PersistentHashSetIterator;
pub use hashset::TransientHashSet;
pub use vector::PersistentVector;
pub use vector::PersistentVectorIntoIterator;
pub use vector::PersistentVectorIterator;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod reference_counter_tests {
    use super::ReferenceCounter;
    use rstest::rstest;

    #[rstest]
    fn test_reference_counter_shares_and_releases() {
        let counter: ReferenceCounter<i32> = ReferenceCounter::new(42);
        assert_eq!(ReferenceCounter::strong_count(&counter), 1);
        let alias = ReferenceCounter::clone(&counter);
        assert_eq!(*alias, 42);
        assert_eq!(ReferenceCounter::strong_count(&counter), 2);
        drop(alias);
        assert_eq!(ReferenceCounter::strong_count(&counter), 1);
    }
}
