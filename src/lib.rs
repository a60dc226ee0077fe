//! # lazers
//!
//! Lazy sequences and persistent collections for Rust.
//!
//! ## Overview
//!
//! This library provides two tightly coupled subsystems:
//!
//! - **Lazy Sequences**: composable pipelines of transformation nodes
//!   (map, filter, slice, concat, reverse, take/skip variants) over an
//!   abstract iteration protocol. Building a pipeline performs no work;
//!   a terminal consumer triggers exactly one traversal, and results can
//!   be memoized once and replayed.
//! - **Persistent Collections**: immutable-by-default containers
//!   (`HashMap`, `HashSet`, `Vector`) with structural sharing, plus opt-in
//!   transient counterparts that batch many edits in place and freeze back
//!   into persistent values.
//!
//! ## Feature Flags
//!
//! - `arc`: share structure through `Arc` instead of `Rc`
//!
//! ## Example
//!
//! ```rust
//! use lazers::prelude::*;
//!
//! let evens = IndexedSequence::from_values([1, 2, 3, 4, 5])
//!     .filter(|value, _| value % 2 == 0, false)
//!     .map(|value, _| value * 10);
//! assert_eq!(evens.to_vec(), vec![20, 40]);
//!
//! let set = PersistentHashSet::new().insert(1).insert(2).insert(1);
//! assert_eq!(set.len(), 2);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types.
///
/// # Usage
///
/// ```rust
/// use lazers::prelude::*;
/// ```
pub mod prelude {
    pub use crate::persistent::*;
    pub use crate::sequence::*;
}

pub mod persistent;
pub mod sequence;
