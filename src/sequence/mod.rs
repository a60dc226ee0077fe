//! Lazy sequence framework.
//!
//! This module provides composable pipelines of transformation nodes over
//! an abstract iteration protocol:
//!
//! - [`KeyedSequence`]: lazy sequences of `(key, value)` entries with the
//!   general-purpose combinators (map, filter, reduce, find, concat,
//!   take/skip families, equality, caching).
//! - [`IndexedSequence`]: sequences over a dense integer index space,
//!   adding index-aware operations (reverse, slice, index search) and the
//!   index-flipping bookkeeping that makes virtual reversal correct without
//!   eager materialization.
//! - [`Step`]: the continuation signal visitors use to stop a traversal.
//!
//! # Laziness
//!
//! Building a pipeline performs no traversal:
//!
//! ```rust
//! use lazers::sequence::IndexedSequence;
//!
//! let pipeline = IndexedSequence::from_values([1, 2, 3, 4, 5])
//!     .filter(|value, _| value % 2 == 0, false)
//!     .map(|value, _| value * 10);
//!
//! // One traversal, triggered by the terminal consumer:
//! assert_eq!(pipeline.to_vec(), vec![20, 40]);
//! ```
//!
//! # Caching
//!
//! A traversal can be materialized exactly once with `cache_result`;
//! further consumption replays the cache instead of re-running upstream
//! closures:
//!
//! ```rust
//! use lazers::sequence::IndexedSequence;
//!
//! let expensive = IndexedSequence::from_values([1, 2, 3])
//!     .map(|value, _| value * value)
//!     .cache_result();
//!
//! assert_eq!(expensive.to_vec(), vec![1, 4, 9]);
//! assert_eq!(expensive.reverse(false).to_vec(), vec![9, 4, 1]);
//! ```
//!
//! This module is single-threaded by design: nodes memoize through
//! interior mutability and handles are reference-counted with `Rc`.

pub(crate) mod iterate;

mod indexed;
mod keyed;

pub use indexed::IndexedSequence;
pub use iterate::Step;
pub use keyed::KeyedSequence;
