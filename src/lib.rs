//! # Lazyseq - Restartable Lazy Sequences
//!
//! A library of composable, lazily evaluated sequence combinators.
//!
//! A [`Sequence`] is a value that can be traversed any number of times; each
//! call to [`Sequence::traverse`] starts an independent pass over the current
//! contents of its source. Combinators build a graph of nodes over one or
//! more upstream sequences without evaluating anything:
//! 1. **Laziness**: no element is produced until a traversal is advanced, and
//!    a node pulls only as many upstream elements as it needs
//! 2. **Restartability**: every node can be traversed again from the start,
//!    except a run-once source, which reports [`SeqError::Reuse`]
//!
//! Nodes that need to see everything before emitting (grouping, sorting,
//! negative windows) buffer internally and say so in their docs. [`Cache`]
//! memoizes one pass for any number of readers.
//!
//! ## Example
//!
//! ```
//! use lazyseq_rs::{from, range, SequenceExt};
//!
//! let evens = range(1, 10).filter(|x| x % 2 == 0).map(|x| x * 10);
//! assert_eq!(evens.to_vec().unwrap(), vec![20, 40, 60, 80, 100]);
//!
//! // Restartable: a second pass sees the same elements.
//! assert_eq!(evens.count().unwrap(), 5);
//!
//! let words = from(vec!["pear", "fig", "apple", "fig"]);
//! let sorted = (&words).sort().to_vec().unwrap();
//! assert_eq!(sorted, vec!["apple", "fig", "fig", "pear"]);
//! assert_eq!((&words).take(-2).to_vec().unwrap(), vec!["apple", "fig"]);
//! ```
//!
//! ## Evaluation cost
//!
//! - Element-wise nodes are O(1) extra space per traversal
//! - Grouping and sorting hold the whole upstream once the first element is requested
//! - Negative windows over a source of unknown length buffer only `|n|` elements

mod adapters;
mod cache;
mod checked;
mod error;
mod ext;
mod group;
mod hint;
mod keyed;
mod pairwise;
mod recursive;
mod seq;
mod sort;
mod source;
mod window;


pub use adapters::{
    Concat, Enumerate, Filter, FilterIter, FilterMap, FilterMapIter, Inspect, InspectIter, Map,
    MapIter,
};
pub use cache::{Cache, CacheReader};
pub use checked::{AssertCount, AssertCountIter, InsertAt, InsertAtIter, RemoveAt, RemoveAtIter};
pub use error::{RangeOp, Result, SeqError};
pub use ext::{DuplicatePolicy, SequenceExt};
pub use group::{GroupBy, GroupIter, Grouping};
pub use hint::LenHint;
pub use keyed::{KeyedCache, KeyedReader, StoreByKey};
pub use pairwise::{Join, JoinIter, JoinMode, Zip, ZipIter};
pub use recursive::{
    Expansion, Flatten, FlattenIter, Nested, TraverseTree, TraverseTreeIter, Tree, WalkOrder,
};
pub use seq::Sequence;
pub use sort::{ByKey, Compare, Natural, Reversed, Sort, SortIter, ThenBy};
pub use source::{
    empty, from, from_fn, once, range, repeat, Empty, Generate, IntoSequence, Items, ItemsIter,
    Range, Repeat, Rewrap, RunOnce, Span,
};
pub use window::{
    Skip, SkipWhile, SkipWhileIter, Take, TakeOptions, TakeWhile, TakeWhileIter, WindowIter,
};
