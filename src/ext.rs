//! Combinators and terminal operations derived from [`Sequence::traverse`].

use crate::adapters::{Concat, Enumerate, Filter, FilterMap, Inspect, Map};
use crate::cache::Cache;
use crate::checked::{AssertCount, InsertAt, RemoveAt};
use crate::error::{Result, SeqError};
use crate::group::GroupBy;
use crate::hint::LenHint;
use crate::keyed::StoreByKey;
use crate::pairwise::{JoinMode, Join, Zip};
use crate::recursive::{Flatten, Nested, TraverseTree, WalkOrder};
use crate::seq::Sequence;
use crate::sort::{ByKey, Natural, Reversed, Sort};
use crate::source::Rewrap;
use crate::window::{Skip, SkipWhile, Take, TakeOptions, TakeWhile};
use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use std::cmp::Ordering;
use std::fmt::{Debug, Display, Write};
use std::hash::Hash;

/// Whether set and map conversions accept repeated keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DuplicatePolicy {
    /// Keep going; sets keep one copy, maps keep the last value.
    #[default]
    Allow,
    /// Fail with [`SeqError::Duplicate`] on the first repeated key.
    Reject,
}

type PairFilter<L, R> = fn(&L, &R) -> bool;
type SiblingFilter<T> = fn(&T, usize) -> bool;

/// Extension methods available on every [`Sequence`].
///
/// Combinators take `self` and return a new lazy node; pass `&seq` to keep
/// using the upstream. Terminal operations start a traversal and consume it
/// until they have their answer.
///
/// ```
/// use lazyseq_rs::{from, JoinMode, SequenceExt};
///
/// let scores = from(vec![("ann", 7), ("bob", 4), ("ann", 3)]);
/// let totals: Vec<(&str, i32)> = (&scores)
///     .group_by(|(name, _)| *name)
///     .map(|g| (*g.key(), g.items().iter().map(|(_, s)| s).sum::<i32>()))
///     .to_vec()
///     .unwrap();
/// assert_eq!(totals, vec![("ann", 10), ("bob", 4)]);
///
/// let zipped = from(vec![1, 2, 3])
///     .zip(from(vec![10, 20]), JoinMode::Left, |a, b| a.unwrap_or(0) + b.unwrap_or(0))
///     .to_vec()
///     .unwrap();
/// assert_eq!(zipped, vec![11, 22, 3]);
/// ```
pub trait SequenceExt: Sequence + Sized {
    // --- element-wise ---

    fn map<F, U>(self, f: F) -> Map<Self, F>
    where
        F: Fn(Self::Item) -> U,
    {
        Map::new(self, f)
    }

    fn filter<P>(self, predicate: P) -> Filter<Self, P>
    where
        P: Fn(&Self::Item) -> bool,
    {
        Filter::new(self, predicate)
    }

    fn filter_map<F, U>(self, f: F) -> FilterMap<Self, F>
    where
        F: Fn(Self::Item) -> Option<U>,
    {
        FilterMap::new(self, f)
    }

    fn enumerate(self) -> Enumerate<Self> {
        Enumerate::new(self)
    }

    fn concat<O>(self, other: O) -> Concat<Self, O>
    where
        O: Sequence<Item = Self::Item>,
    {
        Concat::new(self, other)
    }

    fn inspect<F>(self, f: F) -> Inspect<Self, F>
    where
        F: Fn(&Self::Item),
    {
        Inspect::new(self, f)
    }

    /// Forces a fresh wrapper node around this sequence.
    fn rewrap(self) -> Rewrap<Self> {
        Rewrap::new(self)
    }

    // --- windows ---

    /// Skips the first `n` elements; a negative `n` drops the last `|n|`.
    fn skip(self, n: isize) -> Skip<Self>
    where
        Self::Item: Clone,
    {
        Skip::new(self, n)
    }

    /// Takes the first `n` elements; a negative `n` takes the last `|n|`.
    fn take(self, n: isize) -> Take<Self>
    where
        Self::Item: Clone,
    {
        Take::new(self, n, TakeOptions::default())
    }

    fn take_with(self, n: isize, options: TakeOptions<Self::Item>) -> Take<Self>
    where
        Self::Item: Clone,
    {
        Take::new(self, n, options)
    }

    /// Takes while `predicate(element, index, taken_so_far)` holds.
    fn take_while<P>(self, predicate: P) -> TakeWhile<Self, P>
    where
        Self::Item: Clone,
        P: Fn(&Self::Item, usize, &[Self::Item]) -> bool,
    {
        TakeWhile::new(self, predicate)
    }

    /// Skips while `predicate(element, index, skipped_so_far)` holds.
    fn skip_while<P>(self, predicate: P) -> SkipWhile<Self, P>
    where
        Self::Item: Clone,
        P: Fn(&Self::Item, usize, &[Self::Item]) -> bool,
    {
        SkipWhile::new(self, predicate)
    }

    // --- pairwise ---

    /// Combines elements pairwise in lockstep; `f` receives `None` for a side
    /// that has run out, as allowed by `mode`.
    fn zip<O, F, U>(self, other: O, mode: JoinMode, f: F) -> Zip<Self, O, F>
    where
        O: Sequence,
        F: Fn(Option<Self::Item>, Option<O::Item>) -> U,
    {
        Zip::new(self, other, mode, f)
    }

    /// Cartesian join emitting the pairs accepted by `filter`, then the
    /// unmatched elements the `mode` keeps.
    fn join<O, P, F, U>(self, other: O, mode: JoinMode, filter: P, f: F) -> Join<Self, O, P, F>
    where
        O: Sequence,
        Self::Item: Clone,
        O::Item: Clone,
        P: Fn(&Self::Item, &O::Item) -> bool,
        F: Fn(Option<Self::Item>, Option<O::Item>) -> U,
    {
        Join::new(self, other, mode, Some(filter), f)
    }

    /// Cartesian join emitting every pair.
    fn cross_join<O, F, U>(
        self,
        other: O,
        mode: JoinMode,
        f: F,
    ) -> Join<Self, O, PairFilter<Self::Item, O::Item>, F>
    where
        O: Sequence,
        Self::Item: Clone,
        O::Item: Clone,
        F: Fn(Option<Self::Item>, Option<O::Item>) -> U,
    {
        Join::new(self, other, mode, None, f)
    }

    // --- grouping and ordering ---

    fn group_by<KF, K>(self, key: KF) -> GroupBy<Self, KF, fn(Self::Item) -> Self::Item>
    where
        KF: Fn(&Self::Item) -> K,
        K: Hash + Eq + Clone,
    {
        GroupBy::new(
            self,
            key,
            std::convert::identity as fn(Self::Item) -> Self::Item,
        )
    }

    /// Groups by `key`, storing `value(element)` in each bucket.
    fn group_by_map<KF, K, VF, V>(self, key: KF, value: VF) -> GroupBy<Self, KF, VF>
    where
        KF: Fn(&Self::Item) -> K,
        VF: Fn(Self::Item) -> V,
        K: Hash + Eq + Clone,
    {
        GroupBy::new(self, key, value)
    }

    fn sort(self) -> Sort<Self, Natural>
    where
        Self::Item: Ord + Hash + Clone,
    {
        Sort::new(self, Natural)
    }

    fn sort_descending(self) -> Sort<Self, Reversed<Natural>>
    where
        Self::Item: Ord + Hash + Clone,
    {
        Sort::new(self, Reversed(Natural))
    }

    fn sort_by<C>(self, comparator: C) -> Sort<Self, C>
    where
        C: Fn(&Self::Item, &Self::Item) -> Ordering,
    {
        Sort::new(self, comparator)
    }

    fn sort_by_descending<C>(self, comparator: C) -> Sort<Self, Reversed<C>>
    where
        C: Fn(&Self::Item, &Self::Item) -> Ordering,
    {
        Sort::new(self, Reversed(comparator))
    }

    fn sort_by_key<F, K>(self, key: F) -> Sort<Self, ByKey<F>>
    where
        F: Fn(&Self::Item) -> K,
        K: Ord,
    {
        Sort::new(self, ByKey(key))
    }

    // --- caching ---

    /// Memoizes one pass over this sequence for any number of readers.
    fn cache(self) -> Cache<Self> {
        Cache::new(self)
    }

    /// Memoizes one pass, split into lazily filled per-key sequences.
    fn store_by_key<KF, K>(self, key: KF) -> StoreByKey<Self, K, KF>
    where
        KF: Fn(&Self::Item) -> K,
        K: Hash + Eq + Clone,
    {
        StoreByKey::new(self, key)
    }

    // --- recursive ---

    fn flatten(self) -> Flatten<Self>
    where
        Self::Item: Nested,
    {
        Flatten::new(self)
    }

    fn traverse_tree<CF, C>(
        self,
        children_of: CF,
        order: WalkOrder,
    ) -> TraverseTree<Self, CF, SiblingFilter<Self::Item>>
    where
        CF: Fn(&Self::Item) -> C,
        C: IntoIterator<Item = Self::Item>,
    {
        TraverseTree::new(self, children_of, None, order)
    }

    fn traverse_tree_filtered<CF, C, FF>(
        self,
        children_of: CF,
        filter: FF,
        order: WalkOrder,
    ) -> TraverseTree<Self, CF, FF>
    where
        CF: Fn(&Self::Item) -> C,
        C: IntoIterator<Item = Self::Item>,
        FF: Fn(&Self::Item, usize) -> bool,
    {
        TraverseTree::new(self, children_of, Some(filter), order)
    }

    // --- checked ---

    fn assert_count(self, expected: usize) -> AssertCount<Self> {
        AssertCount::new(self, expected)
    }

    fn insert_at<O>(self, index: usize, other: O) -> InsertAt<Self, O>
    where
        O: Sequence<Item = Self::Item>,
    {
        InsertAt::new(self, index, other)
    }

    fn remove_at(self, index: usize, count: usize) -> RemoveAt<Self> {
        RemoveAt::new(self, index, count)
    }

    // --- terminal ---

    fn to_vec(&self) -> Result<Vec<Self::Item>> {
        Ok(self.traverse()?.collect())
    }

    /// Number of elements. Uses a known length hint without traversing.
    fn count(&self) -> Result<usize> {
        match self.len_hint() {
            LenHint::Known(n) => Ok(n),
            LenHint::Unknown => Ok(self.traverse()?.count()),
        }
    }

    fn sum<T>(&self) -> Result<T>
    where
        T: std::iter::Sum<Self::Item>,
    {
        Ok(self.traverse()?.sum())
    }

    fn min(&self) -> Result<Option<Self::Item>>
    where
        Self::Item: Ord,
    {
        Ok(self.traverse()?.min())
    }

    fn max(&self) -> Result<Option<Self::Item>>
    where
        Self::Item: Ord,
    {
        Ok(self.traverse()?.max())
    }

    fn min_by<C>(&self, comparator: C) -> Result<Option<Self::Item>>
    where
        C: Fn(&Self::Item, &Self::Item) -> Ordering,
    {
        Ok(self.traverse()?.min_by(comparator))
    }

    fn max_by<C>(&self, comparator: C) -> Result<Option<Self::Item>>
    where
        C: Fn(&Self::Item, &Self::Item) -> Ordering,
    {
        Ok(self.traverse()?.max_by(comparator))
    }

    fn min_by_key<F, K>(&self, key: F) -> Result<Option<Self::Item>>
    where
        F: Fn(&Self::Item) -> K,
        K: Ord,
    {
        Ok(self.traverse()?.min_by_key(key))
    }

    fn max_by_key<F, K>(&self, key: F) -> Result<Option<Self::Item>>
    where
        F: Fn(&Self::Item) -> K,
        K: Ord,
    {
        Ok(self.traverse()?.max_by_key(key))
    }

    fn first(&self) -> Result<Option<Self::Item>> {
        Ok(self.traverse()?.next())
    }

    fn first_where<P>(&self, predicate: P) -> Result<Option<Self::Item>>
    where
        P: Fn(&Self::Item) -> bool,
    {
        Ok(self.traverse()?.find(|v| predicate(v)))
    }

    fn last(&self) -> Result<Option<Self::Item>> {
        Ok(self.traverse()?.last())
    }

    fn last_where<P>(&self, predicate: P) -> Result<Option<Self::Item>>
    where
        P: Fn(&Self::Item) -> bool,
    {
        Ok(self.traverse()?.filter(|v| predicate(v)).last())
    }

    /// The single element, or [`SeqError::Cardinality`].
    ///
    /// Stops reading at the second element, so `actual` is then 2.
    fn single(&self) -> Result<Self::Item> {
        let mut iter = self.traverse()?;
        match (iter.next(), iter.next()) {
            (Some(value), None) => Ok(value),
            (None, _) => Err(SeqError::Cardinality {
                expected: 1,
                actual: 0,
            }),
            (Some(_), Some(_)) => Err(SeqError::Cardinality {
                expected: 1,
                actual: 2,
            }),
        }
    }

    fn any<P>(&self, predicate: P) -> Result<bool>
    where
        P: Fn(&Self::Item) -> bool,
    {
        Ok(self.traverse()?.any(|v| predicate(&v)))
    }

    fn all<P>(&self, predicate: P) -> Result<bool>
    where
        P: Fn(&Self::Item) -> bool,
    {
        Ok(self.traverse()?.all(|v| predicate(&v)))
    }

    fn contains(&self, value: &Self::Item) -> Result<bool>
    where
        Self::Item: PartialEq,
    {
        Ok(self.traverse()?.any(|v| v == *value))
    }

    /// Element at `index`; negative indices count back from the end.
    ///
    /// A non-negative index stops reading at that element. A negative index
    /// has to read the whole sequence to find the end.
    fn at(&self, index: isize) -> Result<Option<Self::Item>> {
        let mut iter = self.traverse()?;
        if index >= 0 {
            return Ok(iter.nth(index.unsigned_abs()));
        }
        let mut all: Vec<Self::Item> = iter.collect();
        let back = index.unsigned_abs();
        if back > all.len() {
            return Ok(None);
        }
        let position = all.len() - back;
        Ok(Some(all.swap_remove(position)))
    }

    /// Left fold from `seed`.
    fn aggregate<A, F>(&self, seed: A, f: F) -> Result<A>
    where
        F: FnMut(A, Self::Item) -> A,
    {
        Ok(self.traverse()?.fold(seed, f))
    }

    /// Left fold seeded with the first element.
    fn reduce<F>(&self, f: F) -> Result<Option<Self::Item>>
    where
        F: FnMut(Self::Item, Self::Item) -> Self::Item,
    {
        Ok(self.traverse()?.reduce(f))
    }

    fn join_to_string(&self, separator: &str) -> Result<String>
    where
        Self::Item: Display,
    {
        let mut out = String::new();
        for (i, value) in self.traverse()?.enumerate() {
            if i > 0 {
                out.push_str(separator);
            }
            // Writing to a String cannot fail.
            let _ = write!(out, "{value}");
        }
        Ok(out)
    }

    fn to_set(&self, policy: DuplicatePolicy) -> Result<HashSet<Self::Item>>
    where
        Self::Item: Hash + Eq + Debug,
    {
        let mut set = HashSet::default();
        for value in self.traverse()? {
            if policy == DuplicatePolicy::Reject && set.contains(&value) {
                return Err(SeqError::Duplicate {
                    key: format!("{value:?}"),
                });
            }
            set.insert(value);
        }
        Ok(set)
    }

    fn to_map<KF, K, VF, V>(
        &self,
        key: KF,
        value: VF,
        policy: DuplicatePolicy,
    ) -> Result<HashMap<K, V>>
    where
        KF: Fn(&Self::Item) -> K,
        VF: Fn(Self::Item) -> V,
        K: Hash + Eq + Debug,
    {
        let mut map = HashMap::default();
        for item in self.traverse()? {
            let k = key(&item);
            if policy == DuplicatePolicy::Reject && map.contains_key(&k) {
                return Err(SeqError::Duplicate {
                    key: format!("{k:?}"),
                });
            }
            map.insert(k, value(item));
        }
        Ok(map)
    }
}

impl<S: Sequence> SequenceExt for S {}
