//! Duplicate-aware stable sort.
//!
//! Sorting builds a multiset of distinct values with their occurrence counts
//! in one pass, then repeatedly scans it for the extremal value, yields that
//! value as many times as it occurred, and removes it. The cost is
//! O(distinct²) comparisons instead of O(n log n), which pays off when
//! duplicates dominate. Comparators never see element indices, since an index
//! means nothing once duplicates are merged.

use crate::error::Result;
use crate::hint::LenHint;
use crate::seq::Sequence;
use ahash::AHashMap as HashMap;
use std::cmp::Ordering;
use std::hash::Hash;
use std::rc::Rc;
use tracing::trace;

/// A total order over `T`.
pub trait Compare<T> {
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

impl<T, F> Compare<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

/// The natural order of `T: Ord`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Natural;

impl<T: Ord> Compare<T> for Natural {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

/// Orders by a derived key.
#[derive(Debug, Clone, Copy)]
pub struct ByKey<F>(pub F);

impl<T, K: Ord, F: Fn(&T) -> K> Compare<T> for ByKey<F> {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.0)(a).cmp(&(self.0)(b))
    }
}

/// The inverse of another order.
#[derive(Debug, Clone, Copy)]
pub struct Reversed<C>(pub C);

impl<T, C: Compare<T>> Compare<T> for Reversed<C> {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self.0.compare(b, a)
    }
}

/// `primary`, with ties broken by `secondary`.
pub struct ThenBy<A, B> {
    primary: Rc<A>,
    secondary: Rc<B>,
}

impl<T, A: Compare<T>, B: Compare<T>> Compare<T> for ThenBy<A, B> {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self.primary
            .compare(a, b)
            .then_with(|| self.secondary.compare(a, b))
    }
}

/// A sorted view of an upstream sequence.
///
/// Chaining more orderings onto a `Sort` composes comparators and still sorts
/// the original upstream once; the intermediate order is never materialized.
/// [`then_by`](Sort::then_by) adds a tie-breaker, while calling
/// [`sort_by`](Sort::sort_by) again makes the new order primary and keeps the
/// old one as the tie-breaker, matching what a stable re-sort would produce.
pub struct Sort<S, C> {
    source: S,
    comparator: Rc<C>,
}

impl<S, C> Sort<S, C> {
    pub(crate) fn new(source: S, comparator: C) -> Self {
        Self {
            source,
            comparator: Rc::new(comparator),
        }
    }

    fn compose<A, B>(source: S, primary: Rc<A>, secondary: Rc<B>) -> Sort<S, ThenBy<A, B>> {
        Sort {
            source,
            comparator: Rc::new(ThenBy { primary, secondary }),
        }
    }

    /// Breaks ties of the current order with `next`.
    pub fn then_by<D>(self, next: D) -> Sort<S, ThenBy<C, D>> {
        Self::compose(self.source, self.comparator, Rc::new(next))
    }

    pub fn then_by_key<F>(self, key: F) -> Sort<S, ThenBy<C, ByKey<F>>> {
        self.then_by(ByKey(key))
    }

    pub fn then_by_descending<D>(self, next: D) -> Sort<S, ThenBy<C, Reversed<D>>> {
        self.then_by(Reversed(next))
    }

    /// Re-sorts by `order`, keeping the current order for ties.
    pub fn sort_by<D>(self, order: D) -> Sort<S, ThenBy<D, C>> {
        Self::compose(self.source, Rc::new(order), self.comparator)
    }

    pub fn sort_by_key<F>(self, key: F) -> Sort<S, ThenBy<ByKey<F>, C>> {
        self.sort_by(ByKey(key))
    }

    pub fn sort_by_descending<D>(self, order: D) -> Sort<S, ThenBy<Reversed<D>, C>> {
        self.sort_by(Reversed(order))
    }

    /// Re-sorts by the natural order of the elements.
    pub fn sort(self) -> Sort<S, ThenBy<Natural, C>> {
        self.sort_by(Natural)
    }

    pub fn sort_descending(self) -> Sort<S, ThenBy<Reversed<Natural>, C>> {
        self.sort_by(Reversed(Natural))
    }

    /// Returns the unsorted upstream.
    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: Clone, C> Clone for Sort<S, C> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            comparator: Rc::clone(&self.comparator),
        }
    }
}

impl<S, C> Sequence for Sort<S, C>
where
    S: Sequence,
    S::Item: Hash + Eq + Clone,
    C: Compare<S::Item>,
{
    type Item = S::Item;
    type Iter = SortIter<S::Iter, C>;

    fn traverse(&self) -> Result<Self::Iter> {
        Ok(SortIter {
            pending: Some(self.source.traverse()?),
            multiset: Vec::new(),
            current: None,
            comparator: Rc::clone(&self.comparator),
        })
    }

    fn len_hint(&self) -> LenHint {
        self.source.len_hint()
    }
}

pub struct SortIter<I: Iterator, C> {
    pending: Option<I>,
    /// Distinct values with occurrence counts, in first-seen order.
    multiset: Vec<(I::Item, usize)>,
    /// The value being emitted and how many copies remain.
    current: Option<(I::Item, usize)>,
    comparator: Rc<C>,
}

impl<I, C> SortIter<I, C>
where
    I: Iterator,
    I::Item: Hash + Eq + Clone,
    C: Compare<I::Item>,
{
    fn build_multiset(source: I) -> Vec<(I::Item, usize)> {
        let mut index: HashMap<I::Item, usize> = HashMap::default();
        let mut multiset: Vec<(I::Item, usize)> = Vec::new();
        for value in source {
            match index.get(&value) {
                Some(&slot) => multiset[slot].1 += 1,
                None => {
                    index.insert(value.clone(), multiset.len());
                    multiset.push((value, 1));
                }
            }
        }
        trace!(distinct = multiset.len(), "built sort multiset");
        multiset
    }

    /// Position of the extremal value; the first seen wins among ties.
    fn extremal(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (slot, (value, _)) in self.multiset.iter().enumerate() {
            best = match best {
                Some(b) if self.comparator.compare(value, &self.multiset[b].0) != Ordering::Less => {
                    Some(b)
                }
                _ => Some(slot),
            };
        }
        best
    }
}

impl<I, C> Iterator for SortIter<I, C>
where
    I: Iterator,
    I::Item: Hash + Eq + Clone,
    C: Compare<I::Item>,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        if let Some(source) = self.pending.take() {
            self.multiset = Self::build_multiset(source);
        }

        if let Some((value, remaining)) = self.current.as_mut() {
            if *remaining > 0 {
                *remaining -= 1;
                return Some(value.clone());
            }
        }

        let slot = self.extremal()?;
        let (value, count) = self.multiset.remove(slot);
        self.current = Some((value.clone(), count - 1));
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::from;
    use crate::SequenceExt;

    #[test]
    fn test_sort_natural() {
        let sorted = from(vec![7, 4, 3, 2, 5, 6, 1]).sort();
        assert_eq!(sorted.to_vec().unwrap(), vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(sorted.len_hint(), LenHint::Known(7));
    }

    #[test]
    fn test_sort_descending() {
        let sorted = from(vec![2, 9, 2, 4]).sort_descending();
        assert_eq!(sorted.to_vec().unwrap(), vec![9, 4, 2, 2]);
    }

    #[test]
    fn test_duplicates_contiguous() {
        let sorted = from(vec![3, 1, 3, 2, 1, 3]).sort().to_vec().unwrap();
        assert_eq!(sorted, vec![1, 1, 2, 3, 3, 3]);
    }

    #[test]
    fn test_stable_among_ties() {
        // Distinct values that compare equal keep first-seen order.
        let words = from(vec!["bb", "a", "cc", "d", "aa"]);
        let sorted = words.sort_by_key(|s: &&str| s.len()).to_vec().unwrap();
        assert_eq!(sorted, vec!["a", "d", "bb", "cc", "aa"]);
    }

    #[test]
    fn test_then_by() {
        let words = from(vec!["bb", "a", "cc", "d", "aa"]);
        let sorted = words
            .sort_by_key(|s: &&str| s.len())
            .then_by(|a: &&str, b: &&str| a.cmp(b))
            .to_vec()
            .unwrap();
        assert_eq!(sorted, vec!["a", "d", "aa", "bb", "cc"]);
    }

    #[test]
    fn test_then_by_descending() {
        let pairs = from(vec![(1, 'a'), (0, 'b'), (1, 'c')]);
        let sorted = pairs
            .sort_by_key(|p: &(i32, char)| p.0)
            .then_by_descending(|a: &(i32, char), b: &(i32, char)| a.1.cmp(&b.1))
            .to_vec()
            .unwrap();
        assert_eq!(sorted, vec![(0, 'b'), (1, 'c'), (1, 'a')]);
    }

    #[test]
    fn test_sort_of_sort_composes() {
        use std::cell::Cell;
        let pulls = Cell::new(0);
        let source = from(vec![(2, 'x'), (1, 'y'), (2, 'a'), (1, 'b')])
            .inspect(|_| pulls.set(pulls.get() + 1));

        // Re-sorting by letter keeps the number order for ties; the source is
        // read once per traversal, not once per sort stage.
        let sorted = source
            .sort_by_key(|p: &(i32, char)| p.1 > 'm')
            .sort_by_key(|p: &(i32, char)| p.0)
            .to_vec()
            .unwrap();
        assert_eq!(sorted, vec![(1, 'b'), (1, 'y'), (2, 'a'), (2, 'x')]);
        assert_eq!(pulls.get(), 4);
    }

    #[test]
    fn test_natural_resort_composes() {
        let resorted = from(vec![3, 1, 2]).sort_by_key(|x: &i32| -x).sort();
        // Still a single sort over the original upstream.
        assert_eq!(resorted.source().as_slice(), &[3, 1, 2]);
        assert_eq!(resorted.to_vec().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_descending_resorts_compose() {
        let pairs = from(vec![(1, 'b'), (2, 'a'), (1, 'a')]);

        let natural = (&pairs)
            .sort_by_key(|p: &(i32, char)| p.1)
            .sort_descending();
        assert_eq!(natural.source().len(), 3);
        assert_eq!(
            natural.to_vec().unwrap(),
            vec![(2, 'a'), (1, 'b'), (1, 'a')]
        );

        let by_number = (&pairs)
            .sort_by_key(|p: &(i32, char)| p.1)
            .sort_by_descending(|a: &(i32, char), b: &(i32, char)| a.0.cmp(&b.0));
        assert_eq!(by_number.source().len(), 3);
        assert_eq!(
            by_number.to_vec().unwrap(),
            vec![(2, 'a'), (1, 'a'), (1, 'b')]
        );
    }

    #[test]
    fn test_sort_empty() {
        assert!(from(Vec::<i32>::new()).sort().to_vec().unwrap().is_empty());
    }

    #[test]
    fn test_sort_retraversable() {
        let sorted = from(vec![3, 1, 2]).sort();
        assert_eq!(sorted.to_vec().unwrap(), sorted.to_vec().unwrap());
    }
}
