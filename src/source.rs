//! Source wrappers binding the [`Sequence`] contract to concrete backing data.
//!
//! - [`Items`] holds a collection and is restartable with a known length.
//! - [`Generate`] calls a zero-argument producer once per traversal.
//! - [`RunOnce`] hands out a bare iterator exactly once.

use crate::error::{Result, SeqError};
use crate::hint::LenHint;
use crate::seq::Sequence;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::marker::PhantomData;
use std::rc::Rc;
use tracing::debug;

/// A restartable sequence backed by shared, immutable storage.
#[derive(Debug)]
pub struct Items<T> {
    items: Rc<[T]>,
}

impl<T> Items<T> {
    pub fn new(items: impl Into<Rc<[T]>>) -> Self {
        Self {
            items: items.into(),
        }
    }

    /// Returns the backing elements.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Clone for Items<T> {
    fn clone(&self) -> Self {
        Self {
            items: Rc::clone(&self.items),
        }
    }
}

impl<T: Clone> Sequence for Items<T> {
    type Item = T;
    type Iter = ItemsIter<T>;

    fn traverse(&self) -> Result<Self::Iter> {
        Ok(ItemsIter {
            items: Rc::clone(&self.items),
            front: 0,
            back: self.items.len(),
        })
    }

    fn len_hint(&self) -> LenHint {
        LenHint::Known(self.items.len())
    }
}

/// Traversal over [`Items`], cloning each element out of shared storage.
#[derive(Debug, Clone)]
pub struct ItemsIter<T> {
    items: Rc<[T]>,
    front: usize,
    back: usize,
}

impl<T: Clone> Iterator for ItemsIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.front >= self.back {
            return None;
        }
        let value = self.items[self.front].clone();
        self.front += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<T> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }
}

impl<T: Clone> DoubleEndedIterator for ItemsIter<T> {
    fn next_back(&mut self) -> Option<T> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.items[self.back].clone())
    }
}

impl<T: Clone> ExactSizeIterator for ItemsIter<T> {}

/// A repeatable traversal factory: the producer is called once per traversal.
#[derive(Clone)]
pub struct Generate<F> {
    producer: F,
}

impl<F, C> Sequence for Generate<F>
where
    F: Fn() -> C,
    C: IntoIterator,
{
    type Item = C::Item;
    type Iter = C::IntoIter;

    fn traverse(&self) -> Result<Self::Iter> {
        Ok((self.producer)().into_iter())
    }
}

/// Wraps a bare iterator so it can be traversed exactly once.
///
/// The second call to [`traverse`](Sequence::traverse) fails with
/// [`SeqError::Reuse`].
pub struct RunOnce<I> {
    iter: RefCell<Option<I>>,
}

impl<I: Iterator> Sequence for RunOnce<I> {
    type Item = I::Item;
    type Iter = I;

    fn traverse(&self) -> Result<I> {
        match self.iter.borrow_mut().take() {
            Some(iter) => Ok(iter),
            None => {
                debug!("rejected second traversal of a run-once sequence");
                Err(SeqError::Reuse)
            }
        }
    }

    fn len_hint(&self) -> LenHint {
        match self.iter.borrow().as_ref() {
            Some(iter) => LenHint::from_size_hint(iter.size_hint()),
            None => LenHint::Unknown,
        }
    }
}

/// A fresh node that forwards to an existing sequence.
#[derive(Debug, Clone)]
pub struct Rewrap<S> {
    inner: S,
}

impl<S> Rewrap<S> {
    pub(crate) fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Sequence> Sequence for Rewrap<S> {
    type Item = S::Item;
    type Iter = S::Iter;

    fn traverse(&self) -> Result<Self::Iter> {
        self.inner.traverse()
    }

    fn len_hint(&self) -> LenHint {
        self.inner.len_hint()
    }
}

/// The sequence with no elements.
pub struct Empty<T> {
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Clone for Empty<T> {
    fn clone(&self) -> Self {
        empty()
    }
}

impl<T> Sequence for Empty<T> {
    type Item = T;
    type Iter = std::iter::Empty<T>;

    fn traverse(&self) -> Result<Self::Iter> {
        Ok(std::iter::empty())
    }

    fn len_hint(&self) -> LenHint {
        LenHint::Known(0)
    }
}

/// A value repeated a fixed number of times.
#[derive(Debug, Clone)]
pub struct Repeat<T> {
    value: T,
    count: usize,
}

impl<T: Clone> Sequence for Repeat<T> {
    type Item = T;
    type Iter = std::iter::Take<std::iter::Repeat<T>>;

    fn traverse(&self) -> Result<Self::Iter> {
        Ok(std::iter::repeat(self.value.clone()).take(self.count))
    }

    fn len_hint(&self) -> LenHint {
        LenHint::Known(self.count)
    }
}

/// `count` consecutive integers starting at `start`.
#[derive(Debug, Clone, Copy)]
pub struct Range {
    start: i64,
    count: usize,
}

impl Sequence for Range {
    type Item = i64;
    type Iter = std::ops::Range<i64>;

    fn traverse(&self) -> Result<Self::Iter> {
        // `range` caps `count` so the end never passes `i64::MAX`.
        Ok(self.start..self.start.saturating_add_unsigned(self.count as u64))
    }

    fn len_hint(&self) -> LenHint {
        LenHint::Known(self.count)
    }
}

/// A standard library range used as a restartable source.
///
/// Each traversal iterates a fresh copy of the range. The hint is the range's
/// exact length, or `Unknown` when that does not fit in a `usize`.
#[derive(Debug, Clone)]
pub struct Span<R> {
    range: R,
}

impl<R: Iterator + Clone> Sequence for Span<R> {
    type Item = R::Item;
    type Iter = R;

    fn traverse(&self) -> Result<R> {
        Ok(self.range.clone())
    }

    fn len_hint(&self) -> LenHint {
        LenHint::from_size_hint(self.range.size_hint())
    }
}

/// Conversion of plain collections into a [`Sequence`].
pub trait IntoSequence {
    type Item;
    type Seq: Sequence<Item = Self::Item>;

    fn into_sequence(self) -> Self::Seq;
}

impl<T: Clone> IntoSequence for Vec<T> {
    type Item = T;
    type Seq = Items<T>;

    fn into_sequence(self) -> Items<T> {
        Items::new(self)
    }
}

impl<T: Clone, const N: usize> IntoSequence for [T; N] {
    type Item = T;
    type Seq = Items<T>;

    fn into_sequence(self) -> Items<T> {
        Items::new(Vec::from(self))
    }
}

impl<T: Clone> IntoSequence for &[T] {
    type Item = T;
    type Seq = Items<T>;

    fn into_sequence(self) -> Items<T> {
        Items::new(self)
    }
}

impl<T: Clone> IntoSequence for VecDeque<T> {
    type Item = T;
    type Seq = Items<T>;

    fn into_sequence(self) -> Items<T> {
        Items::new(Vec::from(self))
    }
}

impl<T: Clone> IntoSequence for Items<T> {
    type Item = T;
    type Seq = Items<T>;

    fn into_sequence(self) -> Items<T> {
        self
    }
}

impl<T> IntoSequence for std::ops::Range<T>
where
    std::ops::Range<T>: Iterator<Item = T> + Clone,
{
    type Item = T;
    type Seq = Span<Self>;

    fn into_sequence(self) -> Span<Self> {
        Span { range: self }
    }
}

impl<T> IntoSequence for std::ops::RangeInclusive<T>
where
    std::ops::RangeInclusive<T>: Iterator<Item = T> + Clone,
{
    type Item = T;
    type Seq = Span<Self>;

    fn into_sequence(self) -> Span<Self> {
        Span { range: self }
    }
}

/// Wraps a collection or range as a restartable sequence.
pub fn from<C: IntoSequence>(collection: C) -> C::Seq {
    collection.into_sequence()
}

/// Wraps a zero-argument producer as a repeatable sequence.
///
/// ```
/// use lazyseq_rs::{from_fn, SequenceExt};
///
/// let evens = from_fn(|| (0..5).map(|n| n * 2));
/// assert_eq!(evens.to_vec().unwrap(), vec![0, 2, 4, 6, 8]);
/// assert_eq!(evens.count().unwrap(), 5);
/// ```
pub fn from_fn<F, C>(producer: F) -> Generate<F>
where
    F: Fn() -> C,
    C: IntoIterator,
{
    Generate { producer }
}

/// Wraps a bare iterator as a sequence that may be traversed once.
pub fn once<I: IntoIterator>(iter: I) -> RunOnce<I::IntoIter> {
    RunOnce {
        iter: RefCell::new(Some(iter.into_iter())),
    }
}

pub fn empty<T>() -> Empty<T> {
    Empty {
        _phantom: PhantomData,
    }
}

pub fn repeat<T: Clone>(value: T, count: usize) -> Repeat<T> {
    Repeat { value, count }
}

/// `count` consecutive integers from `start`, cut short at `i64::MAX`.
pub fn range(start: i64, count: usize) -> Range {
    let room = usize::try_from(i64::MAX.abs_diff(start)).unwrap_or(usize::MAX);
    Range {
        start,
        count: count.min(room),
    }
}
