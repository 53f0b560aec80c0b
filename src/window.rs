//! Positional and predicate-driven windows: take and skip.
//!
//! Negative counts address the end of the sequence. When the upstream hint is
//! known the window is computed positionally and stays fully lazy; otherwise
//! the traversal keeps a bounded lag buffer of `|n|` elements, which is the
//! least it can hold while still deciding what lies within `|n|` of the end.

use crate::error::Result;
use crate::hint::LenHint;
use crate::seq::Sequence;
use std::collections::VecDeque;
use std::iter::Fuse;
use std::rc::Rc;
use tracing::trace;

/// Options for [`take_with`](crate::SequenceExt::take_with).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TakeOptions<T> {
    /// Fill a short sequence with this value up to the requested count.
    pub pad: Option<T>,
    /// For negative counts, keep everything except the last `|n|` instead of
    /// the last `|n|`.
    pub left_on_negative: bool,
}

impl<T> Default for TakeOptions<T> {
    fn default() -> Self {
        Self {
            pad: None,
            left_on_negative: false,
        }
    }
}

impl<T> TakeOptions<T> {
    pub fn padded(pad: T) -> Self {
        Self {
            pad: Some(pad),
            left_on_negative: false,
        }
    }

    pub fn left_on_negative() -> Self {
        Self {
            pad: None,
            left_on_negative: true,
        }
    }
}

/// Traversal shared by [`Skip`] and [`Take`].
pub enum WindowIter<I: Iterator> {
    Skip(std::iter::Skip<I>),
    Take(std::iter::Take<I>),
    Padded {
        inner: Fuse<I>,
        remaining: usize,
        pad: I::Item,
    },
    DropLast {
        inner: I,
        lag: VecDeque<I::Item>,
        count: usize,
    },
    TakeLast {
        inner: Option<I>,
        tail: VecDeque<I::Item>,
        count: usize,
    },
}

impl<I> Iterator for WindowIter<I>
where
    I: Iterator,
    I::Item: Clone,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        match self {
            WindowIter::Skip(inner) => inner.next(),
            WindowIter::Take(inner) => inner.next(),
            WindowIter::Padded {
                inner,
                remaining,
                pad,
            } => {
                if *remaining == 0 {
                    return None;
                }
                *remaining -= 1;
                Some(inner.next().unwrap_or_else(|| pad.clone()))
            }
            WindowIter::DropLast { inner, lag, count } => {
                // Keep `count` elements in hand; anything older is safe to yield.
                for value in inner.by_ref() {
                    lag.push_back(value);
                    if lag.len() > *count {
                        return lag.pop_front();
                    }
                }
                None
            }
            WindowIter::TakeLast { inner, tail, count } => {
                if let Some(mut source) = inner.take() {
                    for value in source.by_ref() {
                        tail.push_back(value);
                        if tail.len() > *count {
                            tail.pop_front();
                        }
                    }
                }
                tail.pop_front()
            }
        }
    }
}

fn drop_last<I: Iterator>(inner: I, count: usize, hint: LenHint) -> WindowIter<I> {
    match hint {
        LenHint::Known(len) => WindowIter::Take(inner.take(len.saturating_sub(count))),
        LenHint::Unknown => {
            trace!(count, "dropping tail of a sequence with unknown length");
            WindowIter::DropLast {
                inner,
                lag: VecDeque::with_capacity(count.saturating_add(1).min(1024)),
                count,
            }
        }
    }
}

fn take_last<I: Iterator>(inner: I, count: usize, hint: LenHint) -> WindowIter<I> {
    match hint {
        LenHint::Known(len) => WindowIter::Skip(inner.skip(len.saturating_sub(count))),
        LenHint::Unknown => {
            trace!(count, "collecting tail of a sequence with unknown length");
            WindowIter::TakeLast {
                inner: Some(inner),
                tail: VecDeque::with_capacity(count.saturating_add(1).min(1024)),
                count,
            }
        }
    }
}

/// Skips the first `n` elements, or with a negative `n` drops the last `|n|`.
#[derive(Clone)]
pub struct Skip<S> {
    source: S,
    count: isize,
}

impl<S> Skip<S> {
    pub(crate) fn new(source: S, count: isize) -> Self {
        Self { source, count }
    }
}

impl<S> Sequence for Skip<S>
where
    S: Sequence,
    S::Item: Clone,
{
    type Item = S::Item;
    type Iter = WindowIter<S::Iter>;

    fn traverse(&self) -> Result<Self::Iter> {
        // Read the hint first: a run-once source forgets it once traversed.
        let hint = self.source.len_hint();
        let inner = self.source.traverse()?;
        let n = self.count.unsigned_abs();
        if self.count >= 0 {
            Ok(WindowIter::Skip(inner.skip(n)))
        } else {
            Ok(drop_last(inner, n, hint))
        }
    }

    fn len_hint(&self) -> LenHint {
        let n = self.count.unsigned_abs();
        self.source.len_hint().map(|len| len.saturating_sub(n))
    }
}

/// Takes the first `n` elements, or with a negative `n` the last `|n|`.
pub struct Take<S: Sequence> {
    source: S,
    count: isize,
    options: TakeOptions<S::Item>,
}

impl<S: Sequence> Take<S> {
    pub(crate) fn new(source: S, count: isize, options: TakeOptions<S::Item>) -> Self {
        Self {
            source,
            count,
            options,
        }
    }
}

impl<S> Clone for Take<S>
where
    S: Sequence + Clone,
    S::Item: Clone,
{
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            count: self.count,
            options: self.options.clone(),
        }
    }
}

impl<S> Sequence for Take<S>
where
    S: Sequence,
    S::Item: Clone,
{
    type Item = S::Item;
    type Iter = WindowIter<S::Iter>;

    fn traverse(&self) -> Result<Self::Iter> {
        let hint = self.source.len_hint();
        let inner = self.source.traverse()?;
        let n = self.count.unsigned_abs();
        if self.count >= 0 {
            return Ok(match &self.options.pad {
                Some(pad) => WindowIter::Padded {
                    inner: inner.fuse(),
                    remaining: n,
                    pad: pad.clone(),
                },
                None => WindowIter::Take(inner.take(n)),
            });
        }
        if self.options.left_on_negative {
            Ok(drop_last(inner, n, hint))
        } else {
            Ok(take_last(inner, n, hint))
        }
    }

    fn len_hint(&self) -> LenHint {
        let n = self.count.unsigned_abs();
        let hint = self.source.len_hint();
        if self.count >= 0 {
            if self.options.pad.is_some() {
                LenHint::Known(n)
            } else {
                hint.map(|len| len.min(n))
            }
        } else if self.options.left_on_negative {
            hint.map(|len| len.saturating_sub(n))
        } else {
            hint.map(|len| len.min(n))
        }
    }
}

/// Takes elements while the predicate holds.
///
/// The predicate sees the element, its index and the elements taken so far,
/// so each traversal keeps a copy of every element it has yielded.
pub struct TakeWhile<S, P> {
    source: S,
    predicate: Rc<P>,
}

impl<S, P> TakeWhile<S, P> {
    pub(crate) fn new(source: S, predicate: P) -> Self {
        Self {
            source,
            predicate: Rc::new(predicate),
        }
    }
}

impl<S: Clone, P> Clone for TakeWhile<S, P> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            predicate: Rc::clone(&self.predicate),
        }
    }
}

impl<S, P> Sequence for TakeWhile<S, P>
where
    S: Sequence,
    S::Item: Clone,
    P: Fn(&S::Item, usize, &[S::Item]) -> bool,
{
    type Item = S::Item;
    type Iter = TakeWhileIter<S::Iter, P>;

    fn traverse(&self) -> Result<Self::Iter> {
        Ok(TakeWhileIter {
            inner: self.source.traverse()?,
            predicate: Rc::clone(&self.predicate),
            taken: Vec::new(),
            done: false,
        })
    }
}

pub struct TakeWhileIter<I: Iterator, P> {
    inner: I,
    predicate: Rc<P>,
    taken: Vec<I::Item>,
    done: bool,
}

impl<I, P> Iterator for TakeWhileIter<I, P>
where
    I: Iterator,
    I::Item: Clone,
    P: Fn(&I::Item, usize, &[I::Item]) -> bool,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        if self.done {
            return None;
        }
        let Some(value) = self.inner.next() else {
            self.done = true;
            return None;
        };
        if (self.predicate)(&value, self.taken.len(), &self.taken) {
            self.taken.push(value.clone());
            Some(value)
        } else {
            self.done = true;
            None
        }
    }
}

/// Skips elements while the predicate holds, then yields the rest.
///
/// The predicate sees the element, its index and the elements skipped so far.
pub struct SkipWhile<S, P> {
    source: S,
    predicate: Rc<P>,
}

impl<S, P> SkipWhile<S, P> {
    pub(crate) fn new(source: S, predicate: P) -> Self {
        Self {
            source,
            predicate: Rc::new(predicate),
        }
    }
}

impl<S: Clone, P> Clone for SkipWhile<S, P> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            predicate: Rc::clone(&self.predicate),
        }
    }
}

impl<S, P> Sequence for SkipWhile<S, P>
where
    S: Sequence,
    S::Item: Clone,
    P: Fn(&S::Item, usize, &[S::Item]) -> bool,
{
    type Item = S::Item;
    type Iter = SkipWhileIter<S::Iter, P>;

    fn traverse(&self) -> Result<Self::Iter> {
        Ok(SkipWhileIter {
            inner: self.source.traverse()?.fuse(),
            predicate: Rc::clone(&self.predicate),
            skipping: true,
        })
    }
}

pub struct SkipWhileIter<I, P> {
    inner: Fuse<I>,
    predicate: Rc<P>,
    skipping: bool,
}

impl<I, P> Iterator for SkipWhileIter<I, P>
where
    I: Iterator,
    I::Item: Clone,
    P: Fn(&I::Item, usize, &[I::Item]) -> bool,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        if self.skipping {
            self.skipping = false;
            let mut skipped = Vec::new();
            for value in self.inner.by_ref() {
                if !(self.predicate)(&value, skipped.len(), &skipped) {
                    return Some(value);
                }
                skipped.push(value);
            }
            return None;
        }
        self.inner.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{from, from_fn};
    use crate::SequenceExt;
    use std::cell::Cell;

    #[test]
    fn test_skip_positive() {
        let seq = from(vec![1, 2, 3, 4, 5]).skip(2);
        assert_eq!(seq.to_vec().unwrap(), vec![3, 4, 5]);
        assert_eq!(seq.len_hint(), LenHint::Known(3));
        assert_eq!(from(vec![1]).skip(5).to_vec().unwrap(), Vec::<i32>::new());
    }

    #[test]
    fn test_skip_negative_known_and_unknown() {
        let known = from(vec![1, 2, 3, 4, 5]).skip(-2);
        assert_eq!(known.len_hint(), LenHint::Known(3));
        assert_eq!(known.to_vec().unwrap(), vec![1, 2, 3]);

        let unknown = from_fn(|| 1..=5).skip(-2);
        assert_eq!(unknown.len_hint(), LenHint::Unknown);
        assert_eq!(unknown.to_vec().unwrap(), vec![1, 2, 3]);

        assert_eq!(from_fn(|| 1..=2).skip(-5).to_vec().unwrap(), Vec::<i32>::new());
    }

    #[test]
    fn test_take_positive_and_padded() {
        let seq = from(vec![1, 2, 3]).take(2);
        assert_eq!(seq.to_vec().unwrap(), vec![1, 2]);
        assert_eq!(seq.len_hint(), LenHint::Known(2));

        let padded = from(vec![1, 2]).take_with(4, TakeOptions::padded(0));
        assert_eq!(padded.len_hint(), LenHint::Known(4));
        assert_eq!(padded.to_vec().unwrap(), vec![1, 2, 0, 0]);

        let unpadded_short = from(vec![1, 2]).take(4);
        assert_eq!(unpadded_short.len_hint(), LenHint::Known(2));
        assert_eq!(unpadded_short.to_vec().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_take_negative() {
        let last = from(vec![1, 2, 3, 4, 5]).take(-2);
        assert_eq!(last.len_hint(), LenHint::Known(2));
        assert_eq!(last.to_vec().unwrap(), vec![4, 5]);

        let last_unknown = from_fn(|| 1..=5).take(-2);
        assert_eq!(last_unknown.to_vec().unwrap(), vec![4, 5]);

        let left = from_fn(|| 1..=5).take_with(-2, TakeOptions::left_on_negative());
        assert_eq!(left.to_vec().unwrap(), vec![1, 2, 3]);

        let left_known = from(vec![1, 2, 3, 4, 5]).take_with(-2, TakeOptions::left_on_negative());
        assert_eq!(left_known.len_hint(), LenHint::Known(3));
        assert_eq!(left_known.to_vec().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_take_last_longer_than_source() {
        assert_eq!(from_fn(|| 1..=2).take(-5).to_vec().unwrap(), vec![1, 2]);
        assert_eq!(from(vec![1, 2]).take(-5).to_vec().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_take_while_sees_partial() {
        // Stop once the running total would pass 6.
        let seq = from(vec![1, 2, 3, 4, 5])
            .take_while(|x, _, taken: &[i32]| taken.iter().sum::<i32>() + x <= 6);
        assert_eq!(seq.len_hint(), LenHint::Unknown);
        assert_eq!(seq.to_vec().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_take_while_index() {
        let seq = from(vec!['a', 'b', 'c']).take_while(|_, i, _| i < 2);
        assert_eq!(seq.to_vec().unwrap(), vec!['a', 'b']);
    }

    /// Yields `1..=len`, counting every call to `next`.
    struct Polled<'a> {
        next: u32,
        len: u32,
        polls: &'a Cell<u32>,
    }

    impl Iterator for Polled<'_> {
        type Item = u32;

        fn next(&mut self) -> Option<u32> {
            self.polls.set(self.polls.get() + 1);
            if self.next == self.len {
                return None;
            }
            self.next += 1;
            Some(self.next)
        }
    }

    #[test]
    fn test_predicate_windows_stop_polling_after_exhaustion() {
        let polls = Cell::new(0);
        let source = from_fn(|| Polled {
            next: 0,
            len: 2,
            polls: &polls,
        });

        let mut taking = (&source).take_while(|_, _, _| true).traverse().unwrap();
        assert_eq!(taking.next(), Some(1));
        assert_eq!(taking.next(), Some(2));
        assert_eq!(taking.next(), None);
        assert_eq!(taking.next(), None);
        assert_eq!(polls.get(), 3);

        polls.set(0);
        let mut skipping = (&source).skip_while(|x, _, _| *x < 2).traverse().unwrap();
        assert_eq!(skipping.next(), Some(2));
        assert_eq!(skipping.next(), None);
        assert_eq!(skipping.next(), None);
        assert_eq!(polls.get(), 3);
    }

    #[test]
    fn test_skip_while() {
        let seq = from(vec![1, 2, 5, 1, 2]).skip_while(|x, _, _| *x < 3);
        assert_eq!(seq.to_vec().unwrap(), vec![5, 1, 2]);
        assert_eq!(seq.len_hint(), LenHint::Unknown);

        let by_skipped = from(vec![1, 1, 1, 1]).skip_while(|_, _, skipped: &[i32]| skipped.len() < 3);
        assert_eq!(by_skipped.to_vec().unwrap(), vec![1]);
    }
}
