//! Element-wise adapters: map, filter, enumerate, concat, inspect.
//!
//! Each node keeps its upstream and an `Rc`-shared closure, so the node is
//! cheap to clone and every traversal carries its own handle on the closure.

use crate::error::Result;
use crate::hint::LenHint;
use crate::seq::Sequence;
use std::rc::Rc;

/// Applies a function to every element.
pub struct Map<S, F> {
    source: S,
    f: Rc<F>,
}

impl<S, F> Map<S, F> {
    pub(crate) fn new(source: S, f: F) -> Self {
        Self {
            source,
            f: Rc::new(f),
        }
    }
}

impl<S: Clone, F> Clone for Map<S, F> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            f: Rc::clone(&self.f),
        }
    }
}

impl<S, F, U> Sequence for Map<S, F>
where
    S: Sequence,
    F: Fn(S::Item) -> U,
{
    type Item = U;
    type Iter = MapIter<S::Iter, F>;

    fn traverse(&self) -> Result<Self::Iter> {
        Ok(MapIter {
            inner: self.source.traverse()?,
            f: Rc::clone(&self.f),
        })
    }

    fn len_hint(&self) -> LenHint {
        self.source.len_hint()
    }
}

pub struct MapIter<I, F> {
    inner: I,
    f: Rc<F>,
}

impl<I, F, U> Iterator for MapIter<I, F>
where
    I: Iterator,
    F: Fn(I::Item) -> U,
{
    type Item = U;

    fn next(&mut self) -> Option<U> {
        self.inner.next().map(|v| (self.f)(v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Keeps the elements a predicate accepts. The hint becomes `Unknown`.
pub struct Filter<S, P> {
    source: S,
    predicate: Rc<P>,
}

impl<S, P> Filter<S, P> {
    pub(crate) fn new(source: S, predicate: P) -> Self {
        Self {
            source,
            predicate: Rc::new(predicate),
        }
    }
}

impl<S: Clone, P> Clone for Filter<S, P> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            predicate: Rc::clone(&self.predicate),
        }
    }
}

impl<S, P> Sequence for Filter<S, P>
where
    S: Sequence,
    P: Fn(&S::Item) -> bool,
{
    type Item = S::Item;
    type Iter = FilterIter<S::Iter, P>;

    fn traverse(&self) -> Result<Self::Iter> {
        Ok(FilterIter {
            inner: self.source.traverse()?,
            predicate: Rc::clone(&self.predicate),
        })
    }
}

pub struct FilterIter<I, P> {
    inner: I,
    predicate: Rc<P>,
}

impl<I, P> Iterator for FilterIter<I, P>
where
    I: Iterator,
    P: Fn(&I::Item) -> bool,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        let predicate = &self.predicate;
        self.inner.find(|v| predicate(v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.inner.size_hint().1)
    }
}

/// Maps each element and drops those that map to `None`.
pub struct FilterMap<S, F> {
    source: S,
    f: Rc<F>,
}

impl<S, F> FilterMap<S, F> {
    pub(crate) fn new(source: S, f: F) -> Self {
        Self {
            source,
            f: Rc::new(f),
        }
    }
}

impl<S: Clone, F> Clone for FilterMap<S, F> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            f: Rc::clone(&self.f),
        }
    }
}

impl<S, F, U> Sequence for FilterMap<S, F>
where
    S: Sequence,
    F: Fn(S::Item) -> Option<U>,
{
    type Item = U;
    type Iter = FilterMapIter<S::Iter, F>;

    fn traverse(&self) -> Result<Self::Iter> {
        Ok(FilterMapIter {
            inner: self.source.traverse()?,
            f: Rc::clone(&self.f),
        })
    }
}

pub struct FilterMapIter<I, F> {
    inner: I,
    f: Rc<F>,
}

impl<I, F, U> Iterator for FilterMapIter<I, F>
where
    I: Iterator,
    F: Fn(I::Item) -> Option<U>,
{
    type Item = U;

    fn next(&mut self) -> Option<U> {
        let f = &self.f;
        self.inner.find_map(|v| f(v))
    }
}

/// Pairs each element with its zero-based index.
#[derive(Clone)]
pub struct Enumerate<S> {
    source: S,
}

impl<S> Enumerate<S> {
    pub(crate) fn new(source: S) -> Self {
        Self { source }
    }
}

impl<S: Sequence> Sequence for Enumerate<S> {
    type Item = (usize, S::Item);
    type Iter = std::iter::Enumerate<S::Iter>;

    fn traverse(&self) -> Result<Self::Iter> {
        Ok(self.source.traverse()?.enumerate())
    }

    fn len_hint(&self) -> LenHint {
        self.source.len_hint()
    }
}

/// `first` followed by `second`.
#[derive(Clone)]
pub struct Concat<A, B> {
    first: A,
    second: B,
}

impl<A, B> Concat<A, B> {
    pub(crate) fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A, B> Sequence for Concat<A, B>
where
    A: Sequence,
    B: Sequence<Item = A::Item>,
{
    type Item = A::Item;
    type Iter = std::iter::Chain<A::Iter, B::Iter>;

    fn traverse(&self) -> Result<Self::Iter> {
        Ok(self.first.traverse()?.chain(self.second.traverse()?))
    }

    fn len_hint(&self) -> LenHint {
        self.first.len_hint().add(self.second.len_hint())
    }
}

/// Calls a closure on each element as it passes through.
pub struct Inspect<S, F> {
    source: S,
    f: Rc<F>,
}

impl<S, F> Inspect<S, F> {
    pub(crate) fn new(source: S, f: F) -> Self {
        Self {
            source,
            f: Rc::new(f),
        }
    }
}

impl<S: Clone, F> Clone for Inspect<S, F> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            f: Rc::clone(&self.f),
        }
    }
}

impl<S, F> Sequence for Inspect<S, F>
where
    S: Sequence,
    F: Fn(&S::Item),
{
    type Item = S::Item;
    type Iter = InspectIter<S::Iter, F>;

    fn traverse(&self) -> Result<Self::Iter> {
        Ok(InspectIter {
            inner: self.source.traverse()?,
            f: Rc::clone(&self.f),
        })
    }

    fn len_hint(&self) -> LenHint {
        self.source.len_hint()
    }
}

pub struct InspectIter<I, F> {
    inner: I,
    f: Rc<F>,
}

impl<I, F> Iterator for InspectIter<I, F>
where
    I: Iterator,
    F: Fn(&I::Item),
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        let value = self.inner.next()?;
        (self.f)(&value);
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
