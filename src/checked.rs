//! Adapters whose validity can only be decided mid-traversal.
//!
//! They yield `Result` items. A violation is reported as an `Err` item at the
//! point it is detected, after which the traversal ends.

use crate::error::{RangeOp, Result, SeqError};
use crate::hint::LenHint;
use crate::seq::Sequence;

/// Passes elements through while asserting the total count.
#[derive(Clone)]
pub struct AssertCount<S> {
    source: S,
    expected: usize,
}

impl<S> AssertCount<S> {
    pub(crate) fn new(source: S, expected: usize) -> Self {
        Self { source, expected }
    }
}

impl<S: Sequence> Sequence for AssertCount<S> {
    type Item = Result<S::Item>;
    type Iter = AssertCountIter<S::Iter>;

    fn traverse(&self) -> Result<Self::Iter> {
        Ok(AssertCountIter {
            inner: self.source.traverse()?,
            expected: self.expected,
            seen: 0,
            done: false,
        })
    }

    fn len_hint(&self) -> LenHint {
        match self.source.len_hint() {
            LenHint::Known(len) if len == self.expected => LenHint::Known(len),
            _ => LenHint::Unknown,
        }
    }
}

pub struct AssertCountIter<I> {
    inner: I,
    expected: usize,
    seen: usize,
    done: bool,
}

impl<I: Iterator> Iterator for AssertCountIter<I> {
    type Item = Result<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.inner.next() {
            Some(value) => {
                self.seen += 1;
                if self.seen > self.expected {
                    self.done = true;
                    return Some(Err(SeqError::Cardinality {
                        expected: self.expected,
                        actual: self.seen,
                    }));
                }
                Some(Ok(value))
            }
            None => {
                self.done = true;
                if self.seen == self.expected {
                    None
                } else {
                    Some(Err(SeqError::Cardinality {
                        expected: self.expected,
                        actual: self.seen,
                    }))
                }
            }
        }
    }
}

/// Splices another sequence in before position `index`.
///
/// `index` may equal the length of the source, which appends.
#[derive(Clone)]
pub struct InsertAt<S, O> {
    source: S,
    index: usize,
    other: O,
}

impl<S, O> InsertAt<S, O> {
    pub(crate) fn new(source: S, index: usize, other: O) -> Self {
        Self {
            source,
            index,
            other,
        }
    }
}

impl<S, O> Sequence for InsertAt<S, O>
where
    S: Sequence,
    O: Sequence<Item = S::Item>,
{
    type Item = Result<S::Item>;
    type Iter = InsertAtIter<S::Iter, O::Iter>;

    fn traverse(&self) -> Result<Self::Iter> {
        Ok(InsertAtIter {
            inner: self.source.traverse()?,
            inserted: Some(self.other.traverse()?),
            index: self.index,
            position: 0,
            done: false,
        })
    }

    fn len_hint(&self) -> LenHint {
        match (self.source.len_hint(), self.other.len_hint()) {
            (LenHint::Known(len), LenHint::Known(extra)) if self.index <= len => {
                LenHint::Known(len + extra)
            }
            _ => LenHint::Unknown,
        }
    }
}

pub struct InsertAtIter<I, J> {
    inner: I,
    /// Present until the splice point has been passed.
    inserted: Option<J>,
    index: usize,
    position: usize,
    done: bool,
}

impl<I, J> Iterator for InsertAtIter<I, J>
where
    I: Iterator,
    J: Iterator<Item = I::Item>,
{
    type Item = Result<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.position == self.index {
            if let Some(inserted) = self.inserted.as_mut() {
                match inserted.next() {
                    Some(value) => return Some(Ok(value)),
                    None => self.inserted = None,
                }
            }
        }
        match self.inner.next() {
            Some(value) => {
                self.position += 1;
                Some(Ok(value))
            }
            None => {
                self.done = true;
                if self.inserted.is_some() && self.position < self.index {
                    Some(Err(SeqError::Range {
                        op: RangeOp::Insert,
                        index: self.index,
                        len: self.position,
                    }))
                } else {
                    None
                }
            }
        }
    }
}

/// Removes up to `count` elements starting at position `index`.
///
/// `index` must address an existing element.
#[derive(Clone)]
pub struct RemoveAt<S> {
    source: S,
    index: usize,
    count: usize,
}

impl<S> RemoveAt<S> {
    pub(crate) fn new(source: S, index: usize, count: usize) -> Self {
        Self {
            source,
            index,
            count,
        }
    }
}

impl<S: Sequence> Sequence for RemoveAt<S> {
    type Item = Result<S::Item>;
    type Iter = RemoveAtIter<S::Iter>;

    fn traverse(&self) -> Result<Self::Iter> {
        Ok(RemoveAtIter {
            inner: self.source.traverse()?,
            index: self.index,
            count: self.count,
            position: 0,
            done: false,
        })
    }

    fn len_hint(&self) -> LenHint {
        match self.source.len_hint() {
            LenHint::Known(len) if self.index < len => {
                LenHint::Known(len - self.count.min(len - self.index))
            }
            _ => LenHint::Unknown,
        }
    }
}

pub struct RemoveAtIter<I> {
    inner: I,
    index: usize,
    count: usize,
    position: usize,
    done: bool,
}

impl<I: Iterator> Iterator for RemoveAtIter<I> {
    type Item = Result<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let Some(value) = self.inner.next() else {
                self.done = true;
                if self.position <= self.index {
                    return Some(Err(SeqError::Range {
                        op: RangeOp::Remove,
                        index: self.index,
                        len: self.position,
                    }));
                }
                return None;
            };
            let position = self.position;
            self.position += 1;
            if position < self.index || position - self.index >= self.count {
                return Some(Ok(value));
            }
        }
    }
}
