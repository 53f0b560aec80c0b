use crate::error::Result;
use crate::hint::LenHint;
use std::rc::Rc;

/// The capability every sequence and combinator implements.
///
/// A sequence is not a container: it knows how to produce a lazy, one-shot
/// traversal of its elements. Traversals are restartable, so calling
/// [`traverse`](Sequence::traverse) again starts over from the first element,
/// unless a wrapper documents otherwise (see [`RunOnce`](crate::RunOnce)).
///
/// Every derived operation in [`SequenceExt`](crate::SequenceExt) is built on
/// this single primitive.
pub trait Sequence {
    /// Element type produced by a traversal.
    type Item;

    /// The traversal. Owns everything it needs, so it can outlive the borrow
    /// of the sequence that produced it.
    type Iter: Iterator<Item = Self::Item>;

    /// Starts a new traversal.
    fn traverse(&self) -> Result<Self::Iter>;

    /// Best-effort element count, obtainable without traversal.
    fn len_hint(&self) -> LenHint {
        LenHint::Unknown
    }
}

impl<S: Sequence + ?Sized> Sequence for &S {
    type Item = S::Item;
    type Iter = S::Iter;

    fn traverse(&self) -> Result<Self::Iter> {
        (**self).traverse()
    }

    fn len_hint(&self) -> LenHint {
        (**self).len_hint()
    }
}

impl<S: Sequence + ?Sized> Sequence for Rc<S> {
    type Item = S::Item;
    type Iter = S::Iter;

    fn traverse(&self) -> Result<Self::Iter> {
        (**self).traverse()
    }

    fn len_hint(&self) -> LenHint {
        (**self).len_hint()
    }
}

impl<S: Sequence + ?Sized> Sequence for Box<S> {
    type Item = S::Item;
    type Iter = S::Iter;

    fn traverse(&self) -> Result<Self::Iter> {
        (**self).traverse()
    }

    fn len_hint(&self) -> LenHint {
        (**self).len_hint()
    }
}
