//! Pairwise combination of two sequences: lockstep zip and cartesian join.

use crate::error::Result;
use crate::hint::LenHint;
use crate::seq::Sequence;
use std::collections::VecDeque;
use std::iter::Fuse;
use std::rc::Rc;
use tracing::trace;

/// Reconciliation policy when the two sides of a pairwise combination differ
/// in length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JoinMode {
    /// The shorter side governs.
    #[default]
    Inner,
    /// The left side governs; missing right values are `None`.
    Left,
    /// The right side governs; missing left values are `None`.
    Right,
    /// The longer side governs; either side may be `None`.
    Outer,
}

impl JoinMode {
    pub fn keeps_left(self) -> bool {
        matches!(self, JoinMode::Left | JoinMode::Outer)
    }

    pub fn keeps_right(self) -> bool {
        matches!(self, JoinMode::Right | JoinMode::Outer)
    }

    /// Length of a lockstep zip of sequences with the given hints.
    pub fn zip_hint(self, left: LenHint, right: LenHint) -> LenHint {
        match self {
            JoinMode::Inner => left.min(right),
            JoinMode::Left => left,
            JoinMode::Right => right,
            JoinMode::Outer => left.max(right),
        }
    }

    /// Length of an unfiltered cartesian join of sequences with the given hints.
    ///
    /// `Unknown` when the pair count does not fit in a `usize`.
    pub fn cross_hint(self, left: LenHint, right: LenHint) -> LenHint {
        match (left, right) {
            (LenHint::Known(0), LenHint::Known(r)) if self.keeps_right() => LenHint::Known(r),
            (LenHint::Known(l), LenHint::Known(0)) if self.keeps_left() => LenHint::Known(l),
            (LenHint::Known(l), LenHint::Known(r)) => {
                l.checked_mul(r).map_or(LenHint::Unknown, LenHint::Known)
            }
            _ => LenHint::Unknown,
        }
    }
}

/// Lockstep combination of two sequences.
pub struct Zip<A, B, F> {
    left: A,
    right: B,
    mode: JoinMode,
    f: Rc<F>,
}

impl<A, B, F> Zip<A, B, F> {
    pub(crate) fn new(left: A, right: B, mode: JoinMode, f: F) -> Self {
        Self {
            left,
            right,
            mode,
            f: Rc::new(f),
        }
    }
}

impl<A: Clone, B: Clone, F> Clone for Zip<A, B, F> {
    fn clone(&self) -> Self {
        Self {
            left: self.left.clone(),
            right: self.right.clone(),
            mode: self.mode,
            f: Rc::clone(&self.f),
        }
    }
}

impl<A, B, F, U> Sequence for Zip<A, B, F>
where
    A: Sequence,
    B: Sequence,
    F: Fn(Option<A::Item>, Option<B::Item>) -> U,
{
    type Item = U;
    type Iter = ZipIter<A::Iter, B::Iter, F>;

    fn traverse(&self) -> Result<Self::Iter> {
        Ok(ZipIter {
            left: self.left.traverse()?.fuse(),
            right: self.right.traverse()?.fuse(),
            mode: self.mode,
            f: Rc::clone(&self.f),
        })
    }

    fn len_hint(&self) -> LenHint {
        self.mode
            .zip_hint(self.left.len_hint(), self.right.len_hint())
    }
}

pub struct ZipIter<L, R, F> {
    left: Fuse<L>,
    right: Fuse<R>,
    mode: JoinMode,
    f: Rc<F>,
}

impl<L, R, F, U> Iterator for ZipIter<L, R, F>
where
    L: Iterator,
    R: Iterator,
    F: Fn(Option<L::Item>, Option<R::Item>) -> U,
{
    type Item = U;

    fn next(&mut self) -> Option<U> {
        // Pull the governing side first so an ended zip never over-reads it.
        let (l, r) = match self.mode {
            JoinMode::Inner => {
                let l = self.left.next()?;
                let r = self.right.next()?;
                (Some(l), Some(r))
            }
            JoinMode::Left => {
                let l = self.left.next()?;
                (Some(l), self.right.next())
            }
            JoinMode::Right => {
                let r = self.right.next()?;
                (self.left.next(), Some(r))
            }
            JoinMode::Outer => match (self.left.next(), self.right.next()) {
                (None, None) => return None,
                pair => pair,
            },
        };
        Some((self.f)(l, r))
    }
}

/// Cartesian combination of two sequences with an optional pair filter.
pub struct Join<A, B, P, F> {
    left: A,
    right: B,
    mode: JoinMode,
    filter: Option<Rc<P>>,
    f: Rc<F>,
}

impl<A, B, P, F> Join<A, B, P, F> {
    pub(crate) fn new(left: A, right: B, mode: JoinMode, filter: Option<P>, f: F) -> Self {
        Self {
            left,
            right,
            mode,
            filter: filter.map(Rc::new),
            f: Rc::new(f),
        }
    }
}

impl<A: Clone, B: Clone, P, F> Clone for Join<A, B, P, F> {
    fn clone(&self) -> Self {
        Self {
            left: self.left.clone(),
            right: self.right.clone(),
            mode: self.mode,
            filter: self.filter.clone(),
            f: Rc::clone(&self.f),
        }
    }
}

impl<A, B, P, F, U> Sequence for Join<A, B, P, F>
where
    A: Sequence,
    B: Sequence,
    A::Item: Clone,
    B::Item: Clone,
    P: Fn(&A::Item, &B::Item) -> bool,
    F: Fn(Option<A::Item>, Option<B::Item>) -> U,
{
    type Item = U;
    type Iter = JoinIter<A::Iter, B::Iter, P, F>;

    fn traverse(&self) -> Result<Self::Iter> {
        Ok(JoinIter {
            left: self.left.traverse()?,
            right: Some(self.right.traverse()?),
            right_seen: Vec::new(),
            current: None,
            cursor: 0,
            unmatched_left: VecDeque::new(),
            phase: JoinPhase::Cartesian,
            mode: self.mode,
            filter: self.filter.clone(),
            f: Rc::clone(&self.f),
        })
    }

    fn len_hint(&self) -> LenHint {
        match self.filter {
            Some(_) => LenHint::Unknown,
            None => self
                .mode
                .cross_hint(self.left.len_hint(), self.right.len_hint()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JoinPhase {
    Cartesian,
    UnmatchedLeft,
    UnmatchedRight(usize),
    Done,
}

/// Traversal of a [`Join`].
///
/// The right side is pulled once into `right_seen` while scanning the first
/// left element, then replayed for every later one. Each cached element
/// carries a flag recording whether it took part in at least one pair.
pub struct JoinIter<LI: Iterator, RI: Iterator, P, F> {
    left: LI,
    right: Option<RI>,
    right_seen: Vec<(RI::Item, bool)>,
    current: Option<(LI::Item, bool)>,
    cursor: usize,
    unmatched_left: VecDeque<LI::Item>,
    phase: JoinPhase,
    mode: JoinMode,
    filter: Option<Rc<P>>,
    f: Rc<F>,
}

impl<LI, RI, P, F> JoinIter<LI, RI, P, F>
where
    LI: Iterator,
    RI: Iterator,
{
    /// Makes sure `right_seen` covers position `index` if the right side has it.
    fn fill_right(&mut self, index: usize) {
        while self.right_seen.len() <= index {
            match self.right.as_mut().and_then(Iterator::next) {
                Some(r) => self.right_seen.push((r, false)),
                None => {
                    if self.right.take().is_some() {
                        trace!(len = self.right_seen.len(), "join right side exhausted");
                    }
                    return;
                }
            }
        }
    }
}

impl<LI, RI, P, F, U> Iterator for JoinIter<LI, RI, P, F>
where
    LI: Iterator,
    RI: Iterator,
    LI::Item: Clone,
    RI::Item: Clone,
    P: Fn(&LI::Item, &RI::Item) -> bool,
    F: Fn(Option<LI::Item>, Option<RI::Item>) -> U,
{
    type Item = U;

    fn next(&mut self) -> Option<U> {
        loop {
            match self.phase {
                JoinPhase::Cartesian => {
                    if self.current.is_none() {
                        match self.left.next() {
                            Some(l) => {
                                self.current = Some((l, false));
                                self.cursor = 0;
                            }
                            None => {
                                // Unmatched right records need the full right side.
                                if self.mode.keeps_right() {
                                    self.fill_right(usize::MAX);
                                }
                                self.phase = JoinPhase::UnmatchedLeft;
                                continue;
                            }
                        }
                    }

                    self.fill_right(self.cursor);
                    let index = self.cursor;
                    if index < self.right_seen.len() {
                        self.cursor += 1;
                        let Some((l, l_matched)) = self.current.as_mut() else {
                            continue;
                        };
                        let (r, r_matched) = &mut self.right_seen[index];
                        let keep = match &self.filter {
                            Some(filter) => filter(l, r),
                            None => true,
                        };
                        if keep {
                            *l_matched = true;
                            *r_matched = true;
                            return Some((self.f)(Some(l.clone()), Some(r.clone())));
                        }
                    } else if let Some((l, matched)) = self.current.take() {
                        if !matched && self.mode.keeps_left() {
                            self.unmatched_left.push_back(l);
                        }
                    }
                }
                JoinPhase::UnmatchedLeft => match self.unmatched_left.pop_front() {
                    Some(l) => return Some((self.f)(Some(l), None)),
                    None => self.phase = JoinPhase::UnmatchedRight(0),
                },
                JoinPhase::UnmatchedRight(start) => {
                    if !self.mode.keeps_right() {
                        self.phase = JoinPhase::Done;
                        continue;
                    }
                    let found = self.right_seen[start..]
                        .iter()
                        .position(|(_, matched)| !matched)
                        .map(|offset| start + offset);
                    match found {
                        Some(index) => {
                            self.phase = JoinPhase::UnmatchedRight(index + 1);
                            let r = self.right_seen[index].0.clone();
                            return Some((self.f)(None, Some(r)));
                        }
                        None => self.phase = JoinPhase::Done,
                    }
                }
                JoinPhase::Done => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{from, from_fn, repeat};
    use crate::SequenceExt;

    fn add(a: Option<i32>, b: Option<i32>) -> Option<i32> {
        Some(a? + b?)
    }

    #[test]
    fn test_zip_modes() {
        let left = from(vec![1, 2, 3]);
        let right = from(vec![4, 5]);

        let inner = left.clone().zip(right.clone(), JoinMode::Inner, add);
        assert_eq!(inner.to_vec().unwrap(), vec![Some(5), Some(7)]);
        assert_eq!(inner.len_hint(), LenHint::Known(2));

        let left_mode = left.clone().zip(right.clone(), JoinMode::Left, add);
        assert_eq!(left_mode.to_vec().unwrap(), vec![Some(5), Some(7), None]);
        assert_eq!(left_mode.len_hint(), LenHint::Known(3));

        let right_mode = left.clone().zip(right.clone(), JoinMode::Right, add);
        assert_eq!(right_mode.to_vec().unwrap(), vec![Some(5), Some(7)]);
        assert_eq!(right_mode.len_hint(), LenHint::Known(2));

        let outer = right.zip(left, JoinMode::Outer, |a, b| (a, b));
        assert_eq!(
            outer.to_vec().unwrap(),
            vec![(Some(4), Some(1)), (Some(5), Some(2)), (None, Some(3))]
        );
        assert_eq!(outer.len_hint(), LenHint::Known(3));
    }

    #[test]
    fn test_zip_hint_unknown_side() {
        let zipped = from(vec![1, 2]).zip(from_fn(|| vec![1]), JoinMode::Inner, add);
        assert_eq!(zipped.len_hint(), LenHint::Unknown);

        // Left mode needs only the left hint.
        let left = from(vec![1, 2]).zip(from_fn(|| vec![1]), JoinMode::Left, add);
        assert_eq!(left.len_hint(), LenHint::Known(2));
    }

    #[test]
    fn test_cross_join_left_major() {
        let pairs = from(vec![1, 2, 3]).cross_join(from(vec![4, 5]), JoinMode::Inner, |a, b| (a, b));
        assert_eq!(pairs.len_hint(), LenHint::Known(6));
        assert_eq!(
            pairs.to_vec().unwrap(),
            vec![
                (Some(1), Some(4)),
                (Some(1), Some(5)),
                (Some(2), Some(4)),
                (Some(2), Some(5)),
                (Some(3), Some(4)),
                (Some(3), Some(5)),
            ]
        );
    }

    #[test]
    fn test_filtered_join_unmatched_order() {
        let left = from(vec![1, 2, 3, 4]);
        let right = from(vec![3, 5, 1]);
        let eq = |a: &i32, b: &i32| a == b;

        let inner = left.clone().join(right.clone(), JoinMode::Inner, eq, |a, b| (a, b));
        assert_eq!(inner.len_hint(), LenHint::Unknown);
        assert_eq!(
            inner.to_vec().unwrap(),
            vec![(Some(1), Some(1)), (Some(3), Some(3))]
        );

        let outer = left.join(right, JoinMode::Outer, eq, |a, b| (a, b));
        assert_eq!(
            outer.to_vec().unwrap(),
            vec![
                (Some(1), Some(1)),
                (Some(3), Some(3)),
                (Some(2), None),
                (Some(4), None),
                (None, Some(5)),
            ]
        );
    }

    #[test]
    fn test_join_with_empty_sides() {
        let empty = from(Vec::<i32>::new());
        let right = from(vec![7, 8]);

        let right_mode = empty.clone().cross_join(right.clone(), JoinMode::Right, |a, b| (a, b));
        assert_eq!(right_mode.len_hint(), LenHint::Known(2));
        assert_eq!(
            right_mode.to_vec().unwrap(),
            vec![(None, Some(7)), (None, Some(8))]
        );

        let inner = empty.clone().cross_join(right.clone(), JoinMode::Inner, |a, b| (a, b));
        assert_eq!(inner.len_hint(), LenHint::Known(0));
        assert!(inner.to_vec().unwrap().is_empty());

        let left_mode = right.cross_join(empty, JoinMode::Left, |a, b| (a, b));
        assert_eq!(left_mode.len_hint(), LenHint::Known(2));
        assert_eq!(
            left_mode.to_vec().unwrap(),
            vec![(Some(7), None), (Some(8), None)]
        );
    }

    #[test]
    fn test_cross_hint_overflow_is_unknown() {
        let huge = repeat(0u8, 1 << 40);
        let joined = (&huge).cross_join(&huge, JoinMode::Inner, |a, b| (a, b));
        assert_eq!(joined.len_hint(), LenHint::Unknown);
        assert_eq!(
            JoinMode::Outer.cross_hint(LenHint::Known(usize::MAX), LenHint::Known(2)),
            LenHint::Unknown
        );
        assert_eq!(
            JoinMode::Inner.cross_hint(LenHint::Known(1 << 20), LenHint::Known(1 << 20)),
            LenHint::Known(1 << 40)
        );
    }

    #[test]
    fn test_join_pulls_right_once() {
        use std::cell::Cell;
        let pulls = Cell::new(0);
        let right = from(vec![1, 2]).inspect(|_| pulls.set(pulls.get() + 1));
        let joined = from(vec![10, 20, 30]).cross_join(right, JoinMode::Inner, |a, b| Some(a? + b?));
        assert_eq!(joined.len_hint(), LenHint::Known(6));
        assert_eq!(joined.to_vec().unwrap().len(), 6);
        assert_eq!(pulls.get(), 2);
    }
}
