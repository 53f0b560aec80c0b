//! Shared memoization of a single pass over a source.
//!
//! A [`Cache`] node owns a record with the elements produced so far, the
//! underlying traversal (created on first use) and an exhausted flag. Every
//! reader replays the buffer and then pulls from the shared traversal,
//! appending each new element to the buffer before yielding it. The buffer
//! therefore always holds elements in source production order, whichever
//! reader caused each pull.
//!
//! Readers may be interleaved freely on one thread: whichever reader first
//! runs past the buffered region triggers the next pull, and every other
//! reader later finds that element at the same position. Alternating two
//! readers one step at a time delivers the elements round-robin, one pull per
//! element. The record is not shared across threads (`Rc`, `RefCell`).

use crate::error::Result;
use crate::hint::LenHint;
use crate::seq::Sequence;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace};

/// The shared state of a cache node.
struct CacheRecord<I: Iterator> {
    buffer: Vec<I::Item>,
    traversal: Option<I>,
    exhausted: bool,
}

impl<I: Iterator> CacheRecord<I> {
    /// Pulls one element from the underlying traversal into the buffer.
    ///
    /// Returns false once the source is exhausted; the traversal is dropped
    /// at that point so it releases whatever it holds.
    fn advance(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        match self.traversal.as_mut().and_then(Iterator::next) {
            Some(value) => {
                self.buffer.push(value);
                true
            }
            None => {
                self.exhausted = true;
                self.traversal = None;
                debug!(len = self.buffer.len(), "cached source exhausted");
                false
            }
        }
    }
}

struct CacheShared<S: Sequence> {
    source: S,
    record: RefCell<CacheRecord<S::Iter>>,
}

/// A sequence that memoizes one pass over its source for any number of
/// readers. Clones share the same record.
pub struct Cache<S: Sequence> {
    shared: Rc<CacheShared<S>>,
}

impl<S: Sequence> Cache<S> {
    pub(crate) fn new(source: S) -> Self {
        Self {
            shared: Rc::new(CacheShared {
                source,
                record: RefCell::new(CacheRecord {
                    buffer: Vec::new(),
                    traversal: None,
                    exhausted: false,
                }),
            }),
        }
    }

    /// Number of elements buffered so far.
    pub fn buffered(&self) -> usize {
        self.shared.record.borrow().buffer.len()
    }

    /// True once the source has been read to the end.
    pub fn is_exhausted(&self) -> bool {
        self.shared.record.borrow().exhausted
    }
}

impl<S: Sequence> Clone for Cache<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<S> Sequence for Cache<S>
where
    S: Sequence,
    S::Item: Clone,
{
    type Item = S::Item;
    type Iter = CacheReader<S>;

    fn traverse(&self) -> Result<Self::Iter> {
        {
            let mut record = self.shared.record.borrow_mut();
            if record.traversal.is_none() && !record.exhausted {
                trace!("starting cached source traversal");
                record.traversal = Some(self.shared.source.traverse()?);
            }
        }
        Ok(CacheReader {
            shared: Rc::clone(&self.shared),
            position: 0,
        })
    }

    fn len_hint(&self) -> LenHint {
        let record = self.shared.record.borrow();
        if record.exhausted {
            LenHint::Known(record.buffer.len())
        } else {
            drop(record);
            self.shared.source.len_hint()
        }
    }
}

/// One reader of a [`Cache`], with its own position in the shared buffer.
pub struct CacheReader<S: Sequence> {
    shared: Rc<CacheShared<S>>,
    position: usize,
}

impl<S> Iterator for CacheReader<S>
where
    S: Sequence,
    S::Item: Clone,
{
    type Item = S::Item;

    fn next(&mut self) -> Option<S::Item> {
        let mut record = self.shared.record.borrow_mut();
        if self.position >= record.buffer.len() && !record.advance() {
            return None;
        }
        let value = record.buffer[self.position].clone();
        self.position += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let record = self.shared.record.borrow();
        let buffered = record.buffer.len().saturating_sub(self.position);
        if record.exhausted {
            (buffered, Some(buffered))
        } else {
            (buffered, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{from, from_fn, once};
    use crate::SequenceExt;
    use std::cell::Cell;

    #[test]
    fn test_sequential_replay_does_not_repull() {
        let pulls = Cell::new(0);
        let cached = from(vec![1, 2, 3])
            .inspect(|_| pulls.set(pulls.get() + 1))
            .cache();
        assert_eq!(cached.to_vec().unwrap(), vec![1, 2, 3]);
        assert_eq!(cached.to_vec().unwrap(), vec![1, 2, 3]);
        assert_eq!(pulls.get(), 3);
        assert!(cached.is_exhausted());
    }

    #[test]
    fn test_interleaved_readers_round_robin() {
        let pulls = Cell::new(0);
        let cached = from(vec![1, 2, 3])
            .inspect(|_| pulls.set(pulls.get() + 1))
            .cache();
        let mut a = cached.traverse().unwrap();
        let mut b = cached.traverse().unwrap();

        let mut delivered = Vec::new();
        for _ in 0..3 {
            delivered.push(('a', a.next()));
            delivered.push(('b', b.next()));
        }
        assert_eq!(
            delivered,
            vec![
                ('a', Some(1)),
                ('b', Some(1)),
                ('a', Some(2)),
                ('b', Some(2)),
                ('a', Some(3)),
                ('b', Some(3)),
            ]
        );
        assert_eq!(a.next(), None);
        assert_eq!(b.next(), None);
        assert_eq!(pulls.get(), 3);
    }

    #[test]
    fn test_late_reader_replays_then_continues() {
        let cached = from_fn(|| 1..=4).cache();
        let mut early = cached.traverse().unwrap();
        assert_eq!(early.next(), Some(1));
        assert_eq!(early.next(), Some(2));
        assert_eq!(cached.buffered(), 2);

        let late: Vec<i32> = cached.traverse().unwrap().collect();
        assert_eq!(late, vec![1, 2, 3, 4]);
        assert_eq!(early.next(), Some(3));
        assert_eq!(early.next(), Some(4));
        assert_eq!(early.next(), None);
    }

    #[test]
    fn test_cache_makes_run_once_replayable() {
        let cached = once(vec!['x', 'y']).cache();
        assert_eq!(cached.to_vec().unwrap(), vec!['x', 'y']);
        assert_eq!(cached.to_vec().unwrap(), vec!['x', 'y']);
    }

    #[test]
    fn test_clones_share_record() {
        let cached = from_fn(|| vec![5, 6]).cache();
        let copy = cached.clone();
        assert_eq!(cached.first().unwrap(), Some(5));
        assert_eq!(copy.buffered(), 1);
    }

    #[test]
    fn test_len_hint() {
        let cached = from_fn(|| vec![1, 2]).cache();
        assert_eq!(cached.len_hint(), LenHint::Unknown);
        cached.to_vec().unwrap();
        assert_eq!(cached.len_hint(), LenHint::Known(2));
    }

    /// Counts up to `limit` and flags `released` when dropped.
    struct Guarded<'a> {
        next: u32,
        limit: u32,
        released: &'a Cell<bool>,
    }

    impl Iterator for Guarded<'_> {
        type Item = u32;

        fn next(&mut self) -> Option<u32> {
            if self.next == self.limit {
                return None;
            }
            self.next += 1;
            Some(self.next - 1)
        }
    }

    impl Drop for Guarded<'_> {
        fn drop(&mut self) {
            self.released.set(true);
        }
    }

    #[test]
    fn test_releases_source_when_exhausted() {
        let released = Cell::new(false);
        let cached = from_fn(|| Guarded {
            next: 0,
            limit: 2,
            released: &released,
        })
        .cache();
        let mut reader = cached.traverse().unwrap();
        assert_eq!(reader.next(), Some(0));
        assert!(!released.get());
        assert_eq!(reader.next(), Some(1));
        assert_eq!(reader.next(), None);
        assert!(released.get());
    }
}
