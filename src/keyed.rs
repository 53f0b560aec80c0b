//! Per-key lazily populated caches over one shared source pass.

use crate::error::Result;
use crate::seq::Sequence;
use ahash::AHashMap as HashMap;
use std::cell::RefCell;
use std::hash::Hash;
use std::rc::Rc;
use tracing::{debug, trace};

struct KeyedRecord<K, I: Iterator> {
    buckets: HashMap<K, Vec<I::Item>>,
    /// Keys in first-seen order.
    keys: Vec<K>,
    traversal: Option<I>,
    exhausted: bool,
}

struct KeyedShared<S: Sequence, K, KF> {
    source: S,
    key: KF,
    record: RefCell<KeyedRecord<K, S::Iter>>,
}

impl<S, K, KF> KeyedShared<S, K, KF>
where
    S: Sequence,
    K: Hash + Eq + Clone,
    KF: Fn(&S::Item) -> K,
{
    fn start(&self) -> Result<()> {
        let mut record = self.record.borrow_mut();
        if record.traversal.is_none() && !record.exhausted {
            trace!("starting keyed store traversal");
            record.traversal = Some(self.source.traverse()?);
        }
        Ok(())
    }
}

/// Splits one pass over a source into per-key sequences.
///
/// Reading the sequence for one key advances the shared traversal as far as
/// needed; elements for other keys met on the way are buffered under their
/// own key until a reader for that key catches up. Like
/// [`Cache`](crate::Cache), the source is pulled once in total.
pub struct StoreByKey<S: Sequence, K, KF> {
    shared: Rc<KeyedShared<S, K, KF>>,
}

impl<S, K, KF> StoreByKey<S, K, KF>
where
    S: Sequence,
    K: Hash + Eq + Clone,
    KF: Fn(&S::Item) -> K,
{
    pub(crate) fn new(source: S, key: KF) -> Self {
        Self {
            shared: Rc::new(KeyedShared {
                source,
                key,
                record: RefCell::new(KeyedRecord {
                    buckets: HashMap::default(),
                    keys: Vec::new(),
                    traversal: None,
                    exhausted: false,
                }),
            }),
        }
    }

    /// The sequence of elements whose key equals `key`.
    pub fn get(&self, key: K) -> KeyedCache<S, K, KF> {
        KeyedCache {
            shared: Rc::clone(&self.shared),
            key,
        }
    }

    /// Keys met so far, in first-seen order.
    pub fn keys_seen(&self) -> Vec<K> {
        self.shared.record.borrow().keys.clone()
    }

    pub fn is_exhausted(&self) -> bool {
        self.shared.record.borrow().exhausted
    }
}

impl<S: Sequence, K, KF> Clone for StoreByKey<S, K, KF> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

/// The elements of a [`StoreByKey`] that share one key.
pub struct KeyedCache<S: Sequence, K, KF> {
    shared: Rc<KeyedShared<S, K, KF>>,
    key: K,
}

impl<S: Sequence, K: Clone, KF> Clone for KeyedCache<S, K, KF> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
            key: self.key.clone(),
        }
    }
}

impl<S: Sequence, K, KF> KeyedCache<S, K, KF> {
    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<S, K, KF> Sequence for KeyedCache<S, K, KF>
where
    S: Sequence,
    S::Item: Clone,
    K: Hash + Eq + Clone,
    KF: Fn(&S::Item) -> K,
{
    type Item = S::Item;
    type Iter = KeyedReader<S, K, KF>;

    fn traverse(&self) -> Result<Self::Iter> {
        self.shared.start()?;
        Ok(KeyedReader {
            shared: Rc::clone(&self.shared),
            key: self.key.clone(),
            position: 0,
        })
    }
}

pub struct KeyedReader<S: Sequence, K, KF> {
    shared: Rc<KeyedShared<S, K, KF>>,
    key: K,
    position: usize,
}

impl<S, K, KF> Iterator for KeyedReader<S, K, KF>
where
    S: Sequence,
    S::Item: Clone,
    K: Hash + Eq + Clone,
    KF: Fn(&S::Item) -> K,
{
    type Item = S::Item;

    /// The record stays borrowed while the upstream iterator is advanced, so
    /// the source itself must not read this store. The key function runs
    /// with the record released and may inspect it.
    fn next(&mut self) -> Option<S::Item> {
        let shared = &*self.shared;
        loop {
            let pulled = {
                let mut record = shared.record.borrow_mut();
                if let Some(value) = record
                    .buckets
                    .get(&self.key)
                    .and_then(|bucket| bucket.get(self.position))
                {
                    let value = value.clone();
                    self.position += 1;
                    return Some(value);
                }
                if record.exhausted {
                    return None;
                }
                match record.traversal.as_mut().and_then(Iterator::next) {
                    Some(value) => value,
                    None => {
                        record.exhausted = true;
                        record.traversal = None;
                        debug!(keys = record.keys.len(), "keyed store source exhausted");
                        return None;
                    }
                }
            };

            let key = (shared.key)(&pulled);
            let mut record = shared.record.borrow_mut();
            if !record.buckets.contains_key(&key) {
                trace!(keys = record.keys.len() + 1, "new key in keyed store");
                record.keys.push(key.clone());
            }
            record.buckets.entry(key).or_default().push(pulled);
        }
    }
}
