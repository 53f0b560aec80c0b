use crate::error::Result;
use crate::hint::LenHint;
use crate::seq::Sequence;
use crate::source::{Items, ItemsIter};
use ahash::AHashMap as HashMap;
use std::hash::Hash;
use std::rc::Rc;
use tracing::debug;

/// A key and the elements that share it.
///
/// Each grouping is itself a restartable sequence over its elements, in the
/// order they appeared in the source.
#[derive(Debug, Clone)]
pub struct Grouping<K, V> {
    key: K,
    items: Items<V>,
}

impl<K, V> Grouping<K, V> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn items(&self) -> &[V] {
        self.items.as_slice()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<K, V: Clone> Sequence for Grouping<K, V> {
    type Item = V;
    type Iter = ItemsIter<V>;

    fn traverse(&self) -> Result<Self::Iter> {
        self.items.traverse()
    }

    fn len_hint(&self) -> LenHint {
        self.items.len_hint()
    }
}

/// Buckets elements by key in first-seen key order.
///
/// The source is consumed in one full pass when the traversal is first
/// advanced; no grouping is available before every key is known.
pub struct GroupBy<S, KF, VF> {
    source: S,
    key: Rc<KF>,
    value: Rc<VF>,
}

impl<S, KF, VF> GroupBy<S, KF, VF> {
    pub(crate) fn new(source: S, key: KF, value: VF) -> Self {
        Self {
            source,
            key: Rc::new(key),
            value: Rc::new(value),
        }
    }
}

impl<S: Clone, KF, VF> Clone for GroupBy<S, KF, VF> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            key: Rc::clone(&self.key),
            value: Rc::clone(&self.value),
        }
    }
}

impl<S, KF, VF, K, V> Sequence for GroupBy<S, KF, VF>
where
    S: Sequence,
    KF: Fn(&S::Item) -> K,
    VF: Fn(S::Item) -> V,
    K: Hash + Eq + Clone,
{
    type Item = Grouping<K, V>;
    type Iter = GroupIter<S::Iter, KF, VF, K, V>;

    fn traverse(&self) -> Result<Self::Iter> {
        Ok(GroupIter {
            pending: Some(self.source.traverse()?),
            groups: Vec::new().into_iter(),
            key: Rc::clone(&self.key),
            value: Rc::clone(&self.value),
        })
    }
}

pub struct GroupIter<I, KF, VF, K, V> {
    pending: Option<I>,
    groups: std::vec::IntoIter<Grouping<K, V>>,
    key: Rc<KF>,
    value: Rc<VF>,
}

impl<I, KF, VF, K, V> GroupIter<I, KF, VF, K, V>
where
    I: Iterator,
    KF: Fn(&I::Item) -> K,
    VF: Fn(I::Item) -> V,
    K: Hash + Eq + Clone,
{
    fn collect_groups(&self, source: I) -> Vec<Grouping<K, V>> {
        let mut index: HashMap<K, usize> = HashMap::default();
        let mut buckets: Vec<(K, Vec<V>)> = Vec::new();
        let mut total = 0usize;

        for item in source {
            let key = (self.key)(&item);
            let value = (self.value)(item);
            total += 1;
            match index.get(&key) {
                Some(&slot) => buckets[slot].1.push(value),
                None => {
                    index.insert(key.clone(), buckets.len());
                    buckets.push((key, vec![value]));
                }
            }
        }

        debug!(groups = buckets.len(), elements = total, "grouped sequence");
        buckets
            .into_iter()
            .map(|(key, values)| Grouping {
                key,
                items: Items::new(values),
            })
            .collect()
    }
}

impl<I, KF, VF, K, V> Iterator for GroupIter<I, KF, VF, K, V>
where
    I: Iterator,
    KF: Fn(&I::Item) -> K,
    VF: Fn(I::Item) -> V,
    K: Hash + Eq + Clone,
{
    type Item = Grouping<K, V>;

    fn next(&mut self) -> Option<Grouping<K, V>> {
        if let Some(source) = self.pending.take() {
            self.groups = self.collect_groups(source).into_iter();
        }
        self.groups.next()
    }
}

#[cfg(test)]
mod tests {
    use crate::source::from;
    use crate::{Sequence, SequenceExt};

    #[test]
    fn test_group_by_first_seen_order() {
        let groups = from(vec![1, 2, 1, 2, 3]).group_by(|x| *x).to_vec().unwrap();
        let keys: Vec<i32> = groups.iter().map(|g| *g.key()).collect();
        assert_eq!(keys, vec![1, 2, 3]);
        assert_eq!(groups[0].items(), &[1, 1]);
        assert_eq!(groups[1].items(), &[2, 2]);
        assert_eq!(groups[2].items(), &[3]);
    }

    #[test]
    fn test_grouping_is_retraversable() {
        let groups = from(vec!["apple", "avocado", "banana"])
            .group_by(|s| s.chars().next())
            .to_vec()
            .unwrap();
        let a = &groups[0];
        assert_eq!(a.key(), &Some('a'));
        assert_eq!(a.to_vec().unwrap(), vec!["apple", "avocado"]);
        assert_eq!(a.to_vec().unwrap(), vec!["apple", "avocado"]);
        assert_eq!(a.len_hint().known(), Some(2));
    }

    #[test]
    fn test_group_by_map_projects_values() {
        let groups = from(vec![(1, 'a'), (2, 'b'), (1, 'c')])
            .group_by_map(|(k, _)| *k, |(_, v)| v)
            .to_vec()
            .unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].items(), &['a', 'c']);
        assert_eq!(groups[1].items(), &['b']);
    }

    #[test]
    fn test_group_by_empty() {
        let groups = from(Vec::<u8>::new()).group_by(|x| *x);
        assert_eq!(groups.count().unwrap(), 0);
    }

    #[test]
    fn test_group_by_runs_on_first_advance() {
        use std::cell::Cell;
        let pulls = Cell::new(0);
        let groups = from(vec![1, 2, 3])
            .inspect(|_| pulls.set(pulls.get() + 1))
            .group_by(|x| x % 2);
        let mut iter = groups.traverse().unwrap();
        assert_eq!(pulls.get(), 0);
        assert!(iter.next().is_some());
        assert_eq!(pulls.get(), 3);
    }
}
