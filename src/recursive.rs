//! Recursive expansion over tree-shaped elements.
//!
//! Both walkers keep an explicit stack of child traversals instead of
//! recursing, so depth is bounded only by memory.

use crate::error::Result;
use crate::seq::Sequence;
use std::rc::Rc;

/// What a [`Nested`] value turns into when expanded one level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion<L, C> {
    Leaf(L),
    Branch(C),
}

/// Values that may contain further values of the same kind.
pub trait Nested: Sized {
    type Leaf;
    type Children: IntoIterator<Item = Self>;

    fn expand(self) -> Expansion<Self::Leaf, Self::Children>;
}

/// A simple nested value: a leaf or a list of subtrees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tree<T> {
    Leaf(T),
    Node(Vec<Tree<T>>),
}

impl<T> Nested for Tree<T> {
    type Leaf = T;
    type Children = Vec<Tree<T>>;

    fn expand(self) -> Expansion<T, Vec<Tree<T>>> {
        match self {
            Tree::Leaf(value) => Expansion::Leaf(value),
            Tree::Node(children) => Expansion::Branch(children),
        }
    }
}

/// Yields the leaves of nested elements, depth-first, to any depth.
#[derive(Clone)]
pub struct Flatten<S> {
    source: S,
}

impl<S> Flatten<S> {
    pub(crate) fn new(source: S) -> Self {
        Self { source }
    }
}

impl<S> Sequence for Flatten<S>
where
    S: Sequence,
    S::Item: Nested,
{
    type Item = <S::Item as Nested>::Leaf;
    type Iter = FlattenIter<S::Iter, S::Item>;

    fn traverse(&self) -> Result<Self::Iter> {
        Ok(FlattenIter {
            roots: self.source.traverse()?,
            stack: Vec::new(),
        })
    }
}

pub struct FlattenIter<I, N: Nested> {
    roots: I,
    stack: Vec<<N::Children as IntoIterator>::IntoIter>,
}

impl<I, N> Iterator for FlattenIter<I, N>
where
    I: Iterator<Item = N>,
    N: Nested,
{
    type Item = N::Leaf;

    fn next(&mut self) -> Option<N::Leaf> {
        loop {
            let candidate = match self.stack.last_mut() {
                Some(top) => match top.next() {
                    Some(node) => node,
                    None => {
                        // End of this level, resume the parent.
                        self.stack.pop();
                        continue;
                    }
                },
                None => self.roots.next()?,
            };
            match candidate.expand() {
                Expansion::Leaf(leaf) => return Some(leaf),
                Expansion::Branch(children) => self.stack.push(children.into_iter()),
            }
        }
    }
}

/// Whether a parent is emitted before or after its descendants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WalkOrder {
    #[default]
    PreOrder,
    PostOrder,
}

/// Depth-first walk over the elements of a sequence and their descendants.
///
/// `children_of` lists the children of an element. The optional filter sees
/// each element with its index among its siblings; a rejected element is
/// neither emitted nor descended into.
pub struct TraverseTree<S, CF, FF> {
    source: S,
    children_of: Rc<CF>,
    filter: Option<Rc<FF>>,
    order: WalkOrder,
}

impl<S, CF, FF> TraverseTree<S, CF, FF> {
    pub(crate) fn new(source: S, children_of: CF, filter: Option<FF>, order: WalkOrder) -> Self {
        Self {
            source,
            children_of: Rc::new(children_of),
            filter: filter.map(Rc::new),
            order,
        }
    }
}

impl<S: Clone, CF, FF> Clone for TraverseTree<S, CF, FF> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            children_of: Rc::clone(&self.children_of),
            filter: self.filter.clone(),
            order: self.order,
        }
    }
}

impl<S, CF, FF, C> Sequence for TraverseTree<S, CF, FF>
where
    S: Sequence,
    CF: Fn(&S::Item) -> C,
    C: IntoIterator<Item = S::Item>,
    FF: Fn(&S::Item, usize) -> bool,
{
    type Item = S::Item;
    type Iter = TraverseTreeIter<S::Iter, C::IntoIter, CF, FF>;

    fn traverse(&self) -> Result<Self::Iter> {
        Ok(TraverseTreeIter {
            roots: self.source.traverse()?,
            root_index: 0,
            stack: Vec::new(),
            children_of: Rc::clone(&self.children_of),
            filter: self.filter.clone(),
            order: self.order,
        })
    }
}

struct Frame<T, CI> {
    /// Held back until the children are done; only used for post-order.
    parent: Option<T>,
    children: CI,
    next_index: usize,
}

pub struct TraverseTreeIter<RI: Iterator, CI, CF, FF> {
    roots: RI,
    root_index: usize,
    stack: Vec<Frame<RI::Item, CI>>,
    children_of: Rc<CF>,
    filter: Option<Rc<FF>>,
    order: WalkOrder,
}

impl<RI, CI, CF, FF, C> Iterator for TraverseTreeIter<RI, CI, CF, FF>
where
    RI: Iterator,
    CI: Iterator<Item = RI::Item>,
    CF: Fn(&RI::Item) -> C,
    C: IntoIterator<Item = RI::Item, IntoIter = CI>,
    FF: Fn(&RI::Item, usize) -> bool,
{
    type Item = RI::Item;

    fn next(&mut self) -> Option<RI::Item> {
        loop {
            let step = match self.stack.last_mut() {
                Some(frame) => frame.children.next().map(|child| {
                    frame.next_index += 1;
                    (child, frame.next_index - 1)
                }),
                None => {
                    let root = self.roots.next()?;
                    self.root_index += 1;
                    Some((root, self.root_index - 1))
                }
            };

            let Some((item, index)) = step else {
                // Top frame is out of children.
                if let Some(Frame {
                    parent: Some(parent),
                    ..
                }) = self.stack.pop()
                {
                    return Some(parent);
                }
                continue;
            };

            if let Some(filter) = &self.filter {
                if !filter(&item, index) {
                    continue;
                }
            }

            let children = (self.children_of)(&item).into_iter();
            match self.order {
                WalkOrder::PreOrder => {
                    self.stack.push(Frame {
                        parent: None,
                        children,
                        next_index: 0,
                    });
                    return Some(item);
                }
                WalkOrder::PostOrder => self.stack.push(Frame {
                    parent: Some(item),
                    children,
                    next_index: 0,
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::from;
    use crate::SequenceExt;

    fn sample() -> Vec<Tree<i32>> {
        vec![
            Tree::Leaf(1),
            Tree::Node(vec![
                Tree::Leaf(2),
                Tree::Node(vec![Tree::Leaf(3), Tree::Node(vec![])]),
            ]),
            Tree::Leaf(4),
        ]
    }

    #[test]
    fn test_flatten_any_depth() {
        let flat = from(sample()).flatten();
        assert_eq!(flat.to_vec().unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_flatten_deep_nesting() {
        let mut tree = Tree::Leaf(0);
        for _ in 0..1_000 {
            tree = Tree::Node(vec![tree]);
        }
        let flat = from(vec![tree]).flatten();
        assert_eq!(flat.to_vec().unwrap(), vec![0]);
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Dir {
        name: &'static str,
        children: Vec<Dir>,
    }

    fn dir(name: &'static str, children: Vec<Dir>) -> Dir {
        Dir { name, children }
    }

    fn fs() -> Vec<Dir> {
        vec![dir(
            "root",
            vec![
                dir("a", vec![dir("a1", vec![]), dir("a2", vec![])]),
                dir("b", vec![dir("b1", vec![])]),
            ],
        )]
    }

    fn names(dirs: Vec<Dir>) -> Vec<&'static str> {
        dirs.into_iter().map(|d| d.name).collect()
    }

    #[test]
    fn test_traverse_pre_order() {
        let walk = from(fs()).traverse_tree(|d: &Dir| d.children.clone(), WalkOrder::PreOrder);
        assert_eq!(
            names(walk.to_vec().unwrap()),
            vec!["root", "a", "a1", "a2", "b", "b1"]
        );
    }

    #[test]
    fn test_traverse_post_order() {
        let walk = from(fs()).traverse_tree(|d: &Dir| d.children.clone(), WalkOrder::PostOrder);
        assert_eq!(
            names(walk.to_vec().unwrap()),
            vec!["a1", "a2", "a", "b1", "b", "root"]
        );
    }

    #[test]
    fn test_filter_prunes_subtree_with_sibling_index() {
        // Index 1 among each sibling set is dropped with its descendants.
        let walk = from(fs()).traverse_tree_filtered(
            |d: &Dir| d.children.clone(),
            |_: &Dir, index| index != 1,
            WalkOrder::PreOrder,
        );
        assert_eq!(names(walk.to_vec().unwrap()), vec!["root", "a", "a1"]);
    }
}
