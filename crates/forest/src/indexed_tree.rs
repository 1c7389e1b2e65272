//! Index-addressable AVL tree.
//!
//! Every node caches the size of its subtree, so the position of a node is
//! recomputed on demand by walking parent links and accumulating left-subtree
//! sizes. No index is stored, because indices shift on every insert or remove
//! elsewhere in the tree.
//!
//! A tree is built either in sorted mode ([`IndexedTree::with_comparator`],
//! values placed by comparator) or in positional mode ([`IndexedTree::new`],
//! values placed at an explicit index). The two are never mixed on the same
//! instance.

use std::cmp::Ordering;

use crate::avl;
use crate::error::ForestError;
use crate::types::{AvlNode, Comparator, Node};

/// Stable handle to a value stored in an [`IndexedTree`].
///
/// The handle survives every insert and remove except the removal of its own
/// node; after that it is stale and operations on it fail with
/// [`ForestError::StaleNode`], even once the slot holds a newer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    slot: u32,
    generation: u32,
}

#[derive(Debug)]
struct TreeNode<V> {
    p: Option<u32>,
    l: Option<u32>,
    r: Option<u32>,
    height: u32,
    /// Number of values in this subtree, `left + 1 + right`.
    size: usize,
    /// Tree-wide allocation counter at the time the slot was filled.
    generation: u32,
    value: Option<V>,
}

impl<V> Node for TreeNode<V> {
    fn p(&self) -> Option<u32> {
        self.p
    }

    fn l(&self) -> Option<u32> {
        self.l
    }

    fn r(&self) -> Option<u32> {
        self.r
    }

    fn set_p(&mut self, v: Option<u32>) {
        self.p = v;
    }

    fn set_l(&mut self, v: Option<u32>) {
        self.l = v;
    }

    fn set_r(&mut self, v: Option<u32>) {
        self.r = v;
    }
}

impl<V> AvlNode for TreeNode<V> {
    type Summary = usize;

    fn height(&self) -> u32 {
        self.height
    }

    fn set_height(&mut self, height: u32) {
        self.height = height;
    }

    fn summary(&self) -> usize {
        self.size
    }

    fn refresh(&mut self, left: usize, right: usize) {
        self.size = left + 1 + right;
    }
}

enum Mode<V> {
    Positional,
    Sorted(Box<Comparator<V>>),
}

pub struct IndexedTree<V> {
    arena: Vec<TreeNode<V>>,
    free: Vec<u32>,
    root: Option<u32>,
    mode: Mode<V>,
    next_generation: u32,
}

impl<V> Default for IndexedTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> IndexedTree<V> {
    /// Creates an empty tree in positional mode.
    pub fn new() -> Self {
        Self {
            arena: Vec::new(),
            free: Vec::new(),
            root: None,
            mode: Mode::Positional,
            next_generation: 0,
        }
    }

    /// Creates an empty tree in sorted mode.
    pub fn with_comparator<C>(comparator: C) -> Self
    where
        C: Fn(&V, &V) -> Ordering + 'static,
    {
        Self {
            arena: Vec::new(),
            free: Vec::new(),
            root: None,
            mode: Mode::Sorted(Box::new(comparator)),
            next_generation: 0,
        }
    }

    pub fn len(&self) -> usize {
        avl::summary(&self.arena, self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn is_sorted(&self) -> bool {
        matches!(self.mode, Mode::Sorted(_))
    }

    fn alloc(&mut self, value: V) -> u32 {
        let generation = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1);
        let node = TreeNode {
            p: None,
            l: None,
            r: None,
            height: 1,
            size: 1,
            generation,
            value: Some(value),
        };
        match self.free.pop() {
            Some(i) => {
                self.arena[i as usize] = node;
                i
            }
            None => {
                self.arena.push(node);
                (self.arena.len() - 1) as u32
            }
        }
    }

    fn handle(&self, slot: u32) -> NodeId {
        NodeId {
            slot,
            generation: self.arena[slot as usize].generation,
        }
    }

    fn live(&self, id: NodeId) -> Result<u32, ForestError> {
        match self.arena.get(id.slot as usize) {
            Some(n) if n.value.is_some() && n.generation == id.generation => Ok(id.slot),
            _ => Err(ForestError::StaleNode),
        }
    }

    fn node_at(&self, mut index: usize) -> Option<u32> {
        let mut curr = self.root;
        while let Some(i) = curr {
            let n = &self.arena[i as usize];
            let left = avl::summary(&self.arena, n.l);
            match index.cmp(&left) {
                Ordering::Less => curr = n.l,
                Ordering::Equal => return Some(i),
                Ordering::Greater => {
                    index -= left + 1;
                    curr = n.r;
                }
            }
        }
        None
    }

    /// Inserts `value` at its comparator position (after any equal values).
    pub fn insert(&mut self, value: V) -> Result<NodeId, ForestError> {
        let Mode::Sorted(comparator) = &self.mode else {
            return Err(ForestError::WrongMode);
        };

        let mut anchor = None;
        let mut curr = self.root;
        while let Some(i) = curr {
            let existing = self.arena[i as usize]
                .value
                .as_ref()
                .expect("linked nodes hold a value");
            if comparator(&value, existing) == Ordering::Less {
                anchor = Some((i, true));
                curr = self.arena[i as usize].l;
            } else {
                anchor = Some((i, false));
                curr = self.arena[i as usize].r;
            }
        }

        let n = self.alloc(value);
        self.root = match anchor {
            None => avl::append(&mut self.arena, self.root, n),
            Some((p, true)) => avl::insert_before(&mut self.arena, self.root, n, p),
            Some((p, false)) => avl::insert_after(&mut self.arena, self.root, n, p),
        };
        Ok(self.handle(n))
    }

    /// Inserts `value` so that it ends up at `index`.
    pub fn insert_at(&mut self, index: usize, value: V) -> Result<NodeId, ForestError> {
        if self.is_sorted() {
            return Err(ForestError::WrongMode);
        }
        let len = self.len();
        if index > len {
            return Err(ForestError::IndexOutOfBounds { index, len });
        }

        let anchor = self.node_at(index);
        let n = self.alloc(value);
        self.root = match anchor {
            Some(a) => avl::insert_before(&mut self.arena, self.root, n, a),
            None => avl::append(&mut self.arena, self.root, n),
        };
        Ok(self.handle(n))
    }

    /// Handle of the node at `index`.
    pub fn get(&self, index: usize) -> Option<NodeId> {
        self.node_at(index).map(|i| self.handle(i))
    }

    pub fn get_value(&self, index: usize) -> Option<&V> {
        self.node_at(index)
            .and_then(|i| self.arena[i as usize].value.as_ref())
    }

    pub fn value(&self, id: NodeId) -> Result<&V, ForestError> {
        let i = self.live(id)?;
        Ok(self.arena[i as usize]
            .value
            .as_ref()
            .expect("live node holds a value"))
    }

    /// Replaces the value held by `id`. Only available in positional mode,
    /// where no ordering can be broken by the new value.
    pub fn set(&mut self, id: NodeId, value: V) -> Result<V, ForestError> {
        if self.is_sorted() {
            return Err(ForestError::WrongMode);
        }
        let i = self.live(id)?;
        Ok(self.arena[i as usize]
            .value
            .replace(value)
            .expect("live node holds a value"))
    }

    /// Current position of `id`.
    pub fn index_of(&self, id: NodeId) -> Result<usize, ForestError> {
        let mut curr = self.live(id)?;
        let mut index = avl::summary(&self.arena, self.arena[curr as usize].l);
        while let Some(p) = self.arena[curr as usize].p {
            if self.arena[p as usize].r == Some(curr) {
                index += avl::summary(&self.arena, self.arena[p as usize].l) + 1;
            }
            curr = p;
        }
        Ok(index)
    }

    /// Unlinks `id` from the tree and returns its value.
    pub fn remove(&mut self, id: NodeId) -> Result<V, ForestError> {
        let i = self.live(id)?;
        self.root = avl::remove(&mut self.arena, self.root, i);
        self.free.push(i);
        Ok(self.arena[i as usize]
            .value
            .take()
            .expect("live node holds a value"))
    }

    pub fn remove_at(&mut self, index: usize) -> Result<V, ForestError> {
        let len = self.len();
        let i = self
            .node_at(index)
            .ok_or(ForestError::IndexOutOfBounds { index, len })?;
        self.remove(self.handle(i))
    }

    /// Index of the first value comparing equal to `value` (sorted mode).
    pub fn find_index(&self, value: &V) -> Result<Option<usize>, ForestError> {
        let Mode::Sorted(comparator) = &self.mode else {
            return Err(ForestError::WrongMode);
        };

        let mut found = None;
        let mut offset = 0;
        let mut curr = self.root;
        while let Some(i) = curr {
            let n = &self.arena[i as usize];
            let existing = n.value.as_ref().expect("linked nodes hold a value");
            let left = avl::summary(&self.arena, n.l);
            match comparator(value, existing) {
                Ordering::Less => curr = n.l,
                Ordering::Greater => {
                    offset += left + 1;
                    curr = n.r;
                }
                Ordering::Equal => {
                    found = Some(offset + left);
                    curr = n.l;
                }
            }
        }
        Ok(found)
    }

    /// Handles in index order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut curr = avl::first(&self.arena, self.root);
        std::iter::from_fn(move || {
            let i = curr?;
            curr = avl::next(&self.arena, i);
            Some(self.handle(i))
        })
    }

    /// Values in index order.
    pub fn iter(&self) -> impl Iterator<Item = &V> + '_ {
        self.nodes()
            .filter_map(move |id| self.arena[id.slot as usize].value.as_ref())
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.free.clear();
        self.root = None;
    }

    /// Checks links, heights, cached sizes and (in sorted mode) value order.
    pub fn assert_valid(&self) -> Result<(), String> {
        avl::assert_avl(&self.arena, self.root)?;

        fn check_size<V>(arena: &[TreeNode<V>], node: Option<u32>) -> Result<usize, String> {
            let Some(i) = node else {
                return Ok(0);
            };
            let n = &arena[i as usize];
            if n.value.is_none() {
                return Err(format!("Linked node {i} holds no value"));
            }
            let size = check_size(arena, n.l)? + 1 + check_size(arena, n.r)?;
            if size != n.size {
                return Err(format!(
                    "Size mismatch at {i}: expected {size}, got {}",
                    n.size
                ));
            }
            Ok(size)
        }
        check_size(&self.arena, self.root)?;

        if let Mode::Sorted(comparator) = &self.mode {
            let mut prev: Option<&V> = None;
            for v in self.iter() {
                if let Some(p) = prev {
                    if comparator(p, v) == Ordering::Greater {
                        return Err("Node order violated".to_string());
                    }
                }
                prev = Some(v);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_insert_keeps_indices() {
        let mut tree = IndexedTree::new();
        let b = tree.insert_at(0, 'b').unwrap();
        let d = tree.insert_at(1, 'd').unwrap();
        let a = tree.insert_at(0, 'a').unwrap();
        let c = tree.insert_at(2, 'c').unwrap();

        assert_eq!(tree.iter().copied().collect::<String>(), "abcd");
        assert_eq!(tree.index_of(a).unwrap(), 0);
        assert_eq!(tree.index_of(b).unwrap(), 1);
        assert_eq!(tree.index_of(c).unwrap(), 2);
        assert_eq!(tree.index_of(d).unwrap(), 3);
        tree.assert_valid().unwrap();
    }

    #[test]
    fn insert_out_of_range_fails() {
        let mut tree = IndexedTree::new();
        tree.insert_at(0, 1).unwrap();
        assert_eq!(
            tree.insert_at(5, 2),
            Err(ForestError::IndexOutOfBounds { index: 5, len: 1 })
        );
    }

    #[test]
    fn modes_are_exclusive() {
        let mut positional = IndexedTree::new();
        assert_eq!(positional.insert(1), Err(ForestError::WrongMode));

        let mut sorted = IndexedTree::with_comparator(|a: &i32, b: &i32| a.cmp(b));
        assert_eq!(sorted.insert_at(0, 1), Err(ForestError::WrongMode));
    }

    #[test]
    fn sorted_insert_orders_values() {
        let mut tree = IndexedTree::with_comparator(|a: &i32, b: &i32| a.cmp(b));
        for v in [5, 1, 4, 1, 3, 9, 2] {
            tree.insert(v).unwrap();
            tree.assert_valid().unwrap();
        }
        assert_eq!(tree.iter().copied().collect::<Vec<_>>(), vec![1, 1, 2, 3, 4, 5, 9]);
        assert_eq!(tree.find_index(&1).unwrap(), Some(0));
        assert_eq!(tree.find_index(&4).unwrap(), Some(4));
        assert_eq!(tree.find_index(&7).unwrap(), None);
    }

    #[test]
    fn remove_with_two_children_keeps_handles() {
        let mut tree = IndexedTree::new();
        let ids: Vec<_> = (0..15).map(|i| tree.insert_at(i, i).unwrap()).collect();

        let root = tree.root.unwrap();
        let removed = tree.remove(tree.handle(root)).unwrap();
        tree.assert_valid().unwrap();

        for (i, id) in ids.iter().enumerate() {
            if id.slot == root {
                assert_eq!(tree.index_of(*id), Err(ForestError::StaleNode));
                continue;
            }
            let expected = if i < removed { i } else { i - 1 };
            assert_eq!(tree.index_of(*id).unwrap(), expected);
            assert_eq!(*tree.value(*id).unwrap(), i);
        }
    }

    #[test]
    fn reused_slot_does_not_revive_stale_handle() {
        let mut tree = IndexedTree::new();
        let a = tree.insert_at(0, "a").unwrap();
        tree.remove(a).unwrap();
        let b = tree.insert_at(0, "b").unwrap();
        assert_eq!(a.slot, b.slot);
        assert_ne!(a, b);
        assert_eq!(tree.value(a), Err(ForestError::StaleNode));
        assert_eq!(tree.index_of(a), Err(ForestError::StaleNode));
        assert_eq!(tree.remove(a), Err(ForestError::StaleNode));
        assert_eq!(*tree.value(b).unwrap(), "b");
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn clear_invalidates_handles() {
        let mut tree = IndexedTree::new();
        let a = tree.insert_at(0, 1).unwrap();
        tree.clear();
        let b = tree.insert_at(0, 2).unwrap();
        assert_ne!(a, b);
        assert_eq!(tree.value(a), Err(ForestError::StaleNode));
    }
}
