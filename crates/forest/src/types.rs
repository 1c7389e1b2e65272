//! Node trait definitions.
//!
//! Each "pointer" is an `Option<u32>` index into a [`Vec`]-backed arena owned
//! by the tree. All tree-manipulation functions take the arena as
//! `&mut [N]` and work with indices.

/// Parent / left / right links.
pub trait Node {
    fn p(&self) -> Option<u32>;
    fn l(&self) -> Option<u32>;
    fn r(&self) -> Option<u32>;
    fn set_p(&mut self, v: Option<u32>);
    fn set_l(&mut self, v: Option<u32>);
    fn set_r(&mut self, v: Option<u32>);
}

/// Height-balanced node carrying a cached summary of its subtree.
///
/// The summary is whatever the tree needs to index by: an element count for
/// [`IndexedTree`](crate::IndexedTree), per-colour counts for
/// [`Barcode`](crate::Barcode).
pub trait AvlNode: Node {
    type Summary: Copy + Default;

    fn height(&self) -> u32;
    fn set_height(&mut self, height: u32);

    /// Summary of the whole subtree rooted at this node.
    fn summary(&self) -> Self::Summary;

    /// Recomputes the cached subtree summary from the children's summaries.
    fn refresh(&mut self, left: Self::Summary, right: Self::Summary);
}

/// Comparator used by sorted trees.
pub type Comparator<V> = dyn Fn(&V, &V) -> std::cmp::Ordering;
