//! Utilities to traverse the k-d tree structure.

use std::fmt;
use std::marker::PhantomData;
use std::ops::Range;

use crate::descriptor::Descriptor;
use crate::kdtree::index::NodeEntry;
use crate::kdtree::KDTreeIndex;

/// A node in the k-d tree: either a leaf holding a run of records or a split with two children.
pub struct Node<'t, 'a, F: Descriptor + 'a, T: KDTreeIndex<'a, F>> {
    /// The tree that this node is a reference onto
    tree: &'t T,

    /// Index into the node arena
    id: usize,

    phantom: PhantomData<&'a F>,
}

impl<'t, 'a, F: Descriptor + 'a, T: KDTreeIndex<'a, F>> Node<'t, 'a, F, T> {
    pub(crate) fn from_root(tree: &'t T) -> Self {
        Self::new(tree, tree.arena().root_id())
    }

    fn new(tree: &'t T, id: usize) -> Self {
        Self {
            tree,
            id,
            phantom: PhantomData,
        }
    }

    #[inline]
    fn entry(&self) -> NodeEntry {
        self.tree.arena().nodes[self.id]
    }

    /// Returns `true` if this is a leaf node without children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.entry(), NodeEntry::Leaf { .. })
    }

    /// Returns `true` if this is a split node with children.
    #[inline]
    pub fn is_parent(&self) -> bool {
        !self.is_leaf()
    }

    /// The descriptor component this node splits on. `None` for leaves.
    pub fn split_dimension(&self) -> Option<usize> {
        match self.entry() {
            NodeEntry::Split { dim, .. } => Some(dim),
            NodeEntry::Leaf { .. } => None,
        }
    }

    /// The split value. Every record under the left child has a component no greater than this
    /// and every record under the right child has one no smaller. `None` for leaves.
    pub fn split_value(&self) -> Option<f64> {
        match self.entry() {
            NodeEntry::Split { value, .. } => Some(value),
            NodeEntry::Leaf { .. } => None,
        }
    }

    /// The child node holding records on the low side of the split. `None` for leaves.
    pub fn left_child(&self) -> Option<Self> {
        match self.entry() {
            NodeEntry::Split { left, .. } => Some(Self::new(self.tree, left)),
            NodeEntry::Leaf { .. } => None,
        }
    }

    /// The child node holding records on the high side of the split. `None` for leaves.
    pub fn right_child(&self) -> Option<Self> {
        match self.entry() {
            NodeEntry::Split { right, .. } => Some(Self::new(self.tree, right)),
            NodeEntry::Leaf { .. } => None,
        }
    }

    /// The records stored directly at this node. Empty for split nodes.
    pub fn records(&self) -> LeafRecords<'t, 'a, F, T> {
        let positions = match self.entry() {
            NodeEntry::Leaf { start, end } => start..end,
            NodeEntry::Split { .. } => 0..0,
        };
        LeafRecords {
            tree: self.tree,
            positions,
            phantom: PhantomData,
        }
    }
}

impl<'a, F: Descriptor + 'a, T: KDTreeIndex<'a, F>> Clone for Node<'_, 'a, F, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, F: Descriptor + 'a, T: KDTreeIndex<'a, F>> Copy for Node<'_, 'a, F, T> {}

impl<'a, F: Descriptor + 'a, T: KDTreeIndex<'a, F>> fmt::Debug for Node<'_, 'a, F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("entry", &self.entry())
            .finish()
    }
}

/// Iterator over the records of a leaf node.
pub struct LeafRecords<'t, 'a, F: Descriptor + 'a, T: KDTreeIndex<'a, F>> {
    tree: &'t T,
    positions: Range<usize>,
    phantom: PhantomData<&'a F>,
}

impl<'a, F: Descriptor + 'a, T: KDTreeIndex<'a, F>> Iterator for LeafRecords<'_, 'a, F, T> {
    type Item = &'a F;

    fn next(&mut self) -> Option<Self::Item> {
        self.positions.next().map(|pos| self.tree.record_at(pos))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.positions.size_hint()
    }
}

impl<'a, F: Descriptor + 'a, T: KDTreeIndex<'a, F>> ExactSizeIterator
    for LeafRecords<'_, 'a, F, T>
{
}

impl<'a, F: Descriptor + 'a, T: KDTreeIndex<'a, F>> fmt::Debug for LeafRecords<'_, 'a, F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafRecords")
            .field("positions", &self.positions)
            .finish()
    }
}
