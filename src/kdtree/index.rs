use log::debug;
use tinyvec::TinyVec;

use crate::descriptor::Descriptor;
use crate::indices::Permutation;
use crate::kdtree::KDTreeIndex;

/// One node of the flat node arena.
///
/// Leaves cover the half-open range `start..end` of record positions. Split nodes refer to their
/// children by arena index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum NodeEntry {
    Leaf {
        start: usize,
        end: usize,
    },
    Split {
        dim: usize,
        value: f64,
        left: usize,
        right: usize,
    },
}

/// The node storage and metadata shared by every k-d tree flavor.
///
/// Nodes are stored in post-order: both children of a split node precede it, and the root is the
/// last node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeArena {
    pub(crate) nodes: Vec<NodeEntry>,
    pub(crate) num_items: usize,
    pub(crate) dimension: usize,
    pub(crate) leaf_size: usize,
    pub(crate) depth: usize,
}

impl NodeArena {
    /// The number of records indexed.
    pub fn num_items(&self) -> usize {
        self.num_items
    }

    /// The descriptor dimension shared by all indexed records.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// The maximum number of records placed in a leaf when a split is still possible.
    pub fn leaf_size(&self) -> usize {
        self.leaf_size
    }

    /// The total number of nodes, leaves and split nodes together.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// The number of leaf nodes.
    pub fn num_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, NodeEntry::Leaf { .. }))
            .count()
    }

    /// The number of edges on the longest root-to-leaf path. A tree that is a single leaf has
    /// depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub(crate) fn root_id(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Drop every node, children before parents, and report how many were released.
    pub(crate) fn release(mut self) -> usize {
        // post-order storage: draining front to back visits children first
        let released = self.nodes.drain(..).count();
        debug!(
            "released k-d tree of {} records ({} nodes)",
            self.num_items, released
        );
        released
    }
}

/// The depth of the tree rooted at the last node of a post-order arena.
pub(crate) fn compute_depth(nodes: &[NodeEntry]) -> usize {
    let Some(root) = nodes.len().checked_sub(1) else {
        return 0;
    };

    // Use TinyVec to avoid heap allocations
    let mut stack: TinyVec<[(usize, usize); 33]> = TinyVec::new();
    stack.push((root, 0));

    let mut max_depth = 0;
    while let Some((id, depth)) = stack.pop() {
        match nodes[id] {
            NodeEntry::Leaf { .. } => max_depth = max_depth.max(depth),
            NodeEntry::Split { left, right, .. } => {
                stack.push((left, depth + 1));
                stack.push((right, depth + 1));
            }
        }
    }
    max_depth
}

/// A k-d tree built in place over a caller-owned slice of records.
///
/// Building reorders the slice; leaves reference contiguous runs of it. The slice stays borrowed
/// for the lifetime of the tree, so records always outlive it.
///
/// Usually this will be created via [`KDTreeBuilder::build`][crate::kdtree::KDTreeBuilder::build].
#[derive(Debug)]
pub struct KDTree<'a, F: Descriptor> {
    pub(crate) records: &'a [F],
    pub(crate) arena: NodeArena,
}

impl<'a, F: Descriptor> KDTree<'a, F> {
    /// The records in tree order.
    pub fn records(&self) -> &'a [F] {
        self.records
    }
}

/// A k-d tree built over a caller-owned slice of records without reordering it.
///
/// A private [`Permutation`] carries the tree order instead.
///
/// Usually this will be created via
/// [`KDTreeBuilder::build_indexed`][crate::kdtree::KDTreeBuilder::build_indexed].
#[derive(Debug)]
pub struct IndexedKDTree<'a, F: Descriptor> {
    pub(crate) records: &'a [F],
    pub(crate) ids: Permutation,
    pub(crate) arena: NodeArena,
}

impl<'a, F: Descriptor> IndexedKDTree<'a, F> {
    /// The records in their original order.
    pub fn records(&self) -> &'a [F] {
        self.records
    }

    /// The tree order: position `i` of the tree holds `records()[permutation().get(i)]`.
    pub fn permutation(&self) -> &Permutation {
        &self.ids
    }
}

impl<'a, F: Descriptor + 'a> KDTreeIndex<'a, F> for KDTree<'a, F> {
    fn arena(&self) -> &NodeArena {
        &self.arena
    }

    #[inline]
    fn record_at(&self, pos: usize) -> &'a F {
        let records: &'a [F] = self.records;
        &records[pos]
    }

    fn release(self) -> usize {
        self.arena.release()
    }
}

impl<'a, F: Descriptor + 'a> KDTreeIndex<'a, F> for IndexedKDTree<'a, F> {
    fn arena(&self) -> &NodeArena {
        &self.arena
    }

    #[inline]
    fn record_at(&self, pos: usize) -> &'a F {
        let records: &'a [F] = self.records;
        &records[self.ids.get(pos)]
    }

    fn release(self) -> usize {
        self.arena.release()
    }
}

/// Release a tree if there is one.
///
/// Releasing `None` is a no-op and returns 0. Otherwise the number of released nodes is returned.
/// A tree cannot be released twice: release consumes it.
pub fn release<'a, F, T>(tree: Option<T>) -> usize
where
    F: Descriptor + 'a,
    T: KDTreeIndex<'a, F>,
{
    tree.map_or(0, |tree| tree.release())
}
