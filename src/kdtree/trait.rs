use geo_traits::RectTrait;

use crate::descriptor::{Descriptor, LocationKind};
use crate::error::Result;
use crate::kdtree::bbf::bbf_knn;
use crate::kdtree::candidates::Neighbor;
use crate::kdtree::index::NodeArena;
use crate::kdtree::traversal::Node;
use crate::r#type::contains;

/// A trait for searching and accessing data out of a k-d tree.
///
/// Trees are immutable once built. Any number of searches may run against the same tree, from any
/// number of threads when the records are `Sync`.
pub trait KDTreeIndex<'a, F: Descriptor + 'a>: Sized {
    /// Access the node storage and metadata of this tree.
    fn arena(&self) -> &NodeArena;

    /// The record at tree position `pos`. Leaves cover contiguous runs of positions.
    fn record_at(&self, pos: usize) -> &'a F;

    /// Release every node of this tree, children before parents, and return how many nodes were
    /// released. The records are left untouched.
    fn release(self) -> usize;

    /// The number of records in this tree.
    fn num_items(&self) -> usize {
        self.arena().num_items()
    }

    /// The descriptor dimension of this tree.
    fn dimension(&self) -> usize {
        self.arena().dimension()
    }

    /// The maximum leaf size this tree was built with.
    fn leaf_size(&self) -> usize {
        self.arena().leaf_size()
    }

    /// The total number of nodes in this tree.
    fn num_nodes(&self) -> usize {
        self.arena().num_nodes()
    }

    /// The length of the longest root-to-leaf path.
    fn depth(&self) -> usize {
        self.arena().depth()
    }

    /// Find the approximate `k` nearest neighbors of `query` by Best-Bin-First search.
    ///
    /// The search stops once `max_checks` records have been examined, so nearer records may be
    /// missed. It is exact when `max_checks >= self.num_items()`.
    ///
    /// Returns at most `min(k, self.num_items())` neighbors in ascending order of squared
    /// descriptor distance. `max_checks == 0` returns no neighbors.
    ///
    /// # Errors
    ///
    /// `k == 0`, a query of the wrong dimension, or a non-finite query component.
    fn knn<Q>(&self, query: &Q, k: usize, max_checks: usize) -> Result<Vec<Neighbor<'a, F>>>
    where
        Q: Descriptor<Num = F::Num> + ?Sized,
    {
        bbf_knn(self, query.descriptor(), k, max_checks, |_| true)
    }

    /// Like [`knn`][Self::knn], but only records whose location of the given `kind` lies inside
    /// `rect` (bounds inclusive) may be returned.
    ///
    /// Records outside `rect` still count against `max_checks`. Records without a model location
    /// never qualify when `kind` is [`LocationKind::Model`].
    fn spatial_knn<Q>(
        &self,
        query: &Q,
        k: usize,
        max_checks: usize,
        rect: &impl RectTrait<T = f64>,
        kind: LocationKind,
    ) -> Result<Vec<Neighbor<'a, F>>>
    where
        Q: Descriptor<Num = F::Num> + ?Sized,
    {
        bbf_knn(self, query.descriptor(), k, max_checks, |record| {
            record
                .location(kind)
                .is_some_and(|point| contains(rect, &point))
        })
    }

    /// Access the root node of the tree for manual traversal.
    fn root(&self) -> Node<'_, 'a, F, Self> {
        Node::from_root(self)
    }
}
