use std::cmp;

use log::debug;

use crate::descriptor::{check_finite, Descriptor};
use crate::error::{DescriptorIndexError, Result};
use crate::indices::Permutation;
use crate::kdtree::index::{compute_depth, IndexedKDTree, KDTree, NodeArena, NodeEntry};
use crate::r#type::DescriptorNum;

/// The default maximum number of records in a leaf.
pub const DEFAULT_LEAF_SIZE: usize = 1;

/// A builder to create a [`KDTree`] or an [`IndexedKDTree`].
///
/// ```
/// use descriptor_index::kdtree::{KDTreeBuilder, KDTreeIndex};
/// use descriptor_index::{Descriptor, Feature};
///
/// let mut features: Vec<Feature<f64>> = (0..5)
///     .map(|i| Feature::new(vec![i as f64, i as f64], i as f64, 0.))
///     .collect();
/// let tree = KDTreeBuilder::new().build(&mut features).unwrap();
///
/// let query = Feature::new(vec![2.1, 2.1], 0., 0.);
/// let nbrs = tree.knn(&query, 1, 5).unwrap();
/// assert_eq!(nbrs[0].record.descriptor(), &[2.0, 2.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KDTreeBuilder {
    leaf_size: usize,
}

impl Default for KDTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl KDTreeBuilder {
    /// Create a new builder with the default leaf size.
    pub fn new() -> Self {
        Self {
            leaf_size: DEFAULT_LEAF_SIZE,
        }
    }

    /// Create a new builder with the provided leaf size, which must be at least 1.
    pub fn new_with_leaf_size(leaf_size: usize) -> Result<Self> {
        if leaf_size == 0 {
            return Err(DescriptorIndexError::InvalidArgument(
                "Leaf size must be at least 1.".to_string(),
            ));
        }
        Ok(Self { leaf_size })
    }

    /// The maximum number of records in a leaf.
    pub fn leaf_size(&self) -> usize {
        self.leaf_size
    }

    /// Build a tree over `records`.
    ///
    /// **This reorders `records` in place.** Copy the slice first if its original order matters,
    /// or use [`build_indexed`][Self::build_indexed].
    pub fn build<'a, F: Descriptor>(&self, records: &'a mut [F]) -> Result<KDTree<'a, F>> {
        let dimension = validate(records)?;
        let arena = self.build_arena(&mut *records, dimension)?;
        Ok(KDTree { records, arena })
    }

    /// Build a tree over `records` without reordering them.
    pub fn build_indexed<'a, F: Descriptor>(
        &self,
        records: &'a [F],
    ) -> Result<IndexedKDTree<'a, F>> {
        let dimension = validate(records)?;
        let mut ids = Permutation::identity(records.len())?;
        let arena = self.build_arena(
            &mut PermutedRecords {
                records,
                ids: &mut ids,
            },
            dimension,
        )?;
        Ok(IndexedKDTree {
            records,
            ids,
            arena,
        })
    }

    fn build_arena<S: SortItems + ?Sized>(
        &self,
        items: &mut S,
        dimension: usize,
    ) -> Result<NodeArena> {
        let num_items = items.len();

        let mut nodes = Vec::new();
        nodes.try_reserve_exact(max_nodes(num_items)?)?;

        build_subtree(items, &mut nodes, 0, num_items, dimension, self.leaf_size);

        let depth = compute_depth(&nodes);
        let arena = NodeArena {
            nodes,
            num_items,
            dimension,
            leaf_size: self.leaf_size,
            depth,
        };
        debug!(
            "built k-d tree over {} records: {} nodes, {} leaves, depth {}",
            num_items,
            arena.num_nodes(),
            arena.num_leaves(),
            arena.depth()
        );
        Ok(arena)
    }
}

/// Upper bound on the arena size for `num_items >= 1` records.
///
/// A strict binary tree over n leaves of >= 1 record has at most 2n - 1 nodes.
fn max_nodes(num_items: usize) -> Result<usize> {
    num_items
        .checked_mul(2)
        .map(|n| n - 1)
        .ok_or_else(|| {
            DescriptorIndexError::InvalidArgument(format!(
                "Cannot index {} records on this target.",
                num_items
            ))
        })
}

/// Check that there is at least one record, that all descriptors share one non-zero dimension,
/// and that every component is finite. Returns the dimension.
fn validate<F: Descriptor>(records: &[F]) -> Result<usize> {
    let Some(first) = records.first() else {
        return Err(DescriptorIndexError::InvalidArgument(
            "Cannot build a k-d tree from zero records.".to_string(),
        ));
    };
    if records.len() > u32::MAX as usize {
        return Err(DescriptorIndexError::InvalidArgument(format!(
            "Cannot index {} records; at most {} are supported.",
            records.len(),
            u32::MAX
        )));
    }

    let dimension = first.descriptor().len();
    if dimension == 0 {
        return Err(DescriptorIndexError::InvalidArgument(
            "Descriptors must have at least one component.".to_string(),
        ));
    }

    for record in records {
        let descr = record.descriptor();
        if descr.len() != dimension {
            return Err(DescriptorIndexError::DimensionMismatch {
                expected: dimension,
                actual: descr.len(),
            });
        }
        check_finite(descr)?;
    }
    Ok(dimension)
}

/// Positional access to the records being partitioned.
pub(crate) trait SortItems {
    fn len(&self) -> usize;

    /// Component `dim` of the record at `pos`, widened to `f64`.
    fn value(&self, pos: usize, dim: usize) -> f64;

    fn swap_items(&mut self, a: usize, b: usize);
}

impl<F: Descriptor> SortItems for [F] {
    #[inline]
    fn len(&self) -> usize {
        <[F]>::len(self)
    }

    #[inline]
    fn value(&self, pos: usize, dim: usize) -> f64 {
        self[pos].descriptor()[dim].as_f64()
    }

    #[inline]
    fn swap_items(&mut self, a: usize, b: usize) {
        self.swap(a, b);
    }
}

/// Records left in place, reordered through a permutation.
struct PermutedRecords<'r, F> {
    records: &'r [F],
    ids: &'r mut Permutation,
}

impl<F: Descriptor> SortItems for PermutedRecords<'_, F> {
    #[inline]
    fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    fn value(&self, pos: usize, dim: usize) -> f64 {
        self.records[self.ids.get(pos)].descriptor()[dim].as_f64()
    }

    #[inline]
    fn swap_items(&mut self, a: usize, b: usize) {
        self.ids.swap(a, b);
    }
}

/// Recursively build the subtree over positions `start..end` and return its arena index.
///
/// Children are pushed before their parent, so the arena ends up in post-order.
fn build_subtree<S: SortItems + ?Sized>(
    items: &mut S,
    nodes: &mut Vec<NodeEntry>,
    start: usize,
    end: usize,
    dimension: usize,
    leaf_size: usize,
) -> usize {
    let len = end - start;
    if len <= leaf_size {
        return push_node(nodes, NodeEntry::Leaf { start, end });
    }

    // identical descriptors cannot be told apart by any split
    let Some(dim) = max_variance_dimension(items, start, end, dimension) else {
        return push_node(nodes, NodeEntry::Leaf { start, end });
    };

    // lower median position; [start, m] goes left and [m + 1, end) goes right, so both sides
    // are non-empty whatever the number of ties
    let m = start + (len - 1) / 2;
    select(items, m, start, end - 1, dim);
    let value = items.value(m, dim);

    let left = build_subtree(items, nodes, start, m + 1, dimension, leaf_size);
    let right = build_subtree(items, nodes, m + 1, end, dimension, leaf_size);
    push_node(
        nodes,
        NodeEntry::Split {
            dim,
            value,
            left,
            right,
        },
    )
}

#[inline]
fn push_node(nodes: &mut Vec<NodeEntry>, node: NodeEntry) -> usize {
    nodes.push(node);
    nodes.len() - 1
}

/// The dimension whose values vary most across `start..end`, or `None` when every dimension is
/// constant. Ties resolve to the lowest dimension index.
fn max_variance_dimension<S: SortItems + ?Sized>(
    items: &S,
    start: usize,
    end: usize,
    dimension: usize,
) -> Option<usize> {
    let n = (end - start) as f64;
    let mut best: Option<(usize, f64)> = None;

    for dim in 0..dimension {
        // rounding in the mean can leave a small positive variance over identical values
        let first = items.value(start, dim);
        if (start + 1..end).all(|pos| items.value(pos, dim) == first) {
            continue;
        }

        let mean = (start..end).map(|pos| items.value(pos, dim)).sum::<f64>() / n;
        let variance = (start..end)
            .map(|pos| {
                let d = items.value(pos, dim) - mean;
                d * d
            })
            .sum::<f64>()
            / n;

        if variance > best.map_or(0.0, |(_, v)| v) {
            best = Some((dim, variance));
        }
    }

    best.map(|(dim, _)| dim)
}

/// Custom Floyd-Rivest selection algorithm: reorder items so that [left..k-1] items are no
/// greater than the k-th item and [k+1..right] items are no smaller, along dimension `dim`.
#[inline]
fn select<S: SortItems + ?Sized>(
    items: &mut S,
    k: usize,
    mut left: usize,
    mut right: usize,
    dim: usize,
) {
    while right > left {
        if right - left > 600 {
            let n = (right - left + 1) as f64;
            let m = (k - left + 1) as f64;
            let z = f64::ln(n);
            let s = 0.5 * f64::exp((2.0 * z) / 3.0);
            let sd = 0.5
                * f64::sqrt((z * s * (n - s)) / n)
                * (if m - n / 2.0 < 0.0 { -1.0 } else { 1.0 });
            let new_left = cmp::max(left, f64::floor(k as f64 - (m * s) / n + sd) as usize);
            let new_right = cmp::min(
                right,
                f64::floor(k as f64 + ((n - m) * s) / n + sd) as usize,
            );
            select(items, k, new_left, new_right, dim);
        }

        let t = items.value(k, dim);
        let mut i = left;
        let mut j = right;

        items.swap_items(left, k);
        if items.value(right, dim) > t {
            items.swap_items(left, right);
        }

        while i < j {
            items.swap_items(i, j);
            i += 1;
            j -= 1;
            while items.value(i, dim) < t {
                i += 1;
            }
            while items.value(j, dim) > t {
                j -= 1;
            }
        }

        if items.value(left, dim) == t {
            items.swap_items(left, j);
        } else {
            j += 1;
            items.swap_items(j, right);
        }

        if j <= k {
            left = j + 1;
        }
        if k <= j {
            // j == 0 implies k == 0, and left is already past right
            right = j.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn column(values: &[f64]) -> Vec<[f64; 1]> {
        values.iter().map(|&v| [v]).collect()
    }

    impl SortItems for Vec<[f64; 1]> {
        fn len(&self) -> usize {
            <[[f64; 1]]>::len(self)
        }

        fn value(&self, pos: usize, _dim: usize) -> f64 {
            self[pos][0]
        }

        fn swap_items(&mut self, a: usize, b: usize) {
            self.swap(a, b);
        }
    }

    fn assert_selected(items: &Vec<[f64; 1]>, k: usize) {
        let kth = items[k][0];
        assert!(items[..k].iter().all(|v| v[0] <= kth), "left of k not <= kth");
        assert!(items[k + 1..].iter().all(|v| v[0] >= kth), "right of k not >= kth");
    }

    #[test]
    fn select_places_median() {
        let mut items = column(&[9., 1., 8., 2., 7., 3., 6., 4., 5.]);
        let k = 4;
        let last = items.len() - 1;
        select(&mut items, k, 0, last, 0);
        assert_eq!(items[k][0], 5.);
        assert_selected(&items, k);
    }

    #[test]
    fn select_handles_ties_and_small_ranges() {
        let mut items = column(&[3., 3., 3., 1., 3., 3.]);
        let last = items.len() - 1;
        select(&mut items, 2, 0, last, 0);
        assert_selected(&items, 2);

        let mut pair = column(&[2., 1.]);
        select(&mut pair, 0, 0, 1, 0);
        assert_eq!(pair[0][0], 1.);
        assert_selected(&pair, 0);
    }

    #[test]
    fn select_large_range() {
        // exercises the Floyd-Rivest sampling step
        let mut items = column(
            &(0..2000)
                .map(|i| ((i * 7919) % 2000) as f64)
                .collect::<Vec<_>>(),
        );
        let last = items.len() - 1;
        select(&mut items, 999, 0, last, 0);
        assert_eq!(items[999][0], 999.);
        assert_selected(&items, 999);
    }

    #[test]
    fn variance_picks_most_spread_dimension() {
        let records = [[0.0f64, 0.0, 5.0], [0.0, 10.0, 5.0], [0.0, -10.0, 6.0]];
        let records: Vec<_> = records
            .iter()
            .map(|d| crate::Feature::new(d.to_vec(), 0., 0.))
            .collect();
        assert_eq!(
            max_variance_dimension(records.as_slice(), 0, 3, 3),
            Some(1)
        );

        let flat: Vec<_> = (0..4)
            .map(|_| crate::Feature::new(vec![1.0f64, 2.0], 0., 0.))
            .collect();
        assert_eq!(max_variance_dimension(flat.as_slice(), 0, 4, 2), None);
    }

    #[test]
    fn inexact_identical_values_are_constant() {
        let flat: Vec<_> = (0..7)
            .map(|_| crate::Feature::new(vec![0.1f64, 0.7, 1.0 / 3.0], 0., 0.))
            .collect();
        assert_eq!(max_variance_dimension(flat.as_slice(), 0, 7, 3), None);

        let mut flat = flat;
        flat[6] = crate::Feature::new(vec![0.1f64, 0.7, 0.3], 0., 0.);
        assert_eq!(max_variance_dimension(flat.as_slice(), 0, 7, 3), Some(2));
    }

    #[test]
    fn node_bound_overflow() {
        assert_eq!(max_nodes(1).unwrap(), 1);
        assert_eq!(max_nodes(5).unwrap(), 9);
        assert!(matches!(
            max_nodes(usize::MAX),
            Err(DescriptorIndexError::InvalidArgument(_))
        ));
    }

    #[test]
    fn rejects_zero_leaf_size() {
        assert!(matches!(
            KDTreeBuilder::new_with_leaf_size(0),
            Err(DescriptorIndexError::InvalidArgument(_))
        ));
        assert_eq!(KDTreeBuilder::new_with_leaf_size(8).unwrap().leaf_size(), 8);
    }
}
