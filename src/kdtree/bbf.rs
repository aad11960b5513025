//! Best-Bin-First traversal.
//!
//! Beis, J. S. and Lowe, D. G. Shape indexing using approximate nearest-neighbor search in
//! high-dimensional spaces. In Conference on Computer Vision and Pattern Recognition (1997).

use log::trace;

use crate::descriptor::{check_finite, sq_dist, Descriptor};
use crate::error::{DescriptorIndexError, Result};
use crate::kdtree::candidates::{CandidateList, Neighbor};
use crate::kdtree::index::{NodeArena, NodeEntry};
use crate::kdtree::pq::MinPq;
use crate::kdtree::KDTreeIndex;
use crate::r#type::DescriptorNum;

/// Approximate k-nearest-neighbor search bounded by `max_checks` record evaluations.
///
/// Only records for which `eligible` returns `true` may enter the result, but every record in a
/// visited leaf counts against the budget.
pub(crate) fn bbf_knn<'a, F, T, P>(
    tree: &T,
    query: &[F::Num],
    k: usize,
    max_checks: usize,
    mut eligible: P,
) -> Result<Vec<Neighbor<'a, F>>>
where
    F: Descriptor + 'a,
    T: KDTreeIndex<'a, F>,
    P: FnMut(&F) -> bool,
{
    if k == 0 {
        return Err(DescriptorIndexError::InvalidArgument(
            "Number of neighbors must be at least 1.".to_string(),
        ));
    }
    let arena = tree.arena();
    if query.len() != arena.dimension() {
        return Err(DescriptorIndexError::DimensionMismatch {
            expected: arena.dimension(),
            actual: query.len(),
        });
    }
    check_finite(query)?;

    if max_checks == 0 {
        return Ok(Vec::new());
    }

    let mut candidates = CandidateList::new(k, arena.num_items())?;
    let mut queue = MinPq::with_capacity(arena.depth() + 1)?;
    queue.push(arena.root_id(), 0.0);

    let mut checks = 0;
    let mut leaves = 0;
    while checks < max_checks {
        let Some((node, _)) = queue.pop() else {
            break;
        };

        let (start, end) = explore_to_leaf(arena, node, query, &mut queue);
        for pos in start..end {
            let record = tree.record_at(pos);
            if !eligible(record) {
                continue;
            }
            let distance_sq = sq_dist(query, record.descriptor());
            candidates.insert(record, distance_sq);
        }
        checks += end - start;
        leaves += 1;
    }

    trace!(
        "bbf search stopped after {} checks in {} leaves ({}); {} found, {} pending",
        checks,
        leaves,
        if queue.is_empty() {
            "tree exhausted"
        } else {
            "budget reached"
        },
        candidates.len(),
        queue.len()
    );

    Ok(candidates.into_neighbors())
}

/// Descend from `node` to a leaf, always taking the side of each split the query falls on and
/// queueing the other side with the squared distance from the query to the split plane as its
/// priority. Returns the leaf's record range.
fn explore_to_leaf<N: DescriptorNum>(
    arena: &NodeArena,
    mut node: usize,
    query: &[N],
    queue: &mut MinPq,
) -> (usize, usize) {
    loop {
        match arena.nodes[node] {
            NodeEntry::Leaf { start, end } => return (start, end),
            NodeEntry::Split {
                dim,
                value,
                left,
                right,
            } => {
                let q = query[dim].as_f64();
                let (near, far) = if q <= value {
                    (left, right)
                } else {
                    (right, left)
                };
                let diff = q - value;
                queue.push(far, diff * diff);
                node = near;
            }
        }
    }
}
