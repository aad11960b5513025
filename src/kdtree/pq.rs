//! Min priority queue of pending tree nodes for Best-Bin-First search.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::error::Result;

/// A wrapper around a node and its lower-bound distance for use in the priority queue.
#[derive(Debug, Clone, Copy)]
struct PendingNode {
    node: usize,
    priority: f64,
    /// insertion order, so equal priorities pop first-in first-out
    seq: usize,
}

impl PartialEq for PendingNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PendingNode {}

impl Ord for PendingNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for PendingNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Pending arena nodes ordered by smallest priority first.
///
/// A node is pushed at most once per search, so the queue never holds more entries than the tree
/// has nodes.
#[derive(Debug, Default)]
pub(crate) struct MinPq {
    heap: BinaryHeap<Reverse<PendingNode>>,
    pushed: usize,
}

impl MinPq {
    /// Create a queue with room for `capacity` nodes before it has to grow.
    pub(crate) fn with_capacity(capacity: usize) -> Result<Self> {
        let mut heap = BinaryHeap::new();
        heap.try_reserve(capacity)?;
        Ok(Self { heap, pushed: 0 })
    }

    #[inline]
    pub(crate) fn push(&mut self, node: usize, priority: f64) {
        self.heap.push(Reverse(PendingNode {
            node,
            priority,
            seq: self.pushed,
        }));
        self.pushed += 1;
    }

    /// Remove the node with the smallest priority.
    #[inline]
    pub(crate) fn pop(&mut self) -> Option<(usize, f64)> {
        self.heap
            .pop()
            .map(|Reverse(pending)| (pending.node, pending.priority))
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::MinPq;

    #[test]
    fn pops_smallest_first() {
        let mut pq = MinPq::with_capacity(4).unwrap();
        pq.push(10, 4.0);
        pq.push(11, 0.5);
        pq.push(12, 9.0);
        pq.push(13, 2.0);
        assert_eq!(pq.len(), 4);

        let order: Vec<usize> = std::iter::from_fn(|| pq.pop().map(|(node, _)| node)).collect();
        assert_eq!(order, vec![11, 13, 10, 12]);
        assert!(pq.is_empty());
        assert_eq!(pq.pop(), None);
    }

    #[test]
    fn equal_priorities_pop_in_insertion_order() {
        let mut pq = MinPq::default();
        for node in [5, 3, 8, 1] {
            pq.push(node, 1.0);
        }
        pq.push(0, 0.0);

        let order: Vec<usize> = std::iter::from_fn(|| pq.pop().map(|(node, _)| node)).collect();
        assert_eq!(order, vec![0, 5, 3, 8, 1]);
    }
}
