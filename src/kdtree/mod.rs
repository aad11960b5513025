//! An immutable k-d tree over feature descriptors with Best-Bin-First approximate
//! nearest-neighbor search.

#![warn(missing_docs)]

mod bbf;
mod builder;
mod candidates;
mod index;
mod pq;
mod r#trait;
pub mod traversal;

pub use builder::{KDTreeBuilder, DEFAULT_LEAF_SIZE};
pub use candidates::Neighbor;
pub use index::{release, IndexedKDTree, KDTree, NodeArena};
pub use r#trait::KDTreeIndex;
