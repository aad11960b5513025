//! Permutation storage that may be either `u16` or `u32` to save space.

use crate::error::Result;

/// An owned permutation of record positions, stored as `u16` when fewer than 65536 records are
/// indexed and `u32` otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permutation {
    /// Compact storage for small trees.
    U16(Vec<u16>),
    /// Storage for trees with at least 65536 records.
    U32(Vec<u32>),
}

impl Permutation {
    /// Create the identity permutation over `num_items` positions.
    ///
    /// `num_items` must fit in a `u32`; the builder checks this before calling.
    pub(crate) fn identity(num_items: usize) -> Result<Self> {
        if num_items < 65536 {
            let mut ids = Vec::new();
            ids.try_reserve_exact(num_items)?;
            ids.extend((0..num_items).map(|i| i as u16));
            Ok(Self::U16(ids))
        } else {
            let mut ids = Vec::new();
            ids.try_reserve_exact(num_items)?;
            ids.extend((0..num_items).map(|i| i as u32));
            Ok(Self::U32(ids))
        }
    }

    /// The number of bytes used per stored position.
    #[inline]
    pub fn bytes_per_element(&self) -> usize {
        match self {
            Self::U16(_) => 2,
            Self::U32(_) => 4,
        }
    }

    /// The number of positions.
    pub fn len(&self) -> usize {
        match self {
            Self::U16(arr) => arr.len(),
            Self::U32(arr) => arr.len(),
        }
    }

    /// Returns `true` if there are no positions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The original record index stored at `pos`.
    #[inline]
    pub fn get(&self, pos: usize) -> usize {
        match self {
            Self::U16(arr) => arr[pos] as usize,
            Self::U32(arr) => arr[pos] as usize,
        }
    }

    #[inline]
    pub(crate) fn swap(&mut self, a: usize, b: usize) {
        match self {
            Self::U16(arr) => arr.swap(a, b),
            Self::U32(arr) => arr.swap(a, b),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn picks_compact_storage() {
        let small = Permutation::identity(10).unwrap();
        assert_eq!(small.bytes_per_element(), 2);
        assert_eq!(small.len(), 10);
        assert_eq!(small.get(7), 7);

        let large = Permutation::identity(70_000).unwrap();
        assert_eq!(large.bytes_per_element(), 4);
        assert_eq!(large.get(69_999), 69_999);
    }

    #[test]
    fn swaps_positions() {
        let mut ids = Permutation::identity(3).unwrap();
        ids.swap(0, 2);
        assert_eq!((ids.get(0), ids.get(1), ids.get(2)), (2, 1, 0));
    }
}
