//! Fixed-capacity list of the best candidates seen so far during a search.

use std::fmt;

use crate::error::Result;

/// A record returned by a nearest-neighbor search, with its squared descriptor distance to the
/// query.
pub struct Neighbor<'a, F> {
    /// The matched record, borrowed from the caller's storage.
    pub record: &'a F,
    /// Squared descriptor distance between the query and `record`.
    pub distance_sq: f64,
}

impl<F> Clone for Neighbor<'_, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F> Copy for Neighbor<'_, F> {}

impl<F: fmt::Debug> fmt::Debug for Neighbor<'_, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Neighbor")
            .field("record", self.record)
            .field("distance_sq", &self.distance_sq)
            .finish()
    }
}

/// Candidates sorted by ascending distance, holding at most `capacity` entries.
///
/// Entries with equal distance keep insertion order.
#[derive(Debug)]
pub(crate) struct CandidateList<'a, F> {
    capacity: usize,
    entries: Vec<Neighbor<'a, F>>,
}

impl<'a, F> CandidateList<'a, F> {
    /// Create an empty list keeping the best `capacity` candidates out of at most `max_inserts`
    /// insertions.
    pub(crate) fn new(capacity: usize, max_inserts: usize) -> Result<Self> {
        let mut entries = Vec::new();
        entries.try_reserve_exact(capacity.min(max_inserts) + 1)?;
        Ok(Self { capacity, entries })
    }

    /// Insert a candidate if it beats the current worst entry or the list is not yet full.
    /// Returns `true` if the candidate was kept.
    pub(crate) fn insert(&mut self, record: &'a F, distance_sq: f64) -> bool {
        if self.entries.len() == self.capacity
            && self
                .entries
                .last()
                .is_some_and(|worst| distance_sq >= worst.distance_sq)
        {
            return false;
        }

        let pos = self
            .entries
            .partition_point(|entry| entry.distance_sq <= distance_sq);
        self.entries.insert(
            pos,
            Neighbor {
                record,
                distance_sq,
            },
        );
        if self.entries.len() > self.capacity {
            self.entries.pop();
        }
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn into_neighbors(self) -> Vec<Neighbor<'a, F>> {
        self.entries
    }
}
